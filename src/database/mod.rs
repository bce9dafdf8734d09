pub mod changes;
pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod value;

pub use changes::ChangeSet;
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::Repository;
pub use value::SqlValue;
