// Public handlers: no bearer token required

pub mod auth;

pub use auth::*;
