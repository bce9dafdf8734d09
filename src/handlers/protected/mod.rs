// Protected handlers: every route here sits behind jwt_auth_middleware and
// receives the caller as Extension<AuthUser>.

pub mod attendance;
pub mod groups;
pub mod notifications;
pub mod resource;
pub mod scales;
pub mod transactions;
pub mod users;
pub mod utils;
