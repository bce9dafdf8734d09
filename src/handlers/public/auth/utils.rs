use serde::Serialize;

use crate::database::models::user::User;

/// Body returned by `/register` and `/login`
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
