use axum::{body::Bytes, extract::State};
use std::sync::Arc;

use crate::auth::{verify_password, AuthError};
use crate::database::models::user::{normalize_email, LoginRequest, User};
use crate::database::Repository;
use crate::filter::FilterData;
use crate::middleware::{parse_body, ApiResponse, ApiResult};
use crate::state::AppState;

use super::utils::AuthResponse;

/// POST /login - exchange email and password for a session token
///
/// Unknown emails and wrong passwords produce the same 401 so the endpoint
/// does not reveal which accounts exist.
pub async fn login_post(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<AuthResponse> {
    let payload: LoginRequest = parse_body(&body)?;
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let users = Repository::<User>::new(User::TABLE, state.pool.clone());
    let Some(user) = users.select_one(FilterData::new().eq("email", email.as_str())).await? else {
        tracing::warn!("Login failed: unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password(payload.password, user.password_hash.clone()).await? {
        tracing::warn!("Login failed for user {}", user.id);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.jwt.issue(&user)?;
    tracing::info!("User {} logged in", user.id);
    Ok(ApiResponse::success(AuthResponse { token, user }))
}
