use axum::{body::Bytes, extract::State};
use std::sync::Arc;

use crate::auth::hash_password;
use crate::database::models::user::{RegisterRequest, Role, User, UserCreate};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{parse_body, ApiResponse, ApiResult};
use crate::state::AppState;

use super::utils::AuthResponse;

/// POST /register - self-service sign-up
///
/// New accounts are always MEMBER; administrators are created through
/// `POST /users` or the `ministry create-admin` command.
pub async fn register_post(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<AuthResponse> {
    if !state.config.security.allow_registration {
        return Err(ApiError::forbidden("Registration is disabled"));
    }

    let payload: RegisterRequest = parse_body(&body)?;
    payload.validate()?;

    let mut create = UserCreate::from(payload);
    let password = std::mem::take(&mut create.password);
    let password_hash = hash_password(password, state.config.security.bcrypt_cost).await?;

    let users = Repository::<User>::new(User::TABLE, state.pool.clone());
    let user = users.insert(create.into_changes(Role::Member, password_hash)).await?;

    let token = state.jwt.issue(&user)?;
    tracing::info!("Registered user {}", user.id);
    Ok(ApiResponse::created(AuthResponse { token, user }))
}
