use anyhow::Context;
use serde_json::json;

use crate::auth;
use crate::cli::utils::{connect, output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::models::user::{Role, User, UserCreate};
use crate::database::Repository;

/// Bootstrap an administrator; registration only ever creates members.
pub async fn create_admin(
    name: String,
    email: String,
    password: String,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let payload = UserCreate {
        name,
        email,
        password,
        role: Some(Role::Admin.to_string()),
        phone: None,
        birth_date: None,
        ministry_entry_date: None,
        avatar_url: None,
    };
    if let Err(errors) = payload.validate() {
        let message = errors
            .into_details()
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ");
        output_error(output_format, &message, Some("VALIDATION_ERROR"))?;
        anyhow::bail!("invalid admin details");
    }

    let pool = connect().await?;
    let password_hash = auth::hash_password(payload.password.clone(), config().security.bcrypt_cost).await?;
    let user = Repository::<User>::new(User::TABLE, pool)
        .insert(payload.into_changes(Role::Admin, password_hash))
        .await
        .context("failed to create admin")?;

    output_success(
        output_format,
        &format!("Admin {} created", user.email),
        Some(json!({ "id": user.id, "email": user.email })),
    )
}

pub async fn hash_password(password: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let hash = auth::hash_password(password, config().security.bcrypt_cost).await?;
    match output_format {
        OutputFormat::Json => output_success(output_format, "Password hashed", Some(json!({ "hash": hash }))),
        OutputFormat::Text => {
            println!("{}", hash);
            Ok(())
        }
    }
}
