use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{AuthError, JwtKeys};
use crate::config::AppConfig;
use crate::notify::{NotificationSink, PgNotificationSink};

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub jwt: JwtKeys,
    pub notifier: Arc<dyn NotificationSink>,
}

impl AppState {
    /// State backed by Postgres for both data and notifications.
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self, AuthError> {
        let jwt = JwtKeys::from_config(&config.security)?;
        let notifier = Arc::new(PgNotificationSink::new(pool.clone()));
        Ok(Self {
            pool,
            config,
            jwt,
            notifier,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }
}
