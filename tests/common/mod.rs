#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use ministry_api::auth::hash_password;
use ministry_api::config::AppConfig;
use ministry_api::database::models::user::{Role, User, UserCreate};
use ministry_api::database::{DatabaseManager, Repository};
use ministry_api::{app, AppState};

/// An in-process server bound to an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: Arc<AppState>,
}

/// Start a server against `TEST_DATABASE_URL`, or `None` when it is unset.
pub async fn server() -> Result<Option<TestServer>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return Ok(None);
    };

    let mut config = AppConfig::development();
    config.database.url = Some(url);
    config.database.max_connections = 5;
    config.security.jwt_secret = Some("integration-secret".to_string());
    config.security.bcrypt_cost = 4;

    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;

    let state = Arc::new(AppState::new(pool, config)?);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = app(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(Some(TestServer {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        state,
    }))
}

pub struct Session {
    pub user_id: Uuid,
    pub token: String,
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.org", prefix, Uuid::new_v4().simple())
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Insert an admin directly and mint a token for it.
    pub async fn admin(&self) -> Result<Session> {
        let create = UserCreate {
            name: "Admin".to_string(),
            email: unique_email("admin"),
            password: String::new(),
            role: None,
            phone: None,
            birth_date: None,
            ministry_entry_date: None,
            avatar_url: None,
        };
        let hash = hash_password("admin-password".to_string(), 4).await?;
        let user = Repository::<User>::new(User::TABLE, self.state.pool.clone())
            .insert(create.into_changes(Role::Admin, hash))
            .await?;
        let token = self.state.jwt.issue(&user)?;
        Ok(Session { user_id: user.id, token })
    }

    /// Register a member through the public endpoint.
    pub async fn member(&self, name: &str) -> Result<Session> {
        let res = self
            .client
            .post(self.url("/register"))
            .json(&json!({ "name": name, "email": unique_email(name), "password": "member-password" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
        let body: Value = res.json().await?;
        let user_id = body["user"]["id"]
            .as_str()
            .context("missing user id")?
            .parse()?;
        let token = body["token"].as_str().context("missing token")?.to_string();
        Ok(Session { user_id, token })
    }

    pub async fn get(&self, session: &Session, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).bearer_auth(&session.token).send().await?;
        read(res).await
    }

    pub async fn post(&self, session: &Session, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(&session.token)
            .json(&body)
            .send()
            .await?;
        read(res).await
    }

    pub async fn put(&self, session: &Session, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(&session.token)
            .json(&body)
            .send()
            .await?;
        read(res).await
    }

    pub async fn delete(&self, session: &Session, path: &str) -> Result<StatusCode> {
        let res = self.client.delete(self.url(path)).bearer_auth(&session.token).send().await?;
        Ok(res.status())
    }
}

async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let text = res.text().await?;
    let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
    Ok((status, body))
}
