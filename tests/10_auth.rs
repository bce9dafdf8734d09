mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn register_then_login() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };

    let email = common::unique_email("Login");
    let res = server
        .client
        .post(server.url("/register"))
        .json(&json!({ "name": "Login Test", "email": email, "password": "s3cret-pass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["user"]["role"], "MEMBER");
    assert_eq!(body["user"]["email"], email.to_lowercase());
    assert!(body["user"].get("passwordHash").is_none());

    let res = server
        .client
        .post(server.url("/login"))
        .json(&json!({ "email": email.to_uppercase(), "password": "s3cret-pass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert!(body["token"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let member = server.member("wrongpw").await?;
    let (_, me) = server.get(&member, "/me").await?;

    let wrong = server
        .client
        .post(server.url("/login"))
        .json(&json!({ "email": me["email"], "password": "not-the-password" }))
        .send()
        .await?;
    let unknown = server
        .client
        .post(server.url("/login"))
        .json(&json!({ "email": common::unique_email("nobody"), "password": "not-the-password" }))
        .send()
        .await?;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let wrong: serde_json::Value = wrong.json().await?;
    let unknown: serde_json::Value = unknown.json().await?;
    assert_eq!(wrong["error"], unknown["error"]);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let email = common::unique_email("dup");
    let payload = json!({ "name": "Dup", "email": email, "password": "s3cret-pass" });

    let first = server.client.post(server.url("/register")).json(&payload).send().await?;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = server.client.post(server.url("/register")).json(&payload).send().await?;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn members_only_see_themselves() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let alice = server.member("alice").await?;
    let bob = server.member("bob").await?;

    let (status, _) = server.get(&alice, &format!("/users/{}", alice.user_id)).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get(&alice, &format!("/users/{}", bob.user_id)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server.get(&alice, "/users").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
