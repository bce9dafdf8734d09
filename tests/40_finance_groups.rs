mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn summary_balances_income_and_expense() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let admin = server.admin().await?;
    let category = format!("cat-{}", uuid::Uuid::new_v4().simple());

    for (kind, amount) in [("INCOME", "150.50"), ("INCOME", "49.50"), ("EXPENSE", "80.25")] {
        let (status, body) = server
            .post(
                &admin,
                "/transactions",
                json!({ "type": kind, "amount": amount, "category": category, "date": "1999-01-15" }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["type"], kind);
    }

    let (status, summary) = server
        .get(&admin, "/transactions/summary?startDate=1999-01-01&endDate=1999-01-31")
        .await?;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<_> = summary["byCategory"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r["category"] == category.as_str())
        .collect();
    assert_eq!(rows.len(), 2);

    let (_, page) = server
        .get(&admin, &format!("/transactions?category={}&limit=2", category))
        .await?;
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(page["pagination"]["totalPages"], 2);
    assert_eq!(page["data"].as_array().map(Vec::len), Some(2));

    let (status, _) = server
        .post(
            &admin,
            "/transactions",
            json!({ "type": "INCOME", "amount": "-5", "category": category, "date": "1999-01-15" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn group_items_notify_other_members() -> Result<()> {
    let Some(server) = common::server().await? else { return Ok(()) };
    let admin = server.admin().await?;
    let a = server.member("worship").await?;
    let b = server.member("media").await?;

    let (status, group) = server.post(&admin, "/groups", json!({ "name": "Worship team" })).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", group);
    let id = group["id"].as_str().unwrap_or_default().to_string();

    let (status, members) = server
        .post(
            &admin,
            &format!("/groups/{}/members", id),
            json!({ "userIds": [a.user_id, b.user_id, admin.user_id] }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", members);
    assert_eq!(members.as_array().map(Vec::len), Some(3));

    let (status, item) = server
        .post(
            &admin,
            &format!("/groups/{}/items", id),
            json!({ "title": "Setlist", "url": "https://example.org/setlist" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", item);
    assert_eq!(item["kind"], "LINK");

    for member in [&a, &b] {
        let (_, list) = server.get(member, "/getNotifications").await?;
        let hits = list["notifications"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|n| n["kind"] == "GROUP_ITEM" && n["link"] == format!("/groups/{}", id))
            .count();
        assert_eq!(hits, 1);
    }
    let (_, own) = server.get(&admin, "/getNotifications").await?;
    assert_eq!(own["unreadCount"], 0);

    let status = server
        .delete(&admin, &format!("/groups/{}/members/{}", id, b.user_id))
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, members) = server.get(&a, &format!("/groups/{}/members", id)).await?;
    assert_eq!(members.as_array().map(Vec::len), Some(2));
    Ok(())
}
