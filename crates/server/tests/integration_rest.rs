mod common;

use anyhow::Context as _;
use jgrants_test_support::KNOWN_SUBSIDY_ID;
use serde_json::{Value, json};

use common::start_server;

async fn get_json(url: &str) -> anyhow::Result<(u16, Value)> {
    let resp = reqwest::get(url).await.with_context(|| format!("GET {url}"))?;
    let status = resp.status().as_u16();
    let body = resp.json::<Value>().await.context("json body")?;
    Ok((status, body))
}

#[tokio::test]
async fn rest_search_detail_and_errors_through_the_binary() -> anyhow::Result<()> {
    let server = start_server(&[]).await?;
    let base = &server.base_url;

    let (status, body) = get_json(&format!("{base}/subsidies/search?keyword=IT&sort=created_date")).await?;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["total_count"], json!(2));
    assert_eq!(body["search_conditions"]["sort"], json!("created_date"));
    assert_eq!(body["search_conditions"]["acceptance"], json!(1));

    let (status, body) = get_json(&format!("{base}/subsidies/search?keyword=IT&order=up")).await?;
    assert_eq!(status, 400);
    assert_eq!(body["detail"], json!("order must be ASC or DESC"));

    let (status, body) = get_json(&format!("{base}/subsidies/{KNOWN_SUBSIDY_ID}")).await?;
    assert_eq!(status, 200);
    assert_eq!(body["id"], json!(KNOWN_SUBSIDY_ID));

    let (status, _) = get_json(&format!("{base}/subsidies/unknown")).await?;
    assert_eq!(status, 404);

    Ok(())
}

#[tokio::test]
async fn openapi_advertises_configured_public_url() -> anyhow::Result<()> {
    let server = start_server(&["--server-url", "https://example.ngrok.app/"]).await?;

    let (status, body) = get_json(&format!("{}/openapi.json", server.base_url)).await?;
    assert_eq!(status, 200);
    assert_eq!(body["servers"][0]["url"], json!("https://example.ngrok.app"));
    assert_eq!(body["servers"][0]["description"], json!("Development (ngrok)"));

    let spec: openapiv3::OpenAPI = serde_json::from_value(body).context("parse OpenAPI")?;
    assert!(spec.paths.paths.contains_key("/subsidies/search"));
    Ok(())
}

#[tokio::test]
async fn rest_only_surface_does_not_mount_mcp() -> anyhow::Result<()> {
    let server = start_server(&["--surface", "rest"]).await?;

    let resp = reqwest::Client::new()
        .post(format!("{}/mcp", server.base_url))
        .header("Accept", "application/json, text/event-stream")
        .json(&json!({ "jsonrpc": "2.0", "id": 0, "method": "ping" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);
    Ok(())
}
