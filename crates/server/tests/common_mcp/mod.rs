use anyhow::Context as _;
use futures::StreamExt as _;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::io::AsyncBufReadExt as _;
use tokio_util::io::StreamReader;

/// Just enough of an MCP streamable HTTP client to drive `/mcp` from tests.
pub struct McpSession {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl McpSession {
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let init = post_mcp(
            &client,
            &base_url,
            None,
            json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "jgrants-server-tests", "version": "0" }
                }
            }),
        )
        .await?;

        let session_id = init
            .headers()
            .get("Mcp-Session-Id")
            .and_then(|h| h.to_str().ok())
            .context("missing Mcp-Session-Id header")?
            .to_string();

        let init_msg = first_sse_message(init).await?;
        anyhow::ensure!(init_msg["id"] == json!(0), "unexpected initialize reply: {init_msg}");

        let ack = post_mcp(
            &client,
            &base_url,
            Some(&session_id),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        )
        .await?;
        anyhow::ensure!(
            ack.status().as_u16() == 202,
            "notifications/initialized returned {}",
            ack.status()
        );

        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    pub async fn request(&self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        let resp = post_mcp(
            &self.client,
            &self.base_url,
            Some(&self.session_id),
            json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }),
        )
        .await?;

        tokio::time::timeout(Duration::from_secs(20), first_sse_message(resp))
            .await
            .context("timeout waiting for event-stream reply")?
    }

    /// Call a tool and return `(structuredContent, isError)`.
    pub async fn call_tool(&self, id: u64, name: &str, arguments: Value) -> anyhow::Result<(Value, bool)> {
        let msg = self
            .request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        let result = msg.get("result").context("tools/call missing result")?;
        let body = match result.get("structuredContent") {
            Some(v) => v.clone(),
            None => {
                let text = result["content"][0]["text"]
                    .as_str()
                    .context("tools/call missing content[0].text")?;
                serde_json::from_str(text).context("tool text is not JSON")?
            }
        };
        let is_error = result["isError"].as_bool().unwrap_or(false);
        Ok((body, is_error))
    }
}

async fn post_mcp(
    client: &reqwest::Client,
    base_url: &str,
    session_id: Option<&str>,
    body: Value,
) -> anyhow::Result<reqwest::Response> {
    let mut req = client
        .post(format!("{base_url}/mcp"))
        .header("Accept", "application/json, text/event-stream")
        .header("Content-Type", "application/json")
        .json(&body);
    if let Some(id) = session_id {
        req = req.header("Mcp-Session-Id", id);
    }

    req.send()
        .await
        .context("POST /mcp")?
        .error_for_status()
        .context("POST /mcp status")
}

async fn first_sse_message(resp: reqwest::Response) -> anyhow::Result<Value> {
    let bytes = resp.bytes_stream().map(|r| r.map_err(std::io::Error::other));
    let mut lines = tokio::io::BufReader::new(StreamReader::new(bytes)).lines();

    let mut data: Vec<String> = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line.is_empty() {
            if data.is_empty() {
                continue;
            }
            return serde_json::from_str(&data.join("\n")).context("parse event-stream data");
        }
        if let Some(v) = line.strip_prefix("data:") {
            let v = v.trim();
            // rmcp primes the stream with an empty event
            if !v.is_empty() {
                data.push(v.to_string());
            }
        }
    }

    anyhow::bail!("event-stream ended without a JSON message")
}
