use anyhow::Context as _;
use axum::Router;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::Child;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Subsidy id the fake upstream knows about (returned as a one-element list).
pub const KNOWN_SUBSIDY_ID: &str = "a0WJ200000CDIYsMAP";
/// Subsidy id the fake upstream returns as a bare object.
pub const OBJECT_SUBSIDY_ID: &str = "a0WJ200000OBJECT";
/// Subsidy id the fake upstream returns with an empty `result` list.
pub const EMPTY_SUBSIDY_ID: &str = "a0WJ200000EMPTY";
/// Search keyword that makes the fake upstream fail with a 500.
pub const FAILING_KEYWORD: &str = "upstream-down";

/// Kills a spawned server process when the test ends, pass or fail.
pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
    }
}

/// A localhost port that was free a moment ago, for handing to a spawned `jgrants-server`.
///
/// The port is released before returning, so a race with other processes is possible.
///
/// # Errors
///
/// Fails if no ephemeral port can be bound.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let probe = TcpListener::bind("127.0.0.1:0").context("bind probe socket")?;
    Ok(probe.local_addr().context("probe local_addr")?.port())
}

/// Poll `url` until it answers 2xx, e.g. `/ping` on a freshly spawned server.
///
/// # Errors
///
/// Fails once `within` has elapsed without a successful response.
pub async fn wait_http_ok(url: &str, within: Duration) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if let Ok(resp) = http.get(url).send().await
            && resp.status().is_success()
        {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("{url} not ready after {within:?}")
}

/// An axum app served on an ephemeral localhost port. Shuts down on drop.
pub struct TestServer {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    _handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Serve `app` on `127.0.0.1:0` in a background task.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn serve(app: Router) -> anyhow::Result<TestServer> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind test server")?;
    let addr = listener.local_addr().context("local_addr")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });
    let handle = tokio::spawn(async move {
        let _ = server.await;
    });

    Ok(TestServer {
        base_url: format!("http://{addr}"),
        shutdown: Some(shutdown_tx),
        _handle: handle,
    })
}

/// A stand-in for the jGrants public API with canned data.
///
/// - `GET /subsidies` echoes the received query back in `result[0].query` and reports
///   `metadata.resultset.count = 2`; keyword [`FAILING_KEYWORD`] yields a 500.
/// - `GET /subsidies/id/{id}` serves [`KNOWN_SUBSIDY_ID`], [`OBJECT_SUBSIDY_ID`] and
///   [`EMPTY_SUBSIDY_ID`]; anything else is a 404.
pub fn fake_jgrants() -> Router {
    Router::new()
        .route("/subsidies", get(fake_search))
        .route("/subsidies/id/{id}", get(fake_detail))
}

/// Serve [`fake_jgrants`] on an ephemeral port.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn spawn_fake_jgrants() -> anyhow::Result<TestServer> {
    serve(fake_jgrants()).await
}

async fn fake_search(Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("keyword").map(String::as_str) == Some(FAILING_KEYWORD) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "maintenance").into_response();
    }
    axum::Json(json!({
        "metadata": { "type": "application/json", "resultset": { "count": 2 } },
        "result": [
            {
                "id": KNOWN_SUBSIDY_ID,
                "title": "IT導入補助金",
                "subsidy_max_limit": 4_500_000,
                "acceptance_end_datetime": "2099-12-31T17:00:00+09:00",
                "query": query,
            },
            {
                "id": "a0WJ200000CLOSED",
                "title": "ものづくり補助金",
                "subsidy_max_limit": 12_500_000,
                "acceptance_end_datetime": "2000-01-31T17:00:00+09:00",
            },
        ],
    }))
    .into_response()
}

async fn fake_detail(Path(id): Path<String>) -> Response {
    let body: Value = match id.as_str() {
        KNOWN_SUBSIDY_ID => json!({
            "metadata": { "type": "application/json", "resultset": { "count": 1 } },
            "result": [{ "id": KNOWN_SUBSIDY_ID, "title": "IT導入補助金", "detail": "<p>...</p>" }],
        }),
        OBJECT_SUBSIDY_ID => json!({ "result": { "id": OBJECT_SUBSIDY_ID } }),
        EMPTY_SUBSIDY_ID => json!({ "result": [] }),
        _ => {
            return (
                StatusCode::NOT_FOUND,
                axum::Json(json!({ "message": "Not Found" })),
            )
                .into_response();
        }
    };
    axum::Json(body).into_response()
}
