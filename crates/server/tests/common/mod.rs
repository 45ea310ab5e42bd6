use anyhow::Context as _;
use std::process::Command;
use std::time::Duration;

pub use jgrants_test_support::{KillOnDrop, TestServer, spawn_fake_jgrants};

/// A running `jgrants-server` binary wired to a fake upstream.
pub struct Running {
    pub base_url: String,
    _server: KillOnDrop,
    _upstream: TestServer,
}

/// Spawn the binary with `extra_args` and wait until `/ping` answers.
pub async fn start_server(extra_args: &[&str]) -> anyhow::Result<Running> {
    let upstream = spawn_fake_jgrants().await?;
    let port = jgrants_test_support::pick_unused_port()?;

    let child = Command::new(env!("CARGO_BIN_EXE_jgrants-server"))
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg("--api-base-url")
        .arg(&upstream.base_url)
        .arg("--log-level")
        .arg("info")
        .args(extra_args)
        .env_remove("RENDER_EXTERNAL_URL")
        .env_remove("SERVER_URL")
        .spawn()
        .context("spawn jgrants-server")?;
    let server = KillOnDrop(child);

    let base_url = format!("http://127.0.0.1:{port}");
    jgrants_test_support::wait_http_ok(&format!("{base_url}/ping"), Duration::from_secs(20))
        .await?;

    Ok(Running {
        base_url,
        _server: server,
        _upstream: upstream,
    })
}
