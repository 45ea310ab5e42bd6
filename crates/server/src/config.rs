//! Command-line and environment configuration.

use clap::{Parser, ValueEnum};
use jgrants_core::API_BASE_URL;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "jgrants-server",
    version,
    about = "jGrants subsidy search as a REST/OpenAPI API and as MCP tools"
)]
pub struct Cli {
    /// Interface to bind.
    #[arg(long, env = "JGRANTS_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8001)]
    pub port: u16,

    /// Public URL assigned by Render; advertised in the OpenAPI document.
    #[arg(long, env = "RENDER_EXTERNAL_URL")]
    pub render_external_url: Option<String>,

    /// Public URL (e.g. an ngrok tunnel); used when `RENDER_EXTERNAL_URL` is unset.
    #[arg(long, env = "SERVER_URL")]
    pub server_url: Option<String>,

    /// Base URL of the upstream jGrants API.
    #[arg(long, env = "JGRANTS_API_BASE_URL", default_value = API_BASE_URL)]
    pub api_base_url: String,

    /// Which front end(s) to serve.
    #[arg(long, env = "JGRANTS_SURFACE", value_enum, default_value_t = Surface::All)]
    pub surface: Surface,

    /// Log filter (`tracing_subscriber::EnvFilter` syntax).
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "JGRANTS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn public_server(&self) -> PublicServer {
        PublicServer::resolve(
            self.render_external_url.as_deref(),
            self.server_url.as_deref(),
            self.port,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Surface {
    /// REST routes and `/mcp`.
    All,
    /// REST routes and `/openapi.json` only.
    Rest,
    /// `/mcp` only (plus `/ping`).
    Mcp,
}

impl Surface {
    #[must_use]
    pub fn rest(self) -> bool {
        matches!(self, Self::All | Self::Rest)
    }

    #[must_use]
    pub fn mcp(self) -> bool {
        matches!(self, Self::All | Self::Mcp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// The `servers` entry advertised in the OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicServer {
    pub url: String,
    pub description: &'static str,
}

impl PublicServer {
    /// `RENDER_EXTERNAL_URL` wins over `SERVER_URL`, which wins over localhost. Blank values
    /// count as unset.
    #[must_use]
    pub fn resolve(render_external_url: Option<&str>, server_url: Option<&str>, port: u16) -> Self {
        let non_blank = |v: Option<&str>| {
            v.map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
        };

        if let Some(url) = non_blank(render_external_url) {
            Self {
                url,
                description: "Production",
            }
        } else if let Some(url) = non_blank(server_url) {
            Self {
                url,
                description: "Development (ngrok)",
            }
        } else {
            Self {
                url: format!("http://localhost:{port}"),
                description: "Local development",
            }
        }
    }
}
