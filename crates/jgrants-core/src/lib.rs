//! Shared jGrants request shaping.
//!
//! This crate is used by both front ends of `jgrants-server`:
//! - the REST/OpenAPI surface (GPT Actions)
//! - the MCP tool surface
//!
//! It intentionally contains **no** HTTP server code; it validates queries, calls the upstream
//! API and reshapes what comes back.

pub mod error;
pub mod overview;
pub mod query;
pub mod shaping;
pub mod upstream;

pub use error::{GrantsError, Result, UpstreamError, ValidationError};
pub use overview::{Overview, OverviewFormat};
pub use query::{SearchParams, SearchQuery};
pub use upstream::{API_BASE_URL, JgrantsClient};
