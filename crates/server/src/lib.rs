//! jGrants subsidy search served as a REST/OpenAPI API (GPT Actions) and as MCP tools.
//!
//! Both surfaces share one [`jgrants_core::JgrantsClient`], so validation and response shaping
//! behave identically whichever way a caller arrives.

pub mod app;
pub mod config;
pub mod error;
pub mod mcp;
pub mod openapi;
pub mod rest;

/// Message returned by the attachment endpoint on both surfaces.
pub const FILE_CONTENT_NOT_IMPLEMENTED: &str = "get_file_content is not implemented yet";
