//! MCP tool surface.
//!
//! Exposes the same operations as the REST surface as named tools over rmcp's streamable HTTP
//! transport. Tool failures never become protocol errors: they come back as
//! `{"error": "<message>"}` with `isError: true` so the calling agent can read and react.

pub mod guidance;

use jgrants_core::{JgrantsClient, OverviewFormat, SearchParams};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    Annotated, CallToolResult, Content, GetPromptRequestParams, GetPromptResult, Implementation,
    ListPromptsResult, ListResourcesResult, PaginatedRequestParams, Prompt, PromptMessage,
    PromptMessageRole, RawResource, ReadResourceRequestParams, ReadResourceResult,
    ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, schemars, tool, tool_handler, tool_router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Arguments for `search_subsidies`.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchSubsidiesArgs {
    /// Search keyword (2 to 255 characters).
    #[serde(default)]
    pub keyword: Option<String>,
    /// Purpose of use.
    #[serde(default)]
    pub use_purpose: Option<String>,
    /// Industry.
    #[serde(default)]
    pub industry: Option<String>,
    /// Employee-count bucket.
    #[serde(default)]
    pub target_number_of_employees: Option<String>,
    /// Target region.
    #[serde(default)]
    pub target_area_search: Option<String>,
    /// Sort field: created_date, acceptance_start_datetime or acceptance_end_datetime (default).
    #[serde(default)]
    pub sort: Option<String>,
    /// Sort order: ASC (default) or DESC.
    #[serde(default)]
    pub order: Option<String>,
    /// 1 (default): only subsidies accepting applications now; 0: all.
    ///
    /// Kept loose so that `"1"` or `"yes"` reach the validator instead of failing to decode.
    #[serde(default)]
    pub acceptance: Option<Value>,
}

impl From<SearchSubsidiesArgs> for SearchParams {
    fn from(a: SearchSubsidiesArgs) -> Self {
        Self {
            keyword: a.keyword,
            use_purpose: a.use_purpose,
            industry: a.industry,
            target_number_of_employees: a.target_number_of_employees,
            target_area_search: a.target_area_search,
            sort: a.sort,
            order: a.order,
            acceptance: a.acceptance.and_then(acceptance_text),
        }
    }
}

/// Render a loosely typed `acceptance` argument the way it would appear in a query string.
fn acceptance_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            #[allow(clippy::cast_possible_truncation)]
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SubsidyDetailArgs {
    /// Subsidy id as returned by `search_subsidies`.
    #[serde(default)]
    pub subsidy_id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OverviewArgs {
    /// json (default) or csv.
    #[serde(default)]
    pub output_format: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileContentArgs {
    pub subsidy_id: String,
    pub filename: String,
    /// markdown (default) or base64.
    #[serde(default)]
    pub return_format: Option<String>,
}

/// MCP server backed by the shared jGrants client.
///
/// One instance is created per MCP session; all instances share the same client.
#[derive(Clone)]
pub struct JgrantsMcpServer {
    client: JgrantsClient,
    tool_router: ToolRouter<JgrantsMcpServer>,
}

#[tool_router]
impl JgrantsMcpServer {
    #[must_use]
    pub fn new(client: JgrantsClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Search jGrants subsidies by keyword. Optional filters: use_purpose, industry, \
        target_number_of_employees, target_area_search. sort is one of created_date / \
        acceptance_start_datetime / acceptance_end_datetime, order is ASC or DESC, acceptance is \
        1 (open now, default) or 0 (all)."
    )]
    async fn search_subsidies(
        &self,
        Parameters(args): Parameters<SearchSubsidiesArgs>,
    ) -> Result<CallToolResult, McpError> {
        debug!(keyword = ?args.keyword, "Tool: search_subsidies");
        let query = match SearchParams::from(args).validate() {
            Ok(q) => q,
            Err(e) => return Ok(error_result(e.to_string())),
        };

        Ok(match self.client.search(&query).await {
            Ok(result) => json_result(result),
            Err(e) => {
                error!(error = ?e, keyword = %query.keyword(), "search failed");
                error_result(format!("search failed: {e}"))
            }
        })
    }

    #[tool(description = "Get the full record of one subsidy by the id returned from search_subsidies.")]
    async fn get_subsidy_detail(
        &self,
        Parameters(args): Parameters<SubsidyDetailArgs>,
    ) -> Result<CallToolResult, McpError> {
        debug!(subsidy_id = ?args.subsidy_id, "Tool: get_subsidy_detail");
        let subsidy_id = args.subsidy_id.as_deref().unwrap_or_default().trim();
        if subsidy_id.is_empty() {
            return Ok(error_result("subsidy_id must be a non-empty string"));
        }

        Ok(match self.client.subsidy_detail(subsidy_id).await {
            Ok(record) => json_result(record),
            Err(e) if e.is_not_found() => {
                error_result(format!("subsidy '{subsidy_id}' not found"))
            }
            Err(e) => {
                error!(error = ?e, subsidy_id = %subsidy_id, "detail lookup failed");
                error_result(e.to_string())
            }
        })
    }

    #[tool(
        description = "Statistics over subsidies open now: counts by application deadline and by \
        maximum amount. output_format is json (default) or csv."
    )]
    async fn get_subsidy_overview(
        &self,
        Parameters(args): Parameters<OverviewArgs>,
    ) -> Result<CallToolResult, McpError> {
        debug!(output_format = ?args.output_format, "Tool: get_subsidy_overview");
        let format: OverviewFormat = match args.output_format.as_deref().unwrap_or("json").parse()
        {
            Ok(f) => f,
            Err(e) => return Ok(error_result(e.to_string())),
        };

        Ok(match self.client.overview(format).await {
            Ok(overview) => match serde_json::to_value(overview) {
                Ok(v) => json_result(v),
                Err(e) => error_result(format!("overview serialization failed: {e}")),
            },
            Err(e) => {
                error!(error = ?e, "overview failed");
                error_result(format!("overview failed: {e}"))
            }
        })
    }

    #[tool(description = "Convert a subsidy attachment to Markdown. Not implemented yet.")]
    async fn get_file_content(
        &self,
        Parameters(args): Parameters<FileContentArgs>,
    ) -> Result<CallToolResult, McpError> {
        debug!(
            subsidy_id = %args.subsidy_id,
            filename = %args.filename,
            return_format = ?args.return_format,
            "Tool: get_file_content"
        );
        Ok(error_result(crate::FILE_CONTENT_NOT_IMPLEMENTED))
    }

    #[tool(
        name = "ping",
        description = "Connectivity check. Always returns {\"status\": \"ok\", \"message\": \"pong\"}."
    )]
    async fn ping_tool(&self) -> Result<CallToolResult, McpError> {
        Ok(json_result(json!({ "status": "ok", "message": "pong" })))
    }
}

#[tool_handler]
impl ServerHandler for JgrantsMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "jGrants subsidy search. Use search_subsidies to find subsidies, then \
                 get_subsidy_detail for one of them. Read jgrants://guidelines for parameter \
                 details."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut raw = RawResource::new(guidance::GUIDELINES_URI, guidance::GUIDELINES_NAME);
        raw.description = Some("How to use the jGrants tools".to_string());
        raw.mime_type = Some("text/markdown".to_string());

        Ok(ListResourcesResult {
            resources: vec![Annotated::new(raw, None)],
            ..Default::default()
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        debug!(uri = %request.uri, "Reading resource");
        if request.uri != guidance::GUIDELINES_URI {
            return Err(McpError::resource_not_found(
                format!("Unknown resource: {}", request.uri),
                None,
            ));
        }
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(guidance::GUIDELINES, request.uri)],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult {
            prompts: vec![Prompt::new(
                guidance::SEARCH_GUIDE_PROMPT,
                Some(guidance::SEARCH_GUIDE_DESCRIPTION),
                None,
            )],
            ..Default::default()
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        if request.name != guidance::SEARCH_GUIDE_PROMPT {
            return Err(McpError::invalid_params(
                format!("Unknown prompt: {}", request.name),
                None,
            ));
        }
        Ok(GetPromptResult {
            description: Some(guidance::SEARCH_GUIDE_DESCRIPTION.to_string()),
            messages: vec![PromptMessage::new_text(
                PromptMessageRole::User,
                guidance::SEARCH_GUIDE,
            )],
        })
    }
}

/// Build the streamable HTTP service to mount at `/mcp`.
pub fn service(
    client: JgrantsClient,
    cancel: &CancellationToken,
) -> StreamableHttpService<JgrantsMcpServer, LocalSessionManager> {
    StreamableHttpService::new(
        move || Ok(JgrantsMcpServer::new(client.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: cancel.child_token(),
            ..Default::default()
        },
    )
}

/// Successful tool output as both text and `structuredContent`.
///
/// Some MCP clients only render `content`, so the JSON is duplicated there.
fn json_result(value: Value) -> CallToolResult {
    let text = serde_json::to_string(&value).unwrap_or_else(|_| value.to_string());
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: Some(value),
        is_error: Some(false),
        meta: None,
    }
}

fn error_result(message: impl Into<String>) -> CallToolResult {
    let body = json!({ "error": message.into() });
    CallToolResult {
        content: vec![Content::text(body.to_string())],
        structured_content: Some(body),
        is_error: Some(true),
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jgrants_test_support::{KNOWN_SUBSIDY_ID, TestServer, spawn_fake_jgrants};

    async fn server() -> (TestServer, JgrantsMcpServer) {
        let upstream = spawn_fake_jgrants().await.expect("fake upstream");
        let client = JgrantsClient::new(&upstream.base_url).expect("client");
        (upstream, JgrantsMcpServer::new(client))
    }

    fn search_args(keyword: &str) -> SearchSubsidiesArgs {
        SearchSubsidiesArgs {
            keyword: Some(keyword.to_string()),
            use_purpose: None,
            industry: None,
            target_number_of_employees: None,
            target_area_search: None,
            sort: None,
            order: None,
            acceptance: None,
        }
    }

    fn body(result: &CallToolResult) -> Value {
        result.structured_content.clone().unwrap_or(Value::Null)
    }

    #[test]
    fn every_tool_is_routed() {
        let mut names: Vec<String> = JgrantsMcpServer::tool_router()
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "get_file_content",
                "get_subsidy_detail",
                "get_subsidy_overview",
                "ping",
                "search_subsidies",
            ]
        );
    }

    #[tokio::test]
    async fn search_tool_validates_without_protocol_errors() {
        let (_upstream, srv) = server().await;

        let r = srv
            .search_subsidies(Parameters(search_args("x")))
            .await
            .expect("tool result");
        assert_eq!(r.is_error, Some(true));
        assert!(body(&r)["error"].as_str().unwrap_or_default().starts_with("keyword"));

        let mut args = search_args("IT");
        args.acceptance = Some(json!(5));
        let r = srv.search_subsidies(Parameters(args)).await.expect("tool result");
        assert_eq!(body(&r), json!({"error": "acceptance must be 0 or 1"}));

        let mut args = search_args("IT");
        args.sort = Some("popularity".to_string());
        let r = srv.search_subsidies(Parameters(args)).await.expect("tool result");
        assert_eq!(r.is_error, Some(true));

        let mut args = search_args("IT");
        args.keyword = None;
        let r = srv.search_subsidies(Parameters(args)).await.expect("tool result");
        assert_eq!(r.is_error, Some(true));
        assert!(body(&r)["error"].as_str().unwrap_or_default().starts_with("keyword"));
    }

    #[test]
    fn loose_acceptance_values_become_query_text() {
        assert_eq!(acceptance_text(json!(0)), Some("0".to_string()));
        assert_eq!(acceptance_text(json!("1")), Some("1".to_string()));
        assert_eq!(acceptance_text(json!(1.0)), Some("1".to_string()));
        assert_eq!(acceptance_text(json!(0.5)), Some("0.5".to_string()));
        assert_eq!(acceptance_text(json!(true)), Some("true".to_string()));
        assert_eq!(acceptance_text(Value::Null), None);
    }

    #[test]
    fn missing_or_mistyped_arguments_still_decode() {
        let args: SearchSubsidiesArgs =
            serde_json::from_value(json!({ "acceptance": "yes" })).expect("decodes");
        assert!(args.keyword.is_none());
        let err = SearchParams::from(args).validate().expect_err("keyword is required");
        assert!(err.to_string().starts_with("keyword"));

        let args: SearchSubsidiesArgs =
            serde_json::from_value(json!({ "keyword": "IT", "acceptance": "yes" }))
                .expect("decodes");
        let err = SearchParams::from(args).validate().expect_err("non-numeric acceptance");
        assert_eq!(err.to_string(), "acceptance must be 0 or 1");

        let args: SubsidyDetailArgs = serde_json::from_value(json!({})).expect("decodes");
        assert!(args.subsidy_id.is_none());
    }

    #[tokio::test]
    async fn search_tool_returns_shaped_results() {
        let (_upstream, srv) = server().await;
        let mut args = search_args("省エネ");
        args.order = Some("desc".to_string());
        let r = srv.search_subsidies(Parameters(args)).await.expect("tool result");
        assert_eq!(r.is_error, Some(false));
        let b = body(&r);
        assert_eq!(b["total_count"], json!(2));
        assert_eq!(b["subsidies"][0]["query"]["order"], json!("DESC"));
    }

    #[tokio::test]
    async fn detail_tool_unwraps_and_reports_missing() {
        let (_upstream, srv) = server().await;
        let r = srv
            .get_subsidy_detail(Parameters(SubsidyDetailArgs {
                subsidy_id: Some(KNOWN_SUBSIDY_ID.to_string()),
            }))
            .await
            .expect("tool result");
        assert_eq!(body(&r)["id"], json!(KNOWN_SUBSIDY_ID));

        let r = srv
            .get_subsidy_detail(Parameters(SubsidyDetailArgs {
                subsidy_id: Some("missing".to_string()),
            }))
            .await
            .expect("tool result");
        assert_eq!(r.is_error, Some(true));
        assert_eq!(body(&r), json!({"error": "subsidy 'missing' not found"}));
    }

    #[tokio::test]
    async fn overview_file_content_and_ping() {
        let (_upstream, srv) = server().await;
        let r = srv
            .get_subsidy_overview(Parameters(OverviewArgs {
                output_format: Some("csv".to_string()),
            }))
            .await
            .expect("tool result");
        assert_eq!(body(&r)["output_format"], json!("csv"));

        let r = srv
            .get_subsidy_overview(Parameters(OverviewArgs {
                output_format: Some("pdf".to_string()),
            }))
            .await
            .expect("tool result");
        assert_eq!(r.is_error, Some(true));

        let r = srv
            .get_file_content(Parameters(FileContentArgs {
                subsidy_id: KNOWN_SUBSIDY_ID.to_string(),
                filename: "a.pdf".to_string(),
                return_format: None,
            }))
            .await
            .expect("tool result");
        assert_eq!(r.is_error, Some(true));

        let r = srv.ping_tool().await.expect("tool result");
        assert_eq!(body(&r), json!({"status": "ok", "message": "pong"}));
    }
}
