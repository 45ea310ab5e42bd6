//! OpenAPI document for the REST surface.
//!
//! GPT Actions import this document from `/openapi.json`, so every operation carries an
//! `operationId` and the `servers` entry points at the public URL.

use crate::config::PublicServer;
use jgrants_core::query::{KEYWORD_MAX_CHARS, KEYWORD_MIN_CHARS};
use serde_json::{Value, json};

pub const SERVICE_TITLE: &str = "jGrants Subsidy Search API";

/// Build the OpenAPI 3.0 document advertised at `/openapi.json`.
#[must_use]
pub fn document(server: &PublicServer) -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": SERVICE_TITLE,
            "description": "REST wrapper around the public API of jGrants, the Digital Agency's \
                subsidy e-application system. Usable from GPT Actions.",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "servers": [{ "url": server.url, "description": server.description }],
        "paths": {
            "/": { "get": health_operation() },
            "/ping": { "get": ping_operation() },
            "/subsidies/search": { "get": search_operation() },
            "/subsidies/overview": { "get": overview_operation() },
            "/subsidies/{subsidy_id}": { "get": detail_operation() },
            "/subsidies/{subsidy_id}/files/{filename}": { "get": file_content_operation() },
        },
        "components": { "schemas": component_schemas() },
    })
}

fn health_operation() -> Value {
    json!({
        "tags": ["Health"],
        "operationId": "healthCheck",
        "summary": "Health check",
        "responses": { "200": json_response("Service status", json!({"type": "object"})) },
    })
}

fn ping_operation() -> Value {
    json!({
        "tags": ["Health"],
        "operationId": "ping",
        "summary": "Connectivity check",
        "responses": {
            "200": json_response("Always {\"status\":\"ok\",\"message\":\"pong\"}", json!({"type": "object"})),
        },
    })
}

fn search_operation() -> Value {
    let keyword = json!({
        "name": "keyword",
        "in": "query",
        "required": true,
        "description": "Search keyword",
        "schema": {
            "type": "string",
            "minLength": KEYWORD_MIN_CHARS,
            "maxLength": KEYWORD_MAX_CHARS,
        },
    });
    let sort = enum_query(
        "sort",
        "Sort field",
        json!({
            "type": "string",
            "enum": ["created_date", "acceptance_start_datetime", "acceptance_end_datetime"],
            "default": "acceptance_end_datetime",
        }),
    );
    let order = enum_query(
        "order",
        "Sort order",
        json!({ "type": "string", "enum": ["ASC", "DESC"], "default": "ASC" }),
    );
    let acceptance = enum_query(
        "acceptance",
        "0: all subsidies, 1: only those accepting applications",
        json!({ "type": "integer", "enum": [0, 1], "default": 1 }),
    );

    json!({
        "tags": ["Subsidy search"],
        "operationId": "searchSubsidies",
        "summary": "Search subsidies",
        "description": "Search subsidies by keyword, optionally narrowed by purpose, industry, \
            region and number of employees.",
        "parameters": [
            keyword,
            optional_query("use_purpose", "Purpose of use"),
            optional_query("industry", "Industry"),
            optional_query("target_number_of_employees", "Employee-count bucket"),
            optional_query("target_area_search", "Target region"),
            sort,
            order,
            acceptance,
        ],
        "responses": {
            "200": json_response("Matching subsidies", json!({"$ref": "#/components/schemas/SearchResult"})),
            "400": error_response("Invalid parameters"),
            "500": error_response("Upstream failure"),
        },
    })
}

fn overview_operation() -> Value {
    let output_format = enum_query(
        "output_format",
        "json, or csv to also get a CSV rendering",
        json!({ "type": "string", "enum": ["json", "csv"], "default": "json" }),
    );
    json!({
        "tags": ["Statistics"],
        "operationId": "getSubsidyOverview",
        "summary": "Subsidy statistics",
        "description": "Counts of currently open subsidies by deadline and by maximum amount.",
        "parameters": [output_format],
        "responses": {
            "200": json_response("Aggregated statistics", json!({"type": "object"})),
            "400": error_response("Invalid parameters"),
            "500": error_response("Upstream failure"),
        },
    })
}

fn detail_operation() -> Value {
    json!({
        "tags": ["Subsidy detail"],
        "operationId": "getSubsidyDetail",
        "summary": "Subsidy detail",
        "parameters": [path_param("subsidy_id", "Subsidy id (18 characters or fewer)")],
        "responses": {
            "200": json_response("The subsidy record", json!({"type": "object"})),
            "400": error_response("Invalid id"),
            "404": error_response("Unknown subsidy"),
            "500": error_response("Upstream failure"),
        },
    })
}

fn file_content_operation() -> Value {
    let return_format = enum_query(
        "return_format",
        "markdown or base64",
        json!({ "type": "string", "enum": ["markdown", "base64"], "default": "markdown" }),
    );
    json!({
        "tags": ["File content"],
        "operationId": "getFileContent",
        "summary": "Attachment content (not implemented yet)",
        "parameters": [
            path_param("subsidy_id", "Subsidy id"),
            path_param("filename", "Attachment file name"),
            return_format,
        ],
        "responses": { "501": error_response("Not implemented") },
    })
}

fn component_schemas() -> Value {
    json!({
        "ErrorDetail": {
            "type": "object",
            "required": ["detail"],
            "properties": { "detail": { "type": "string" } },
        },
        "SearchResult": {
            "type": "object",
            "properties": {
                "total_count": { "type": "integer" },
                "subsidies": { "type": "array", "items": { "type": "object" } },
                "search_conditions": { "type": "object" },
            },
        },
    })
}

fn path_param(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": { "type": "string" },
    })
}

fn enum_query(name: &str, description: &str, schema: Value) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": schema,
    })
}

fn optional_query(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": { "type": "string" },
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } },
    })
}

fn error_response(description: &str) -> Value {
    json_response(description, json!({"$ref": "#/components/schemas/ErrorDetail"}))
}
