//!  Wayfare Flights Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! MCP server integration tests using subprocess with stdio transport.
//! Upstream providers are replaced by a local mock server.

#![cfg(all(test, feature = "mcp"))]

mod mcp_helpers;

use anyhow::{Context, Result};
use mcp_helpers::{McpSession, TIMEOUT, is_tool_error, server_command, tool_text};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Once;
use tracing_subscriber::EnvFilter;
use wayfare_flights_agent::{AIRPORTS_RESOURCE_URI, get_airports};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::new("debug"))
            .init();
    });
}

fn load_schema_from_file(name: &str) -> Result<Value> {
    let manifest_dir = PathBuf::from(
        std::env::var("CARGO_MANIFEST_DIR")
            .map_err(|e| anyhow::anyhow!("CARGO_MANIFEST_DIR not set: {}", e))?,
    );
    let schema_path = manifest_dir.join("tests").join("schemas").join(name);
    let content = std::fs::read_to_string(&schema_path)
        .context(format!("Failed to read schema file: {:?}", schema_path))?;
    serde_json::from_str(&content)
        .context(format!("Failed to parse schema file: {:?}", schema_path))
}

fn validate_json_schema(instance: &Value, schema_name: &str) -> Result<()> {
    let schema = load_schema_from_file(schema_name)?;
    let validator = jsonschema::Validator::new(&schema)
        .context(format!("Failed to create validator for {}", schema_name))?;
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{}: {}", schema_name, e))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Schema validation failed for {}:\n{}", schema_name, errors.join("\n"))
    }
}

#[tokio::test]
async fn test_mcp_help_and_version() -> Result<()> {
    init_tracing();
    let help = server_command(&[]).arg("--help").output().await?;
    assert!(help.status.success());
    let help = String::from_utf8_lossy(&help.stdout);
    assert!(help.contains("stdio"), "{}", help);
    assert!(help.contains("http"), "{}", help);

    let version = server_command(&[]).arg("--version").output().await?;
    assert!(version.status.success());
    assert!(String::from_utf8_lossy(&version.stdout).contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[tokio::test]
async fn test_mcp_fails_fast_without_credentials() -> Result<()> {
    init_tracing();
    let output = tokio::time::timeout(
        TIMEOUT,
        server_command(&[("DUFFEL_TOKEN", "duffel_test_token".to_string())])
            .arg("stdio")
            .stdin(std::process::Stdio::null())
            .output(),
    )
    .await??;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SERPAPI_API_KEY"), "{}", stderr);
    Ok(())
}

#[tokio::test]
async fn test_mcp_initialize_and_list_tools() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    let mut session = McpSession::start(&server.uri(), &server.uri()).await?;

    let response = session.request("tools/list", json!({})).await?;
    let result = &response["result"];
    validate_json_schema(result, "tools-list.json")?;

    let names: BTreeSet<&str> = result["tools"]
        .as_array()
        .context("tools is not an array")?
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    let expected: BTreeSet<&str> = [
        "search_flights",
        "get_flight_details",
        "search_multi_city",
        "duffel_create_offer_request",
        "duffel_list_offers",
        "booking_validate_or_price_offer",
        "booking_list_services_and_seatmaps",
        "booking_create_order",
        "booking_pay_for_order",
        "booking_get_order_status",
    ]
    .into_iter()
    .collect();
    assert_eq!(names, expected);

    session.shutdown().await
}

#[tokio::test]
async fn test_mcp_airports_resource() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    let mut session = McpSession::start(&server.uri(), &server.uri()).await?;

    let listed = session.request("resources/list", json!({})).await?;
    assert_eq!(listed["result"]["resources"][0]["uri"], AIRPORTS_RESOURCE_URI);

    let read = session
        .request("resources/read", json!({"uri": AIRPORTS_RESOURCE_URI}))
        .await?;
    let contents = &read["result"]["contents"][0];
    assert_eq!(contents["uri"], AIRPORTS_RESOURCE_URI);
    let airports: Vec<Value> = serde_json::from_str(contents["text"].as_str().unwrap_or("[]"))?;
    assert_eq!(airports.len(), get_airports().len());
    assert!(airports.iter().any(|a| a["id"] == "JFK" && a["city"] == "New York City"));

    let missing = session
        .request("resources/read", json!({"uri": "mcp://hotels"}))
        .await?;
    assert!(missing.get("error").is_some(), "{}", missing);

    session.shutdown().await
}

#[tokio::test]
async fn test_mcp_search_flights_end_to_end() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    let body = json!({
        "search_metadata": {"id": "abc", "status": "Success"},
        "best_flights": [{"price": 289, "flights": [{"airline": "Delta"}]}]
    });
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("departure_id", "JFK"))
        .and(query_param("type", "2"))
        .and(query_param("api_key", "serp-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = McpSession::start(&server.uri(), &server.uri()).await?;
    let result = session
        .call_tool(
            "search_flights",
            json!({"departure_id": "JFK", "arrival_id": "LAX", "outbound_date": "2025-09-01"}),
        )
        .await?;
    assert!(!is_tool_error(&result), "{}", result);
    let returned: Value = serde_json::from_str(tool_text(&result))?;
    assert_eq!(returned, body);

    session.shutdown().await
}

#[tokio::test]
async fn test_mcp_search_flights_http_error_is_tool_error() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let mut session = McpSession::start(&server.uri(), &server.uri()).await?;
    let result = session
        .call_tool(
            "search_flights",
            json!({"departure_id": "JFK", "arrival_id": "LAX", "outbound_date": "2025-09-01"}),
        )
        .await?;
    assert!(is_tool_error(&result), "{}", result);
    assert_eq!(tool_text(&result), "API Error: 401 - Invalid API key");

    session.shutdown().await
}

#[tokio::test]
async fn test_mcp_multi_city_validation_is_tool_error() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = McpSession::start(&server.uri(), &server.uri()).await?;
    let result = session
        .call_tool(
            "search_multi_city",
            json!({"legs": [{"from": "LAX", "to": "JFK", "date": "2025-09-15"}]}),
        )
        .await?;
    assert!(is_tool_error(&result), "{}", result);
    assert!(tool_text(&result).contains("at least 2 legs"), "{}", result);

    session.shutdown().await
}

#[tokio::test]
async fn test_mcp_booking_errors_are_envelopes() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/air/orders/ord_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"code": "not_found", "title": "Not found"}]
        })))
        .mount(&server)
        .await;

    let mut session = McpSession::start(&server.uri(), &server.uri()).await?;

    let result = session
        .call_tool(
            "booking_create_order",
            json!({"offer_id": "off_1", "passengers": [{"id": "pas_1"}]}),
        )
        .await?;
    assert!(!is_tool_error(&result), "{}", result);
    let envelope: Value = serde_json::from_str(tool_text(&result))?;
    validate_json_schema(&envelope, "error-envelope.json")?;
    assert_eq!(envelope["message"], "payments are required for instant purchase orders");

    let result = session
        .call_tool("booking_get_order_status", json!({"order_id": "ord_missing"}))
        .await?;
    assert!(!is_tool_error(&result), "{}", result);
    let envelope: Value = serde_json::from_str(tool_text(&result))?;
    validate_json_schema(&envelope, "error-envelope.json")?;
    assert_eq!(envelope["details"]["errors"][0]["code"], "not_found");

    session.shutdown().await
}
