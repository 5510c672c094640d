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

//! # Unified MCP Server Entry Point
//!
//! Supports stdio and streamable HTTP transports via subcommand.
//! Credentials are read from the environment (or a `.env` file) at startup.

use anyhow::{Context, Error, Result};
use clap::{Parser, Subcommand};
use rmcp::handler::server::{ServerHandler, tool::ToolRouter, wrapper::Parameters};
use rmcp::model::AnnotateAble;
use rmcp::service::serve_server;
use rmcp::tool;
use rmcp::tool_router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_flights_agent::tools::{
    CreateOrderInput, FlightDetailsInput, ListOffersInput, MultiCityInput, OfferIdInput,
    OfferRequestInput, OrderIdInput, PayOrderInput, SearchFlightsInput, api_error_message,
};
use wayfare_flights_agent::{AIRPORTS_RESOURCE_URI, Config, FlightToolbox, get_airports};

#[derive(Parser, Debug)]
#[command(name = "wayfare-flights-mcp")]
#[command(
    author,
    version,
    about = "MCP server for flight search (SerpAPI) and booking (Duffel)"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run MCP server over stdio (for Claude Desktop, etc.)
    Stdio,

    /// Run MCP server over HTTP
    Http {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "8000")]
        port: u16,
    },
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

#[derive(Clone)]
pub struct FlightsMcpServer {
    toolbox: Arc<FlightToolbox>,
    tool_router: ToolRouter<Self>,
}

impl FlightsMcpServer {
    pub fn new(toolbox: Arc<FlightToolbox>) -> Self {
        Self {
            toolbox,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl FlightsMcpServer {
    #[tool(
        name = "search_flights",
        description = "Search one-way or round-trip flights via Google Flights (SerpAPI). Parameters: departure_id (airport code), arrival_id (airport code), outbound_date (YYYY-MM-DD), return_date (YYYY-MM-DD, optional; makes it a round trip), travel_class (economy/premium_economy/business/first), adults (1+). Returns the raw SerpAPI response."
    )]
    async fn search_flights(&self, params: Parameters<SearchFlightsInput>) -> Result<String, String> {
        let result = self
            .toolbox
            .search_flights(&params.0)
            .await
            .map_err(|e| api_error_message(&e))?;
        to_json(&result)
    }

    #[tool(
        name = "get_flight_details",
        description = "Get details for a specific flight from a previous search. Parameters: flight_id."
    )]
    async fn get_flight_details(&self, params: Parameters<FlightDetailsInput>) -> Result<String, String> {
        let result = self
            .toolbox
            .get_flight_details(&params.0)
            .await
            .map_err(|e| api_error_message(&e))?;
        to_json(&result)
    }

    #[tool(
        name = "search_multi_city",
        description = "Search a multi-city itinerary in one request. Parameters: legs (at least 2, each {from, to, date}), travel_class, adults. Upstream failures are reported with search_completed=false."
    )]
    async fn search_multi_city(&self, params: Parameters<MultiCityInput>) -> Result<String, String> {
        let reply = self
            .toolbox
            .search_multi_city(&params.0)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&reply)
    }

    #[tool(
        name = "duffel_create_offer_request",
        description = "Create a Duffel offer request and return its offers. Parameters: origin, destination, departure_date (YYYY-MM-DD), return_date (optional), cabin_class, adults, children, infants, return_offers. Each returned offer has the id used for booking."
    )]
    async fn duffel_create_offer_request(&self, params: Parameters<OfferRequestInput>) -> Result<String, String> {
        to_json(&self.toolbox.duffel_create_offer_request(&params.0).await)
    }

    #[tool(
        name = "duffel_list_offers",
        description = "List offers of a Duffel offer request. Parameters: offer_request_id, sort (total_amount/total_duration, optional), limit (default 50)."
    )]
    async fn duffel_list_offers(&self, params: Parameters<ListOffersInput>) -> Result<String, String> {
        to_json(&self.toolbox.duffel_list_offers(&params.0).await)
    }

    #[tool(
        name = "booking_validate_or_price_offer",
        description = "Fetch the latest price and availability of a Duffel offer before booking. Parameters: offer_id."
    )]
    async fn booking_validate_or_price_offer(&self, params: Parameters<OfferIdInput>) -> Result<String, String> {
        to_json(&self.toolbox.booking_validate_or_price_offer(&params.0).await)
    }

    #[tool(
        name = "booking_list_services_and_seatmaps",
        description = "List ancillary services (bags, etc.) and seat maps for a Duffel offer. Parameters: offer_id."
    )]
    async fn booking_list_services_and_seatmaps(&self, params: Parameters<OfferIdInput>) -> Result<String, String> {
        to_json(&self.toolbox.booking_list_services_and_seatmaps(&params.0).await)
    }

    #[tool(
        name = "booking_create_order",
        description = "Create a Duffel order. Parameters: offer_id, passengers (ids from the offer plus traveller details), payments (required for instant orders), services (optional), type (instant/hold), metadata, contact."
    )]
    async fn booking_create_order(&self, params: Parameters<CreateOrderInput>) -> Result<String, String> {
        to_json(&self.toolbox.booking_create_order(&params.0).await)
    }

    #[tool(
        name = "booking_pay_for_order",
        description = "Pay for a Duffel hold order. Parameters: order_id, amount, currency (both must match the order total), payment_type (default balance)."
    )]
    async fn booking_pay_for_order(&self, params: Parameters<PayOrderInput>) -> Result<String, String> {
        to_json(&self.toolbox.booking_pay_for_order(&params.0).await)
    }

    #[tool(
        name = "booking_get_order_status",
        description = "Get a Duffel order with its payment status and documents (e.g. e-tickets). Parameters: order_id."
    )]
    async fn booking_get_order_status(&self, params: Parameters<OrderIdInput>) -> Result<String, String> {
        to_json(&self.toolbox.booking_get_order_status(&params.0).await)
    }
}

fn airports_resource() -> rmcp::model::Resource {
    let mut raw = rmcp::model::RawResource::new(AIRPORTS_RESOURCE_URI, "airports");
    raw.description = Some("Airport codes and names for common destinations".to_string());
    raw.mime_type = Some("application/json".to_string());
    raw.no_annotation()
}

impl ServerHandler for FlightsMcpServer {
    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::ListToolsResult, rmcp::ErrorData>> + Send + '_
    {
        Box::pin(async move {
            let tools = self.tool_router.list_all();
            tracing::debug!("Returning {} tools", tools.len());
            Ok(rmcp::model::ListToolsResult::with_all_items(tools))
        })
    }

    fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::CallToolResult, rmcp::ErrorData>> + Send + '_
    {
        let router = self.tool_router.clone();
        let self_clone = self.clone();
        Box::pin(async move {
            tracing::info!("Tool call: {}", request.name);
            let context =
                rmcp::handler::server::tool::ToolCallContext::new(&self_clone, request, context);
            router.call(context).await
        })
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::ListResourcesResult, rmcp::ErrorData>> + Send + '_
    {
        Box::pin(async move {
            Ok(rmcp::model::ListResourcesResult::with_all_items(vec![
                airports_resource(),
            ]))
        })
    }

    fn read_resource(
        &self,
        request: rmcp::model::ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::ReadResourceResult, rmcp::ErrorData>> + Send + '_
    {
        Box::pin(async move {
            if request.uri != AIRPORTS_RESOURCE_URI {
                return Err(rmcp::ErrorData::resource_not_found(
                    format!("Unknown resource: {}", request.uri),
                    None,
                ));
            }
            let text = serde_json::to_string(get_airports())
                .map_err(|e| rmcp::ErrorData::internal_error(e.to_string(), None))?;
            Ok(rmcp::model::ReadResourceResult {
                contents: vec![rmcp::model::ResourceContents::text(text, AIRPORTS_RESOURCE_URI)],
            })
        })
    }

    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2025_03_26,
            capabilities: rmcp::model::ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                resources: Some(rmcp::model::ResourcesCapability::default()),
                ..Default::default()
            },
            server_info: rmcp::model::Implementation::from_build_env(),
            instructions: Some(
                "Search flights with SerpAPI Google Flights, then book with Duffel: \
                 create an offer request, price the offer, create the order, pay for holds."
                    .to_string(),
            ),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::debug!("Parsing arguments...");
    let args = Args::parse();
    tracing::debug!("Parsed args: {:?}", args);

    if dotenv::dotenv().is_ok() {
        tracing::debug!("Loaded .env file");
    }
    let config = Config::from_env().context("Missing credentials")?;
    tracing::debug!("Config: {:?}", config);

    let toolbox = Arc::new(FlightToolbox::new(&config).context("Failed to create API clients")?);
    let server = FlightsMcpServer::new(toolbox);

    match args.command {
        Command::Stdio => {
            tracing::info!("Starting MCP server over stdio...");
            let (stdin, stdout) = rmcp::transport::io::stdio();
            let running = serve_server(server, (stdin, stdout))
                .await
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
            let reason = running.waiting().await.context("Server task failed")?;
            tracing::debug!("Server stopped: {:?}", reason);
        }
        Command::Http { host, port } => {
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .context("Invalid host:port")?;
            tracing::info!("Starting MCP server over HTTP on {}", addr);
            let session_manager = Arc::new(LocalSessionManager::default());
            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..Default::default()
            };
            let service =
                StreamableHttpService::new(move || Ok(server.clone()), session_manager, config);
            let app = axum::Router::new().nest_service("/mcp", service);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;
            tracing::debug!("Listening on {}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server error")?;
        }
    }

    Ok(())
}
