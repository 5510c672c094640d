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

// Library for wayfare-flights-agent
// Flight search (SerpAPI Google Flights) and booking (Duffel) behind MCP tools

pub mod airports;
pub mod config;
mod duffel_client;
mod duffel_payloads;
mod error;
mod serp_query_builder;
mod serp_search;
pub mod tools;

pub use airports::{AIRPORTS_RESOURCE_URI, Airport, find_airport, get_airports};
pub use config::{Config, ConfigError, DuffelConfig, SerpApiConfig};
pub use error::{FlightsError, Result};

// Re-export duffel
pub use duffel_client::DuffelClient;
pub use duffel_payloads::{
    CreateOrderParams, OfferRequestParams, OrderPassenger, OrderService, OrderType,
    PayOrderParams, Payment,
};

// Re-export serpapi
pub use serp_query_builder::{FlightLeg, MultiCityParams, SearchParams, TravelClass, TripType};
pub use serp_search::SerpFlightsClient;

pub use tools::FlightToolbox;

// Shared HTTP layer, so binaries and tests need not depend on it directly
pub use wayfare_http_json::{JsonHttp, UpstreamError};
