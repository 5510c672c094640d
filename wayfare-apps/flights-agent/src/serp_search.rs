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

//! # SerpAPI Google Flights Client
//!
//! Effectful (network) operations against SerpAPI's `google_flights` engine.

use serde_json::Value;
use std::time::{Duration, Instant};
use wayfare_http_json::{Endpoint, JsonHttp, OK, Query};

use crate::config::SerpApiConfig;
use crate::error::Result;
use crate::serp_query_builder::{MultiCityParams, SearchParams, flight_details_query};

pub const SEARCH_PATH: &str = "/search";
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct SerpFlightsClient {
    http: JsonHttp,
    config: SerpApiConfig,
}

impl SerpFlightsClient {
    pub fn new(http: JsonHttp, config: SerpApiConfig) -> Self {
        Self { http, config }
    }

    pub fn endpoint(&self, query: &Query) -> Endpoint {
        Endpoint::new(&self.config.base_url, SEARCH_PATH, query)
    }

    async fn fetch(&self, query: Query) -> Result<Value> {
        let endpoint = self.endpoint(&query);
        let start = Instant::now();
        tracing::info!("🔗 SerpAPI request: {}", endpoint.display());
        let result = self.http.get(&endpoint, &[], OK, SEARCH_TIMEOUT).await;
        tracing::info!("SerpAPI answered in {:?}", start.elapsed());
        Ok(result?)
    }

    /// One-way or round-trip search; the response JSON is returned untouched.
    pub async fn search_flights(&self, params: &SearchParams) -> Result<Value> {
        params.validate()?;
        tracing::debug!(
            "Searching {} -> {} on {} ({:?})",
            params.departure_id,
            params.arrival_id,
            params.outbound_date,
            params.trip_type()
        );
        self.fetch(params.to_query(&self.config.api_key)).await
    }

    pub async fn get_flight_details(&self, flight_id: &str) -> Result<Value> {
        let query = flight_details_query(flight_id, &self.config.api_key)?;
        self.fetch(query).await
    }

    /// Multi-city search; all legs travel in one `multi_city_json` parameter.
    pub async fn search_multi_city(&self, params: &MultiCityParams) -> Result<Value> {
        params.validate()?;
        tracing::debug!("Searching multi-city itinerary with {} legs", params.legs.len());
        self.fetch(params.to_query(&self.config.api_key)).await
    }
}
