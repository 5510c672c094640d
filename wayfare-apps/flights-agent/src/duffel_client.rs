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

//! # Duffel Air API Client
//!
//! Effectful (network) operations against Duffel. Every method issues exactly
//! one request and returns the raw response JSON.

use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use wayfare_http_json::{Endpoint, JsonHttp, OK_OR_CREATED, Query};

use crate::config::DuffelConfig;
use crate::duffel_payloads::{CreateOrderParams, OfferRequestParams, PayOrderParams, list_offers_query};
use crate::error::{Result, ensure_present};

pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(45);

/// Duffel wraps every request body in a top-level `data` key.
#[derive(Serialize)]
struct DataEnvelope<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Clone)]
pub struct DuffelClient {
    http: JsonHttp,
    config: DuffelConfig,
}

impl DuffelClient {
    pub fn new(http: JsonHttp, config: DuffelConfig) -> Self {
        Self { http, config }
    }

    fn headers(&self) -> [(&'static str, String); 3] {
        [
            ("Accept", "application/json".to_string()),
            ("Duffel-Version", self.config.version.clone()),
            ("Authorization", format!("Bearer {}", self.config.token)),
        ]
    }

    async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        let endpoint = Endpoint::new(&self.config.base_url, path, query);
        let start = Instant::now();
        let result = self
            .http
            .get(&endpoint, &self.headers(), OK_OR_CREATED, READ_TIMEOUT)
            .await;
        tracing::info!("Duffel GET {} in {:?}", path, start.elapsed());
        Ok(result?)
    }

    async fn post<T: Serialize>(&self, path: &str, query: &Query, data: &T) -> Result<Value> {
        let endpoint = Endpoint::new(&self.config.base_url, path, query);
        let start = Instant::now();
        let result = self
            .http
            .post(
                &endpoint,
                &self.headers(),
                &DataEnvelope { data },
                OK_OR_CREATED,
                WRITE_TIMEOUT,
            )
            .await;
        tracing::info!("Duffel POST {} in {:?}", path, start.elapsed());
        Ok(result?)
    }

    /// POST /air/offer_requests
    pub async fn create_offer_request(&self, params: &OfferRequestParams) -> Result<Value> {
        let payload = params.payload()?;
        tracing::debug!(
            "Offer request {} -> {} ({} slices, {} passengers)",
            params.origin,
            params.destination,
            payload.slices.len(),
            payload.passengers.len()
        );
        self.post("/air/offer_requests", &params.query(), &payload).await
    }

    /// GET /air/offers
    pub async fn list_offers(&self, offer_request_id: &str, sort: Option<&str>, limit: u32) -> Result<Value> {
        let query = list_offers_query(offer_request_id, sort, limit)?;
        self.get("/air/offers", &query).await
    }

    /// GET /air/offers/{id}, the latest price and availability of one offer
    pub async fn get_offer(&self, offer_id: &str) -> Result<Value> {
        ensure_present("offer_id", offer_id)?;
        let path = format!("/air/offers/{}", urlencoding::encode(offer_id));
        self.get(&path, &Query::new()).await
    }

    /// GET /air/seat_maps
    pub async fn list_seat_maps(&self, offer_id: &str) -> Result<Value> {
        ensure_present("offer_id", offer_id)?;
        self.get("/air/seat_maps", &Query::new().param("offer_id", offer_id))
            .await
    }

    /// GET /air/offer_services
    pub async fn list_offer_services(&self, offer_id: &str) -> Result<Value> {
        ensure_present("offer_id", offer_id)?;
        self.get("/air/offer_services", &Query::new().param("offer_id", offer_id))
            .await
    }

    /// POST /air/orders
    pub async fn create_order(&self, params: &CreateOrderParams) -> Result<Value> {
        let payload = params.payload()?;
        tracing::debug!("Creating {:?} order for offer {}", params.order_type, params.offer_id);
        self.post("/air/orders", &Query::new(), &payload).await
    }

    /// POST /air/payments, settling a hold order
    pub async fn pay_for_order(&self, params: &PayOrderParams) -> Result<Value> {
        let payload = params.payload()?;
        self.post("/air/payments", &Query::new(), &payload).await
    }

    /// GET /air/orders/{id}
    pub async fn get_order(&self, order_id: &str) -> Result<Value> {
        ensure_present("order_id", order_id)?;
        let path = format!("/air/orders/{}", urlencoding::encode(order_id));
        self.get(&path, &Query::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_deadline_outlasts_read_deadline() {
        assert_eq!(READ_TIMEOUT, Duration::from_secs(30));
        assert_eq!(WRITE_TIMEOUT, Duration::from_secs(45));
    }
}
