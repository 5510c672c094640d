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

//! # Flight Tools
//!
//! Tool inputs, response shaping and error policy for every exposed tool.
//!
//! Two error policies coexist, kept as-is for existing MCP callers:
//!
//! - raise: `search_flights`, `get_flight_details` and multi-city validation
//!   return `Err(FlightsError)`, which the server turns into an MCP error result;
//! - envelope: multi-city upstream failures and every Duffel tool fold the
//!   failure into the returned JSON (`error` key), so the call itself succeeds.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wayfare_http_json::{JsonHttp, UpstreamError};

use crate::config::Config;
use crate::duffel_client::DuffelClient;
use crate::duffel_payloads::{
    CreateOrderParams, DEFAULT_OFFER_LIMIT, OfferRequestParams, OrderPassenger, OrderService,
    OrderType, PayOrderParams, Payment, default_payment_type,
};
use crate::error::FlightsError;
use crate::serp_query_builder::{FlightLeg, MultiCityParams, SearchParams, TravelClass};
use crate::serp_search::SerpFlightsClient;

// =============================================================================
// Inputs
// =============================================================================

fn default_travel_class() -> String {
    "economy".to_string()
}

fn default_adults() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_limit() -> u32 {
    DEFAULT_OFFER_LIMIT
}

fn default_order_type() -> String {
    "instant".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct SearchFlightsInput {
    /// Departure airport code (e.g. JFK)
    pub departure_id: String,
    /// Arrival airport code (e.g. LAX)
    pub arrival_id: String,
    /// Outbound date (YYYY-MM-DD)
    pub outbound_date: String,
    /// Return date (YYYY-MM-DD); makes the search a round trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    /// economy, premium_economy, business or first
    #[serde(default = "default_travel_class")]
    pub travel_class: String,
    #[serde(default = "default_adults")]
    pub adults: u32,
}

impl SearchFlightsInput {
    pub fn to_params(&self) -> SearchParams {
        SearchParams::new(&self.departure_id, &self.arrival_id, &self.outbound_date)
            .return_date(self.return_date.clone())
            .travel_class(TravelClass::from_name(&self.travel_class))
            .adults(self.adults)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct FlightDetailsInput {
    /// Flight identifier from a previous search
    pub flight_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct MultiCityInput {
    /// Ordered legs, at least two
    pub legs: Vec<FlightLeg>,
    /// economy, premium_economy, business or first
    #[serde(default = "default_travel_class")]
    pub travel_class: String,
    #[serde(default = "default_adults")]
    pub adults: u32,
}

impl MultiCityInput {
    pub fn to_params(&self) -> MultiCityParams {
        MultiCityParams {
            legs: self.legs.clone(),
            travel_class: TravelClass::from_name(&self.travel_class),
            adults: self.adults,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct OfferRequestInput {
    /// Origin airport or city code
    pub origin: String,
    /// Destination airport or city code
    pub destination: String,
    /// YYYY-MM-DD
    pub departure_date: String,
    /// YYYY-MM-DD; adds the return slice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    /// economy, premium_economy, business or first
    #[serde(default = "default_travel_class")]
    pub cabin_class: String,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    /// Infants without their own seat
    #[serde(default)]
    pub infants: u32,
    /// Return offers inline with the offer request
    #[serde(default = "default_true")]
    pub return_offers: bool,
}

impl OfferRequestInput {
    pub fn to_params(&self) -> OfferRequestParams {
        OfferRequestParams {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_date: self.departure_date.clone(),
            return_date: self.return_date.clone(),
            cabin_class: TravelClass::from_name(&self.cabin_class),
            adults: self.adults,
            children: self.children,
            infants: self.infants,
            return_offers: self.return_offers,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct ListOffersInput {
    pub offer_request_id: String,
    /// total_amount or total_duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct OfferIdInput {
    /// Offer id (off_...)
    pub offer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct CreateOrderInput {
    /// Offer id (off_...)
    pub offer_id: String,
    pub passengers: Vec<OrderPassenger>,
    /// Required unless type is "hold"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payments: Option<Vec<Payment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<OrderService>>,
    /// "instant" or "hold"; hold is only accepted for hold-eligible offers
    #[serde(rename = "type", default = "default_order_type")]
    pub order_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Map<String, Value>>,
}

impl CreateOrderInput {
    pub fn to_params(&self) -> CreateOrderParams {
        CreateOrderParams {
            offer_id: self.offer_id.clone(),
            passengers: self.passengers.clone(),
            payments: self.payments.clone(),
            services: self.services.clone(),
            order_type: OrderType::from_name(&self.order_type),
            metadata: self.metadata.clone(),
            contact: self.contact.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct PayOrderInput {
    /// Order id (ord_...)
    pub order_id: String,
    /// Must equal the order's total_amount
    pub amount: String,
    /// Must equal the order's total_currency
    pub currency: String,
    #[serde(default = "default_payment_type")]
    pub payment_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct OrderIdInput {
    /// Order id (ord_...)
    pub order_id: String,
}

// =============================================================================
// Outputs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<FlightsError> for ErrorEnvelope {
    fn from(e: FlightsError) -> Self {
        let details = match &e {
            FlightsError::Validation(_) => None,
            FlightsError::Upstream(_) => Some(e.details()),
        };
        Self {
            error: true,
            message: e.to_string(),
            details,
        }
    }
}

/// Result of an envelope-policy tool; serializes to either shape directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Enveloped<T> {
    Success(T),
    Failure(ErrorEnvelope),
}

impl<T> Enveloped<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn into_result(self) -> Result<T, ErrorEnvelope> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Failure(e) => Err(e),
        }
    }
}

impl<T> From<crate::error::Result<T>> for Enveloped<T> {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => {
                tracing::warn!("Tool failed, returning error envelope: {}", e);
                Self::Failure(e.into())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiCityFound {
    pub best_flights: Value,
    pub other_flights: Value,
    pub airports: Value,
    pub search_metadata: Value,
    pub legs_info: Vec<FlightLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultiCityResults {
    Found(MultiCityFound),
    Empty(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiCityReply {
    pub search_completed: bool,
    pub total_legs: usize,
    pub multi_city_results: MultiCityResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferRequestCreated {
    pub offer_request_id: Value,
    /// Each offer carries the `id` used for booking
    pub offers: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferList {
    pub offers: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedOffer {
    pub offer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServicesAndSeatMaps {
    pub services: Value,
    pub seat_maps: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCreated {
    pub order: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCreated {
    pub payment: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStatus {
    pub order: Value,
    pub payment_status: Value,
    pub documents: Value,
}

/// Removes `key` from a JSON object, `null` if absent.
fn take(value: &mut Value, key: &str) -> Value {
    value.get_mut(key).map(Value::take).unwrap_or(Value::Null)
}

/// Like [`take`], substituting `default` for a missing or null field.
fn take_or(value: &mut Value, key: &str, default: Value) -> Value {
    match take(value, key) {
        Value::Null => default,
        v => v,
    }
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Message of a raise-policy failure: HTTP failures read `API Error: {status} - {body}`.
pub fn api_error_message(e: &FlightsError) -> String {
    match e {
        FlightsError::Upstream(UpstreamError::Status { status, body, .. }) => {
            format!("API Error: {} - {}", status, body)
        }
        other => other.to_string(),
    }
}

/// Multi-city search shaped as the tool reply; shared with the CLI, which
/// has no Duffel credentials.
pub async fn multi_city_reply(
    serp: &SerpFlightsClient,
    input: &MultiCityInput,
) -> Result<MultiCityReply, FlightsError> {
    let params = input.to_params();
    params.validate()?;
    let total_legs = input.legs.len();

    match serp.search_multi_city(&params).await {
        Ok(mut data) => Ok(MultiCityReply {
            search_completed: true,
            total_legs,
            multi_city_results: MultiCityResults::Found(MultiCityFound {
                best_flights: take_or(&mut data, "best_flights", empty_array()),
                other_flights: take_or(&mut data, "other_flights", empty_array()),
                airports: take_or(&mut data, "airports", empty_object()),
                search_metadata: take_or(&mut data, "search_metadata", empty_object()),
                legs_info: input.legs.clone(),
            }),
            error: None,
        }),
        Err(e) => {
            tracing::warn!("Error in multi-city search: {}", e);
            Ok(MultiCityReply {
                search_completed: false,
                total_legs,
                multi_city_results: MultiCityResults::Empty(Vec::new()),
                error: Some(e.to_string()),
            })
        }
    }
}

// =============================================================================
// Toolbox
// =============================================================================

#[derive(Clone)]
pub struct FlightToolbox {
    serp: SerpFlightsClient,
    duffel: DuffelClient,
}

impl FlightToolbox {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = JsonHttp::new().context("Failed to build HTTP client")?;
        Ok(Self::from_parts(
            SerpFlightsClient::new(http.clone(), config.serpapi.clone()),
            DuffelClient::new(http, config.duffel.clone()),
        ))
    }

    pub fn from_parts(serp: SerpFlightsClient, duffel: DuffelClient) -> Self {
        Self { serp, duffel }
    }

    pub fn serp(&self) -> &SerpFlightsClient {
        &self.serp
    }

    pub fn duffel(&self) -> &DuffelClient {
        &self.duffel
    }

    // ---- raise policy -------------------------------------------------------

    pub async fn search_flights(&self, input: &SearchFlightsInput) -> Result<Value, FlightsError> {
        self.serp.search_flights(&input.to_params()).await
    }

    pub async fn get_flight_details(&self, input: &FlightDetailsInput) -> Result<Value, FlightsError> {
        self.serp.get_flight_details(&input.flight_id).await
    }

    /// Fails only on invalid input; upstream failures come back as
    /// `search_completed: false`.
    pub async fn search_multi_city(&self, input: &MultiCityInput) -> Result<MultiCityReply, FlightsError> {
        multi_city_reply(&self.serp, input).await
    }

    // ---- envelope policy ----------------------------------------------------

    pub async fn duffel_create_offer_request(&self, input: &OfferRequestInput) -> Enveloped<OfferRequestCreated> {
        let result = self.duffel.create_offer_request(&input.to_params()).await;
        result
            .map(|mut res| {
                let mut offer_request = take(&mut res, "data");
                OfferRequestCreated {
                    offer_request_id: take(&mut offer_request, "id"),
                    offers: take_or(&mut offer_request, "offers", empty_array()),
                }
            })
            .into()
    }

    pub async fn duffel_list_offers(&self, input: &ListOffersInput) -> Enveloped<OfferList> {
        let result = self
            .duffel
            .list_offers(&input.offer_request_id, input.sort.as_deref(), input.limit)
            .await;
        result
            .map(|mut res| OfferList {
                offers: take_or(&mut res, "data", empty_array()),
            })
            .into()
    }

    pub async fn booking_validate_or_price_offer(&self, input: &OfferIdInput) -> Enveloped<PricedOffer> {
        let result = self.duffel.get_offer(&input.offer_id).await;
        result
            .map(|mut res| PricedOffer {
                offer: take(&mut res, "data"),
            })
            .into()
    }

    pub async fn booking_list_services_and_seatmaps(&self, input: &OfferIdInput) -> Enveloped<ServicesAndSeatMaps> {
        let result = async {
            let mut seat_maps = self.duffel.list_seat_maps(&input.offer_id).await?;
            let mut services = self.duffel.list_offer_services(&input.offer_id).await?;
            Ok::<_, FlightsError>(ServicesAndSeatMaps {
                services: take_or(&mut services, "data", empty_array()),
                seat_maps: take_or(&mut seat_maps, "data", empty_array()),
            })
        }
        .await;
        result.into()
    }

    pub async fn booking_create_order(&self, input: &CreateOrderInput) -> Enveloped<OrderCreated> {
        let result = self.duffel.create_order(&input.to_params()).await;
        result
            .map(|mut res| OrderCreated {
                order: take(&mut res, "data"),
            })
            .into()
    }

    pub async fn booking_pay_for_order(&self, input: &PayOrderInput) -> Enveloped<PaymentCreated> {
        let params = PayOrderParams::new(&input.order_id, &input.amount, &input.currency, &input.payment_type);
        let result = self.duffel.pay_for_order(&params).await;
        result
            .map(|mut res| PaymentCreated {
                payment: take(&mut res, "data"),
            })
            .into()
    }

    pub async fn booking_get_order_status(&self, input: &OrderIdInput) -> Enveloped<OrderStatus> {
        let result = self.duffel.get_order(&input.order_id).await;
        result
            .map(|mut res| {
                let order = take(&mut res, "data");
                OrderStatus {
                    payment_status: order.get("payment_status").cloned().unwrap_or(Value::Null),
                    documents: order.get("documents").cloned().unwrap_or(Value::Null),
                    order,
                }
            })
            .into()
    }
}
