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

//! # Duffel Payloads
//!
//! Side-effect free request bodies and query strings for the Duffel Air API.
//! Offers, orders and payments coming back are kept as opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wayfare_http_json::Query;

use crate::error::{FlightsError, Result, ensure_present, parse_date};
use crate::serp_query_builder::TravelClass;

pub const DEFAULT_OFFER_LIMIT: u32 = 50;

// =============================================================================
// Offer requests
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerType {
    Adult,
    Child,
    InfantWithoutSeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassengerSpec {
    #[serde(rename = "type")]
    pub kind: PassengerType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferRequestPayload {
    pub slices: Vec<Slice>,
    pub passengers: Vec<PassengerSpec>,
    pub cabin_class: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfferRequestParams {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub cabin_class: TravelClass,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub return_offers: bool,
}

impl OfferRequestParams {
    pub fn new(origin: &str, destination: &str, departure_date: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date: departure_date.to_string(),
            return_date: None,
            cabin_class: TravelClass::Economy,
            adults: 1,
            children: 0,
            infants: 0,
            return_offers: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_present("origin", &self.origin)?;
        ensure_present("destination", &self.destination)?;
        parse_date("departure_date", &self.departure_date)?;
        if let Some(rd) = &self.return_date {
            parse_date("return_date", rd)?;
        }
        if self.adults == 0 {
            return Err(FlightsError::validation("At least one adult is required"));
        }
        if self.infants > self.adults {
            return Err(FlightsError::validation(format!(
                "Cannot have more infants ({}) than adults ({})",
                self.infants, self.adults
            )));
        }
        Ok(())
    }

    /// Outbound slice, plus the mirrored inbound slice for round trips.
    pub fn slices(&self) -> Vec<Slice> {
        let mut slices = vec![Slice {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_date: self.departure_date.clone(),
        }];
        if let Some(rd) = &self.return_date {
            slices.push(Slice {
                origin: self.destination.clone(),
                destination: self.origin.clone(),
                departure_date: rd.clone(),
            });
        }
        slices
    }

    pub fn passengers(&self) -> Vec<PassengerSpec> {
        [
            (PassengerType::Adult, self.adults),
            (PassengerType::Child, self.children),
            (PassengerType::InfantWithoutSeat, self.infants),
        ]
        .into_iter()
        .flat_map(|(kind, count)| std::iter::repeat_n(PassengerSpec { kind }, count as usize))
        .collect()
    }

    pub fn payload(&self) -> Result<OfferRequestPayload> {
        self.validate()?;
        Ok(OfferRequestPayload {
            slices: self.slices(),
            passengers: self.passengers(),
            cabin_class: self.cabin_class.as_str(),
        })
    }

    pub fn query(&self) -> Query {
        Query::new().param("return_offers", self.return_offers)
    }
}

pub fn list_offers_query(offer_request_id: &str, sort: Option<&str>, limit: u32) -> Result<Query> {
    ensure_present("offer_request_id", offer_request_id)?;
    Ok(Query::new()
        .param("offer_request_id", offer_request_id)
        .param("limit", limit)
        .param_opt("sort", sort.filter(|s| !s.is_empty())))
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Instant,
    Hold,
}

impl OrderType {
    /// Anything but exactly `hold` is an instant purchase.
    pub fn from_name(name: &str) -> Self {
        if name == "hold" {
            Self::Hold
        } else {
            Self::Instant
        }
    }
}

/// A passenger on the order, matched by `id` to a passenger of the offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct OrderPassenger {
    /// Passenger id from the offer (pas_...)
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// YYYY-MM-DD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infant_passenger_id: Option<String>,
    /// Any other Duffel passenger field, passed through as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct Payment {
    /// Usually "balance"
    #[serde(rename = "type", default = "default_payment_type")]
    pub kind: String,
    /// Decimal string, must equal the order total
    pub amount: String,
    /// ISO 4217, must equal the order currency
    pub currency: String,
}

pub(crate) fn default_payment_type() -> String {
    "balance".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct OrderService {
    /// Service id from the offer's available services (ase_...)
    pub id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPayload<'a> {
    pub selected_offers: Vec<&'a str>,
    pub passengers: &'a [OrderPassenger],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<&'a [OrderService]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<&'a Map<String, Value>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments: Option<&'a [Payment]>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateOrderParams {
    pub offer_id: String,
    pub passengers: Vec<OrderPassenger>,
    pub payments: Option<Vec<Payment>>,
    pub services: Option<Vec<OrderService>>,
    pub order_type: OrderType,
    pub metadata: Option<Map<String, Value>>,
    pub contact: Option<Map<String, Value>>,
}

fn non_empty<T>(items: &Option<Vec<T>>) -> Option<&[T]> {
    items.as_deref().filter(|v| !v.is_empty())
}

fn non_empty_map(map: &Option<Map<String, Value>>) -> Option<&Map<String, Value>> {
    map.as_ref().filter(|m| !m.is_empty())
}

impl CreateOrderParams {
    /// Hold orders carry `type: hold` and never payments; instant orders need payments.
    pub fn payload(&self) -> Result<OrderPayload<'_>> {
        let payments = match self.order_type {
            OrderType::Hold => None,
            OrderType::Instant => Some(non_empty(&self.payments).ok_or_else(|| {
                FlightsError::validation("payments are required for instant purchase orders")
            })?),
        };
        ensure_present("offer_id", &self.offer_id)?;
        if self.passengers.is_empty() {
            return Err(FlightsError::validation("At least one passenger is required"));
        }

        Ok(OrderPayload {
            selected_offers: vec![self.offer_id.as_str()],
            passengers: &self.passengers,
            services: non_empty(&self.services),
            metadata: non_empty_map(&self.metadata),
            contact: non_empty_map(&self.contact),
            order_type: (self.order_type == OrderType::Hold).then_some(OrderType::Hold),
            payments,
        })
    }
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPayload<'a> {
    pub order_id: &'a str,
    pub payment: &'a Payment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayOrderParams {
    pub order_id: String,
    pub payment: Payment,
}

impl PayOrderParams {
    pub fn new(order_id: &str, amount: &str, currency: &str, payment_type: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            payment: Payment {
                kind: payment_type.to_string(),
                amount: amount.to_string(),
                currency: currency.to_string(),
            },
        }
    }

    /// Amount and currency are not checked against the order; Duffel rejects mismatches.
    pub fn payload(&self) -> Result<PaymentPayload<'_>> {
        ensure_present("order_id", &self.order_id)?;
        ensure_present("amount", &self.payment.amount)?;
        ensure_present("currency", &self.payment.currency)?;
        Ok(PaymentPayload {
            order_id: &self.order_id,
            payment: &self.payment,
        })
    }
}
