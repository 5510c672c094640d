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

//! # SerpAPI Query Builder
//!
//! Side-effect free query encoding for SerpAPI's `google_flights` engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wayfare_http_json::Query;

use crate::error::{FlightsError, Result, ensure_present, parse_date};

pub const ENGINE: &str = "google_flights";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelClass {
    #[default]
    Economy = 1,
    PremiumEconomy = 2,
    Business = 3,
    First = 4,
}

impl TravelClass {
    /// Strict parse, accepting the usual short aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "economy" | "e" => Some(Self::Economy),
            "premium_economy" | "premium" | "pe" => Some(Self::PremiumEconomy),
            "business" | "b" => Some(Self::Business),
            "first" | "f" => Some(Self::First),
            _ => None,
        }
    }

    /// Lenient parse: unknown names fall back to economy.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::debug!("Unknown travel class {:?}, using economy", name);
            Self::Economy
        })
    }

    /// SerpAPI `travel_class` code
    pub fn serp_code(self) -> &'static str {
        match self {
            Self::Economy => "1",
            Self::PremiumEconomy => "2",
            Self::Business => "3",
            Self::First => "4",
        }
    }

    /// Duffel `cabin_class` name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::PremiumEconomy => "premium_economy",
            Self::Business => "business",
            Self::First => "first",
        }
    }
}

/// SerpAPI `type` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripType {
    RoundTrip = 1,
    OneWay = 2,
    MultiCity = 3,
}

impl TripType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub departure_id: String,
    pub arrival_id: String,
    pub outbound_date: String,
    pub return_date: Option<String>,
    pub travel_class: TravelClass,
    pub adults: u32,
    pub currency: Option<String>,
}

impl SearchParams {
    pub fn new(departure_id: &str, arrival_id: &str, outbound_date: &str) -> Self {
        Self {
            departure_id: departure_id.to_string(),
            arrival_id: arrival_id.to_string(),
            outbound_date: outbound_date.to_string(),
            return_date: None,
            travel_class: TravelClass::Economy,
            adults: 1,
            currency: None,
        }
    }

    pub fn return_date(mut self, date: Option<String>) -> Self {
        self.return_date = date;
        self
    }

    pub fn travel_class(mut self, travel_class: TravelClass) -> Self {
        self.travel_class = travel_class;
        self
    }

    pub fn adults(mut self, adults: u32) -> Self {
        self.adults = adults;
        self
    }

    pub fn currency(mut self, currency: Option<String>) -> Self {
        self.currency = currency;
        self
    }

    /// Round-trip exactly when a return date is present.
    pub fn trip_type(&self) -> TripType {
        if self.return_date.is_some() {
            TripType::RoundTrip
        } else {
            TripType::OneWay
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_present("departure_id", &self.departure_id)?;
        ensure_present("arrival_id", &self.arrival_id)?;
        let outbound = parse_date("outbound_date", &self.outbound_date)?;
        if let Some(rd) = &self.return_date {
            let inbound = parse_date("return_date", rd)?;
            if inbound < outbound {
                return Err(FlightsError::validation(format!(
                    "return_date {} is before outbound_date {}",
                    rd, self.outbound_date
                )));
            }
        }
        if self.adults == 0 {
            return Err(FlightsError::validation("At least one adult is required"));
        }
        Ok(())
    }

    pub fn to_query(&self, api_key: &str) -> Query {
        Query::new()
            .param("engine", ENGINE)
            .param("departure_id", &self.departure_id)
            .param("arrival_id", &self.arrival_id)
            .param("outbound_date", &self.outbound_date)
            .param_opt("return_date", self.return_date.as_deref())
            .param("travel_class", self.travel_class.serp_code())
            .param("adults", self.adults)
            .param("type", self.trip_type().code())
            .param_opt("currency", self.currency.as_deref())
            .secret("api_key", api_key)
    }
}

pub fn flight_details_query(flight_id: &str, api_key: &str) -> Result<Query> {
    ensure_present("flight_id", flight_id)?;
    Ok(Query::new()
        .param("engine", ENGINE)
        .param("flight_id", flight_id)
        .secret("api_key", api_key))
}

/// One leg of a multi-city itinerary, as supplied by the caller.
/// Keys other than `from`, `to` and `date` are kept so the leg can be echoed back as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
pub struct FlightLeg {
    /// Origin airport code (e.g. LAX)
    pub from: String,
    /// Destination airport code (e.g. JFK)
    pub to: String,
    /// Departure date (YYYY-MM-DD)
    pub date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlightLeg {
    pub fn new(from: &str, to: &str, date: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            date: date.to_string(),
            extra: Map::new(),
        }
    }
}

/// Wire shape of a leg inside `multi_city_json`
#[derive(Serialize)]
struct MultiCityLeg<'a> {
    departure_id: &'a str,
    arrival_id: &'a str,
    date: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiCityParams {
    pub legs: Vec<FlightLeg>,
    pub travel_class: TravelClass,
    pub adults: u32,
}

impl MultiCityParams {
    pub fn new(legs: Vec<FlightLeg>) -> Self {
        Self {
            legs,
            travel_class: TravelClass::Economy,
            adults: 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.legs.len() < 2 {
            return Err(FlightsError::validation(
                "Multi-city search requires at least 2 legs",
            ));
        }
        for (i, leg) in self.legs.iter().enumerate() {
            ensure_present(&format!("legs[{}].from", i), &leg.from)?;
            ensure_present(&format!("legs[{}].to", i), &leg.to)?;
            parse_date(&format!("legs[{}].date", i), &leg.date)?;
        }
        if self.adults == 0 {
            return Err(FlightsError::validation("At least one adult is required"));
        }
        Ok(())
    }

    pub fn multi_city_json(&self) -> String {
        let legs: Vec<MultiCityLeg<'_>> = self
            .legs
            .iter()
            .map(|leg| MultiCityLeg {
                departure_id: &leg.from,
                arrival_id: &leg.to,
                date: &leg.date,
            })
            .collect();
        // A Vec of borrowed strings always serializes.
        serde_json::to_string(&legs).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn to_query(&self, api_key: &str) -> Query {
        Query::new()
            .param("engine", ENGINE)
            .param("type", TripType::MultiCity.code())
            .param("multi_city_json", self.multi_city_json())
            .param("adults", self.adults)
            .param("travel_class", self.travel_class.serp_code())
            .secret("api_key", api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_class_codes() {
        assert_eq!(TravelClass::from_name("economy").serp_code(), "1");
        assert_eq!(TravelClass::from_name("premium_economy").serp_code(), "2");
        assert_eq!(TravelClass::from_name("business").serp_code(), "3");
        assert_eq!(TravelClass::from_name("first").serp_code(), "4");
        assert_eq!(TravelClass::from_name("BUSINESS").serp_code(), "3");
    }

    #[test]
    fn test_unknown_travel_class_defaults_to_economy() {
        for name in ["", "coach", "premium economy", "1"] {
            assert_eq!(TravelClass::from_name(name), TravelClass::Economy, "{:?}", name);
        }
        assert_eq!(TravelClass::parse("coach"), None);
    }

    #[test]
    fn test_one_way_query() {
        let params = SearchParams::new("JFK", "LAX", "2025-09-01");
        params.validate().unwrap();
        let query = params.to_query("key");
        assert_eq!(query.get("engine"), Some("google_flights"));
        assert_eq!(query.get("type"), Some("2"));
        assert_eq!(query.get("travel_class"), Some("1"));
        assert_eq!(query.get("adults"), Some("1"));
        assert_eq!(query.get("return_date"), None);
        assert_eq!(query.get("api_key"), Some("key"));
    }

    #[test]
    fn test_round_trip_query() {
        let params = SearchParams::new("SFO", "LHR", "2025-11-01")
            .return_date(Some("2025-11-08".into()))
            .travel_class(TravelClass::Business)
            .adults(2)
            .currency(Some("USD".into()));
        let query = params.to_query("key");
        assert_eq!(params.trip_type(), TripType::RoundTrip);
        assert_eq!(query.get("type"), Some("1"));
        assert_eq!(query.get("return_date"), Some("2025-11-08"));
        assert_eq!(query.get("travel_class"), Some("3"));
        assert_eq!(query.get("adults"), Some("2"));
        assert_eq!(query.get("currency"), Some("USD"));
    }

    #[test]
    fn test_search_validation() {
        assert!(SearchParams::new("", "LAX", "2025-09-01").validate().is_err());
        assert!(SearchParams::new("JFK", "LAX", "09/01/2025").validate().is_err());
        assert!(
            SearchParams::new("JFK", "LAX", "2025-09-08")
                .return_date(Some("2025-09-01".into()))
                .validate()
                .is_err()
        );
        assert!(SearchParams::new("JFK", "LAX", "2025-09-01").adults(0).validate().is_err());
    }

    #[test]
    fn test_flight_details_query() {
        let query = flight_details_query("abc123", "key").unwrap();
        assert_eq!(query.get("flight_id"), Some("abc123"));
        assert!(flight_details_query(" ", "key").is_err());
    }

    #[test]
    fn test_multi_city_requires_two_legs() {
        let none = MultiCityParams::new(vec![]);
        let one = MultiCityParams::new(vec![FlightLeg::new("LAX", "JFK", "2025-09-15")]);
        for params in [none, one] {
            let err = params.validate().unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.to_string(), "Multi-city search requires at least 2 legs");
        }
    }

    #[test]
    fn test_extra_leg_keys_stay_out_of_the_wire_format() {
        let leg: FlightLeg = serde_json::from_value(serde_json::json!({
            "from": "LAX", "to": "JFK", "date": "2025-09-15", "note": "red-eye"
        }))
        .unwrap();
        assert_eq!(leg.extra["note"], "red-eye");
        let params = MultiCityParams::new(vec![leg.clone(), FlightLeg::new("JFK", "LAX", "2025-09-20")]);
        assert!(!params.multi_city_json().contains("red-eye"));
        assert_eq!(serde_json::to_value(&leg).unwrap()["note"], "red-eye");
    }

    #[test]
    fn test_multi_city_query() {
        let mut params = MultiCityParams::new(vec![
            FlightLeg::new("LAX", "JFK", "2025-09-15"),
            FlightLeg::new("JFK", "LAX", "2025-09-20"),
        ]);
        params.travel_class = TravelClass::First;
        params.validate().unwrap();

        let query = params.to_query("key");
        assert_eq!(query.get("type"), Some("3"));
        assert_eq!(query.get("travel_class"), Some("4"));
        assert_eq!(
            query.get("multi_city_json"),
            Some(
                r#"[{"departure_id":"LAX","arrival_id":"JFK","date":"2025-09-15"},{"departure_id":"JFK","arrival_id":"LAX","date":"2025-09-20"}]"#
            )
        );
    }

    #[test]
    fn test_multi_city_rejects_bad_leg() {
        let params = MultiCityParams::new(vec![
            FlightLeg::new("LAX", "JFK", "2025-09-15"),
            FlightLeg::new("JFK", "", "2025-09-20"),
        ]);
        assert_eq!(params.validate().unwrap_err().to_string(), "legs[1].to is required");
    }
}
