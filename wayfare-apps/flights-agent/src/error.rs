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

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use wayfare_http_json::UpstreamError;

/// Failure of any flight or booking operation.
///
/// Every operation returns this one type; whether a tool surfaces it as an
/// MCP error or folds it into a JSON envelope is decided in [`crate::tools`].
#[derive(Debug, Error)]
pub enum FlightsError {
    /// Rejected before any request was sent
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

pub type Result<T> = std::result::Result<T, FlightsError>;

impl FlightsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Provider payload attached to the failure, `null` if there is none
    pub fn details(&self) -> Value {
        match self {
            Self::Validation(_) => Value::Null,
            Self::Upstream(e) => e.details(),
        }
    }
}

pub(crate) fn ensure_present(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FlightsError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        FlightsError::validation(format!(
            "Invalid {}: {}. Use YYYY-MM-DD",
            field, value
        ))
    })
}
