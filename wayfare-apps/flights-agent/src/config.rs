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

//! # Provider Configuration
//!
//! Credentials and endpoints for both upstream providers.
//!
//! - `SERPAPI_API_KEY`: required, SerpAPI key for Google Flights searches
//! - `DUFFEL_TOKEN`: required, Duffel bearer token
//! - `SERPAPI_BASE_URL`: optional, default `https://serpapi.com`
//! - `DUFFEL_BASE_URL`: optional, default `https://api.duffel.com`
//! - `DUFFEL_VERSION`: optional, default `v2`

use thiserror::Error;

pub const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com";
pub const DEFAULT_DUFFEL_BASE_URL: &str = "https://api.duffel.com";
pub const DEFAULT_DUFFEL_VERSION: &str = "v2";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not set. Please set it in the environment or the .env file.")]
    Missing(&'static str),
}

#[derive(Clone, PartialEq)]
pub struct SerpApiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Clone, PartialEq)]
pub struct DuffelConfig {
    pub token: String,
    pub base_url: String,
    pub version: String,
}

impl SerpApiConfig {
    /// SerpAPI settings alone, for tools that never touch Duffel.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            api_key: get("SERPAPI_API_KEY").ok_or(ConfigError::Missing("SERPAPI_API_KEY"))?,
            base_url: get("SERPAPI_BASE_URL").unwrap_or_else(|| DEFAULT_SERPAPI_BASE_URL.to_string()),
        })
    }
}

// Hand-written so credentials never reach logs.
impl std::fmt::Debug for SerpApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpApiConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl std::fmt::Debug for DuffelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuffelConfig")
            .field("token", &"***")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub serpapi: SerpApiConfig,
    pub duffel: DuffelConfig,
}

impl Config {
    /// Config pointing at the production endpoints
    pub fn new(serpapi_key: impl Into<String>, duffel_token: impl Into<String>) -> Self {
        Self {
            serpapi: SerpApiConfig {
                api_key: serpapi_key.into(),
                base_url: DEFAULT_SERPAPI_BASE_URL.to_string(),
            },
            duffel: DuffelConfig {
                token: duffel_token.into(),
                base_url: DEFAULT_DUFFEL_BASE_URL.to_string(),
                version: DEFAULT_DUFFEL_VERSION.to_string(),
            },
        }
    }

    pub fn with_serpapi_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.serpapi.base_url = base_url.into();
        self
    }

    pub fn with_duffel_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.duffel.base_url = base_url.into();
        self
    }

    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let serpapi = SerpApiConfig::from_lookup(&lookup)?;
        let duffel_token = get("DUFFEL_TOKEN").ok_or(ConfigError::Missing("DUFFEL_TOKEN"))?;

        let mut config = Self::new(serpapi.api_key, duffel_token);
        config.serpapi.base_url = serpapi.base_url;
        if let Some(url) = get("DUFFEL_BASE_URL") {
            config.duffel.base_url = url;
        }
        if let Some(version) = get("DUFFEL_VERSION") {
            config.duffel.version = version;
        }
        Ok(config)
    }
}
