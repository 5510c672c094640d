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

//! CLI for SerpAPI Google Flights search and response exploration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::cmp::max;
use std::path::PathBuf;
use wayfare_flights_agent::tools::{MultiCityInput, multi_city_reply};
use wayfare_flights_agent::{
    FlightLeg, JsonHttp, SearchParams, SerpApiConfig, SerpFlightsClient, TravelClass,
    get_airports,
};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "wayfare-flights")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: CliCommand,

    /// Verbose output
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// One-way or round-trip search
    Search {
        /// Origin airport code (e.g., JFK)
        #[arg(short, long)]
        from: String,

        /// Destination airport code (e.g., LAX)
        #[arg(short, long)]
        to: String,

        /// Departure date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Return date for round trips (YYYY-MM-DD)
        #[arg(short = 'R', long)]
        return_date: Option<String>,

        /// Cabin class: economy, premium_economy, business, first
        #[arg(short, long, default_value = "economy")]
        cabin: String,

        /// Number of adults
        #[arg(short, long, default_value = "1")]
        adults: u32,

        /// Currency code (e.g., USD)
        #[arg(long)]
        currency: Option<String>,

        /// Print the raw JSON response instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Multi-city search, printing the tool's JSON result
    MultiCity {
        /// Legs as FROM:TO:YYYY-MM-DD, at least two
        #[arg(required = true, value_parser = parse_leg)]
        legs: Vec<FlightLeg>,

        /// Cabin class: economy, premium_economy, business, first
        #[arg(short, long, default_value = "economy")]
        cabin: String,

        /// Number of adults
        #[arg(short, long, default_value = "1")]
        adults: u32,
    },

    /// Run sample searches and describe the response structure
    Explore {
        /// Run the one-way and business round-trip samples instead of the basic one
        #[arg(long)]
        types: bool,

        /// Only print the documented response sections
        #[arg(long)]
        fields: bool,

        /// Save the full basic response to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// List the known airports
    Airports,
}

/// Configure logging based on verbosity level
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse a `FROM:TO:DATE` leg
fn parse_leg(s: &str) -> Result<FlightLeg, String> {
    match s.split(':').collect::<Vec<_>>().as_slice() {
        [from, to, date] if !from.is_empty() && !to.is_empty() && !date.is_empty() => Ok(
            FlightLeg::new(&from.to_uppercase(), &to.to_uppercase(), date),
        ),
        _ => Err(format!("Invalid leg: {}. Use FROM:TO:YYYY-MM-DD", s)),
    }
}

/// Parse cabin class string, rejecting unknown names on the command line
fn parse_cabin(s: &str) -> Result<TravelClass> {
    TravelClass::parse(s).with_context(|| {
        format!(
            "Invalid cabin class: {}. Use: economy, premium_economy, business, first",
            s
        )
    })
}

/// Format duration in hours/minutes.
fn fmt_duration(minutes: i64) -> String {
    let hrs = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{}h", hrs)
    } else if hrs == 0 {
        format!("{}m", mins)
    } else {
        format!("{}h {:02}m", hrs, mins)
    }
}

/// Get terminal width for responsive tables
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

fn dash_bar() -> String {
    "-".repeat(get_terminal_width().min(100))
}

/// One display row of a SerpAPI flight group
struct FlightRow {
    airline: String,
    times: String,
    duration: String,
    layovers: String,
    price: String,
}

impl FlightRow {
    fn from_json(group: &Value) -> Self {
        let segments = group["flights"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        let first = segments.first();
        let last = segments.last();

        let airline = first
            .and_then(|s| s["airline"].as_str())
            .unwrap_or("??")
            .to_string();
        let dep = first
            .and_then(|s| s["departure_airport"]["time"].as_str())
            .unwrap_or("??:??");
        let arr = last
            .and_then(|s| s["arrival_airport"]["time"].as_str())
            .unwrap_or("??:??");

        let layovers = group["layovers"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        let parts: Vec<String> = layovers
            .iter()
            .map(|l| {
                let dur = l["duration"].as_i64().map_or("??".to_string(), fmt_duration);
                let name = l["id"].as_str().or(l["name"].as_str()).unwrap_or("Unknown");
                format!("{}@{}", dur, name)
            })
            .collect();
        let layovers = match parts.len() {
            0 => "direct".to_string(),
            1 => format!("1 stop: {}", parts[0]),
            n => format!("{} stops: {}", n, parts.join(", ")),
        };

        Self {
            airline,
            times: format!("{} → {}", dep, arr),
            duration: group["total_duration"].as_i64().map_or("??".to_string(), fmt_duration),
            layovers,
            price: group["price"].as_i64().map_or("N/A".to_string(), |p| format!("${}", p)),
        }
    }
}

/// Render one section (best or other flights) as a table
fn render_section(title: &str, groups: &[Value]) {
    if groups.is_empty() {
        return;
    }
    let rows: Vec<FlightRow> = groups.iter().map(FlightRow::from_json).collect();

    let mut aw = 7;
    let mut tw = 15;
    let mut dw = 8;
    let mut sw = 8;
    for r in &rows {
        aw = max(aw, r.airline.chars().count());
        tw = max(tw, r.times.chars().count());
        dw = max(dw, r.duration.chars().count());
        sw = max(sw, r.layovers.chars().count());
    }
    // Keep the table within the terminal, layovers give way first
    let fixed = 5 + aw + tw + dw + 20;
    sw = sw.min(max(get_terminal_width().saturating_sub(fixed), 10));

    println!("\n{} ({}):", title, rows.len());
    println!("{}", dash_bar());
    println!(
        "  {:>3}  {:<aw$}  {:<tw$}  {:<dw$}  {:<sw$}   PRICE",
        "#", "AIRLINE", "DEP → ARR", "DURATION", "LAYOVERS"
    );
    println!("{}", dash_bar());
    for (i, r) in rows.iter().enumerate() {
        let layovers: String = r.layovers.chars().take(sw).collect();
        println!(
            "  {:>3}  {:<aw$}  {:<tw$}  {:<dw$}  {:<sw$}   {}",
            i + 1,
            r.airline,
            r.times,
            r.duration,
            layovers,
            r.price
        );
    }
}

/// Render search results to stdout
fn render_results(params: &SearchParams, data: &Value) {
    let route = match &params.return_date {
        Some(rd) => format!(
            "{} ⇄ {} on {} / {}",
            params.departure_id, params.arrival_id, params.outbound_date, rd
        ),
        None => format!(
            "{} → {} on {}",
            params.departure_id, params.arrival_id, params.outbound_date
        ),
    };
    println!("{}", "=".repeat(96));
    println!("  🛫  {}", route);
    println!("{}", "=".repeat(96));

    let best = data["best_flights"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    let other = data["other_flights"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    if let Some(low) = data["price_insights"]["lowest_price"].as_i64() {
        println!("💰 Lowest Price:  ${}", low);
    }
    println!("📊 Total Flights: {}", best.len() + other.len());
    if let Some(url) = data["search_metadata"]["google_flights_url"].as_str() {
        println!("🔗 Google Flights: {}", url);
    }

    render_section("🏆 Best Flights", best);
    render_section("🔄 Other Flights", other);
}

// Explorer
// ---------------------------------------------------------------------------

const RESPONSE_FIELDS: [(&str, &str); 6] = [
    ("search_parameters", "Parameters used in the search request"),
    ("best_flights", "Top recommended flights with best value"),
    ("other_flights", "Additional flight options"),
    ("price_insights", "Historical pricing and booking recommendations"),
    ("airports", "Airport information and codes"),
    ("booking_options", "Available booking sources and links"),
];

fn print_response_fields() {
    println!("\n📝 RESPONSE SECTIONS");
    println!("{}", "=".repeat(55));
    for (field, description) in RESPONSE_FIELDS {
        println!("  • {}: {}", field, description);
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("[array with {} items]", items.len()),
        Value::Object(map) => format!("[object with {} fields]", map.len()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn analyze_flight_structure(flight: &Value, indent: &str) {
    let Some(map) = flight.as_object() else {
        return;
    };
    for (key, value) in map {
        match value {
            Value::Array(segments) if key == "flights" => {
                println!("{}• {}: [{} segments]", indent, key, segments.len());
                if let Some(seg) = segments.first().and_then(Value::as_object) {
                    println!("{}  First segment structure:", indent);
                    for seg_key in seg.keys() {
                        println!("{}    - {}", indent, seg_key);
                    }
                }
            }
            Value::Object(sub) => {
                println!("{}• {}: {}", indent, key, describe_value(value));
                for sub_key in sub.keys() {
                    println!("{}    - {}", indent, sub_key);
                }
            }
            _ => println!("{}• {}: {}", indent, key, describe_value(value)),
        }
    }
}

fn analyze_response_structure(data: &Value) {
    println!("\n📋 RESPONSE STRUCTURE ANALYSIS");
    println!("{}", "-".repeat(40));

    println!("🔑 Top-level keys:");
    if let Some(map) = data.as_object() {
        for key in map.keys() {
            println!("  • {}", key);
        }
    }

    if let Some(params) = data["search_parameters"].as_object() {
        println!("\n🎯 Search Parameters Used:");
        for (key, value) in params {
            println!("  • {}: {}", key, describe_value(value));
        }
    }

    if let Some(best) = data["best_flights"].as_array().filter(|b| !b.is_empty()) {
        println!("\n🏆 Best Flights Found: {}", best.len());
        println!("📄 First flight structure:");
        analyze_flight_structure(&best[0], "  ");
    }

    if let Some(insights) = data["price_insights"].as_object() {
        println!("\n💰 Price Insights Available:");
        for (key, value) in insights {
            println!("  • {}: {}", key, describe_value(value));
        }
    }

    if let Some(other) = data["other_flights"].as_array() {
        println!("\n🔄 Other Flights: {}", other.len());
    }
}

async fn explore_basic(client: &SerpFlightsClient, save: Option<PathBuf>) -> Result<()> {
    println!("\n EXPLORING BASIC FLIGHT SEARCH");
    println!("{}", "=".repeat(50));

    let params = SearchParams::new("JFK", "LAX", "2025-09-01")
        .return_date(Some("2025-09-08".to_string()))
        .currency(Some("USD".to_string()));
    let query = params.to_query("");
    println!("Request: {}", client.endpoint(&query).display());

    let data = client.search_flights(&params).await.context("Request failed")?;
    analyze_response_structure(&data);

    if let Some(path) = save {
        let pretty = serde_json::to_string_pretty(&data)?;
        std::fs::write(&path, pretty)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\n💾 Full response saved to: {}", path.display());
    }
    Ok(())
}

async fn explore_search_types(client: &SerpFlightsClient) {
    println!("\n🔍 EXPLORING DIFFERENT SEARCH TYPES");
    println!("{}", "=".repeat(50));

    let samples = [
        (
            "One-Way Flight",
            SearchParams::new("LAX", "NRT", "2025-10-15"),
        ),
        (
            "Business Class Round-Trip",
            SearchParams::new("SFO", "LHR", "2025-11-01")
                .return_date(Some("2025-11-08".to_string()))
                .travel_class(TravelClass::Business)
                .adults(2),
        ),
    ];

    for (name, params) in samples {
        println!("\n📋 Testing: {}", name);
        println!("{}", "-".repeat(30));
        let params = params.currency(Some("USD".to_string()));
        match client.search_flights(&params).await {
            Ok(data) => {
                let best = data["best_flights"].as_array().map_or(0, Vec::len);
                let other = data["other_flights"].as_array().map_or(0, Vec::len);
                let has_insights = data.get("price_insights").is_some();
                println!("✅ Success: {} best flights, {} others", best, other);
                println!("💰 Price insights: {}", if has_insights { "Yes" } else { "No" });
                if best > 0 {
                    let price = &data["best_flights"][0]["price"];
                    println!("💵 Cheapest: ${}", describe_value(price));
                }
            }
            Err(e) => println!("❌ Failed: {}", e),
        }
    }
}

fn print_airports() {
    println!("{:<5}  {:<45}  CITY", "CODE", "NAME");
    println!("{}", dash_bar());
    for a in get_airports() {
        println!("{:<5}  {:<45}  {}", a.id, a.name, a.city);
    }
}

fn serp_client() -> Result<SerpFlightsClient> {
    let config = SerpApiConfig::from_env()?;
    tracing::debug!("Config: {:?}", config);
    let http = JsonHttp::new().context("Failed to build HTTP client")?;
    Ok(SerpFlightsClient::new(http, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose);
    dotenv::dotenv().ok();

    tracing::debug!("Args: {:?}", args);

    match args.command {
        CliCommand::Search {
            from,
            to,
            date,
            return_date,
            cabin,
            adults,
            currency,
            json,
        } => {
            let params = SearchParams::new(&from.to_uppercase(), &to.to_uppercase(), &date)
                .return_date(return_date)
                .travel_class(parse_cabin(&cabin)?)
                .adults(adults)
                .currency(currency);
            let client = serp_client()?;
            let data = client.search_flights(&params).await.context("Search failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                render_results(&params, &data);
            }
        }
        CliCommand::MultiCity { legs, cabin, adults } => {
            let input = MultiCityInput {
                legs,
                travel_class: parse_cabin(&cabin)?.as_str().to_string(),
                adults,
            };
            let client = serp_client()?;
            let reply = multi_city_reply(&client, &input).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        CliCommand::Explore { types, fields, save } => {
            println!("Google Flights API Explorer");
            println!("{}", "=".repeat(60));
            if fields {
                print_response_fields();
                return Ok(());
            }
            let client = serp_client()?;
            if types {
                explore_search_types(&client).await;
            } else {
                explore_basic(&client, save).await?;
            }
        }
        CliCommand::Airports => print_airports(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_leg() {
        assert_eq!(
            parse_leg("lax:jfk:2025-09-15").unwrap(),
            FlightLeg::new("LAX", "JFK", "2025-09-15")
        );
        assert!(parse_leg("LAX:JFK").is_err());
        assert!(parse_leg("LAX::2025-09-15").is_err());
    }

    #[test]
    fn test_fmt_duration() {
        assert_eq!(fmt_duration(60), "1h");
        assert_eq!(fmt_duration(45), "45m");
        assert_eq!(fmt_duration(385), "6h 25m");
    }

    #[test]
    fn test_flight_row() {
        let group = json!({
            "flights": [
                {"airline": "Delta", "departure_airport": {"time": "2025-09-01 08:00"}, "arrival_airport": {"time": "2025-09-01 11:00"}},
                {"airline": "Delta", "departure_airport": {"time": "2025-09-01 12:30"}, "arrival_airport": {"time": "2025-09-01 15:10"}}
            ],
            "layovers": [{"duration": 90, "id": "DEN", "name": "Denver International Airport"}],
            "total_duration": 430,
            "price": 289
        });
        let row = FlightRow::from_json(&group);
        assert_eq!(row.airline, "Delta");
        assert_eq!(row.times, "2025-09-01 08:00 → 2025-09-01 15:10");
        assert_eq!(row.duration, "7h 10m");
        assert_eq!(row.layovers, "1 stop: 1h 30m@DEN");
        assert_eq!(row.price, "$289");

        let empty = FlightRow::from_json(&json!({}));
        assert_eq!(empty.layovers, "direct");
        assert_eq!(empty.price, "N/A");
    }
}
