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

//! Static list of major US airports, served as the `mcp://airports` resource.

use serde::Serialize;

pub const AIRPORTS_RESOURCE_URI: &str = "mcp://airports";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Airport {
    pub id: &'static str,
    pub name: &'static str,
    pub city: &'static str,
}

const fn airport(id: &'static str, name: &'static str, city: &'static str) -> Airport {
    Airport { id, name, city }
}

static AIRPORTS: [Airport; 28] = [
    airport("ATL", "Hartsfield–Jackson Atlanta International Airport", "Atlanta"),
    airport("DFW", "Dallas/Fort Worth International Airport", "Dallas–Fort Worth"),
    airport("DEN", "Denver International Airport", "Denver"),
    airport("LAX", "Los Angeles International Airport", "Los Angeles"),
    airport("ORD", "O'Hare International Airport", "Chicago"),
    airport("JFK", "John F. Kennedy International Airport", "New York City"),
    airport("MCO", "Orlando International Airport", "Orlando"),
    airport("LAS", "Harry Reid International Airport", "Las Vegas"),
    airport("CLT", "Charlotte Douglas International Airport", "Charlotte"),
    airport("MIA", "Miami International Airport", "Miami"),
    airport("PHX", "Phoenix Sky Harbor International Airport", "Phoenix"),
    airport("SEA", "Seattle–Tacoma International Airport", "Seattle"),
    airport("SFO", "San Francisco International Airport", "San Francisco"),
    airport("EWR", "Newark Liberty International Airport", "Newark"),
    airport("IAH", "George Bush Intercontinental Airport", "Houston"),
    airport("BOS", "Logan International Airport", "Boston"),
    airport("MSP", "Minneapolis–Saint Paul International Airport", "Minneapolis–Saint Paul"),
    airport("FLL", "Fort Lauderdale–Hollywood International Airport", "Fort Lauderdale"),
    airport("LGA", "LaGuardia Airport", "New York City"),
    airport("DTW", "Detroit Metropolitan Airport", "Detroit"),
    airport("PHL", "Philadelphia International Airport", "Philadelphia"),
    airport("SLC", "Salt Lake City International Airport", "Salt Lake City"),
    airport("BWI", "Baltimore/Washington International Airport", "Baltimore–Washington"),
    airport("IAD", "Washington Dulles International Airport", "Washington, D.C."),
    airport("SAN", "San Diego International Airport", "San Diego"),
    airport("TPA", "Tampa International Airport", "Tampa"),
    airport("BNA", "Nashville International Airport", "Nashville"),
    airport("RDU", "Raleigh–Durham International Airport", "Raleigh/Durham"),
];

pub fn get_airports() -> &'static [Airport] {
    &AIRPORTS
}

pub fn find_airport(code: &str) -> Option<&'static Airport> {
    AIRPORTS.iter().find(|a| a.id.eq_ignore_ascii_case(code))
}
