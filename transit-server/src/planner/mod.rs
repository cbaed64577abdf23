//! Itinerary planning over pluggable edge providers.
//!
//! The search engine answers "how do I get from here to there, leaving
//! after or arriving before a given time"; the enumerator layers distinct
//! alternatives on top of it; the departure listing merges provider
//! departure boards.

mod alternatives;
mod departures;
mod search;

pub use alternatives::{find_itineraries, Itineraries};
pub use departures::list_departures;
pub use search::{find_itinerary, find_itinerary_excluding, SearchError, TripMode};
