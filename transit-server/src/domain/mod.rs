//! Domain types for the itinerary planner.
//!
//! Nodes are opaque strings: stop names, street addresses, or whatever the
//! caller used as an origin or destination. Everything else the planner
//! exchanges is built from the value types here.

mod edge;
mod itinerary;
mod time;

pub use edge::{Edge, NodeTime, ProviderId, ProviderKind};
pub use itinerary::{InvalidItinerary, Itinerary};
pub use time::Timestamp;
