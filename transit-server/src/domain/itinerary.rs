//! A connected sequence of edges from origin to destination.

use super::{Edge, Timestamp};

/// Error returned when an edge sequence does not form a valid itinerary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid itinerary: {reason}")]
pub struct InvalidItinerary {
    reason: &'static str,
}

impl InvalidItinerary {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// An ordered, connected sequence of edges.
///
/// Produced only as a terminal search result; each edge's arrival node is
/// the next edge's departure node, which [`Itinerary::new`] enforces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Itinerary {
    edges: Vec<Edge>,
}

impl Itinerary {
    /// Build an itinerary, validating connectivity.
    pub fn new(edges: Vec<Edge>) -> Result<Self, InvalidItinerary> {
        if edges.is_empty() {
            return Err(InvalidItinerary::new("no edges"));
        }
        for pair in edges.windows(2) {
            if pair[0].to != pair[1].from {
                return Err(InvalidItinerary::new("edges are not connected"));
            }
        }
        Ok(Self { edges })
    }

    /// The edges, in travel order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Consume the itinerary, returning its edges.
    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }

    /// The origin node.
    pub fn origin(&self) -> &str {
        &self.edges[0].from
    }

    /// The destination node.
    pub fn destination(&self) -> &str {
        &self.edges[self.edges.len() - 1].to
    }

    /// Departure time from the origin.
    pub fn departure_time(&self) -> Timestamp {
        self.edges[0].depart
    }

    /// Arrival time at the destination.
    pub fn arrival_time(&self) -> Timestamp {
        self.edges[self.edges.len() - 1].arrive
    }

    /// Number of legs.
    pub fn hop_count(&self) -> usize {
        self.edges.len()
    }

    /// Total time from first departure to final arrival.
    pub fn total_duration(&self) -> chrono::Duration {
        self.arrival_time().signed_duration_since(self.departure_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProviderId, ProviderKind};
    use chrono::{Duration, NaiveDate};

    const ID: ProviderId = ProviderId::new("schedule", ProviderKind::Scheduled);

    fn edge(from: &str, to: &str, depart_h: i64, arrive_h: i64) -> Edge {
        let day = Timestamp::at_midnight(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        Edge {
            provider: ID,
            from: from.into(),
            to: to.into(),
            depart: day + Duration::hours(depart_h),
            arrive: day + Duration::hours(arrive_h),
            instruction: None,
            intermediate_stops: Vec::new(),
        }
    }

    #[test]
    fn accepts_connected_edges() {
        let it = Itinerary::new(vec![edge("A", "B", 9, 10), edge("B", "C", 11, 12)]).unwrap();
        assert_eq!(it.origin(), "A");
        assert_eq!(it.destination(), "C");
        assert_eq!(it.hop_count(), 2);
        assert_eq!(it.total_duration(), Duration::hours(3));
    }

    #[test]
    fn rejects_empty() {
        assert!(Itinerary::new(Vec::new()).is_err());
    }

    #[test]
    fn rejects_disconnected_edges() {
        assert!(Itinerary::new(vec![edge("A", "B", 9, 10), edge("C", "D", 11, 12)]).is_err());
    }
}
