//! Directed, time-bounded connections between named locations.

use super::Timestamp;

/// The broad category a provider belongs to.
///
/// Categories drive the rule against consecutive same-mode legs: a walking
/// provider refuses to extend a path whose previous leg came from any
/// walking provider, not just from itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Timetabled service.
    Scheduled,
    /// Walking, at a fixed duration per pair of locations.
    Walking,
}

/// Identity of an edge provider.
///
/// Carried on every edge for tie-breaking, for the consecutive-leg rule,
/// and for selecting which edges the alternative-itinerary enumerator may
/// vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId {
    name: &'static str,
    kind: ProviderKind,
}

impl ProviderId {
    /// Create a provider identity.
    pub const fn new(name: &'static str, kind: ProviderKind) -> Self {
        Self { name, kind }
    }

    /// Short name for logs and DTOs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The provider's category.
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Whether this provider produces walking legs.
    pub fn is_walking(&self) -> bool {
        self.kind == ProviderKind::Walking
    }
}

/// A stop passed through en route, with the time the vehicle calls there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeTime {
    pub node: String,
    pub time: Timestamp,
}

/// A directed, weighted connection between two nodes.
///
/// Edges are immutable value objects once produced by a provider. Equality
/// is structural and includes the producing provider, so an exclusion set
/// of edges (used by the alternative-itinerary enumerator) matches exactly
/// the edge it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The provider that produced this edge.
    pub provider: ProviderId,
    /// Node the edge departs from.
    pub from: String,
    /// Node the edge arrives at.
    pub to: String,
    /// Departure time at `from`.
    pub depart: Timestamp,
    /// Arrival time at `to`.
    pub arrive: Timestamp,
    /// Human-readable instruction for this leg, if any.
    pub instruction: Option<String>,
    /// Stops the vehicle makes between `from` and `to`.
    pub intermediate_stops: Vec<NodeTime>,
}

impl Edge {
    /// Total travel time of this edge.
    pub fn duration(&self) -> chrono::Duration {
        self.arrive.signed_duration_since(self.depart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn edge(provider: ProviderId) -> Edge {
        let day = Timestamp::at_midnight(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        Edge {
            provider,
            from: "A".into(),
            to: "B".into(),
            depart: day + Duration::hours(9),
            arrive: day + Duration::hours(9) + Duration::minutes(30),
            instruction: Some("Take Route X.".into()),
            intermediate_stops: Vec::new(),
        }
    }

    #[test]
    fn duration_is_arrive_minus_depart() {
        let id = ProviderId::new("schedule", ProviderKind::Scheduled);
        assert_eq!(edge(id).duration(), Duration::minutes(30));
    }

    #[test]
    fn equality_includes_provider() {
        let a = edge(ProviderId::new("schedule", ProviderKind::Scheduled));
        let b = edge(ProviderId::new("walking", ProviderKind::Walking));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn kind_checks() {
        assert!(ProviderId::new("w", ProviderKind::Walking).is_walking());
        assert!(!ProviderId::new("s", ProviderKind::Scheduled).is_walking());
    }
}
