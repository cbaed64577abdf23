//! Edge providers: pluggable sources of connections between named locations.
//!
//! Each transportation mode implements [`EdgeProvider`]. The search engine
//! never sees a materialised graph; it asks every registered provider for
//! the next relevant edge between two nodes and takes the union of the
//! answers.

mod schedule;
mod walking;
mod walking_dynamic;

pub use schedule::ScheduleProvider;
pub use walking::{
    StaticWalkingProvider, WalkingConfig, WalkingEntry, WalkingTable, WalkingTableError,
};
pub use walking_dynamic::DynamicWalkingProvider;

use crate::distance::DistanceError;
use crate::domain::{Edge, ProviderId, Timestamp};

/// Error from a provider's [`EdgeProvider::prepare`] hook.
///
/// Edge generation itself never errors: a provider that cannot service a
/// query yields an empty sequence so other providers get a chance.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("distance lookup failed: {0}")]
    Distance(#[from] DistanceError),
}

/// A pluggable source of directed, time-bounded edges.
///
/// Exactly one of `depart_after` / `arrive_before` is the bound in effect;
/// the other carries its sentinel ([`Timestamp::MIN`] for `depart_after`,
/// [`Timestamp::MAX`] for `arrive_before`) meaning "unconstrained". When the
/// arrive bound alone is in effect the query is reversed: edges come
/// latest-departure-first. Otherwise they come earliest-arrival-first. The
/// direction matters because the search consumes only the first edge
/// yielded.
pub trait EdgeProvider: Send + Sync {
    /// This provider's identity.
    fn id(&self) -> ProviderId;

    /// The node names this provider can connect.
    ///
    /// The search unions these across providers, plus the origin and
    /// destination, to form the candidate node set of the implicit graph.
    fn known_nodes(&self) -> Vec<String>;

    /// Lazily yield edges from `from` to `to` within the bounds.
    ///
    /// `preceding` identifies the provider of the edge leading into `from`
    /// (or out of `to` on a reversed query); a provider may refuse to
    /// produce a second consecutive edge of its own kind.
    fn edges<'a>(
        &'a self,
        from: &str,
        to: &str,
        depart_after: Timestamp,
        arrive_before: Timestamp,
        preceding: Option<ProviderId>,
    ) -> Box<dyn Iterator<Item = Edge> + 'a>;

    /// Lazily yield departures from `from` after `after`, ordered by
    /// non-decreasing departure time, each edge running to the final stop of
    /// its trip.
    ///
    /// Providers without a departure board yield nothing.
    fn departures<'a>(&'a self, _from: &str, _after: Timestamp) -> Box<dyn Iterator<Item = Edge> + 'a> {
        Box::new(std::iter::empty())
    }

    /// Hook invoked once before a search begins.
    ///
    /// Lets a provider fetch or precompute data for this specific origin and
    /// destination, confining any blocking I/O to one call per search. A
    /// failure here makes the search proceed without this provider rather
    /// than abort.
    fn prepare(&self, _origin: &str, _destination: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// True when only the arrive bound is in effect, i.e. the query runs
/// backwards in time and edges must come latest-departure-first.
pub(crate) fn is_reversed(depart_after: Timestamp, arrive_before: Timestamp) -> bool {
    depart_after == Timestamp::MIN && arrive_before != Timestamp::MAX
}
