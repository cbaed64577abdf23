//! Uniform-cost itinerary search.
//!
//! A Dijkstra-style search over an implicit graph: nodes are discovered
//! lazily, and the outgoing (or, in arrive mode, incoming) edges of a node
//! are exactly the first edge each registered provider yields for each
//! candidate neighbour at the node's best known time. Edge weights are real
//! timestamps, so the popped-once-is-final invariant of uniform-cost search
//! holds.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Duration;

use crate::domain::{Edge, Itinerary, Timestamp};
use crate::provider::EdgeProvider;

/// Which end of the trip the given time constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripMode {
    /// Depart at or after the given time; minimise arrival.
    Depart,
    /// Arrive at or before the given time; maximise departure.
    Arrive,
}

/// Error from itinerary search.
///
/// "No connecting path" and "endpoint unknown to every provider" are
/// deliberately not distinguished; both simply mean no itinerary exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("no itinerary is possible between these endpoints at this time")]
    ItineraryNotPossible,
}

/// How a node was reached during one search.
#[derive(Debug, Clone)]
enum Reached {
    /// The search's starting node.
    Start,
    /// Reached over `edge` with `hops` legs used so far.
    Via { edge: Edge, hops: u32 },
}

/// Ordering key for a node's tentative distance.
///
/// Depart mode: earliest arrival first, then fewest hops, then latest
/// departure. Arrive mode mirrors it: latest departure first, then fewest
/// hops, then earliest arrival. Both shapes reduce to a comparable triple
/// of durations measured against the sentinels.
type DistanceKey = (Duration, u32, Duration);

fn edge_distance(mode: TripMode, edge: &Edge, hops: u32) -> DistanceKey {
    match mode {
        TripMode::Depart => (edge.arrive.since_min(), hops, edge.depart.until_max()),
        TripMode::Arrive => (edge.depart.until_max(), hops, edge.arrive.since_min()),
    }
}

fn reached_distance(mode: TripMode, reached: &Reached, when: Timestamp) -> DistanceKey {
    match reached {
        Reached::Via { edge, hops } => edge_distance(mode, edge, *hops),
        Reached::Start => match mode {
            TripMode::Depart => (when.since_min(), 0, Timestamp::MIN.until_max()),
            TripMode::Arrive => (when.until_max(), 0, Timestamp::MAX.since_min()),
        },
    }
}

/// Find the optimal itinerary between two nodes.
///
/// In [`TripMode::Depart`] the itinerary leaves `origin` at or after `when`;
/// in [`TripMode::Arrive`] it reaches `destination` at or before `when`.
/// The origin and destination may be any strings; they need not be stops,
/// as long as some provider can connect them. Equal endpoints, unknown
/// endpoints, and disconnected endpoints all produce
/// [`SearchError::ItineraryNotPossible`].
pub fn find_itinerary(
    providers: &[Arc<dyn EdgeProvider>],
    origin: &str,
    destination: &str,
    when: Timestamp,
    mode: TripMode,
) -> Result<Itinerary, SearchError> {
    find_itinerary_excluding(providers, origin, destination, when, mode, &HashSet::new())
}

/// [`find_itinerary`] with an exclusion set: an itinerary may not contain an
/// exact match of any excluded edge. Used by the alternative-itinerary
/// enumerator to force variation.
pub fn find_itinerary_excluding(
    providers: &[Arc<dyn EdgeProvider>],
    origin: &str,
    destination: &str,
    when: Timestamp,
    mode: TripMode,
    excluded: &HashSet<Edge>,
) -> Result<Itinerary, SearchError> {
    // Give every provider its one chance to precompute for this trip. A
    // provider whose hook fails sits the search out; the others may still
    // connect the endpoints.
    let mut active: Vec<&Arc<dyn EdgeProvider>> = Vec::new();
    for provider in providers {
        match provider.prepare(origin, destination) {
            Ok(()) => active.push(provider),
            Err(error) => {
                tracing::warn!(
                    provider = provider.id().name(),
                    %error,
                    "provider unavailable, searching without it"
                );
            }
        }
    }

    // Candidate node universe: everything any provider can serve, plus the
    // endpoints themselves. Ordered so that equal-distance discoveries
    // resolve identically on every run.
    let mut nodes: BTreeSet<String> = active
        .iter()
        .flat_map(|provider| provider.known_nodes())
        .collect();
    nodes.insert(origin.to_string());
    nodes.insert(destination.to_string());

    let (start, target) = match mode {
        TripMode::Depart => (origin, destination),
        TripMode::Arrive => (destination, origin),
    };

    let mut best: HashMap<String, Reached> = HashMap::new();
    best.insert(start.to_string(), Reached::Start);

    let mut visited: HashSet<String> = HashSet::new();
    let mut frontier: BinaryHeap<Reverse<(DistanceKey, u64, String)>> = BinaryHeap::new();
    let mut seq: u64 = 0;
    frontier.push(Reverse((
        (Duration::zero(), 0, Duration::zero()),
        seq,
        start.to_string(),
    )));

    while let Some(Reverse((_, _, node))) = frontier.pop() {
        if !visited.insert(node.clone()) {
            continue;
        }
        if node == target {
            break;
        }

        let reached = best.get(&node).cloned().unwrap_or(Reached::Start);
        let (time_here, preceding, hops_here) = match &reached {
            Reached::Start => (when, None, 0),
            Reached::Via { edge, hops } => {
                let time = match mode {
                    TripMode::Depart => edge.arrive,
                    TripMode::Arrive => edge.depart,
                };
                (time, Some(edge.provider), *hops)
            }
        };

        for neighbour in &nodes {
            if neighbour == &node || visited.contains(neighbour) {
                continue;
            }
            for provider in &active {
                // The search consumes the first edge each provider yields
                // that is not excluded; the bound direction makes that edge
                // the best remaining one.
                let mut stream = match mode {
                    TripMode::Depart => {
                        provider.edges(&node, neighbour, time_here, Timestamp::MAX, preceding)
                    }
                    TripMode::Arrive => {
                        provider.edges(neighbour, &node, Timestamp::MIN, time_here, preceding)
                    }
                };
                let Some(edge) = stream.find(|edge| !excluded.contains(edge)) else {
                    continue;
                };

                let hops = hops_here + 1;
                let candidate = edge_distance(mode, &edge, hops);
                let improves = match best.get(neighbour) {
                    None => true,
                    // Strict improvement only: on a tie the incumbent wins,
                    // keeping results deterministic.
                    Some(current) => candidate < reached_distance(mode, current, when),
                };
                if improves {
                    best.insert(neighbour.clone(), Reached::Via { edge, hops });
                    seq += 1;
                    frontier.push(Reverse((candidate, seq, neighbour.clone())));
                }
            }
        }
    }

    reconstruct(&best, origin, destination, mode)
}

/// Walk the predecessor links from the target back to the start.
fn reconstruct(
    best: &HashMap<String, Reached>,
    origin: &str,
    destination: &str,
    mode: TripMode,
) -> Result<Itinerary, SearchError> {
    let mut edges = Vec::new();
    let mut current = match mode {
        TripMode::Depart => destination.to_string(),
        TripMode::Arrive => origin.to_string(),
    };
    loop {
        match best.get(&current) {
            None => return Err(SearchError::ItineraryNotPossible),
            Some(Reached::Start) => break,
            Some(Reached::Via { edge, .. }) => {
                current = match mode {
                    TripMode::Depart => edge.from.clone(),
                    TripMode::Arrive => edge.to.clone(),
                };
                edges.push(edge.clone());
            }
        }
    }
    if let TripMode::Depart = mode {
        edges.reverse();
    }
    Itinerary::new(edges).map_err(|_| SearchError::ItineraryNotPossible)
}
