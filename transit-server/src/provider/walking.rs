//! Walking edges from a fixed lookup table.
//!
//! Walking is independent of the time of day, so a known (from, to) pair
//! expands into a dense sequence of equivalent trips one minute apart. That
//! density lets the search align a walking leg with whatever schedule-bound
//! neighbour it connects to. Two walking legs may never appear back to back.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use serde::Deserialize;

use crate::domain::{Edge, ProviderId, ProviderKind, Timestamp};

use super::{is_reversed, EdgeProvider};

/// A known walking connection: fixed duration plus descriptive text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkingEntry {
    pub duration: Duration,
    pub description: String,
}

/// Error loading a walking table file.
#[derive(Debug, thiserror::Error)]
pub enum WalkingTableError {
    #[error("failed to read walking table file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse walking table file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Walking durations between ordered (from, to) node pairs.
///
/// Directions are not assumed symmetric; an A to B entry says nothing about
/// B to A.
#[derive(Debug, Clone, Default)]
pub struct WalkingTable {
    entries: HashMap<(String, String), WalkingEntry>,
}

#[derive(Debug, Deserialize)]
struct WalkingFile {
    entries: Vec<WalkingEntryFile>,
}

#[derive(Debug, Deserialize)]
struct WalkingEntryFile {
    from: String,
    to: String,
    seconds: i64,
    description: String,
}

impl WalkingTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for an ordered pair.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>, entry: WalkingEntry) {
        self.entries.insert((from.into(), to.into()), entry);
    }

    /// Look up the entry for an ordered pair.
    pub fn get(&self, from: &str, to: &str) -> Option<&WalkingEntry> {
        self.entries.get(&(from.to_string(), to.to_string()))
    }

    /// Every distinct node name appearing in the table, sorted.
    pub fn nodes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .keys()
            .flat_map(|(from, to)| [from.clone(), to.clone()])
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Number of ordered pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no pairs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a walking table from its JSON representation.
    pub fn parse(json: &str) -> Result<Self, WalkingTableError> {
        let file: WalkingFile = serde_json::from_str(json)?;
        let mut table = Self::new();
        for entry in file.entries {
            table.insert(
                entry.from,
                entry.to,
                WalkingEntry {
                    duration: Duration::seconds(entry.seconds),
                    description: entry.description,
                },
            );
        }
        Ok(table)
    }

    /// Load a walking table from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self, WalkingTableError> {
        Ok(Self::parse(&std::fs::read_to_string(path)?)?)
    }
}

/// Configuration for walking providers.
#[derive(Debug, Clone)]
pub struct WalkingConfig {
    /// Longest walk the planner may suggest for a single leg. Pairs whose
    /// duration meets or exceeds this produce no edges.
    pub max_walk: Duration,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            max_walk: Duration::MAX,
        }
    }
}

impl WalkingConfig {
    /// Cap walks at the given number of minutes.
    pub fn with_max_minutes(minutes: i64) -> Self {
        Self {
            max_walk: Duration::minutes(minutes),
        }
    }
}

/// Edge provider over a static walking table.
pub struct StaticWalkingProvider {
    table: Arc<WalkingTable>,
    config: WalkingConfig,
}

impl StaticWalkingProvider {
    /// Identity of the static walking provider.
    pub const ID: ProviderId = ProviderId::new("walking", ProviderKind::Walking);

    /// Create a provider over a loaded table.
    pub fn new(table: Arc<WalkingTable>, config: WalkingConfig) -> Self {
        Self { table, config }
    }
}

impl EdgeProvider for StaticWalkingProvider {
    fn id(&self) -> ProviderId {
        Self::ID
    }

    fn known_nodes(&self) -> Vec<String> {
        self.table.nodes()
    }

    fn edges<'a>(
        &'a self,
        from: &str,
        to: &str,
        depart_after: Timestamp,
        arrive_before: Timestamp,
        preceding: Option<ProviderId>,
    ) -> Box<dyn Iterator<Item = Edge> + 'a> {
        walking_edges(
            Self::ID,
            self.table.get(from, to),
            &self.config,
            from,
            to,
            depart_after,
            arrive_before,
            preceding,
        )
    }
}

/// Shared edge expansion for the static and dynamic walking providers.
#[allow(clippy::too_many_arguments)]
pub(super) fn walking_edges<'a>(
    id: ProviderId,
    entry: Option<&WalkingEntry>,
    config: &WalkingConfig,
    from: &str,
    to: &str,
    depart_after: Timestamp,
    arrive_before: Timestamp,
    preceding: Option<ProviderId>,
) -> Box<dyn Iterator<Item = Edge> + 'a> {
    // Never chain two walking legs, whichever walking provider made the
    // previous one.
    if preceding.is_some_and(|p| p.is_walking()) {
        return Box::new(std::iter::empty());
    }
    let Some(entry) = entry else {
        return Box::new(std::iter::empty());
    };
    if entry.duration >= config.max_walk {
        return Box::new(std::iter::empty());
    }
    Box::new(WalkingEdges::new(
        id,
        from.to_string(),
        to.to_string(),
        entry.clone(),
        depart_after,
        arrive_before,
    ))
}

/// Minute-stepped expansion of a single walking connection.
///
/// With only an arrive bound the latest trip comes first and the stream
/// steps backwards one minute at a time; otherwise the earliest trip comes
/// first and the stream steps forwards. Either way the stream stops one
/// minute short of the relevant sentinel.
struct WalkingEdges {
    id: ProviderId,
    from: String,
    to: String,
    instruction: String,
    depart: Timestamp,
    arrive: Timestamp,
    reversed: bool,
    exhausted: bool,
}

impl WalkingEdges {
    fn new(
        id: ProviderId,
        from: String,
        to: String,
        entry: WalkingEntry,
        depart_after: Timestamp,
        arrive_before: Timestamp,
    ) -> Self {
        let reversed = is_reversed(depart_after, arrive_before);
        let mut exhausted = false;
        let mut depart = Timestamp::MIN;
        let mut arrive = Timestamp::MAX;
        if reversed {
            // The walk must start after the beginning of time.
            match arrive_before.checked_sub(entry.duration) {
                Some(start) if start > Timestamp::MIN => {
                    depart = start;
                    arrive = arrive_before;
                }
                _ => exhausted = true,
            }
        } else {
            // The walk must finish before the end of time, and the arrive
            // bound must leave room for it after the beginning of time.
            let bound_reachable = Timestamp::MIN
                .checked_add(entry.duration)
                .is_some_and(|earliest| arrive_before > earliest);
            match depart_after.checked_add(entry.duration) {
                Some(end) if end < Timestamp::MAX && bound_reachable => {
                    depart = depart_after;
                    arrive = end;
                }
                _ => exhausted = true,
            }
        }
        Self {
            id,
            from,
            to,
            instruction: entry.description,
            depart,
            arrive,
            reversed,
            exhausted,
        }
    }
}

impl Iterator for WalkingEdges {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        if self.exhausted {
            return None;
        }
        let edge = Edge {
            provider: self.id,
            from: self.from.clone(),
            to: self.to.clone(),
            depart: self.depart,
            arrive: self.arrive,
            instruction: Some(self.instruction.clone()),
            intermediate_stops: Vec::new(),
        };
        let minute = Duration::minutes(1);
        if self.reversed {
            if self.depart.since_min() <= minute {
                self.exhausted = true;
            } else {
                self.depart = self.depart - minute;
                self.arrive = self.arrive - minute;
            }
        } else if self.arrive.until_max() <= minute {
            self.exhausted = true;
        } else {
            self.depart = self.depart + minute;
            self.arrive = self.arrive + minute;
        }
        Some(edge)
    }
}
