//! Walking edges resolved on demand through a distance source.
//!
//! The static walking table only covers pairs prepared ahead of time. This
//! provider fills the gap for arbitrary origins and destinations: before a
//! search begins it asks a [`DistanceSource`] for walking times from the
//! origin to every known stop and from every known stop to the destination,
//! then serves edges from that per-instance cache. The lookup happens once
//! per search, in `prepare`, so no edge generation ever blocks on I/O.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::distance::DistanceSource;
use crate::domain::{Edge, ProviderId, ProviderKind, Timestamp};

use super::walking::{walking_edges, WalkingConfig, WalkingEntry};
use super::{EdgeProvider, ProviderError};

/// Edge provider that fetches walking times through a [`DistanceSource`].
pub struct DynamicWalkingProvider<S> {
    source: S,
    /// Stop names worth connecting an arbitrary endpoint to.
    stops: Vec<String>,
    config: WalkingConfig,
    /// Estimates resolved so far. Guarded because one provider instance may
    /// be shared across concurrent searches.
    cache: Mutex<HashMap<(String, String), WalkingEntry>>,
}

impl<S: DistanceSource> DynamicWalkingProvider<S> {
    /// Identity of the dynamic walking provider.
    pub const ID: ProviderId = ProviderId::new("walking-dynamic", ProviderKind::Walking);

    /// Create a provider over the given source and known stop names.
    pub fn new(source: S, stops: Vec<String>, config: WalkingConfig) -> Self {
        Self {
            source,
            stops,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn is_stop(&self, node: &str) -> bool {
        self.stops.iter().any(|stop| stop == node)
    }

    fn store(
        &self,
        cache: &mut HashMap<(String, String), WalkingEntry>,
        pairs: impl Iterator<Item = (String, String)>,
        estimates: Vec<Option<crate::distance::WalkingEstimate>>,
    ) {
        for ((from, to), estimate) in pairs.zip(estimates) {
            if let Some(estimate) = estimate {
                cache.insert(
                    (from, to),
                    WalkingEntry {
                        duration: estimate.duration,
                        description: estimate.description,
                    },
                );
            }
        }
    }
}

impl<S: DistanceSource> EdgeProvider for DynamicWalkingProvider<S> {
    fn id(&self) -> ProviderId {
        Self::ID
    }

    fn known_nodes(&self) -> Vec<String> {
        self.stops.clone()
    }

    fn edges<'a>(
        &'a self,
        from: &str,
        to: &str,
        depart_after: Timestamp,
        arrive_before: Timestamp,
        preceding: Option<ProviderId>,
    ) -> Box<dyn Iterator<Item = Edge> + 'a> {
        let entry = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(from.to_string(), to.to_string()))
            .cloned();
        walking_edges(
            Self::ID,
            entry.as_ref(),
            &self.config,
            from,
            to,
            depart_after,
            arrive_before,
            preceding,
        )
    }

    fn prepare(&self, origin: &str, destination: &str) -> Result<(), ProviderError> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        // Origin to every stop it is not already paired with, plus the
        // destination itself when that is not a stop.
        if !self.is_stop(origin) {
            let mut targets: Vec<&str> = self
                .stops
                .iter()
                .map(String::as_str)
                .filter(|stop| !cache.contains_key(&(origin.to_string(), stop.to_string())))
                .collect();
            if !self.is_stop(destination)
                && !cache.contains_key(&(origin.to_string(), destination.to_string()))
            {
                targets.push(destination);
            }
            if !targets.is_empty() {
                let estimates = self.source.walking_times(&[origin], &targets)?;
                let pairs: Vec<(String, String)> = targets
                    .iter()
                    .map(|target| (origin.to_string(), target.to_string()))
                    .collect();
                self.store(&mut cache, pairs.into_iter(), estimates);
            }
        }

        // Every stop to the destination.
        if !self.is_stop(destination) {
            let froms: Vec<&str> = self
                .stops
                .iter()
                .map(String::as_str)
                .filter(|stop| !cache.contains_key(&(stop.to_string(), destination.to_string())))
                .collect();
            if !froms.is_empty() {
                let estimates = self.source.walking_times(&froms, &[destination])?;
                let pairs: Vec<(String, String)> = froms
                    .iter()
                    .map(|from| (from.to_string(), destination.to_string()))
                    .collect();
                self.store(&mut cache, pairs.into_iter(), estimates);
            }
        }

        Ok(())
    }
}
