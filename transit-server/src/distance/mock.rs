//! In-memory distance source for tests and offline use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{DistanceError, DistanceSource, WalkingEstimate};

/// A [`DistanceSource`] backed by a fixed map of pair estimates.
#[derive(Debug, Default)]
pub struct MockDistanceSource {
    estimates: HashMap<(String, String), WalkingEstimate>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockDistanceSource {
    /// An empty source that resolves nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every lookup fails, for exercising the
    /// provider-unavailable path.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Register an estimate for an ordered pair.
    pub fn with_walk(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        minutes: i64,
        description: impl Into<String>,
    ) -> Self {
        self.estimates.insert(
            (from.into(), to.into()),
            WalkingEstimate {
                duration: chrono::Duration::minutes(minutes),
                description: description.into(),
            },
        );
        self
    }

    /// Number of `walking_times` calls made against this source.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DistanceSource for MockDistanceSource {
    fn walking_times(
        &self,
        origins: &[&str],
        destinations: &[&str],
    ) -> Result<Vec<Option<WalkingEstimate>>, DistanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DistanceError::Api {
                status: "REQUEST_DENIED".to_string(),
                message: Some("mock failure".to_string()),
            });
        }
        let mut result = Vec::with_capacity(origins.len() * destinations.len());
        for origin in origins {
            for destination in destinations {
                result.push(
                    self.estimates
                        .get(&(origin.to_string(), destination.to_string()))
                        .cloned(),
                );
            }
        }
        Ok(result)
    }
}
