//! Walking-distance collaborator interface.
//!
//! The planner does not compute walking times itself; it asks a
//! [`DistanceSource`] for them. The production implementation is an HTTP
//! distance-matrix client ([`MatrixClient`]); tests use [`MockDistanceSource`].

mod client;
mod mock;

pub use client::{MatrixClient, MatrixClientConfig};
pub use mock::MockDistanceSource;

use chrono::Duration;

/// Error from a distance lookup.
#[derive(Debug, thiserror::Error)]
pub enum DistanceError {
    #[error("distance request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("distance API rejected the request: {status}")]
    Api {
        status: String,
        message: Option<String>,
    },

    #[error("too many origin/destination elements for one matrix request")]
    TooManyElements,

    #[error("distance API kept failing after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// A walking-time estimate for one ordered (origin, destination) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkingEstimate {
    pub duration: Duration,
    /// Human-readable leg description, e.g. "Walk 0.3 miles to 6 MetroTech.".
    pub description: String,
}

/// Source of walking times between named locations.
///
/// Implementations may block on network I/O; callers confine lookups to a
/// provider's `prepare` hook so the blocking surface is one call per search.
pub trait DistanceSource: Send + Sync {
    /// Walking estimates for the full origins x destinations matrix,
    /// row-major. `None` marks a pair the source could not resolve.
    fn walking_times(
        &self,
        origins: &[&str],
        destinations: &[&str],
    ) -> Result<Vec<Option<WalkingEstimate>>, DistanceError>;
}
