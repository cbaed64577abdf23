//! Combined departure listing across providers.

use std::sync::Arc;

use crate::domain::{Edge, Timestamp};
use crate::merge::merge_by_key;
use crate::provider::EdgeProvider;

/// List departures from `from` after `after`, merged across every provider
/// into one stream ordered by departure time.
///
/// Provider streams are individually departure-ordered, so a k-way merge
/// keeps the combined listing ordered; ties go to the earlier-registered
/// provider. `max_count` truncates the output; without it the listing is
/// unbounded for weekly-repeating schedules.
pub fn list_departures<'a>(
    providers: &'a [Arc<dyn EdgeProvider>],
    from: &str,
    after: Timestamp,
    max_count: Option<usize>,
) -> impl Iterator<Item = Edge> + 'a {
    let streams: Vec<Box<dyn Iterator<Item = Edge> + 'a>> = providers
        .iter()
        .map(|provider| provider.departures(from, after))
        .collect();
    merge_by_key(streams, |edge: &Edge| edge.depart).take(max_count.unwrap_or(usize::MAX))
}
