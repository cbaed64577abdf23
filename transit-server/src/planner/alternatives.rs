//! Alternative-itinerary enumeration.
//!
//! Produces a ranked sequence of distinct itineraries by combinatorially
//! excluding edges of the best one and searching again. Instead of nested
//! recursive generators, a work queue holds one pending search request per
//! exclusion set and is served breadth-first, so alternatives built from
//! fewer exclusions surface before deeper ones and recursion depth stays
//! bounded.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::domain::{Edge, Itinerary, ProviderId, Timestamp};
use crate::provider::EdgeProvider;

use super::search::{find_itinerary_excluding, TripMode};

/// Lazily enumerate up to `max_count` distinct itineraries.
///
/// Yielded itineraries differ from each other in at least one edge whose
/// provider is in `variable`; legs from other providers (typically walking)
/// are not varied. `max_count` of `None` means no limit, though the
/// enumeration itself is finite only as far as the underlying network is.
pub fn find_itineraries(
    variable: &[ProviderId],
    providers: &[Arc<dyn EdgeProvider>],
    origin: &str,
    destination: &str,
    when: Timestamp,
    mode: TripMode,
    max_count: Option<usize>,
) -> Itineraries {
    let mut queue = VecDeque::new();
    queue.push_back(HashSet::new());
    Itineraries {
        variable: variable.to_vec(),
        providers: providers.to_vec(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        when,
        mode,
        remaining: max_count,
        queue,
        yielded: HashSet::new(),
    }
}

/// Iterator returned by [`find_itineraries`].
pub struct Itineraries {
    variable: Vec<ProviderId>,
    providers: Vec<Arc<dyn EdgeProvider>>,
    origin: String,
    destination: String,
    when: Timestamp,
    mode: TripMode,
    remaining: Option<usize>,
    /// Pending search requests, each described by its exclusion set.
    queue: VecDeque<HashSet<Edge>>,
    /// Itineraries already produced; repeats from converging branches are
    /// suppressed.
    yielded: HashSet<Itinerary>,
}

impl Iterator for Itineraries {
    type Item = Itinerary;

    fn next(&mut self) -> Option<Itinerary> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let excluded = self.queue.pop_front()?;
            let Ok(itinerary) = find_itinerary_excluding(
                &self.providers,
                &self.origin,
                &self.destination,
                self.when,
                self.mode,
                &excluded,
            ) else {
                // This branch is a dead end; it simply contributes nothing.
                continue;
            };

            if !self.yielded.insert(itinerary.clone()) {
                continue;
            }

            // Branch on every non-empty combination of this itinerary's
            // variable edges, smallest combinations first.
            let variable_edges: Vec<&Edge> = itinerary
                .edges()
                .iter()
                .filter(|edge| self.variable.contains(&edge.provider))
                .collect();
            for combination in combinations(&variable_edges) {
                let mut child = excluded.clone();
                child.extend(combination.into_iter().cloned());
                self.queue.push_back(child);
            }

            if let Some(remaining) = &mut self.remaining {
                *remaining -= 1;
            }
            return Some(itinerary);
        }
    }
}

/// Every non-empty combination of `items`, in increasing size, positions in
/// lexicographic order within each size.
fn combinations<'a, T>(items: &[&'a T]) -> Vec<Vec<&'a T>> {
    let mut result = Vec::new();
    for size in 1..=items.len() {
        let mut current = Vec::with_capacity(size);
        choose(items, size, 0, &mut current, &mut result);
    }
    result
}

fn choose<'a, T>(
    items: &[&'a T],
    size: usize,
    start: usize,
    current: &mut Vec<&'a T>,
    result: &mut Vec<Vec<&'a T>>,
) {
    if current.len() == size {
        result.push(current.clone());
        return;
    }
    for index in start..items.len() {
        current.push(items[index]);
        choose(items, size, index + 1, current, result);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ScheduleProvider, StaticWalkingProvider, WalkingConfig, WalkingEntry, WalkingTable};
    use crate::timetable::{RouteTable, StopTime, Timetable};
    use chrono::{Duration, NaiveDate};

    fn at(minutes: i64) -> Timestamp {
        Timestamp::at_midnight(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            + Duration::minutes(minutes)
    }

    fn cell(minutes: i64) -> Option<StopTime> {
        Some(StopTime {
            time: Duration::minutes(minutes),
            pickup: true,
            signal: false,
        })
    }

    fn schedule(trips: Vec<Vec<Option<StopTime>>>) -> Arc<dyn EdgeProvider> {
        let mut tt = Timetable::new();
        tt.insert(
            &(0..7).collect::<Vec<_>>(),
            RouteTable {
                route: "A".into(),
                stops: vec!["Alpha".into(), "Beta".into()],
                trips,
            },
        )
        .unwrap();
        Arc::new(ScheduleProvider::new(Arc::new(tt)))
    }

    #[test]
    fn combinations_smallest_first() {
        let a = 1;
        let b = 2;
        let c = 3;
        let combos = combinations(&[&a, &b, &c]);
        let sizes: Vec<usize> = combos.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 1, 1, 2, 2, 2, 3]);
        assert_eq!(combos[0], vec![&a]);
        assert_eq!(combos[3], vec![&a, &b]);
        assert_eq!(combos[6], vec![&a, &b, &c]);
    }

    #[test]
    fn two_equal_trips_give_two_distinct_itineraries() {
        let providers = vec![schedule(vec![
            vec![cell(9 * 60), cell(9 * 60 + 30)],
            vec![cell(10 * 60), cell(10 * 60 + 30)],
        ])];
        let found: Vec<Itinerary> = find_itineraries(
            &[ScheduleProvider::ID],
            &providers,
            "Alpha",
            "Beta",
            at(8 * 60),
            TripMode::Depart,
            Some(2),
        )
        .collect();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].departure_time(), at(9 * 60));
        assert_eq!(found[1].departure_time(), at(10 * 60));
        assert_ne!(found[0], found[1]);
    }

    #[test]
    fn max_count_truncates() {
        let providers = vec![schedule(vec![
            vec![cell(9 * 60), cell(9 * 60 + 30)],
            vec![cell(10 * 60), cell(10 * 60 + 30)],
            vec![cell(11 * 60), cell(11 * 60 + 30)],
        ])];
        let found: Vec<Itinerary> = find_itineraries(
            &[ScheduleProvider::ID],
            &providers,
            "Alpha",
            "Beta",
            at(0),
            TripMode::Depart,
            Some(1),
        )
        .collect();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn no_path_yields_nothing() {
        let providers = vec![schedule(vec![vec![cell(9 * 60), cell(9 * 60 + 30)]])];
        let found: Vec<Itinerary> = find_itineraries(
            &[ScheduleProvider::ID],
            &providers,
            "Alpha",
            "Nowhere",
            at(0),
            TripMode::Depart,
            Some(5),
        )
        .collect();
        assert!(found.is_empty());
    }

    #[test]
    fn walking_legs_are_not_varied() {
        // One walk into the stop, two scheduled trips: alternatives differ
        // in the trip, and every itinerary keeps a walking first leg.
        let mut table = WalkingTable::new();
        table.insert(
            "Home",
            "Alpha",
            WalkingEntry {
                duration: Duration::minutes(5),
                description: "Walk to Alpha.".into(),
            },
        );
        let providers = vec![
            schedule(vec![
                vec![cell(9 * 60), cell(9 * 60 + 30)],
                vec![cell(10 * 60), cell(10 * 60 + 30)],
            ]),
            Arc::new(StaticWalkingProvider::new(
                Arc::new(table),
                WalkingConfig::default(),
            )) as Arc<dyn EdgeProvider>,
        ];

        let found: Vec<Itinerary> = find_itineraries(
            &[ScheduleProvider::ID],
            &providers,
            "Home",
            "Beta",
            at(8 * 60),
            TripMode::Depart,
            Some(2),
        )
        .collect();

        assert_eq!(found.len(), 2);
        for itinerary in &found {
            assert!(itinerary.edges()[0].provider.is_walking());
        }
        assert_eq!(found[0].edges()[1].depart, at(9 * 60));
        assert_eq!(found[1].edges()[1].depart, at(10 * 60));
    }

    #[test]
    fn deeper_exclusions_roll_over_to_later_days() {
        let providers = vec![schedule(vec![
            vec![cell(9 * 60), cell(9 * 60 + 30)],
            vec![cell(10 * 60), cell(10 * 60 + 30)],
        ])];
        let found: Vec<Itinerary> = find_itineraries(
            &[ScheduleProvider::ID],
            &providers,
            "Alpha",
            "Beta",
            at(8 * 60),
            TripMode::Depart,
            None,
        )
        .take(3)
        .collect();
        // Once both of the bound day's trips are excluded, the schedule's
        // weekly repetition supplies the next day's first trip.
        assert_eq!(found[0].departure_time(), at(9 * 60));
        assert_eq!(found[1].departure_time(), at(10 * 60));
        assert_eq!(found[2].departure_time(), at(24 * 60 + 9 * 60));
    }
}
