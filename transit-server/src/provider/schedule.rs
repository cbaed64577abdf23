//! Schedule-based edge generation over a weekly timetable.
//!
//! Trips are produced on demand, honouring weekly periodicity and midnight
//! wraparound, without unrolling the timetable into concrete dates. The
//! scan walks one calendar day at a time and buffers candidate edges in a
//! heap until the buffered departures span at least a full day; only then is
//! the heap minimum safe to emit as the chronologically next trip, because a
//! trip discovered while scanning a later day can still arrive earlier than
//! one discovered the day before.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::domain::{Edge, NodeTime, ProviderId, ProviderKind, Timestamp};
use crate::timetable::{first_greater_than, RouteTable, StopTime, Timetable};

use super::{is_reversed, EdgeProvider};

/// Stop scanning after this many consecutive days with no candidates:
/// schedules repeat weekly, so no further day can help.
const MAX_DAYS_WITHOUT_EDGES: u32 = 7;

/// Edge provider backed by a weekly [`Timetable`].
pub struct ScheduleProvider {
    timetable: Arc<Timetable>,
}

impl ScheduleProvider {
    /// Identity of schedule providers.
    pub const ID: ProviderId = ProviderId::new("schedule", ProviderKind::Scheduled);

    /// Create a provider over a loaded timetable.
    pub fn new(timetable: Arc<Timetable>) -> Self {
        Self { timetable }
    }
}

impl EdgeProvider for ScheduleProvider {
    fn id(&self) -> ProviderId {
        Self::ID
    }

    fn known_nodes(&self) -> Vec<String> {
        self.timetable.stop_names()
    }

    fn edges<'a>(
        &'a self,
        from: &str,
        to: &str,
        depart_after: Timestamp,
        arrive_before: Timestamp,
        _preceding: Option<ProviderId>,
    ) -> Box<dyn Iterator<Item = Edge> + 'a> {
        Box::new(ScheduleEdges::new(
            Arc::clone(&self.timetable),
            from.to_string(),
            to.to_string(),
            depart_after,
            arrive_before,
        ))
    }

    fn departures<'a>(&'a self, from: &str, after: Timestamp) -> Box<dyn Iterator<Item = Edge> + 'a> {
        Box::new(ScheduleDepartures::new(
            Arc::clone(&self.timetable),
            from.to_string(),
            after,
        ))
    }
}

/// Heap entry ordered by a scan key, ties broken by discovery order so that
/// earlier rows win deterministically.
struct HeapEntry {
    key: Duration,
    seq: u64,
    edge: Edge,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that BinaryHeap's max is the smallest key.
        (other.key, other.seq).cmp(&(self.key, self.seq))
    }
}

/// A trip row qualifying for one (from, to) column pair on one day.
struct Candidate<'t> {
    depart_tod: Duration,
    arrive_tod: Duration,
    signal: bool,
    row: &'t [Option<StopTime>],
}

/// Lazy edge stream for one (from, to, bounds) query.
struct ScheduleEdges {
    timetable: Arc<Timetable>,
    from: String,
    to: String,
    depart_after: Timestamp,
    arrive_before: Timestamp,
    reversed: bool,
    /// Next calendar day to scan; `None` once the date range overflowed.
    scan_date: Option<NaiveDate>,
    /// Time-since-midnight cutoff for the binary search on the scan day.
    threshold: Duration,
    /// Latest departure seen (forward) or earliest arrival seen (reversed);
    /// drives the one-day lookahead invariant.
    extreme: Timestamp,
    heap: BinaryHeap<HeapEntry>,
    seq: u64,
    days_without_edges: u32,
    finished: bool,
}

impl ScheduleEdges {
    fn new(
        timetable: Arc<Timetable>,
        from: String,
        to: String,
        depart_after: Timestamp,
        arrive_before: Timestamp,
    ) -> Self {
        let reversed = is_reversed(depart_after, arrive_before);
        let (scan_date, threshold, extreme) = if reversed {
            let (date, tod) = arrive_before.split();
            (date, tod, Timestamp::MAX)
        } else {
            // Start one day early with the cutoff pushed up by 24 hours so
            // that trips which began the previous day but cross midnight
            // into the bound's day are still caught.
            let (date, tod) = depart_after.split();
            match date.pred_opt() {
                Some(previous) => (previous, tod + Duration::days(1), Timestamp::MIN),
                None => (date, tod, Timestamp::MIN),
            }
        };
        Self {
            timetable,
            from,
            to,
            depart_after,
            arrive_before,
            reversed,
            scan_date: Some(scan_date),
            threshold,
            extreme,
            heap: BinaryHeap::new(),
            seq: 0,
            days_without_edges: 0,
            finished: false,
        }
    }

    /// Whether the lookahead invariant requires scanning another day before
    /// the heap minimum may be emitted.
    fn needs_more_days(&self) -> bool {
        if self.days_without_edges >= MAX_DAYS_WITHOUT_EDGES || self.scan_date.is_none() {
            return false;
        }
        match self.heap.peek() {
            None => true,
            Some(entry) => {
                let span = if self.reversed {
                    entry.edge.arrive.signed_duration_since(self.extreme)
                } else {
                    self.extreme.signed_duration_since(entry.edge.depart)
                };
                span < Duration::days(1)
            }
        }
    }

    fn push(&mut self, key: Duration, edge: Edge) {
        if self.reversed {
            if edge.arrive < self.extreme {
                self.extreme = edge.arrive;
            }
        } else if edge.depart > self.extreme {
            self.extreme = edge.depart;
        }
        self.heap.push(HeapEntry {
            key,
            seq: self.seq,
            edge,
        });
        self.seq += 1;
        self.days_without_edges = 0;
    }

    /// Scan every route table valid on the current day, pushing every
    /// qualifying trip onto the heap, then advance the scan day.
    fn scan_day(&mut self) {
        let Some(date) = self.scan_date else { return };
        self.days_without_edges += 1;
        let midnight = Timestamp::at_midnight(date);
        let timetable = Arc::clone(&self.timetable);
        for table in timetable.tables_for(midnight.weekday_index()) {
            for (from_col, to_col) in table.column_pairs(&self.from, &self.to) {
                let candidates = collect_candidates(table, from_col, to_col);
                if self.reversed {
                    let end = first_greater_than(&candidates, &self.threshold, |c| c.arrive_tod)
                        .unwrap_or(candidates.len());
                    for candidate in candidates[..end].iter().rev() {
                        self.push_candidate(table, candidate, from_col, to_col, midnight);
                    }
                } else {
                    let Some(start) =
                        first_greater_than(&candidates, &self.threshold, |c| c.depart_tod)
                    else {
                        continue;
                    };
                    for candidate in &candidates[start..] {
                        self.push_candidate(table, candidate, from_col, to_col, midnight);
                    }
                }
            }
        }
        self.advance_day();
    }

    fn push_candidate(
        &mut self,
        table: &RouteTable,
        candidate: &Candidate<'_>,
        from_col: usize,
        to_col: usize,
        midnight: Timestamp,
    ) {
        // Shifts past the representable range are dropped rather than
        // propagated; they only occur at the extreme ends of time.
        let Some(depart) = midnight.checked_add(candidate.depart_tod) else { return };
        let Some(arrive) = midnight.checked_add(candidate.arrive_tod) else { return };
        let key = if self.reversed {
            depart.until_max()
        } else {
            arrive.since_min()
        };
        let edge = Edge {
            provider: ScheduleProvider::ID,
            from: self.from.clone(),
            to: self.to.clone(),
            depart,
            arrive,
            instruction: Some(instruction(&table.route, candidate.signal)),
            intermediate_stops: intermediate_stops(table, candidate.row, from_col, to_col, midnight),
        };
        self.push(key, edge);
    }

    fn advance_day(&mut self) {
        let Some(date) = self.scan_date else { return };
        if self.reversed {
            match date.pred_opt() {
                None => self.scan_date = None,
                Some(previous) => {
                    self.scan_date = Some(previous);
                    // Earlier days qualify whenever the arrival stays on
                    // that same day.
                    self.threshold = Duration::days(1);
                }
            }
        } else {
            match date.succ_opt() {
                None => self.scan_date = None,
                Some(next) => {
                    self.scan_date = Some(next);
                    self.threshold = if self.threshold < Duration::days(1) {
                        // The whole next day qualifies; one microsecond
                        // below midnight keeps the strict comparison open.
                        Duration::microseconds(-1)
                    } else {
                        self.threshold - Duration::days(1)
                    };
                }
            }
        }
    }
}

impl Iterator for ScheduleEdges {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        if self.finished {
            return None;
        }
        loop {
            if self.needs_more_days() {
                self.scan_day();
                continue;
            }
            let Some(entry) = self.heap.pop() else {
                self.finished = true;
                return None;
            };
            if entry.edge.depart >= self.depart_after && entry.edge.arrive <= self.arrive_before {
                return Some(entry.edge);
            }
            // The heap minimum fell outside the bounds; everything after it
            // is further outside still.
            self.finished = true;
            return None;
        }
    }
}

/// Lazy stream of departures from one stop, each edge running to the final
/// stop of its trip. Ordered by non-decreasing departure time; unbounded in
/// principle because schedules repeat weekly.
struct ScheduleDepartures {
    timetable: Arc<Timetable>,
    from: String,
    scan_date: Option<NaiveDate>,
    threshold: Duration,
    last_departure: Timestamp,
    heap: BinaryHeap<HeapEntry>,
    seq: u64,
    days_without_edges: u32,
}

impl ScheduleDepartures {
    fn new(timetable: Arc<Timetable>, from: String, after: Timestamp) -> Self {
        let (date, tod) = after.split();
        let (scan_date, threshold) = match date.pred_opt() {
            Some(previous) => (previous, tod + Duration::days(1)),
            None => (date, tod),
        };
        Self {
            timetable,
            from,
            scan_date: Some(scan_date),
            threshold,
            last_departure: Timestamp::MIN,
            heap: BinaryHeap::new(),
            seq: 0,
            days_without_edges: 0,
        }
    }

    fn needs_more_days(&self) -> bool {
        if self.days_without_edges >= MAX_DAYS_WITHOUT_EDGES || self.scan_date.is_none() {
            return false;
        }
        match self.heap.peek() {
            None => true,
            Some(entry) => {
                self.last_departure.signed_duration_since(entry.edge.depart) < Duration::days(1)
            }
        }
    }

    fn scan_day(&mut self) {
        let Some(date) = self.scan_date else { return };
        self.days_without_edges += 1;
        let midnight = Timestamp::at_midnight(date);
        let timetable = Arc::clone(&self.timetable);
        for table in timetable.tables_for(midnight.weekday_index()) {
            for from_col in table.column_indices(&self.from) {
                let candidates = collect_trip_ends(table, from_col);
                let Some(start) =
                    first_greater_than(&candidates, &self.threshold, |c| c.0.depart_tod)
                else {
                    continue;
                };
                for (candidate, final_col) in &candidates[start..] {
                    let Some(depart) = midnight.checked_add(candidate.depart_tod) else {
                        continue;
                    };
                    let Some(arrive) = midnight.checked_add(candidate.arrive_tod) else {
                        continue;
                    };
                    if depart > self.last_departure {
                        self.last_departure = depart;
                    }
                    self.heap.push(HeapEntry {
                        key: depart.since_min(),
                        seq: self.seq,
                        edge: Edge {
                            provider: ScheduleProvider::ID,
                            from: self.from.clone(),
                            to: table.stops[*final_col].clone(),
                            depart,
                            arrive,
                            instruction: Some(instruction(&table.route, candidate.signal)),
                            intermediate_stops: intermediate_stops(
                                table,
                                candidate.row,
                                from_col,
                                *final_col,
                                midnight,
                            ),
                        },
                    });
                    self.seq += 1;
                    self.days_without_edges = 0;
                }
            }
        }
        match date.succ_opt() {
            None => self.scan_date = None,
            Some(next) => {
                self.scan_date = Some(next);
                self.threshold = if self.threshold < Duration::days(1) {
                    Duration::microseconds(-1)
                } else {
                    self.threshold - Duration::days(1)
                };
            }
        }
    }
}

impl Iterator for ScheduleDepartures {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        loop {
            if self.needs_more_days() {
                self.scan_day();
                continue;
            }
            return self.heap.pop().map(|entry| entry.edge);
        }
    }
}

/// Rows of `table` usable between the given column pair: boarding must be
/// allowed at the from column and the to column must be present.
fn collect_candidates(table: &RouteTable, from_col: usize, to_col: usize) -> Vec<Candidate<'_>> {
    table
        .trips
        .iter()
        .filter_map(|row| {
            let from_cell = row.get(from_col)?.as_ref()?;
            let to_cell = row.get(to_col)?.as_ref()?;
            if !from_cell.pickup {
                return None;
            }
            Some(Candidate {
                depart_tod: from_cell.time,
                arrive_tod: to_cell.time,
                signal: to_cell.signal,
                row,
            })
        })
        .collect()
}

/// Rows usable from `from_col` through to the final stop of their trip.
fn collect_trip_ends(table: &RouteTable, from_col: usize) -> Vec<(Candidate<'_>, usize)> {
    table
        .trips
        .iter()
        .filter_map(|row| {
            let from_cell = row.get(from_col)?.as_ref()?;
            if !from_cell.pickup {
                return None;
            }
            let final_col = row.iter().rposition(Option::is_some)?;
            if final_col <= from_col || final_col >= table.stops.len() {
                return None;
            }
            let final_cell = row[final_col].as_ref()?;
            Some((
                Candidate {
                    depart_tod: from_cell.time,
                    arrive_tod: final_cell.time,
                    signal: final_cell.signal,
                    row,
                },
                final_col,
            ))
        })
        .collect()
}

fn instruction(route: &str, signal: bool) -> String {
    if signal {
        format!("Take Route {route}. Signal driver to stop.")
    } else {
        format!("Take Route {route}.")
    }
}

/// Stops the vehicle calls at strictly between the boarding and alighting
/// columns.
fn intermediate_stops(
    table: &RouteTable,
    row: &[Option<StopTime>],
    from_col: usize,
    to_col: usize,
    midnight: Timestamp,
) -> Vec<NodeTime> {
    (from_col + 1..to_col)
        .filter_map(|col| {
            let cell = row.get(col)?.as_ref()?;
            let name = table.stops.get(col)?;
            let time = midnight.checked_add(cell.time)?;
            Some(NodeTime {
                node: name.clone(),
                time,
            })
        })
        .collect()
}
