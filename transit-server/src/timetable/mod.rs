//! Weekly timetable model.
//!
//! A [`Timetable`] maps each weekday (Monday = 0) to the route tables valid
//! on that day. A [`RouteTable`] is one trip pattern: a header row of stop
//! names and data rows of call times. Within a row, present cells are
//! strictly increasing in time-since-midnight from left to right; this is an
//! ingestion-time responsibility and is relied upon, not re-validated, here.

mod loader;

pub use loader::{load_timetable, parse_timetable, TimetableError};

use std::sync::Arc;

use chrono::Duration;

/// One cell of a route table: the time a vehicle calls at a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    /// Time since midnight; 24 hours or more means the next calendar day.
    pub time: Duration,
    /// Whether passengers may board here.
    pub pickup: bool,
    /// Whether a rider must signal the driver to stop here.
    pub signal: bool,
}

/// One scheduled trip pattern's stop-by-stop timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    /// Route identifier, e.g. "A".
    pub route: String,
    /// Header row of stop names. Names may repeat (loop routes).
    pub stops: Vec<String>,
    /// Data rows; one per trip, ordered earliest to latest. Rows may be
    /// shorter than the header, and a `None` cell means the vehicle does not
    /// stop there.
    pub trips: Vec<Vec<Option<StopTime>>>,
}

impl RouteTable {
    /// Indices of header columns whose name equals `name`, in column order.
    pub fn column_indices(&self, name: &str) -> Vec<usize> {
        self.stops
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_str() == name)
            .map(|(i, _)| i)
            .collect()
    }

    /// Every strictly-increasing combination of column indices matching the
    /// requested names in order.
    ///
    /// Header names are not guaranteed unique, and the requested names are
    /// not guaranteed distinct from each other, so each requested name gets
    /// its own index list and the combinations are generated recursively,
    /// each chosen index strictly greater than the previous one. The
    /// strictly-increasing constraint reflects the assumption that vehicles
    /// visit columns left to right in time order.
    pub fn column_combinations(&self, names: &[&str]) -> Vec<Vec<usize>> {
        let lists: Vec<Vec<usize>> = names.iter().map(|n| self.column_indices(n)).collect();
        let mut out = Vec::new();
        let mut current = Vec::with_capacity(lists.len());
        combine(&lists, None, &mut current, &mut out);
        out
    }

    /// The two-name case of [`Self::column_combinations`], as (from, to)
    /// column pairs with `from < to`.
    pub fn column_pairs(&self, from: &str, to: &str) -> Vec<(usize, usize)> {
        self.column_combinations(&[from, to])
            .into_iter()
            .map(|combo| (combo[0], combo[1]))
            .collect()
    }
}

/// Recursive "next index greater than the previous" combination generator.
fn combine(
    lists: &[Vec<usize>],
    previous: Option<usize>,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    let Some((first, rest)) = lists.split_first() else {
        out.push(current.clone());
        return;
    };
    for &index in first {
        if previous.is_some_and(|p| index <= p) {
            continue;
        }
        current.push(index);
        combine(rest, Some(index), current, out);
        current.pop();
    }
}

/// Route tables organised by weekday.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    by_day: [Vec<Arc<RouteTable>>; 7],
}

impl Timetable {
    /// An empty timetable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route table for the given weekdays (Monday = 0).
    ///
    /// The table is shared, not copied, across its days.
    pub fn insert(&mut self, days: &[usize], table: RouteTable) -> Result<(), TimetableError> {
        let table = Arc::new(table);
        for &day in days {
            if day >= 7 {
                return Err(TimetableError::BadWeekday { day });
            }
            self.by_day[day].push(Arc::clone(&table));
        }
        Ok(())
    }

    /// The route tables valid on the given weekday (Monday = 0).
    pub fn tables_for(&self, weekday: usize) -> &[Arc<RouteTable>] {
        &self.by_day[weekday]
    }

    /// True if no day has any route table.
    pub fn is_empty(&self) -> bool {
        self.by_day.iter().all(|day| day.is_empty())
    }

    /// Every distinct, non-empty stop name in the timetable, sorted.
    pub fn stop_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .by_day
            .iter()
            .flatten()
            .flat_map(|table| table.stops.iter())
            .filter(|name| !name.is_empty())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Index of the first item whose key is strictly greater than `target`.
///
/// `items` must be sorted ascending under `key`. Returns `None` when no item
/// compares greater; callers scanning a day's rows treat that as "no
/// qualifying rows this day".
pub fn first_greater_than<T, K, F>(items: &[T], target: &K, key: F) -> Option<usize>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut low = 0;
    let mut high = items.len();
    while low < high {
        let mid = (low + high) / 2;
        if *target < key(&items[mid]) {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    if low < items.len() { Some(low) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(minutes: i64) -> Option<StopTime> {
        Some(StopTime {
            time: Duration::minutes(minutes),
            pickup: true,
            signal: false,
        })
    }

    fn loop_table() -> RouteTable {
        // A loop route: the vehicle calls at "Depot" twice.
        RouteTable {
            route: "L".into(),
            stops: vec!["Depot".into(), "Mid".into(), "Depot".into()],
            trips: vec![vec![cell(0), cell(10), cell(20)]],
        }
    }

    #[test]
    fn column_indices_finds_duplicates() {
        let table = loop_table();
        assert_eq!(table.column_indices("Depot"), vec![0, 2]);
        assert_eq!(table.column_indices("Mid"), vec![1]);
        assert!(table.column_indices("Nowhere").is_empty());
    }

    #[test]
    fn column_pairs_are_strictly_increasing() {
        let table = loop_table();
        assert_eq!(table.column_pairs("Depot", "Mid"), vec![(0, 1)]);
        assert_eq!(table.column_pairs("Mid", "Depot"), vec![(1, 2)]);
        // Same name for both endpoints: only the in-order pair qualifies.
        assert_eq!(table.column_pairs("Depot", "Depot"), vec![(0, 2)]);
    }

    #[test]
    fn column_combinations_three_names() {
        let table = loop_table();
        assert_eq!(
            table.column_combinations(&["Depot", "Mid", "Depot"]),
            vec![vec![0, 1, 2]]
        );
        // "Mid" cannot come before column 0.
        assert!(table.column_combinations(&["Mid", "Depot", "Depot"]).is_empty());
    }

    #[test]
    fn first_greater_than_basics() {
        let items = [1, 3, 3, 7];
        assert_eq!(first_greater_than(&items, &0, |x| *x), Some(0));
        assert_eq!(first_greater_than(&items, &1, |x| *x), Some(1));
        assert_eq!(first_greater_than(&items, &3, |x| *x), Some(3));
        assert_eq!(first_greater_than(&items, &7, |x| *x), None);
        assert_eq!(first_greater_than(&[] as &[i32], &0, |x| *x), None);
    }

    #[test]
    fn timetable_insert_and_lookup() {
        let mut tt = Timetable::new();
        tt.insert(&[0, 1], loop_table()).unwrap();
        assert_eq!(tt.tables_for(0).len(), 1);
        assert_eq!(tt.tables_for(1).len(), 1);
        assert!(tt.tables_for(2).is_empty());
        assert!(!tt.is_empty());
        assert_eq!(tt.stop_names(), vec!["Depot".to_string(), "Mid".to_string()]);
    }

    #[test]
    fn timetable_rejects_bad_weekday() {
        let mut tt = Timetable::new();
        assert!(matches!(
            tt.insert(&[7], loop_table()),
            Err(TimetableError::BadWeekday { day: 7 })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The binary search agrees with a linear scan.
        #[test]
        fn first_greater_than_matches_linear_scan(
            mut items in prop::collection::vec(0i64..100, 0..40),
            target in 0i64..100,
        ) {
            items.sort();
            let expected = items.iter().position(|&x| x > target);
            prop_assert_eq!(first_greater_than(&items, &target, |x| *x), expected);
        }
    }
}
