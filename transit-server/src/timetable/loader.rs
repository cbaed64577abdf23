//! Timetable file loading.
//!
//! The ingestion pipeline (document parsing, header cleanup, row migration)
//! lives outside this crate and hands over a JSON document:
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "route": "A",
//!       "days": [0, 1, 2, 3, 4],
//!       "stops": ["First Stop", "Second Stop"],
//!       "trips": [
//!         [{"seconds": 32400}, {"seconds": 33300, "signal": true}],
//!         [null, {"seconds": 36000, "pickup": false}]
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `seconds` is time since midnight and may exceed 86400 for trips that
//! continue into the next day. The loader checks shape (day indices, row
//! widths) but not the left-to-right time monotonicity invariant, which the
//! ingestion side guarantees.

use std::path::Path;

use serde::Deserialize;

use super::{RouteTable, StopTime, Timetable};

/// Error loading or validating a timetable file.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    #[error("failed to read timetable file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse timetable file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("weekday index {day} is out of range (0-6)")]
    BadWeekday { day: usize },

    #[error("route {route}: trip row {row} has {cells} cells but only {stops} stops")]
    RowTooWide {
        route: String,
        row: usize,
        cells: usize,
        stops: usize,
    },
}

#[derive(Debug, Deserialize)]
struct TimetableFile {
    tables: Vec<TableFile>,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    route: String,
    days: Vec<usize>,
    stops: Vec<String>,
    trips: Vec<Vec<Option<CellFile>>>,
}

#[derive(Debug, Deserialize)]
struct CellFile {
    seconds: i64,
    #[serde(default = "default_pickup")]
    pickup: bool,
    #[serde(default)]
    signal: bool,
}

fn default_pickup() -> bool {
    true
}

impl CellFile {
    fn into_stop_time(self) -> StopTime {
        StopTime {
            time: chrono::Duration::seconds(self.seconds),
            pickup: self.pickup,
            signal: self.signal,
        }
    }
}

/// Parse a timetable from its JSON representation.
pub fn parse_timetable(json: &str) -> Result<Timetable, TimetableError> {
    let file: TimetableFile = serde_json::from_str(json)?;
    let mut timetable = Timetable::new();
    for table in file.tables {
        for (row_index, row) in table.trips.iter().enumerate() {
            if row.len() > table.stops.len() {
                return Err(TimetableError::RowTooWide {
                    route: table.route,
                    row: row_index,
                    cells: row.len(),
                    stops: table.stops.len(),
                });
            }
        }
        let route = RouteTable {
            route: table.route,
            stops: table.stops,
            trips: table
                .trips
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| cell.map(CellFile::into_stop_time))
                        .collect()
                })
                .collect(),
        };
        timetable.insert(&table.days, route)?;
    }
    Ok(timetable)
}

/// Load a timetable from a JSON file on disk.
pub fn load_timetable(path: &Path) -> Result<Timetable, TimetableError> {
    let json = std::fs::read_to_string(path)?;
    parse_timetable(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "tables": [
            {
                "route": "A",
                "days": [0, 1],
                "stops": ["First", "Second"],
                "trips": [
                    [{"seconds": 32400}, {"seconds": 34200, "signal": true}],
                    [null, {"seconds": 90000, "pickup": false}]
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_cells_and_defaults() {
        let tt = parse_timetable(SAMPLE).unwrap();
        let tables = tt.tables_for(0);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.route, "A");

        let first = table.trips[0][0].as_ref().unwrap();
        assert_eq!(first.time, Duration::hours(9));
        assert!(first.pickup);
        assert!(!first.signal);

        let second = table.trips[0][1].as_ref().unwrap();
        assert!(second.signal);

        // Absent cell and a next-day continuation time.
        assert!(table.trips[1][0].is_none());
        let late = table.trips[1][1].as_ref().unwrap();
        assert_eq!(late.time, Duration::hours(25));
        assert!(!late.pickup);
    }

    #[test]
    fn shares_tables_across_days() {
        let tt = parse_timetable(SAMPLE).unwrap();
        assert!(std::sync::Arc::ptr_eq(
            &tt.tables_for(0)[0],
            &tt.tables_for(1)[0]
        ));
        assert!(tt.tables_for(2).is_empty());
    }

    #[test]
    fn rejects_out_of_range_day() {
        let json = r#"{"tables": [{"route": "A", "days": [9], "stops": [], "trips": []}]}"#;
        assert!(matches!(
            parse_timetable(json),
            Err(TimetableError::BadWeekday { day: 9 })
        ));
    }

    #[test]
    fn rejects_row_wider_than_header() {
        let json = r#"{
            "tables": [{
                "route": "A",
                "days": [0],
                "stops": ["Only"],
                "trips": [[{"seconds": 60}, {"seconds": 120}]]
            }]
        }"#;
        assert!(matches!(
            parse_timetable(json),
            Err(TimetableError::RowTooWide { .. })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_timetable("{not json"),
            Err(TimetableError::Json(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let tt = load_timetable(file.path()).unwrap();
        assert_eq!(tt.stop_names(), vec!["First".to_string(), "Second".to_string()]);
    }
}
