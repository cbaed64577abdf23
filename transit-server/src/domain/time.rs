//! Fixed-point time handling for the planner.
//!
//! Bounds on edge queries use sentinel values: [`Timestamp::MIN`] stands for
//! "unbounded past" and [`Timestamp::MAX`] for "unbounded future". Schedule
//! times are stored as durations since midnight, which allows values of 24
//! hours or more to express trips that continue into the next day.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// A point in time with explicit unbounded sentinels.
///
/// Arithmetic that would move past the sentinels returns `None` from the
/// checked operations and clamps in the saturating ones; it never wraps.
///
/// # Examples
///
/// ```
/// use transit_server::domain::Timestamp;
/// use chrono::{Duration, NaiveDate};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let t = Timestamp::at_midnight(date) + Duration::hours(9);
/// assert_eq!(t.to_string(), "2024-03-15 09:00");
/// assert!(Timestamp::MIN < t && t < Timestamp::MAX);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// The unbounded-past sentinel.
    pub const MIN: Timestamp = Timestamp(NaiveDateTime::MIN);

    /// The unbounded-future sentinel.
    pub const MAX: Timestamp = Timestamp(NaiveDateTime::MAX);

    /// Create a timestamp from date and time components.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }

    /// Midnight at the start of the given date.
    pub fn at_midnight(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN))
    }

    /// Wrap an existing datetime.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self(dt)
    }

    /// The underlying datetime.
    pub fn to_datetime(self) -> NaiveDateTime {
        self.0
    }

    /// The date component.
    pub fn date(self) -> NaiveDate {
        self.0.date()
    }

    /// The duration elapsed since midnight on this timestamp's date.
    pub fn since_midnight(self) -> Duration {
        self.0.time().signed_duration_since(NaiveTime::MIN)
    }

    /// Separate into a date and the duration since midnight on that date.
    pub fn split(self) -> (NaiveDate, Duration) {
        (self.date(), self.since_midnight())
    }

    /// Weekday index with Monday as 0 and Sunday as 6.
    pub fn weekday_index(self) -> usize {
        self.0.weekday().num_days_from_monday() as usize
    }

    /// Add a duration, or `None` if the result would pass a sentinel.
    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        self.0.checked_add_signed(duration).map(Self)
    }

    /// Subtract a duration, or `None` if the result would pass a sentinel.
    pub fn checked_sub(self, duration: Duration) -> Option<Self> {
        self.0.checked_sub_signed(duration).map(Self)
    }

    /// Add a duration, clamping at the sentinels instead of failing.
    pub fn saturating_add(self, duration: Duration) -> Self {
        self.checked_add(duration).unwrap_or(if duration < Duration::zero() {
            Self::MIN
        } else {
            Self::MAX
        })
    }

    /// The signed duration from `other` to `self`.
    ///
    /// The full sentinel-to-sentinel span is representable, so this cannot
    /// overflow for any pair of timestamps.
    pub fn signed_duration_since(self, other: Self) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Distance above the unbounded-past sentinel.
    pub fn since_min(self) -> Duration {
        self.signed_duration_since(Self::MIN)
    }

    /// Distance below the unbounded-future sentinel.
    pub fn until_max(self) -> Duration {
        Self::MAX.signed_duration_since(self)
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        self.checked_add(rhs).expect("timestamp overflow")
    }
}

impl std::ops::Sub<Duration> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        self.checked_sub(rhs).expect("timestamp underflow")
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::MIN {
            write!(f, "Timestamp(MIN)")
        } else if *self == Self::MAX {
            write!(f, "Timestamp(MAX)")
        } else {
            write!(f, "Timestamp({})", self.0.format("%Y-%m-%d %H:%M:%S"))
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Timestamp::new(date(y, m, d), NaiveTime::from_hms_opt(h, min, 0).unwrap())
    }

    #[test]
    fn sentinels_bracket_everything() {
        let t = ts(2024, 3, 15, 12, 0);
        assert!(Timestamp::MIN < t);
        assert!(t < Timestamp::MAX);
        assert!(Timestamp::MIN < Timestamp::MAX);
    }

    #[test]
    fn split_at_midnight() {
        let t = ts(2024, 3, 15, 9, 30);
        let (d, tod) = t.split();
        assert_eq!(d, date(2024, 3, 15));
        assert_eq!(tod, Duration::hours(9) + Duration::minutes(30));
    }

    #[test]
    fn weekday_monday_is_zero() {
        // 2024-01-01 was a Monday.
        assert_eq!(Timestamp::at_midnight(date(2024, 1, 1)).weekday_index(), 0);
        assert_eq!(Timestamp::at_midnight(date(2024, 1, 7)).weekday_index(), 6);
    }

    #[test]
    fn add_crosses_midnight() {
        let t = ts(2024, 3, 15, 23, 30) + Duration::hours(1);
        assert_eq!(t, ts(2024, 3, 16, 0, 30));
    }

    #[test]
    fn checked_ops_fail_at_sentinels() {
        assert!(Timestamp::MAX.checked_add(Duration::minutes(1)).is_none());
        assert!(Timestamp::MIN.checked_sub(Duration::minutes(1)).is_none());
        assert!(Timestamp::MAX.checked_sub(Duration::minutes(1)).is_some());
    }

    #[test]
    fn saturating_add_clamps() {
        assert_eq!(
            Timestamp::MAX.saturating_add(Duration::days(2)),
            Timestamp::MAX
        );
        assert_eq!(
            Timestamp::MIN.saturating_add(-Duration::days(2)),
            Timestamp::MIN
        );
        let t = ts(2024, 3, 15, 12, 0);
        assert_eq!(t.saturating_add(Duration::hours(1)), ts(2024, 3, 15, 13, 0));
    }

    #[test]
    fn full_span_is_representable() {
        // The key guarantee behind the search ordering keys.
        let span = Timestamp::MAX.signed_duration_since(Timestamp::MIN);
        assert!(span > Duration::zero());
        assert_eq!(Timestamp::MAX.since_min(), span);
        assert_eq!(Timestamp::MIN.until_max(), span);
    }

    #[test]
    fn display_format() {
        assert_eq!(ts(2024, 3, 15, 9, 5).to_string(), "2024-03-15 09:05");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn valid_stamp()(
            year in 2000i32..2100,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
        ) -> Timestamp {
            Timestamp::new(
                NaiveDate::from_ymd_opt(year, month, day).unwrap(),
                NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            )
        }
    }

    proptest! {
        /// Adding then subtracting the same duration is the identity.
        #[test]
        fn add_sub_identity(t in valid_stamp(), minutes in 0i64..100_000) {
            let d = Duration::minutes(minutes);
            if let Some(added) = t.checked_add(d) {
                prop_assert_eq!(added.checked_sub(d), Some(t));
            }
        }

        /// `since_min` orders the same way as the timestamps themselves.
        #[test]
        fn since_min_monotone(a in valid_stamp(), b in valid_stamp()) {
            prop_assert_eq!(a.cmp(&b), a.since_min().cmp(&b.since_min()));
        }

        /// `until_max` orders in reverse.
        #[test]
        fn until_max_antitone(a in valid_stamp(), b in valid_stamp()) {
            prop_assert_eq!(a.cmp(&b), b.until_max().cmp(&a.until_max()));
        }

        /// Splitting and recombining is the identity.
        #[test]
        fn split_roundtrip(t in valid_stamp()) {
            let (d, tod) = t.split();
            prop_assert_eq!(Timestamp::at_midnight(d) + tod, t);
        }
    }
}
