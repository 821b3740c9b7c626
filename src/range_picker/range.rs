use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::errors::{Error, Result};

/// Years a range built from outside input may touch. Keeps day and month
/// arithmetic well inside chrono's representable dates.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1900..=9999;

/// An inclusive span between two instants in a particular time zone.
///
/// `start <= end` always holds. Bounds are full timestamps; callers that
/// care about whole calendar days should go through [`DateRange::day_bounds`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl DateRange {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(DateRange { start, end })
    }

    /// Build a range from two instants in either order.
    pub fn ordered(a: DateTime<Tz>, b: DateTime<Tz>) -> Self {
        if a <= b {
            DateRange { start: a, end: b }
        } else {
            DateRange { start: b, end: a }
        }
    }

    /// Zero-width range, used while a calendar selection only has its anchor.
    pub fn instant(at: DateTime<Tz>) -> Self {
        DateRange { start: at, end: at }
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    pub fn is_zero_width(&self) -> bool {
        self.start == self.end
    }

    /// Inclusive containment check against any time zone.
    pub fn contains<Z: TimeZone>(&self, instant: &DateTime<Z>) -> bool {
        let instant = instant.with_timezone(&self.timezone());
        instant >= self.start && instant <= self.end
    }

    /// Widen to whole local days: midnight of the first day through
    /// 23:59:59.999 of the last day.
    pub fn day_bounds(&self) -> DateRange {
        let tz = self.timezone();
        let start = local_midnight(&tz, self.start.date_naive());
        let end = self
            .end
            .date_naive()
            .succ_opt()
            .map(|next| local_midnight(&tz, next))
            .and_then(|next| next.checked_sub_signed(Duration::milliseconds(1)))
            .unwrap_or(self.end);
        DateRange::ordered(start, end)
    }

    /// `(start, end)` as unix milliseconds.
    pub fn to_millis(&self) -> (i64, i64) {
        (self.start.timestamp_millis(), self.end.timestamp_millis())
    }

    /// `None` when either bound is unrepresentable, outside
    /// [`SUPPORTED_YEARS`], or the bounds are inverted.
    pub fn from_millis(tz: &Tz, start: i64, end: i64) -> Option<Self> {
        let start = tz.timestamp_millis_opt(start).single()?;
        let end = tz.timestamp_millis_opt(end).single()?;
        let supported = |at: &DateTime<Tz>| SUPPORTED_YEARS.contains(&at.year());
        if !supported(&start) || !supported(&end) {
            return None;
        }
        DateRange::new(start, end).ok()
    }
}

/// The first instant of `date` on the local calendar of `tz`.
///
/// Ambiguous midnights resolve to the earlier instant. Where a DST jump
/// skips midnight the first valid local time of that day is returned.
pub fn local_midnight(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|hours| {
            let candidate = midnight.checked_add_signed(Duration::hours(hours))?;
            tz.from_local_datetime(&candidate).earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use chrono_tz::America::Santiago;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Tz> {
        New_York
            .with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        assert!(DateRange::new(at(2024, 3, 2, 0), at(2024, 3, 1, 0)).is_err());
        assert!(DateRange::new(at(2024, 3, 1, 0), at(2024, 3, 1, 0)).is_ok());
    }

    #[test]
    fn test_ordered_swaps() {
        let range = DateRange::ordered(at(2024, 3, 9, 0), at(2024, 3, 2, 0));
        assert_eq!(range.start(), &at(2024, 3, 2, 0));
        assert_eq!(range.end(), &at(2024, 3, 9, 0));
    }

    #[test]
    fn test_day_bounds_cover_whole_days() {
        let range = DateRange::new(at(2024, 3, 14, 9), at(2024, 3, 15, 10)).unwrap();
        let bounds = range.day_bounds();
        assert_eq!(bounds.start(), &at(2024, 3, 14, 0));
        assert_eq!(
            bounds.end(),
            &(at(2024, 3, 16, 0) - Duration::milliseconds(1))
        );
    }

    #[test]
    fn test_day_bounds_across_dst_start() {
        // March 10, 2024 is 23 hours long in New York
        let day = at(2024, 3, 10, 0);
        let bounds = DateRange::instant(day).day_bounds();
        let length = *bounds.end() - *bounds.start();
        assert_eq!(length, Duration::hours(23) - Duration::milliseconds(1));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = DateRange::new(at(2024, 3, 1, 0), at(2024, 3, 2, 0)).unwrap();
        assert!(range.contains(&at(2024, 3, 1, 0)));
        assert!(range.contains(&at(2024, 3, 2, 0)));
        assert!(!range.contains(&at(2024, 3, 2, 1)));
        assert!(range.contains(&at(2024, 3, 1, 12).with_timezone(&chrono::Utc)));
    }

    #[test]
    fn test_local_midnight_in_dst_gap() {
        // Chile skipped midnight on 2022-09-11
        let date = NaiveDate::from_ymd_opt(2022, 9, 11).unwrap();
        let midnight = local_midnight(&Santiago, date);
        assert_eq!(midnight.date_naive(), date);
        assert_eq!(midnight.format("%H:%M").to_string(), "01:00");
    }

    #[test]
    fn test_millis_round_trip_rejects_inverted() {
        assert!(DateRange::from_millis(&New_York, 2000, 1000).is_none());
        let range = DateRange::from_millis(&New_York, 1000, 2000).unwrap();
        assert_eq!(range.to_millis(), (1000, 2000));
    }

    #[test]
    fn test_millis_outside_supported_years_rejected() {
        let last = chrono::DateTime::<chrono::Utc>::MAX_UTC.timestamp_millis() - 1000;
        assert!(DateRange::from_millis(&New_York, last, last).is_none());
        let first = chrono::DateTime::<chrono::Utc>::MIN_UTC.timestamp_millis() + 86_400_000;
        assert!(DateRange::from_millis(&New_York, first, 0).is_none());
    }

    #[test]
    fn test_day_bounds_on_last_representable_day() {
        let last = chrono::DateTime::<chrono::Utc>::MAX_UTC.with_timezone(&Tz::UTC);
        let bounds = DateRange::instant(last).day_bounds();
        assert_eq!(bounds.end(), &last);
        assert_eq!(bounds.start().date_naive(), NaiveDate::MAX);
    }
}
