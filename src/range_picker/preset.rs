//! Named date range presets.
//!
//! A preset resolves to a concrete [`DateRange`] given the current moment.
//! All day arithmetic happens on the local calendar of `now`'s time zone,
//! with weeks starting on Sunday.
//!
//! | Preset       | Start                         | End                           |
//! |--------------|-------------------------------|-------------------------------|
//! | `today`      | today 00:00                   | `now`                         |
//! | `yesterday`  | yesterday 00:00               | yesterday 00:00               |
//! | `this_week`  | most recent Sunday 00:00      | `now`                         |
//! | `last_week`  | Sunday before that, 00:00     | the Saturday after it, 00:00  |
//! | `this_month` | 1st of this month 00:00       | `now`                         |
//! | `last_month` | 1st of last month 00:00       | last day of last month 00:00  |
//! | `this_year`  | Jan 1 00:00                   | `now`                         |
//! | `last_year`  | Jan 1 of last year 00:00      | Dec 31 of last year 00:00     |
//! | `all_time`   | configured anchor 00:00       | `now`                         |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate};
use chrono_tz::Tz;

use super::range::{local_midnight, DateRange};
use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
    AllTime,
}

impl Preset {
    /// Menu order.
    pub const ALL: [Preset; 9] = [
        Preset::Today,
        Preset::Yesterday,
        Preset::ThisWeek,
        Preset::LastWeek,
        Preset::ThisMonth,
        Preset::LastMonth,
        Preset::ThisYear,
        Preset::LastYear,
        Preset::AllTime,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Preset::Today => "today",
            Preset::Yesterday => "yesterday",
            Preset::ThisWeek => "this_week",
            Preset::LastWeek => "last_week",
            Preset::ThisMonth => "this_month",
            Preset::LastMonth => "last_month",
            Preset::ThisYear => "this_year",
            Preset::LastYear => "last_year",
            Preset::AllTime => "all_time",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preset::Today => "Today",
            Preset::Yesterday => "Yesterday",
            Preset::ThisWeek => "This week",
            Preset::LastWeek => "Last week",
            Preset::ThisMonth => "This month",
            Preset::LastMonth => "Last month",
            Preset::ThisYear => "This year",
            Preset::LastYear => "Last year",
            Preset::AllTime => "All time",
        }
    }

    /// Whether the range runs up to `now` rather than a fixed day boundary.
    pub fn is_open_ended(&self) -> bool {
        matches!(
            self,
            Preset::Today
                | Preset::ThisWeek
                | Preset::ThisMonth
                | Preset::ThisYear
                | Preset::AllTime
        )
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.slug() == s)
            .ok_or_else(|| Error::UnknownPreset(s.to_string()))
    }
}

/// What the preset sidebar shows as selected.
///
/// `Custom` marks a range produced by calendar interaction and has no
/// resolution of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetSelection {
    Preset(Preset),
    Custom,
}

impl PresetSelection {
    pub fn slug(&self) -> &'static str {
        match self {
            PresetSelection::Preset(p) => p.slug(),
            PresetSelection::Custom => "custom",
        }
    }

    pub fn preset(&self) -> Option<Preset> {
        match self {
            PresetSelection::Preset(p) => Some(*p),
            PresetSelection::Custom => None,
        }
    }
}

impl From<Preset> for PresetSelection {
    fn from(value: Preset) -> Self {
        PresetSelection::Preset(value)
    }
}

impl fmt::Display for PresetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PresetSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom" => Ok(PresetSelection::Custom),
            other => other.parse().map(PresetSelection::Preset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetResolver {
    /// First day covered by `all_time`.
    pub all_time_start: NaiveDate,
}

impl Default for PresetResolver {
    fn default() -> Self {
        PresetResolver {
            all_time_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
        }
    }
}

impl PresetResolver {
    pub fn new(all_time_start: NaiveDate) -> Self {
        PresetResolver { all_time_start }
    }

    pub fn resolve(&self, preset: Preset, now: DateTime<Tz>) -> DateRange {
        let tz = now.timezone();
        let today = now.date_naive();
        let midnight = |date: NaiveDate| local_midnight(&tz, date);

        let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
        let month_start = today - Duration::days(today.day0() as i64);
        let year_start = today - Duration::days(today.ordinal0() as i64);

        match preset {
            Preset::Today => DateRange::ordered(midnight(today), now),
            Preset::Yesterday => DateRange::instant(midnight(today - Duration::days(1))),
            Preset::ThisWeek => DateRange::ordered(midnight(week_start), now),
            Preset::LastWeek => {
                let end = week_start - Duration::days(1);
                let start = end - Duration::days(6);
                DateRange::ordered(midnight(start), midnight(end))
            }
            Preset::ThisMonth => DateRange::ordered(midnight(month_start), now),
            Preset::LastMonth => {
                let end = month_start - Duration::days(1);
                let start = end - Duration::days(end.day0() as i64);
                DateRange::ordered(midnight(start), midnight(end))
            }
            Preset::ThisYear => DateRange::ordered(midnight(year_start), now),
            Preset::LastYear => {
                let end = year_start - Duration::days(1);
                let start = end - Duration::days(end.ordinal0() as i64);
                DateRange::ordered(midnight(start), midnight(end))
            }
            Preset::AllTime => DateRange::ordered(midnight(self.all_time_start), now),
        }
    }

    /// `None` for [`PresetSelection::Custom`].
    pub fn resolve_selection(
        &self,
        selection: PresetSelection,
        now: DateTime<Tz>,
    ) -> Option<DateRange> {
        selection.preset().map(|p| self.resolve(p, now))
    }

    /// Best-effort guess of which preset produced `range`.
    ///
    /// Closed presets must match exactly. Open-ended presets match when the
    /// start agrees and the end falls on today's local date no later than
    /// `now`, so a range applied earlier today still reads as "Today".
    /// Anything else is `Custom`.
    pub fn reverse_match(&self, range: &DateRange, now: DateTime<Tz>) -> PresetSelection {
        let now = now.with_timezone(&range.timezone());
        Preset::ALL
            .iter()
            .copied()
            .find(|preset| {
                let resolved = self.resolve(*preset, now);
                if preset.is_open_ended() {
                    resolved.start() == range.start()
                        && range.end().date_naive() == now.date_naive()
                        && *range.end() <= now
                } else {
                    resolved == *range
                }
            })
            .map(PresetSelection::Preset)
            .unwrap_or(PresetSelection::Custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    const TEST_TZ: Tz = New_York;

    // Friday, March 15, 2024, 10:00:00 EDT
    fn test_now() -> DateTime<Tz> {
        TEST_TZ
            .with_ymd_and_hms(2024, 3, 15, 10, 0, 0)
            .single()
            .unwrap()
    }

    fn midnight(year: i32, month: u32, day: u32) -> DateTime<Tz> {
        TEST_TZ
            .with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .unwrap()
    }

    fn resolve(preset: Preset) -> DateRange {
        PresetResolver::default().resolve(preset, test_now())
    }

    #[test]
    fn test_today() {
        let range = resolve(Preset::Today);
        assert_eq!(range.start(), &midnight(2024, 3, 15));
        assert_eq!(range.end(), &test_now());
    }

    #[test]
    fn test_yesterday_is_single_midnight() {
        let range = resolve(Preset::Yesterday);
        assert_eq!(range.start(), &midnight(2024, 3, 14));
        assert_eq!(range.end(), &midnight(2024, 3, 14));
    }

    #[test]
    fn test_this_week_starts_sunday() {
        let range = resolve(Preset::ThisWeek);
        assert_eq!(range.start(), &midnight(2024, 3, 10));
        assert_eq!(range.end(), &test_now());
    }

    #[test]
    fn test_this_week_on_sunday_starts_today() {
        let now = TEST_TZ.with_ymd_and_hms(2024, 3, 17, 8, 0, 0).single().unwrap();
        let range = PresetResolver::default().resolve(Preset::ThisWeek, now);
        assert_eq!(range.start(), &midnight(2024, 3, 17));
    }

    #[test]
    fn test_last_week() {
        let range = resolve(Preset::LastWeek);
        assert_eq!(range.start(), &midnight(2024, 3, 3));
        assert_eq!(range.end(), &midnight(2024, 3, 9));
    }

    #[test]
    fn test_this_month() {
        let range = resolve(Preset::ThisMonth);
        assert_eq!(range.start(), &midnight(2024, 3, 1));
        assert_eq!(range.end(), &test_now());
    }

    #[test]
    fn test_last_month_leap_year() {
        let range = resolve(Preset::LastMonth);
        assert_eq!(range.start(), &midnight(2024, 2, 1));
        assert_eq!(range.end(), &midnight(2024, 2, 29));
    }

    #[test]
    fn test_last_month_in_january() {
        let now = TEST_TZ.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).single().unwrap();
        let range = PresetResolver::default().resolve(Preset::LastMonth, now);
        assert_eq!(range.start(), &midnight(2024, 12, 1));
        assert_eq!(range.end(), &midnight(2024, 12, 31));
    }

    #[test]
    fn test_this_year_and_last_year() {
        let this_year = resolve(Preset::ThisYear);
        assert_eq!(this_year.start(), &midnight(2024, 1, 1));
        assert_eq!(this_year.end(), &test_now());

        let last_year = resolve(Preset::LastYear);
        assert_eq!(last_year.start(), &midnight(2023, 1, 1));
        assert_eq!(last_year.end(), &midnight(2023, 12, 31));
    }

    #[test]
    fn test_all_time_uses_configured_anchor() {
        assert_eq!(resolve(Preset::AllTime).start(), &midnight(2020, 1, 1));

        let resolver = PresetResolver::new(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        let range = resolver.resolve(Preset::AllTime, test_now());
        assert_eq!(range.start(), &midnight(2023, 6, 1));
        assert_eq!(range.end(), &test_now());
    }

    #[test]
    fn test_all_time_anchor_in_future_stays_ordered() {
        let resolver = PresetResolver::new(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        let range = resolver.resolve(Preset::AllTime, test_now());
        assert!(range.start() <= range.end());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = PresetResolver::default();
        for preset in Preset::ALL {
            let first = resolver.resolve(preset, test_now());
            let second = resolver.resolve(preset, test_now());
            assert_eq!(first, second, "{}", preset);
            assert!(first.start() <= first.end(), "{}", preset);
        }
    }

    #[test]
    fn test_custom_has_no_resolution() {
        let resolver = PresetResolver::default();
        assert!(resolver
            .resolve_selection(PresetSelection::Custom, test_now())
            .is_none());
        assert_eq!(
            resolver.resolve_selection(Preset::Today.into(), test_now()),
            Some(resolve(Preset::Today))
        );
    }

    #[test]
    fn test_reverse_match_closed_presets() {
        let resolver = PresetResolver::default();
        for preset in [Preset::Yesterday, Preset::LastWeek, Preset::LastMonth, Preset::LastYear] {
            let range = resolver.resolve(preset, test_now());
            assert_eq!(
                resolver.reverse_match(&range, test_now()),
                PresetSelection::Preset(preset)
            );
        }
    }

    #[test]
    fn test_reverse_match_open_ended_applied_earlier_today() {
        let resolver = PresetResolver::default();
        let earlier = test_now() - Duration::hours(2);
        let range = resolver.resolve(Preset::ThisMonth, earlier);
        assert_eq!(
            resolver.reverse_match(&range, test_now()),
            PresetSelection::Preset(Preset::ThisMonth)
        );
    }

    #[test]
    fn test_reverse_match_falls_back_to_custom() {
        let resolver = PresetResolver::default();
        let range = DateRange::new(midnight(2024, 1, 1), midnight(2024, 1, 31)).unwrap();
        assert_eq!(
            resolver.reverse_match(&range, test_now()),
            PresetSelection::Custom
        );
    }

    #[test]
    fn test_parse_identifiers() {
        assert_eq!("this_week".parse::<Preset>().unwrap(), Preset::ThisWeek);
        assert!("custom".parse::<Preset>().is_err());
        assert_eq!(
            "custom".parse::<PresetSelection>().unwrap(),
            PresetSelection::Custom
        );
        assert_eq!(
            "last_year".parse::<PresetSelection>().unwrap(),
            PresetSelection::Preset(Preset::LastYear)
        );
        assert!("fortnight".parse::<PresetSelection>().is_err());
    }
}
