use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use chrono_tz::Tz;
use itertools::Itertools;
use serde::Deserialize;
use urlencoding::encode;

use crate::errors::{Error, Result};
use crate::feedback::RatingFilter;
use crate::range_picker::{
    DateRange, DateRangePicker, PickerEvent, PickerOptions, PresetSelection, SelectionStaging,
    YearMonth,
};

/// Raw query string of the feedback page.
#[derive(Deserialize, Debug, Default)]
pub struct FeedbackQuery {
    pub rating: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub open: Option<bool>,
    pub staged_from: Option<i64>,
    pub staged_to: Option<i64>,
    pub preset: Option<String>,
    pub anchor: Option<bool>,
    pub month: Option<String>,
    pub filters: Option<String>,
    pub action: Option<String>,
}

/// The whole state of the feedback page, round-tripped through its URL
/// so every interaction can be a plain link.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedbackUrlState {
    pub site_prefix: String,
    pub rating: RatingFilter,
    pub committed: DateRange,
    /// The filter panel can be collapsed without losing its values.
    pub show_filters: bool,
    pub popover: PopoverUrlState,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PopoverUrlState {
    Closed,
    Open {
        staging: SelectionStaging,
        /// First of the months shown by the calendar.
        month: YearMonth,
    },
}

/// A link target on the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageAction {
    Trigger,
    Apply,
    Cancel,
    Backdrop,
    Preset(PresetSelection),
    Day(NaiveDate),
    PrevMonth,
    NextMonth,
}

impl PageAction {
    pub fn picker_event(&self) -> Option<PickerEvent> {
        match self {
            PageAction::Trigger => Some(PickerEvent::Trigger),
            PageAction::Apply => Some(PickerEvent::Apply),
            PageAction::Cancel => Some(PickerEvent::Cancel),
            PageAction::Backdrop => Some(PickerEvent::Backdrop),
            PageAction::Preset(selection) => Some(PickerEvent::Preset(*selection)),
            PageAction::Day(day) => Some(PickerEvent::Day(*day)),
            PageAction::PrevMonth | PageAction::NextMonth => None,
        }
    }
}

impl fmt::Display for PageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageAction::Trigger => f.write_str("toggle"),
            PageAction::Apply => f.write_str("apply"),
            PageAction::Cancel => f.write_str("cancel"),
            PageAction::Backdrop => f.write_str("backdrop"),
            PageAction::Preset(selection) => write!(f, "preset:{}", selection),
            PageAction::Day(day) => write!(f, "day:{}", day.format("%Y-%m-%d")),
            PageAction::PrevMonth => f.write_str("prev_month"),
            PageAction::NextMonth => f.write_str("next_month"),
        }
    }
}

impl FromStr for PageAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "toggle" => Ok(PageAction::Trigger),
            "apply" => Ok(PageAction::Apply),
            "cancel" => Ok(PageAction::Cancel),
            "backdrop" => Ok(PageAction::Backdrop),
            "prev_month" => Ok(PageAction::PrevMonth),
            "next_month" => Ok(PageAction::NextMonth),
            other => {
                if let Some(preset) = other.strip_prefix("preset:") {
                    return preset.parse().map(PageAction::Preset);
                }
                if let Some(day) = other.strip_prefix("day:") {
                    return NaiveDate::parse_from_str(day, "%Y-%m-%d")
                        .map(PageAction::Day)
                        .map_err(|_| Error::InvalidAction(other.to_string()));
                }
                Err(Error::InvalidAction(other.to_string()))
            }
        }
    }
}

fn range_from_millis(tz: &Tz, start: i64, end: i64) -> Result<DateRange> {
    DateRange::from_millis(tz, start, end).ok_or_else(|| Error::InvalidRange {
        start: start.to_string(),
        end: end.to_string(),
    })
}

impl FeedbackUrlState {
    /// Rebuild page state from the query string. Without `from`/`to` the
    /// committed range comes from `fallback`.
    pub fn from_query<D>(
        site_prefix: &str,
        query: &FeedbackQuery,
        tz: &Tz,
        fallback: D,
    ) -> Result<Self>
    where
        D: FnOnce() -> DateRange,
    {
        let rating = query
            .rating
            .as_deref()
            .map(str::parse::<RatingFilter>)
            .transpose()?
            .unwrap_or_default();

        let show_filters = match query.filters.as_deref() {
            None | Some("shown") => true,
            Some("hidden") => false,
            Some(other) => return Err(Error::Context(format!("Unknown filters mode: {}", other))),
        };

        let committed = match (query.from, query.to) {
            (Some(from), Some(to)) => range_from_millis(tz, from, to)?,
            _ => fallback(),
        };

        let popover = if query.open.unwrap_or(false) {
            let staged = match (query.staged_from, query.staged_to) {
                (Some(from), Some(to)) => range_from_millis(tz, from, to)?,
                _ => committed.clone(),
            };
            let selected = query
                .preset
                .as_deref()
                .map(str::parse::<PresetSelection>)
                .transpose()?
                .unwrap_or(PresetSelection::Custom);
            let month = query
                .month
                .as_deref()
                .and_then(YearMonth::parse)
                .unwrap_or_else(|| YearMonth::of(staged.start().date_naive()));
            PopoverUrlState::Open {
                staging: SelectionStaging::restore(staged, selected, query.anchor.unwrap_or(false)),
                month,
            }
        } else {
            PopoverUrlState::Closed
        };

        Ok(FeedbackUrlState {
            site_prefix: site_prefix.to_string(),
            rating,
            committed,
            show_filters,
            popover,
        })
    }

    pub fn is_open(&self) -> bool {
        matches!(self.popover, PopoverUrlState::Open { .. })
    }

    pub fn with_rating(&self, rating: RatingFilter) -> Self {
        Self {
            rating,
            ..self.clone()
        }
    }

    pub fn with_filters_shown(&self, show_filters: bool) -> Self {
        Self {
            show_filters,
            ..self.clone()
        }
    }

    /// Fresh page state with default filters. Panel visibility is kept.
    pub fn cleared(&self, range: DateRange) -> Self {
        Self {
            site_prefix: self.site_prefix.clone(),
            rating: RatingFilter::All,
            committed: range,
            show_filters: self.show_filters,
            popover: PopoverUrlState::Closed,
        }
    }

    /// Page the calendar view. No effect while closed.
    pub fn shift_month(&self, forward: bool) -> Self {
        match &self.popover {
            PopoverUrlState::Open { staging, month } => Self {
                popover: PopoverUrlState::Open {
                    staging: staging.clone(),
                    month: if forward { month.next() } else { month.prev() },
                },
                ..self.clone()
            },
            PopoverUrlState::Closed => self.clone(),
        }
    }

    /// A picker positioned where this URL left it.
    pub fn picker<F>(&self, options: PickerOptions, on_change: F) -> DateRangePicker<F>
    where
        F: FnMut(DateRange),
    {
        let mut picker = DateRangePicker::new(self.committed.clone(), options, on_change);
        if let PopoverUrlState::Open { staging, .. } = &self.popover {
            picker.resume(staging.clone());
        }
        picker
    }

    /// Popover state after `event` was handled by `picker`. The calendar
    /// follows the staged start unless the user clicked a day in view.
    pub fn capture<F>(&self, picker: &DateRangePicker<F>, event: &PickerEvent) -> PopoverUrlState
    where
        F: FnMut(DateRange),
    {
        let Some(staging) = picker.staging() else {
            return PopoverUrlState::Closed;
        };
        let month = match (&self.popover, event) {
            (PopoverUrlState::Open { month, .. }, PickerEvent::Day(_)) => *month,
            _ => YearMonth::of(staging.staged().start().date_naive()),
        };
        PopoverUrlState::Open {
            staging: staging.clone(),
            month,
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let (from, to) = self.committed.to_millis();
        let mut params = vec![
            ("rating", self.rating.slug().to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ];
        if !self.show_filters {
            params.push(("filters", "hidden".to_string()));
        }
        if let PopoverUrlState::Open { staging, month } = &self.popover {
            let (staged_from, staged_to) = staging.staged().to_millis();
            params.push(("open", "true".to_string()));
            params.push(("staged_from", staged_from.to_string()));
            params.push(("staged_to", staged_to.to_string()));
            params.push(("preset", staging.selected().slug().to_string()));
            if staging.awaiting_end() {
                params.push(("anchor", "true".to_string()));
            }
            params.push(("month", month.to_string()));
        }
        params
    }

    /// Generate the URL string
    pub fn to_url(&self) -> String {
        let query = self
            .params()
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode(v)))
            .join("&");
        format!("/{}/feedback?{}", self.site_prefix, query)
    }

    /// URL that performs `action` from this state.
    pub fn action_url(&self, action: &PageAction) -> String {
        format!("{}&action={}", self.to_url(), encode(&action.to_string()))
    }
}
