use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

use super::calendar::CalendarProps;
use super::format::trigger_text;
use super::preset::{PresetResolver, PresetSelection};
use super::range::{local_midnight, DateRange};
use super::staging::SelectionStaging;

#[derive(Debug, Clone, Default)]
pub struct PickerOptions {
    pub min_date: Option<NaiveDate>,
    /// Defaults to the current local date.
    pub max_date: Option<NaiveDate>,
    pub label: Option<String>,
    pub resolver: PresetResolver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerState {
    Closed,
    Open(SelectionStaging),
}

/// Everything a user can do to the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    Trigger,
    Preset(PresetSelection),
    Day(NaiveDate),
    CalendarChange(DateTime<Tz>, Option<DateTime<Tz>>),
    Apply,
    Cancel,
    Backdrop,
    Escape,
}

/// Popover controller for picking a date range.
///
/// The picker is controlled: `value` is whatever the parent last passed in
/// and is never replaced by the picker itself. Applying a staged range
/// hands it to `on_change`; the parent decides whether to feed it back
/// through [`DateRangePicker::set_value`].
pub struct DateRangePicker<F>
where
    F: FnMut(DateRange),
{
    value: DateRange,
    options: PickerOptions,
    state: PickerState,
    on_change: F,
}

impl<F> DateRangePicker<F>
where
    F: FnMut(DateRange),
{
    pub fn new(value: DateRange, options: PickerOptions, on_change: F) -> Self {
        DateRangePicker {
            value,
            options,
            state: PickerState::Closed,
            on_change,
        }
    }

    pub fn value(&self) -> &DateRange {
        &self.value
    }

    pub fn options(&self) -> &PickerOptions {
        &self.options
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PickerState::Open(_))
    }

    pub fn staging(&self) -> Option<&SelectionStaging> {
        match &self.state {
            PickerState::Open(staging) => Some(staging),
            PickerState::Closed => None,
        }
    }

    /// Text on the trigger button. Always reflects the committed value.
    pub fn trigger_text(&self) -> String {
        trigger_text(self.options.label.as_deref(), &self.value)
    }

    /// New committed value from the parent. An open popover restarts from it.
    pub fn set_value(&mut self, value: DateRange, now: DateTime<Tz>) {
        if value == self.value {
            return;
        }
        self.value = value;
        if let PickerState::Open(staging) = &mut self.state {
            staging.on_external_value_change(&self.value, &self.options.resolver, now);
        }
    }

    /// Re-enter the open state with a staging store captured earlier.
    pub fn resume(&mut self, staging: SelectionStaging) {
        self.state = PickerState::Open(staging);
    }

    pub fn open(&mut self, now: DateTime<Tz>) {
        if self.is_open() {
            return;
        }
        let selected = self.options.resolver.reverse_match(&self.value, now);
        self.state = PickerState::Open(SelectionStaging::seeded(&self.value, selected));
    }

    /// Commit the staged range. Returns whether `on_change` fired.
    pub fn apply(&mut self) -> bool {
        match std::mem::replace(&mut self.state, PickerState::Closed) {
            PickerState::Open(staging) => {
                log::debug!("applying staged range {:?}", staging.staged());
                (self.on_change)(staging.staged().clone());
                true
            }
            PickerState::Closed => false,
        }
    }

    /// Close without committing.
    pub fn cancel(&mut self) {
        self.state = PickerState::Closed;
    }

    pub fn calendar_props(&self, now: DateTime<Tz>) -> Option<CalendarProps> {
        let staging = self.staging()?;
        let staged = staging.staged();
        Some(CalendarProps {
            selected_start: staged.start().date_naive(),
            selected_end: if staging.awaiting_end() {
                None
            } else {
                Some(staged.end().date_naive())
            },
            min_date: self.options.min_date,
            max_date: Some(self.options.max_date.unwrap_or_else(|| now.date_naive())),
            selects_range: true,
            months_shown: 2,
        })
    }

    /// Handle one user interaction. Returns `false` when the event does
    /// not apply in the current state and was ignored.
    pub fn dispatch(&mut self, event: PickerEvent, now: DateTime<Tz>) -> bool {
        match event {
            PickerEvent::Trigger => {
                if self.is_open() {
                    self.cancel();
                } else {
                    self.open(now);
                }
                true
            }
            PickerEvent::Apply => self.apply(),
            PickerEvent::Cancel | PickerEvent::Backdrop | PickerEvent::Escape => {
                let was_open = self.is_open();
                self.cancel();
                was_open
            }
            PickerEvent::Preset(selection) => {
                let resolver = self.options.resolver;
                match &mut self.state {
                    PickerState::Open(staging) => {
                        staging.on_preset_click(selection, &resolver, now);
                        true
                    }
                    PickerState::Closed => false,
                }
            }
            PickerEvent::Day(day) => {
                let Some(selection) = self
                    .calendar_props(now)
                    .and_then(|props| props.range_click(day))
                else {
                    return false;
                };
                let tz = now.timezone();
                let start = local_midnight(&tz, selection.0);
                let end = selection.1.map(|end| local_midnight(&tz, end));
                self.dispatch(PickerEvent::CalendarChange(start, end), now)
            }
            PickerEvent::CalendarChange(start, end) => match &mut self.state {
                PickerState::Open(staging) => {
                    staging.on_calendar_range_change(start, end);
                    true
                }
                PickerState::Closed => false,
            },
        }
    }
}
