use chrono::DateTime;
use chrono_tz::Tz;

use super::preset::{PresetResolver, PresetSelection};
use super::range::DateRange;

/// The in-progress selection of an open picker.
///
/// Edits land here and only reach the committed value on apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStaging {
    staged: DateRange,
    selected: PresetSelection,
    // Calendar has a start anchor and is waiting for the second click
    awaiting_end: bool,
}

impl SelectionStaging {
    pub fn seeded(committed: &DateRange, selected: PresetSelection) -> Self {
        SelectionStaging {
            staged: committed.clone(),
            selected,
            awaiting_end: false,
        }
    }

    /// Rebuild a staging store from its parts, e.g. after a round trip
    /// through a URL. A pending calendar anchor only makes sense on a
    /// zero-width range and is dropped otherwise.
    pub fn restore(staged: DateRange, selected: PresetSelection, awaiting_end: bool) -> Self {
        let awaiting_end = awaiting_end && staged.is_zero_width();
        SelectionStaging {
            staged,
            selected,
            awaiting_end,
        }
    }

    pub fn staged(&self) -> &DateRange {
        &self.staged
    }

    pub fn selected(&self) -> PresetSelection {
        self.selected
    }

    pub fn awaiting_end(&self) -> bool {
        self.awaiting_end
    }

    pub fn on_external_value_change(
        &mut self,
        committed: &DateRange,
        resolver: &PresetResolver,
        now: DateTime<Tz>,
    ) {
        self.staged = committed.clone();
        self.selected = resolver.reverse_match(committed, now);
        self.awaiting_end = false;
    }

    pub fn on_preset_click(
        &mut self,
        selection: PresetSelection,
        resolver: &PresetResolver,
        now: DateTime<Tz>,
    ) {
        self.selected = selection;
        if let Some(range) = resolver.resolve_selection(selection, now) {
            self.staged = range;
            self.awaiting_end = false;
        }
    }

    /// Calendar reported a new selection. Without an end the range is
    /// zero-width at `start` until the second click arrives.
    pub fn on_calendar_range_change(&mut self, start: DateTime<Tz>, end: Option<DateTime<Tz>>) {
        self.selected = PresetSelection::Custom;
        match end {
            Some(end) => {
                if end < start {
                    log::debug!("calendar reported end {} before start {}", end, start);
                }
                self.staged = DateRange::ordered(start, end);
                self.awaiting_end = false;
            }
            None => {
                self.staged = DateRange::instant(start);
                self.awaiting_end = true;
            }
        }
    }
}
