//! Headless date range picker.
//!
//! The picker keeps two values apart: the committed range owned by the
//! caller and a staged range edited while the popover is open. Presets and
//! calendar clicks only touch the staged range; apply hands it back to the
//! caller through a callback.

pub mod calendar;
pub mod format;
pub mod picker;
pub mod preset;
pub mod range;
pub mod staging;

pub use calendar::{CalendarProps, DayCell, MonthGrid, YearMonth};
pub use format::{format_date, format_range, trigger_text};
pub use picker::{DateRangePicker, PickerEvent, PickerOptions, PickerState};
pub use preset::{Preset, PresetResolver, PresetSelection};
pub use range::{local_midnight, DateRange};
pub use staging::SelectionStaging;
