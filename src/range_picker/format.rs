use chrono::DateTime;
use chrono_tz::Tz;

use super::range::DateRange;

// Month names are always English; chrono ignores the host locale.
const DATE_FORMAT: &str = "%b %-d, %Y";

/// `"Mar 15, 2024"`
pub fn format_date(date: &DateTime<Tz>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `"Mar 1, 2024 - Mar 15, 2024"`
pub fn format_range(range: &DateRange) -> String {
    format!("{} - {}", format_date(range.start()), format_date(range.end()))
}

/// Text for the trigger button. An explicit label wins over the range.
pub fn trigger_text(label: Option<&str>, committed: &DateRange) -> String {
    match label {
        Some(label) => label.to_string(),
        None => format_range(committed),
    }
}
