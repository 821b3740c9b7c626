use chrono::DateTime;
use chrono_tz::Tz;
use maud::{html, Markup};

use crate::range_picker::calendar::WEEKDAY_HEADERS;
use crate::range_picker::{
    format_date, DateRange, DateRangePicker, DayCell, MonthGrid, Preset, PresetSelection,
};

use super::url_state::{FeedbackUrlState, PageAction, PopoverUrlState};

/// Trigger button plus, when open, the preset list, calendar and
/// cancel/apply bar. Every control is a link carrying its action.
pub fn render_picker<F>(
    state: &FeedbackUrlState,
    picker: &DateRangePicker<F>,
    now: DateTime<Tz>,
) -> Markup
where
    F: FnMut(DateRange),
{
    let open = picker.is_open();
    let dropdown = match (picker.staging(), &state.popover) {
        (Some(staging), PopoverUrlState::Open { month, .. }) => Some((staging, *month)),
        _ => None,
    };

    html! {
        .date-range-picker {
            a.picker-trigger href=(state.action_url(&PageAction::Trigger)) {
                span.picker-text { (picker.trigger_text()) }
                span.picker-chevron .rotated[open] { "\u{25BE}" }
            }
            @if let Some((staging, month)) = dropdown {
                a.picker-backdrop href=(state.action_url(&PageAction::Backdrop)) {}
                .picker-dropdown {
                    .picker-presets {
                        @for preset in Preset::ALL {
                            a.picker-preset
                                .active[staging.selected() == PresetSelection::Preset(preset)]
                                href=(state.action_url(&PageAction::Preset(preset.into()))) {
                                (preset.label())
                            }
                        }
                    }
                    .picker-calendar {
                        @if let Some(props) = picker.calendar_props(now) {
                            .calendar-nav {
                                a.calendar-prev href=(state.action_url(&PageAction::PrevMonth)) { "\u{2039}" }
                                a.calendar-next href=(state.action_url(&PageAction::NextMonth)) { "\u{203A}" }
                            }
                            .calendar-months {
                                @for grid in props.visible_months(month) {
                                    (render_month(state, &grid))
                                }
                            }
                        }
                        .picker-footer {
                            .picker-staged {
                                input.picker-staged-start type="text" readonly value=(format_date(staging.staged().start()));
                                span.picker-staged-separator { "-" }
                                input.picker-staged-end type="text" readonly value=(format_date(staging.staged().end()));
                            }
                            .picker-actions {
                                a.picker-cancel href=(state.action_url(&PageAction::Cancel)) { "Cancel" }
                                a.picker-apply href=(state.action_url(&PageAction::Apply)) { "Apply" }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_month(state: &FeedbackUrlState, grid: &MonthGrid) -> Markup {
    html! {
        table.calendar-month {
            caption { (grid.month.title()) }
            thead {
                tr {
                    @for name in WEEKDAY_HEADERS {
                        th { (name) }
                    }
                }
            }
            tbody {
                @for week in &grid.weeks {
                    tr {
                        @for cell in week {
                            (render_day(state, cell))
                        }
                    }
                }
            }
        }
    }
}

fn render_day(state: &FeedbackUrlState, cell: &DayCell) -> Markup {
    html! {
        td.calendar-day
            .outside-month[!cell.in_month]
            .disabled[!cell.selectable]
            .in-range[cell.in_range]
            .range-start[cell.range_start]
            .range-end[cell.range_end] {
            @if cell.selectable {
                a href=(state.action_url(&PageAction::Day(cell.date))) { (cell.date.format("%-d")) }
            } @else {
                span { (cell.date.format("%-d")) }
            }
        }
    }
}
