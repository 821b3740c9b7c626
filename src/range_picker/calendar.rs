//! The calendar the picker drives.
//!
//! The picker only hands the calendar a [`CalendarProps`] and listens for
//! `(start, end?)` selections back. Month grids are laid out Sunday-first
//! to agree with the week presets.

use std::fmt;

use chrono::{Datelike, Duration, Months, NaiveDate};

use super::range::SUPPORTED_YEARS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarProps {
    pub selected_start: NaiveDate,
    /// `None` while a range selection only has its anchor.
    pub selected_end: Option<NaiveDate>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub selects_range: bool,
    pub months_shown: u32,
}

impl CalendarProps {
    pub fn is_selectable(&self, day: NaiveDate) -> bool {
        self.min_date.map_or(true, |min| day >= min) && self.max_date.map_or(true, |max| day <= max)
    }

    /// Selection after clicking `day`, or `None` when the day is disabled.
    ///
    /// A pending anchor is completed by a click on or after it; a click
    /// before it moves the anchor. Otherwise every click starts over.
    pub fn range_click(&self, day: NaiveDate) -> Option<(NaiveDate, Option<NaiveDate>)> {
        if !self.is_selectable(day) {
            return None;
        }
        if !self.selects_range {
            return Some((day, Some(day)));
        }
        match self.selected_end {
            None if day >= self.selected_start => Some((self.selected_start, Some(day))),
            _ => Some((day, None)),
        }
    }

    /// The months to render, starting at `first`.
    pub fn visible_months(&self, first: YearMonth) -> Vec<MonthGrid> {
        let mut months = Vec::with_capacity(self.months_shown as usize);
        let mut month = first;
        for _ in 0..self.months_shown.max(1) {
            months.push(self.month_grid(month));
            month = month.next();
        }
        months
    }

    pub fn month_grid(&self, month: YearMonth) -> MonthGrid {
        let first = month.first_day();
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        let grid_start = first
            .checked_sub_signed(Duration::days(first.weekday().num_days_from_sunday() as i64))
            .unwrap_or(first);
        let grid_end = last
            .checked_add_signed(Duration::days(6 - last.weekday().num_days_from_sunday() as i64))
            .unwrap_or(last);

        let cells: Vec<DayCell> = grid_start
            .iter_days()
            .take_while(|day| *day <= grid_end)
            .map(|date| self.day_cell(month, date))
            .collect();

        MonthGrid {
            month,
            weeks: cells.chunks(7).map(|week| week.to_vec()).collect(),
        }
    }

    fn day_cell(&self, month: YearMonth, date: NaiveDate) -> DayCell {
        let start = self.selected_start;
        let (range_end, in_range) = match self.selected_end {
            Some(end) => (date == end, date >= start && date <= end),
            None => (false, date == start),
        };
        DayCell {
            date,
            in_month: YearMonth::of(date) == month,
            selectable: self.is_selectable(date),
            range_start: date == start,
            range_end,
            in_range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth(date.with_day(1).unwrap_or(date))
    }

    /// Parses `"2024-03"`. Years outside [`SUPPORTED_YEARS`] are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .ok()
            .filter(|date| SUPPORTED_YEARS.contains(&date.year()))
            .map(YearMonth)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Saturates at the last representable month.
    pub fn next(&self) -> Self {
        self.0
            .checked_add_months(Months::new(1))
            .map(YearMonth)
            .unwrap_or(*self)
    }

    /// Saturates at the first representable month.
    pub fn prev(&self) -> Self {
        self.0
            .checked_sub_months(Months::new(1))
            .map(YearMonth)
            .unwrap_or(*self)
    }

    /// `"March 2024"`
    pub fn title(&self) -> String {
        self.0.format("%B %Y").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub selectable: bool,
    pub range_start: bool,
    pub range_end: bool,
    pub in_range: bool,
}

#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub month: YearMonth,
    pub weeks: Vec<Vec<DayCell>>,
}

pub const WEEKDAY_HEADERS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
