use std::cmp::Reverse;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::range_picker::DateRange;
use crate::serde::{
    deserialize_map_values, deserialize_utc, serialize_map_values, serialize_utc, GetKey,
};

/// A rated chatbot answer as exported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedQuery {
    pub feedback_id: String,
    pub message_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub query: String,
    pub response: String,
    /// 1 = thumbs up, 0 = thumbs down
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(serialize_with = "serialize_utc")]
    #[serde(deserialize_with = "deserialize_utc")]
    pub created_at: DateTime<Utc>,
}

impl FlaggedQuery {
    pub fn is_positive(&self) -> bool {
        self.rating == 1
    }

    pub fn is_negative(&self) -> bool {
        self.rating == 0
    }
}

impl GetKey for FlaggedQuery {
    fn get_key(&self) -> &str {
        &self.feedback_id
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackItems {
    #[serde(serialize_with = "serialize_map_values")]
    #[serde(deserialize_with = "deserialize_map_values")]
    pub items: IndexMap<String, FlaggedQuery>,
}

impl FeedbackItems {
    /// Newest first.
    pub fn sort(&mut self) {
        self.items
            .sort_by(|_k1, v1, _k2, v2| v2.created_at.cmp(&v1.created_at));
    }

    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.items.values().map(|x| x.created_at).max()
    }

    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        self.items.values().map(|x| x.created_at).min()
    }
}

impl From<Vec<FlaggedQuery>> for FeedbackItems {
    fn from(value: Vec<FlaggedQuery>) -> Self {
        FeedbackItems {
            items: value
                .into_iter()
                .map(|x| (x.feedback_id.clone(), x))
                .collect(),
        }
    }
}

impl Deref for FeedbackItems {
    type Target = IndexMap<String, FlaggedQuery>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingFilter {
    #[default]
    All,
    Positive,
    Negative,
}

impl RatingFilter {
    pub const ALL: [RatingFilter; 3] = [RatingFilter::All, RatingFilter::Positive, RatingFilter::Negative];

    pub fn slug(&self) -> &'static str {
        match self {
            RatingFilter::All => "all",
            RatingFilter::Positive => "positive",
            RatingFilter::Negative => "negative",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingFilter::All => "All Feedback",
            RatingFilter::Positive => "Positive Only",
            RatingFilter::Negative => "Negative Only",
        }
    }

    pub fn matches(&self, item: &FlaggedQuery) -> bool {
        match self {
            RatingFilter::All => true,
            RatingFilter::Positive => item.is_positive(),
            RatingFilter::Negative => item.is_negative(),
        }
    }
}

impl fmt::Display for RatingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for RatingFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RatingFilter::ALL
            .iter()
            .copied()
            .find(|r| r.slug() == s)
            .ok_or_else(|| Error::Context(format!("Unknown rating filter: {}", s)))
    }
}

/// The committed filter of the triage page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub rating: RatingFilter,
    pub range: DateRange,
}

impl FeedbackFilter {
    /// The range is widened to whole local days before comparing, so a
    /// range ending at midnight still covers that entire day.
    pub fn matches(&self, item: &FlaggedQuery) -> bool {
        self.rating.matches(item) && self.range.day_bounds().contains(&item.created_at)
    }

    /// Matching items, newest first.
    pub fn apply<'a, I>(&self, items: I) -> Vec<&'a FlaggedQuery>
    where
        I: IntoIterator<Item = &'a FlaggedQuery>,
    {
        let bounds = self.range.day_bounds();
        items
            .into_iter()
            .filter(|item| self.rating.matches(item) && bounds.contains(&item.created_at))
            .sorted_by_key(|item| Reverse(item.created_at))
            .collect()
    }
}

/// The range the page starts with and returns to on "clear filters".
pub fn default_range(now: DateTime<Tz>, days: u32) -> DateRange {
    let start = now
        .checked_sub_signed(Duration::days(days as i64))
        .unwrap_or(now);
    DateRange::ordered(start, now)
}

/// Totals over every item, regardless of the active filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedbackStats {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
}

impl FeedbackStats {
    pub fn collect<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a FlaggedQuery>,
    {
        items
            .into_iter()
            .fold(FeedbackStats::default(), |mut stats, item| {
                stats.total += 1;
                if item.is_positive() {
                    stats.positive += 1;
                } else if item.is_negative() {
                    stats.negative += 1;
                }
                stats
            })
    }

    /// Share of positive ratings, rounded to whole percent.
    pub fn positive_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.positive as f64 / self.total as f64) * 100.0).round() as u32
    }
}
