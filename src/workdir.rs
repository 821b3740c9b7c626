use std::{
    fs::File,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::feedback::FeedbackItems;
use crate::range_picker::{PickerOptions, PresetResolver};

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_range_days() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub slug: String,
    pub label: String,
    /// IANA name; the calendar and presets follow this zone's local days.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub all_time_start: Option<NaiveDate>,
    #[serde(default = "default_range_days")]
    pub default_range_days: u32,
}

impl Config {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimezone(self.timezone.clone()))
    }

    pub fn resolver(&self) -> PresetResolver {
        match self.all_time_start {
            Some(start) => PresetResolver::new(start),
            None => PresetResolver::default(),
        }
    }

    pub fn picker_options(&self) -> PickerOptions {
        PickerOptions {
            resolver: self.resolver(),
            ..PickerOptions::default()
        }
    }
}

#[derive(Clone)]
pub struct WorkDir {
    pub path: Box<Path>,
    pub config: Config,
    pub tz: Tz,
    pub feedback: FeedbackItems,
    pub last_seen_modified: u64,
    pub loaded_at: DateTime<Utc>,
}

pub fn feedback_modified_secs(path: &Path) -> u64 {
    std::fs::metadata(path.join("feedback.json"))
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl WorkDir {
    pub fn new<P: Into<PathBuf>>(p: P) -> Result<Self> {
        let path = p.into();
        let config_path = path.join("config.json");
        let config_file = File::open(config_path).context("Unable to open config.json")?;
        let config: Config =
            serde_json::from_reader(config_file).context("config.json was not well-formatted")?;
        let tz = config.tz()?;

        let feedback_path = path.join("feedback.json");
        let mut feedback: FeedbackItems = if feedback_path.exists() {
            let feedback_file =
                File::open(&feedback_path).context("Unable to open feedback.json")?;
            serde_json::from_reader(feedback_file)
                .context("feedback.json was not well-formatted")?
        } else {
            log::warn!(
                "No feedback.json in {}, starting empty",
                path.to_string_lossy()
            );
            FeedbackItems::default()
        };
        feedback.sort();

        let last_seen_modified = feedback_modified_secs(&path);

        log::info!(
            "Loaded {} feedback items for {} ({})",
            feedback.len(),
            config.slug,
            config.timezone
        );

        Ok(WorkDir {
            path: path.into(),
            config,
            tz,
            feedback,
            last_seen_modified,
            loaded_at: Utc::now(),
        })
    }

    /// Current moment on this work dir's local calendar.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}
