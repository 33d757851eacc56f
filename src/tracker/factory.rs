//! Construction of tracker instances from parsed configuration.

use serde::Deserialize;
use thiserror::Error;

use crate::common::Detection;
use crate::tracker::botsort::{BotSort, BotSortConfig};
use crate::tracker::sort::{Sort, SortConfig};
use crate::tracker::track::Track;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("unknown tracker name `{0}`")]
    UnknownTracker(String),
    #[error("invalid tracker configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Fully-parsed tracker configuration, tagged by tracker name.
///
/// The JSON shape keys the config block by the tracker it belongs to,
/// e.g. `{"sort": {"match_thresh": 0.4}}` or `{"botsort": {}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerConfig {
    Sort(SortConfig),
    BotSort(BotSortConfig),
}

impl TrackerConfig {
    /// Parse a configuration document. Unknown tracker names and
    /// malformed values are fatal.
    pub fn from_json(data: &str) -> Result<Self, TrackerError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Default configuration for a recognized tracker name.
    pub fn from_name(name: &str) -> Result<Self, TrackerError> {
        match name {
            "sort" => Ok(Self::Sort(SortConfig::default())),
            "botsort" => Ok(Self::BotSort(BotSortConfig::default())),
            _ => Err(TrackerError::UnknownTracker(name.to_owned())),
        }
    }
}

/// Tracker variant. Both variants expose the same per-frame surface;
/// dispatch is static over this union.
#[derive(Debug)]
pub enum Tracker {
    Sort(Sort),
    BotSort(BotSort),
}

impl Tracker {
    /// Process one frame of detections.
    pub fn update(&mut self, detections: &mut [Detection]) {
        match self {
            Self::Sort(tracker) => tracker.update(detections),
            Self::BotSort(tracker) => tracker.update(detections),
        }
    }

    /// Read-only view of the current track population.
    pub fn tracks(&self) -> Vec<&Track> {
        match self {
            Self::Sort(tracker) => tracker.tracks().iter().collect(),
            Self::BotSort(tracker) => tracker.tracks().iter().map(|t| &t.track).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sort(_) => "sort",
            Self::BotSort(_) => "botsort",
        }
    }
}

/// Build the tracker a configuration describes, handing ownership to
/// the caller.
pub fn build_tracker(config: TrackerConfig) -> Tracker {
    match config {
        TrackerConfig::Sort(config) => Tracker::Sort(Sort::new(config)),
        TrackerConfig::BotSort(config) => Tracker::BotSort(BotSort::new(config)),
    }
}
