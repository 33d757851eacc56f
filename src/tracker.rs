//! Track lifecycle management and the per-frame tracker pipelines.

mod botsort;
mod factory;
mod matching;
mod sort;
mod track;

pub use botsort::{BotSort, BotSortConfig, BotSortTrack};
pub use factory::{Tracker, TrackerConfig, TrackerError, build_tracker};
pub use matching::{AssignmentResult, PRECISION, linear_assignment};
pub use sort::{Sort, SortConfig};
pub use track::{MAX_HISTORY, Track, TrackState, reset_track_id_counter};
