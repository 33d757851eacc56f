//! Multi-object tracking core.
//!
//! For each frame, the tracker ingests a batch of [`Detection`]s and
//! annotates the matched ones with persistent track ids. Two tracker
//! variants are provided: [`Sort`] (single-pass IoU association) and
//! [`BotSort`] (cascaded association with appearance fusion). Both drive
//! Kalman constant-velocity motion models and share the same track
//! lifecycle (`New -> Tracked -> Lost -> Removed`).
//!
//! ```no_run
//! use mot_rs::{Detection, Rect, TrackerConfig, build_tracker};
//!
//! let config = TrackerConfig::from_name("sort").unwrap();
//! let mut tracker = build_tracker(config);
//!
//! let mut detections = vec![Detection::new(1, Rect::new(10.0, 10.0, 50.0, 50.0), 0.9)];
//! tracker.update(&mut detections);
//! assert_ne!(detections[0].id, 0);
//! ```

pub mod common;
pub mod kalman;
pub mod tracker;

pub use common::{Detection, Rect};
pub use kalman::{KalmanConfig, KalmanXysr, KalmanXywh, MotionFilter};
pub use tracker::{
    BotSort, BotSortConfig, BotSortTrack, Sort, SortConfig, Track, TrackState, Tracker,
    TrackerConfig, TrackerError, build_tracker, reset_track_id_counter,
};
