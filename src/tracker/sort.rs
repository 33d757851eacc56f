//! SORT: single-pass IoU association over Kalman-predicted boxes.

use ndarray::Array2;
use serde::Deserialize;
use tracing::debug;

use crate::common::Detection;
use crate::kalman::{KalmanConfig, MotionFilter};
use crate::tracker::matching::{self, AssignmentResult, PRECISION};
use crate::tracker::track::Track;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub kalman: KalmanConfig,
    /// Frames a track may go unmatched before it is removed
    pub max_time_lost: u32,
    /// Minimum IoU accepted by the association
    pub match_thresh: f32,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            kalman: KalmanConfig::default(),
            max_time_lost: 15,
            match_thresh: 0.3,
        }
    }
}

/// IoU-only tracker. Every unmatched detection spawns a track; there is
/// no confidence gate and no confirmation stage.
#[derive(Debug)]
pub struct Sort {
    config: SortConfig,
    tracks: Vec<Track>,
}

impl Sort {
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
        }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Read-only view of the current track population.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Process one frame of detections, stamping matched detections
    /// with their track id.
    pub fn update(&mut self, detections: &mut [Detection]) {
        for track in &mut self.tracks {
            track.predict();
        }

        let result = self.assign(detections, self.config.match_thresh);

        for &(det_idx, track_idx) in &result.matches {
            let track = &mut self.tracks[track_idx];
            track.update(&detections[det_idx]);
            detections[det_idx].id = track.id;
        }

        // An unmatched detection is its own confirming match: the new
        // track starts out active and the detection carries its id.
        for &det_idx in &result.unmatched_detections {
            let det = &mut detections[det_idx];
            let mut track = Track::new(MotionFilter::xywh(det.bbox, &self.config.kalman));
            track.mark_active();
            det.id = track.id;
            self.tracks.push(track);
        }

        for &track_idx in &result.unmatched_tracks {
            let track = &mut self.tracks[track_idx];
            if track.time_since_update > self.config.max_time_lost {
                track.mark_removed();
            } else {
                track.mark_lost();
            }
        }

        let before = self.tracks.len();
        self.tracks.retain(|track| !track.is_removed());

        debug!(
            "sort frame: {} matched, {} spawned, {} removed, {} live",
            result.matches.len(),
            result.unmatched_detections.len(),
            before - self.tracks.len(),
            self.tracks.len()
        );
    }

    fn assign(&self, detections: &[Detection], match_thresh: f32) -> AssignmentResult {
        let mut costs = Array2::zeros((detections.len(), self.tracks.len()));
        for (j, track) in self.tracks.iter().enumerate() {
            let track_box = track.bbox();
            for (i, det) in detections.iter().enumerate() {
                costs[[i, j]] = (PRECISION * det.bbox.iou(&track_box)).round() as i64;
            }
        }
        matching::linear_assignment(&costs, (PRECISION * match_thresh).round() as i64)
    }
}
