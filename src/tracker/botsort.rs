//! BotSort: three-stage cascaded association with appearance fusion.

use ndarray::Array2;
use serde::Deserialize;
use tracing::debug;

use crate::common::{Detection, Rect, vector};
use crate::kalman::{KalmanConfig, MotionFilter};
use crate::tracker::matching::{self, AssignmentResult, PRECISION};
use crate::tracker::track::Track;

/// Weight of the track side when folding detection features.
const FEATURE_EMA_ALPHA: f32 = 0.9;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotSortConfig {
    pub kalman: KalmanConfig,
    /// Frames a lost track survives before removal
    pub max_time_lost: u32,
    /// Confidence floor of the first-stage detection tier
    pub track_high_thresh: f32,
    /// Confidence floor of the second-stage detection tier
    pub track_low_thresh: f32,
    /// Confidence a leftover detection needs to spawn a track
    pub new_track_thresh: f32,
    pub first_match_thresh: f32,
    pub second_match_thresh: f32,
    pub unconfirmed_match_thresh: f32,
    /// Box overlap required before appearance is consulted
    pub proximity_thresh: f32,
    /// Cosine similarity below which appearance is ignored
    pub appearance_thresh: f32,
}

impl Default for BotSortConfig {
    fn default() -> Self {
        Self {
            kalman: KalmanConfig::default(),
            max_time_lost: 15,
            track_high_thresh: 0.5,
            track_low_thresh: 0.1,
            new_track_thresh: 0.6,
            first_match_thresh: 0.3,
            second_match_thresh: 0.1,
            unconfirmed_match_thresh: 0.2,
            proximity_thresh: 0.5,
            appearance_thresh: 0.9,
        }
    }
}

/// Track carrying an appearance embedding maintained as an exponential
/// moving average of its matched detections' features.
#[derive(Debug, Clone)]
pub struct BotSortTrack {
    pub track: Track,
    pub features: Vec<f32>,
}

impl BotSortTrack {
    pub fn new(rect: Rect, features: Vec<f32>, config: &KalmanConfig) -> Self {
        Self {
            track: Track::new(MotionFilter::xywh(rect, config)),
            features,
        }
    }

    pub fn predict(&mut self) {
        self.track.predict();
    }

    /// Fold the detection's features into the track's, then apply the
    /// base update.
    pub fn update(&mut self, det: &Detection) {
        if self.features.is_empty() {
            self.features = det.features.clone();
        } else if !det.features.is_empty() {
            self.features =
                vector::ema_normalized(&self.features, &det.features, FEATURE_EMA_ALPHA);
        }
        self.track.update(det);
    }
}

/// Cascaded tracker: high-confidence detections are matched against
/// active and lost tracks first, low-confidence ones recover tracks the
/// first stage missed, and the remainder confirms newborn tracks.
#[derive(Debug)]
pub struct BotSort {
    config: BotSortConfig,
    tracks: Vec<BotSortTrack>,
}

impl BotSort {
    pub fn new(config: BotSortConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
        }
    }

    pub fn config(&self) -> &BotSortConfig {
        &self.config
    }

    /// Read-only view of the current track population.
    pub fn tracks(&self) -> &[BotSortTrack] {
        &self.tracks
    }

    /// Process one frame of detections, stamping matched detections
    /// with their track id.
    pub fn update(&mut self, detections: &mut [Detection]) {
        // Confidence tiers. Detections below the low floor skip straight
        // to the confirmation stage.
        let mut high = Vec::new();
        let mut low = Vec::new();
        let mut carried = Vec::new();
        for (i, det) in detections.iter().enumerate() {
            if det.confidence >= self.config.track_high_thresh {
                high.push(i);
            } else if det.confidence >= self.config.track_low_thresh {
                low.push(i);
            } else {
                carried.push(i);
            }
        }

        // Track pools by state at frame start. Lost tracks join the
        // first stage so they can re-acquire their object.
        let mut first_pool = Vec::new();
        let mut lost_pool = Vec::new();
        let mut unconfirmed_pool = Vec::new();
        for (j, track) in self.tracks.iter().enumerate() {
            if track.track.is_active() {
                first_pool.push(j);
            } else if track.track.is_lost() {
                lost_pool.push(j);
                first_pool.push(j);
            } else {
                unconfirmed_pool.push(j);
            }
        }

        for track in &mut self.tracks {
            track.predict();
        }

        // Stage 1: high-score detections, IoU fused with appearance.
        let first = self.assign(
            detections,
            &high,
            &first_pool,
            self.config.first_match_thresh,
            self.config.proximity_thresh,
            self.config.appearance_thresh,
        );
        for &(di, tj) in &first.matches {
            let det_idx = high[di];
            let track = &mut self.tracks[first_pool[tj]];
            track.update(&detections[det_idx]);
            detections[det_idx].id = track.track.id;
        }

        // Only tracks that were still active fall through to stage 2;
        // lost tracks that failed stage 1 stay in the lost pool.
        let second_pool: Vec<usize> = first
            .unmatched_tracks
            .iter()
            .map(|&tj| first_pool[tj])
            .filter(|&j| self.tracks[j].track.is_active())
            .collect();
        carried.extend(first.unmatched_detections.iter().map(|&di| high[di]));

        // Stage 2: low-score detections, IoU only.
        let second = self.assign(
            detections,
            &low,
            &second_pool,
            self.config.second_match_thresh,
            0.0,
            1.0,
        );
        for &(di, tj) in &second.matches {
            let det_idx = low[di];
            let track = &mut self.tracks[second_pool[tj]];
            track.update(&detections[det_idx]);
            detections[det_idx].id = track.track.id;
        }
        for &tj in &second.unmatched_tracks {
            let track_idx = second_pool[tj];
            self.tracks[track_idx].track.mark_lost();
            lost_pool.push(track_idx);
        }
        carried.extend(second.unmatched_detections.iter().map(|&di| low[di]));

        // Stage 3: leftover detections confirm newborn tracks. A
        // newborn that fails its confirmation match is dropped.
        let third = self.assign(
            detections,
            &carried,
            &unconfirmed_pool,
            self.config.unconfirmed_match_thresh,
            self.config.proximity_thresh,
            self.config.appearance_thresh,
        );
        for &(di, tj) in &third.matches {
            let det_idx = carried[di];
            let track = &mut self.tracks[unconfirmed_pool[tj]];
            track.update(&detections[det_idx]);
            detections[det_idx].id = track.track.id;
        }
        for &tj in &third.unmatched_tracks {
            self.tracks[unconfirmed_pool[tj]].track.mark_removed();
        }

        // Birth: confident leftovers spawn unconfirmed tracks carrying
        // their detection's features.
        let mut spawned = 0usize;
        for &di in &third.unmatched_detections {
            let det = &detections[carried[di]];
            if det.confidence > self.config.new_track_thresh {
                self.tracks.push(BotSortTrack::new(
                    det.bbox,
                    det.features.clone(),
                    &self.config.kalman,
                ));
                spawned += 1;
            }
        }

        for &track_idx in &lost_pool {
            let track = &mut self.tracks[track_idx].track;
            if track.time_since_update > self.config.max_time_lost {
                track.mark_removed();
            }
        }

        let before = self.tracks.len();
        self.tracks.retain(|track| !track.track.is_removed());

        debug!(
            "botsort frame: {} matched, {} spawned, {} removed, {} live",
            first.matches.len() + second.matches.len() + third.matches.len(),
            spawned,
            before - self.tracks.len(),
            self.tracks.len()
        );
    }

    fn assign(
        &self,
        detections: &[Detection],
        det_indices: &[usize],
        track_indices: &[usize],
        match_thresh: f32,
        proximity_thresh: f32,
        appearance_thresh: f32,
    ) -> AssignmentResult {
        let mut costs = Array2::zeros((det_indices.len(), track_indices.len()));
        for (j, &track_idx) in track_indices.iter().enumerate() {
            let track = &self.tracks[track_idx];
            let track_box = track.track.bbox();

            for (i, &det_idx) in det_indices.iter().enumerate() {
                let det = &detections[det_idx];
                let iou = det.bbox.iou(&track_box);

                // Appearance only weighs in when the boxes are already
                // close and the embeddings agree strongly.
                let mut similarity = 0.0f32;
                if !det.features.is_empty() && !track.features.is_empty() {
                    let proximity = det.bbox.area() / det.bbox.union(&track_box).area();
                    if proximity > proximity_thresh {
                        let cos = vector::cosine_similarity(&det.features, &track.features);
                        if cos > appearance_thresh {
                            similarity = cos;
                        }
                    }
                }

                costs[[i, j]] = (PRECISION * iou.max(similarity)).round() as i64;
            }
        }
        matching::linear_assignment(&costs, (PRECISION * match_thresh).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_adopts_features_when_track_has_none() {
        let mut track = BotSortTrack::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Vec::new(),
            &KalmanConfig::default(),
        );
        track.predict();

        let det = Detection::new(1, Rect::new(0.0, 0.0, 10.0, 10.0), 0.9)
            .with_features(vec![1.0, 0.0]);
        track.update(&det);
        assert_eq!(track.features, vec![1.0, 0.0]);
    }

    #[test]
    fn test_update_blends_features_toward_track_side() {
        let mut track = BotSortTrack::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![1.0, 0.0],
            &KalmanConfig::default(),
        );
        track.predict();

        let det = Detection::new(1, Rect::new(0.0, 0.0, 10.0, 10.0), 0.9)
            .with_features(vec![0.0, 1.0]);
        track.update(&det);

        assert!(track.features[0] > track.features[1]);
        let norm = track.features.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_update_keeps_features_for_featureless_detection() {
        let mut track = BotSortTrack::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![0.6, 0.8],
            &KalmanConfig::default(),
        );
        track.predict();

        let det = Detection::new(1, Rect::new(0.0, 0.0, 10.0, 10.0), 0.9);
        track.update(&det);
        assert_eq!(track.features, vec![0.6, 0.8]);
    }

    #[test]
    fn test_birth_is_unconfirmed() {
        let mut tracker = BotSort::new(BotSortConfig::default());
        let mut detections = vec![Detection::new(1, Rect::new(10.0, 10.0, 50.0, 50.0), 0.9)];
        tracker.update(&mut detections);

        assert_eq!(tracker.tracks().len(), 1);
        assert_eq!(tracker.tracks()[0].track.state, crate::tracker::TrackState::New);
        // The detection is only stamped once the track confirms.
        assert_eq!(detections[0].id, 0);
    }
}
