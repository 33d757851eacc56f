//! Kalman-based motion estimation for bounding-box tracks.

mod filter;
mod xysr;
mod xywh;

pub use xysr::KalmanXysr;
pub use xywh::KalmanXywh;

use serde::Deserialize;

use crate::common::Rect;

/// Numeric estimator settings, shared by both parameterizations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KalmanConfig {
    pub time_step: u32,
    pub process_noise_scale: f32,
    pub measurement_noise_scale: f32,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            time_step: 1,
            process_noise_scale: 1.0,
            measurement_noise_scale: 1.0,
        }
    }
}

/// Motion model of a single track.
///
/// Tagged union over the two state parameterizations; each track owns
/// exactly one variant and dispatches through it.
#[derive(Debug, Clone)]
pub enum MotionFilter {
    /// 8-state center/width/height model
    Xywh(KalmanXywh),
    /// 7-state center/area/aspect model
    Xysr(KalmanXysr),
}

impl MotionFilter {
    pub fn xywh(rect: Rect, config: &KalmanConfig) -> Self {
        Self::Xywh(KalmanXywh::new(rect, config))
    }

    pub fn xysr(rect: Rect, config: &KalmanConfig) -> Self {
        Self::Xysr(KalmanXysr::new(rect, config))
    }

    /// Advance one time step and return the predicted box.
    pub fn predict(&mut self) -> Rect {
        match self {
            Self::Xywh(kf) => kf.predict(),
            Self::Xysr(kf) => kf.predict(),
        }
    }

    /// Incorporate a measured box.
    pub fn update(&mut self, rect: Rect) {
        match self {
            Self::Xywh(kf) => kf.update(rect),
            Self::Xysr(kf) => kf.update(rect),
        }
    }

    /// Zero the stateful shape velocities, suppressing drift while the
    /// track goes unobserved.
    pub fn reset(&mut self) {
        match self {
            Self::Xywh(kf) => kf.reset(),
            Self::Xysr(kf) => kf.reset(),
        }
    }

    /// Current posterior box.
    pub fn bbox(&self) -> Rect {
        match self {
            Self::Xywh(kf) => kf.bbox(),
            Self::Xysr(kf) => kf.bbox(),
        }
    }

    /// Current posterior center velocity.
    pub fn velocity(&self) -> (f32, f32) {
        match self {
            Self::Xywh(kf) => kf.velocity(),
            Self::Xysr(kf) => kf.velocity(),
        }
    }
}
