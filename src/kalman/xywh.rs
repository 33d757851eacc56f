use ndarray::{Array1, Array2};

use super::KalmanConfig;
use super::filter::LinearKalman;
use crate::common::Rect;

const STATE_DIM: usize = 8;
const MEASURE_DIM: usize = 4;

const STD_WEIGHT_POSITION: f32 = 5e-2;
const STD_WEIGHT_VELOCITY: f32 = 625e-5;

/// Constant-velocity estimator over `[xc, yc, w, h, dxc, dyc, dw, dh]`.
///
/// All four measured components carry a velocity term; the measurement
/// projects the first four state components.
#[derive(Debug, Clone)]
pub struct KalmanXywh {
    kf: LinearKalman,
}

impl KalmanXywh {
    pub fn new(rect: Rect, config: &KalmanConfig) -> Self {
        let time_step = config.time_step as f32;

        let mut transition: Array2<f32> = Array2::eye(STATE_DIM);
        for i in 0..STATE_DIM - MEASURE_DIM {
            transition[[i, MEASURE_DIM + i]] = time_step;
        }

        let mut measurement: Array2<f32> = Array2::zeros((MEASURE_DIM, STATE_DIM));
        for i in 0..MEASURE_DIM {
            measurement[[i, i]] = 1.0;
        }

        let mut process_noise: Array2<f32> = Array2::eye(STATE_DIM) * config.process_noise_scale;
        for i in 0..MEASURE_DIM {
            process_noise[[i, i]] *= STD_WEIGHT_POSITION;
        }
        for i in MEASURE_DIM..STATE_DIM {
            process_noise[[i, i]] *= STD_WEIGHT_VELOCITY;
        }

        let mut measurement_noise: Array2<f32> =
            Array2::eye(MEASURE_DIM) * config.measurement_noise_scale;
        for i in 0..MEASURE_DIM {
            measurement_noise[[i, i]] *= STD_WEIGHT_POSITION;
        }

        // Birth uncertainty scales with the measured box extent,
        // alternating width/height by component parity.
        let mut error_cov: Array2<f32> = Array2::zeros((STATE_DIM, STATE_DIM));
        for i in 0..MEASURE_DIM {
            let dim = if i % 2 == 1 { rect.height } else { rect.width };
            error_cov[[i, i]] = (2.0 * STD_WEIGHT_POSITION * dim).powi(2);
        }
        for i in MEASURE_DIM..STATE_DIM {
            let dim = if i % 2 == 1 { rect.height } else { rect.width };
            error_cov[[i, i]] = (10.0 * STD_WEIGHT_VELOCITY * dim).powi(2);
        }

        let (xc, yc) = rect.center();
        let mut state: Array1<f32> = Array1::zeros(STATE_DIM);
        state[0] = xc;
        state[1] = yc;
        state[2] = rect.width;
        state[3] = rect.height;

        Self {
            kf: LinearKalman::new(
                transition,
                measurement,
                process_noise,
                measurement_noise,
                error_cov,
                state,
            ),
        }
    }

    fn measure(rect: Rect) -> [f32; 4] {
        let (xc, yc) = rect.center();
        [xc, yc, rect.width, rect.height]
    }

    /// Advance one time step and return the predicted box.
    pub fn predict(&mut self) -> Rect {
        Self::box_of(self.kf.predict())
    }

    /// Incorporate a measured box.
    pub fn update(&mut self, rect: Rect) {
        self.kf.correct(Self::measure(rect));
    }

    /// Zero the width/height velocities.
    pub fn reset(&mut self) {
        let state = self.kf.state_mut();
        state[6] = 0.0;
        state[7] = 0.0;
    }

    /// Current posterior box.
    pub fn bbox(&self) -> Rect {
        Self::box_of(self.kf.state())
    }

    /// Current posterior center velocity.
    pub fn velocity(&self) -> (f32, f32) {
        let state = self.kf.state();
        (state[4], state[5])
    }

    /// Recover a box from any state vector, clamped to non-negative
    /// extent and position.
    pub fn box_of(state: &Array1<f32>) -> Rect {
        let width = state[2].max(0.0);
        let height = state[3].max(0.0);
        let x = (state[0] - width / 2.0).max(0.0);
        let y = (state[1] - height / 2.0).max(0.0);
        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_init_round_trips_box() {
        let rect = Rect::new(10.5, 20.0, 50.0, 40.0);
        let kf = KalmanXywh::new(rect, &KalmanConfig::default());
        assert_eq!(kf.bbox(), rect);
    }

    #[test]
    fn test_velocity_zero_at_birth() {
        let kf = KalmanXywh::new(Rect::new(0.0, 0.0, 10.0, 10.0), &KalmanConfig::default());
        assert_eq!(kf.velocity(), (0.0, 0.0));
    }

    #[test]
    fn test_predict_without_updates_is_stationary() {
        let rect = Rect::new(10.0, 10.0, 50.0, 50.0);
        let mut kf = KalmanXywh::new(rect, &KalmanConfig::default());

        // Velocities are zero at birth, so the box holds still under
        // repeated linear advance.
        for _ in 0..5 {
            let predicted = kf.predict();
            assert_relative_eq!(predicted.x, rect.x, epsilon = 1e-3);
            assert_relative_eq!(predicted.y, rect.y, epsilon = 1e-3);
            assert_relative_eq!(predicted.width, rect.width, epsilon = 1e-3);
            assert_relative_eq!(predicted.height, rect.height, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_velocity_advances_linearly_between_updates() {
        let mut kf = KalmanXywh::new(Rect::new(10.0, 10.0, 20.0, 20.0), &KalmanConfig::default());

        // Constant rightward motion observed over three frames.
        for step in 1..=3u32 {
            kf.predict();
            kf.update(Rect::new(10.0 + 4.0 * step as f32, 10.0, 20.0, 20.0));
        }

        let (dx, dy) = kf.velocity();
        assert!(dx > 0.0);

        // With no further updates, each prediction advances the center
        // by exactly one velocity step.
        let start = kf.bbox();
        for n in 1..=4u32 {
            let predicted = kf.predict();
            assert_relative_eq!(predicted.x, start.x + n as f32 * dx, epsilon = 1e-3);
            assert_relative_eq!(predicted.y, start.y + n as f32 * dy, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_update_pulls_state_toward_measurement() {
        let mut kf = KalmanXywh::new(Rect::new(0.0, 0.0, 10.0, 10.0), &KalmanConfig::default());
        kf.predict();
        kf.update(Rect::new(4.0, 4.0, 10.0, 10.0));

        let boxed = kf.bbox();
        assert!(boxed.x > 0.0 && boxed.x <= 4.0);
        assert!(boxed.y > 0.0 && boxed.y <= 4.0);
    }

    #[test]
    fn test_reset_zeroes_shape_velocities() {
        let mut kf = KalmanXywh::new(Rect::new(0.0, 0.0, 10.0, 10.0), &KalmanConfig::default());
        // Grow the box across two frames so dw/dh become nonzero.
        kf.predict();
        kf.update(Rect::new(0.0, 0.0, 14.0, 14.0));
        kf.predict();
        kf.update(Rect::new(0.0, 0.0, 18.0, 18.0));

        kf.reset();
        let before = kf.bbox();
        let predicted = kf.predict();
        assert_relative_eq!(predicted.width, before.width, epsilon = 1e-4);
        assert_relative_eq!(predicted.height, before.height, epsilon = 1e-4);
    }

    #[test]
    fn test_box_of_clamps_negative_state() {
        let mut state: Array1<f32> = Array1::zeros(STATE_DIM);
        state[0] = 1.0;
        state[1] = 1.0;
        state[2] = -5.0;
        state[3] = 8.0;
        let rect = KalmanXywh::box_of(&state);
        assert_eq!(rect.width, 0.0);
        assert!(rect.x >= 0.0 && rect.y >= 0.0 && rect.height == 8.0);
    }
}
