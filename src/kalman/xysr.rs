use ndarray::{Array1, Array2};

use super::KalmanConfig;
use super::filter::LinearKalman;
use crate::common::Rect;

const STATE_DIM: usize = 7;
const MEASURE_DIM: usize = 4;

/// Constant-velocity estimator over `[xc, yc, s, r, dxc, dyc, ds]`,
/// where `s` is the box area and `r = w/h` its aspect ratio.
///
/// The aspect ratio is treated as stationary: it carries no velocity
/// term and is measured with low noise.
#[derive(Debug, Clone)]
pub struct KalmanXysr {
    kf: LinearKalman,
}

impl KalmanXysr {
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

        // Velocities carry little process noise, the area rate least.
        let mut process_noise: Array2<f32> = Array2::eye(STATE_DIM) * config.process_noise_scale;
        process_noise[[STATE_DIM - 1, STATE_DIM - 1]] *= 0.01;
        for i in MEASURE_DIM..STATE_DIM {
            process_noise[[i, i]] *= 0.01;
        }

        let mut measurement_noise: Array2<f32> =
            Array2::eye(MEASURE_DIM) * config.measurement_noise_scale;
        for i in MEASURE_DIM / 2..MEASURE_DIM {
            measurement_noise[[i, i]] *= 0.01;
        }

        // High uncertainty on the unobservable velocities at birth.
        let mut error_cov: Array2<f32> = Array2::eye(STATE_DIM) * 10.0;
        for i in MEASURE_DIM..STATE_DIM {
            error_cov[[i, i]] *= 100.0;
        }

        let (xc, yc) = rect.center();
        let mut state: Array1<f32> = Array1::zeros(STATE_DIM);
        state[0] = xc;
        state[1] = yc;
        state[2] = rect.area();
        state[3] = aspect(rect);

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
        [xc, yc, rect.area(), aspect(rect)]
    }

    /// Advance one time step and return the predicted box.
    pub fn predict(&mut self) -> Rect {
        Self::box_of(self.kf.predict())
    }

    /// Incorporate a measured box.
    pub fn update(&mut self, rect: Rect) {
        self.kf.correct(Self::measure(rect));
    }

    /// Zero the area velocity.
    pub fn reset(&mut self) {
        self.kf.state_mut()[6] = 0.0;
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
    /// extent and position. A collapsed area yields a zero-size box.
    pub fn box_of(state: &Array1<f32>) -> Rect {
        let area = state[2].max(0.0);
        let width = (area * state[3]).max(0.0).sqrt();
        let height = if width > 0.0 { area / width } else { 0.0 };
        let x = (state[0] - width / 2.0).max(0.0);
        let y = (state[1] - height / 2.0).max(0.0);
        Rect::new(x, y, width, height)
    }
}

// Aspect of a measured box; guards on height so degenerate boxes map
// to a zero aspect instead of dividing by zero.
fn aspect(rect: Rect) -> f32 {
    if rect.height > 0.0 {
        rect.width / rect.height
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_init_recovers_box() {
        let rect = Rect::new(10.0, 20.0, 40.0, 20.0);
        let kf = KalmanXysr::new(rect, &KalmanConfig::default());

        let boxed = kf.bbox();
        assert_relative_eq!(boxed.x, rect.x, epsilon = 1e-3);
        assert_relative_eq!(boxed.y, rect.y, epsilon = 1e-3);
        assert_relative_eq!(boxed.width, rect.width, epsilon = 1e-3);
        assert_relative_eq!(boxed.height, rect.height, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_height_box_is_tolerated() {
        let rect = Rect::new(5.0, 5.0, 10.0, 0.0);
        let kf = KalmanXysr::new(rect, &KalmanConfig::default());

        let boxed = kf.bbox();
        assert_eq!(boxed.width, 0.0);
        assert_eq!(boxed.height, 0.0);
    }

    #[test]
    fn test_zero_area_aspect_is_zero() {
        assert_eq!(aspect(Rect::new(0.0, 0.0, 10.0, 0.0)), 0.0);
        assert_eq!(aspect(Rect::new(0.0, 0.0, 0.0, 10.0)), 0.0);
    }

    #[test]
    fn test_predict_without_updates_is_stationary() {
        let rect = Rect::new(10.0, 10.0, 50.0, 25.0);
        let mut kf = KalmanXysr::new(rect, &KalmanConfig::default());

        for _ in 0..3 {
            let predicted = kf.predict();
            assert_relative_eq!(predicted.x, rect.x, epsilon = 1e-2);
            assert_relative_eq!(predicted.width, rect.width, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_reset_zeroes_area_velocity() {
        let mut kf = KalmanXysr::new(Rect::new(0.0, 0.0, 10.0, 10.0), &KalmanConfig::default());
        kf.predict();
        kf.update(Rect::new(0.0, 0.0, 14.0, 14.0));
        kf.predict();
        kf.update(Rect::new(0.0, 0.0, 18.0, 18.0));

        kf.reset();
        let before = kf.bbox();
        let predicted = kf.predict();
        assert_relative_eq!(predicted.area(), before.area(), epsilon = 1e-2);
    }
}
