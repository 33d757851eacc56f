//! Generic linear-Gaussian estimator core shared by both bounding-box
//! parameterizations, using ndarray with a nalgebra-based inverse.

use ndarray::{Array1, Array2};

/// Linear Kalman filter over an n-dimensional state with 4-dimensional
/// measurements. Holds the posterior only: `predict` overwrites it with
/// the prior, so repeated predictions compound.
#[derive(Debug, Clone)]
pub(crate) struct LinearKalman {
    transition: Array2<f32>,
    measurement: Array2<f32>,
    process_noise: Array2<f32>,
    measurement_noise: Array2<f32>,
    error_cov: Array2<f32>,
    state: Array1<f32>,
}

impl LinearKalman {
    pub(crate) fn new(
        transition: Array2<f32>,
        measurement: Array2<f32>,
        process_noise: Array2<f32>,
        measurement_noise: Array2<f32>,
        error_cov: Array2<f32>,
        state: Array1<f32>,
    ) -> Self {
        Self {
            transition,
            measurement,
            process_noise,
            measurement_noise,
            error_cov,
            state,
        }
    }

    pub(crate) fn state(&self) -> &Array1<f32> {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut Array1<f32> {
        &mut self.state
    }

    /// x = F x, P = F P Fᵀ + Q. Returns the advanced state.
    pub(crate) fn predict(&mut self) -> &Array1<f32> {
        self.state = self.transition.dot(&self.state);
        self.error_cov =
            self.transition.dot(&self.error_cov).dot(&self.transition.t()) + &self.process_noise;
        &self.state
    }

    /// Fold a measurement into the posterior.
    pub(crate) fn correct(&mut self, measured: [f32; 4]) {
        let z = Array1::from_vec(measured.to_vec());
        let innovation = z - self.measurement.dot(&self.state);

        // S = H P Hᵀ + R
        let innovation_cov =
            self.measurement.dot(&self.error_cov).dot(&self.measurement.t())
                + &self.measurement_noise;

        // K = P Hᵀ S⁻¹; S is 4x4, inverted in closed form via nalgebra.
        let s_inv = invert_4x4(&innovation_cov);
        let gain = self.error_cov.dot(&self.measurement.t()).dot(&s_inv);

        self.state = &self.state + &gain.dot(&innovation);
        self.error_cov = &self.error_cov - &gain.dot(&innovation_cov).dot(&gain.t());
    }
}

fn invert_4x4(m: &Array2<f32>) -> Array2<f32> {
    let mut nm = nalgebra::Matrix4::zeros();
    for i in 0..4 {
        for j in 0..4 {
            nm[(i, j)] = m[[i, j]];
        }
    }
    let inv = nm
        .try_inverse()
        .expect("singular innovation covariance");
    let mut res = Array2::zeros((4, 4));
    for i in 0..4 {
        for j in 0..4 {
            res[[i, j]] = inv[(i, j)];
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_identity() {
        let eye: Array2<f32> = Array2::eye(4);
        let inv = invert_4x4(&eye);
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((inv[[i, j]] - expected).abs() < 1e-6);
            }
        }
    }
}
