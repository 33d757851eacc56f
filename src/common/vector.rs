//! Helpers for opaque appearance-feature vectors.

use crate::common::EPSILON;

/// Cosine similarity between two equal-length vectors. Returns 0 when
/// either norm is below [`EPSILON`]. Mismatched lengths are a
/// programmer bug and abort.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "feature dimensions differ");

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();

    if norm_a < EPSILON || norm_b < EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Exponential moving average of a track feature with a detection
/// feature (`alpha` weighs the track side), L2-normalized afterwards.
pub fn ema_normalized(track: &[f32], detection: &[f32], alpha: f32) -> Vec<f32> {
    assert_eq!(
        track.len(),
        detection.len(),
        "feature dimensions differ"
    );

    let mut blended: Vec<f32> = track
        .iter()
        .zip(detection)
        .map(|(t, d)| alpha * t + (1.0 - alpha) * d)
        .collect();

    let norm = blended.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm >= EPSILON {
        for v in &mut blended {
            *v /= norm;
        }
    }
    blended
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_bounded() {
        let a = [0.3, -0.7, 0.2];
        let b = [-0.5, 0.1, 0.9];
        assert!(cosine_similarity(&a, &b).abs() <= 1.0 + 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_ema_keeps_unit_norm() {
        let old = vec![1.0, 0.0];
        let new = vec![0.0, 1.0];
        let blended = ema_normalized(&old, &new, 0.9);

        let norm = blended.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        // The track side dominates at alpha = 0.9.
        assert!(blended[0] > blended[1]);
    }

    #[test]
    fn test_ema_identical_inputs_are_fixed_point() {
        let f = vec![0.6, 0.8];
        let blended = ema_normalized(&f, &f, 0.9);
        assert!((blended[0] - 0.6).abs() < 1e-6);
        assert!((blended[1] - 0.8).abs() < 1e-6);
    }
}
