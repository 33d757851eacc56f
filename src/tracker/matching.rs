//! Integer linear-assignment layer driving detection-track association.

use ndarray::Array2;
use pathfinding::prelude::{Matrix, kuhn_munkres};

/// Scale factor turning `[0, 1]` similarities into integer costs so the
/// assignment is bit-identical across platforms.
pub const PRECISION: f32 = 1e6;

/// Outcome of one association round. Indices are positions in the
/// detection (row) and track (column) lists the cost matrix was built
/// from, in ascending order.
#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_detections: Vec<usize>,
    pub unmatched_tracks: Vec<usize>,
}

impl AssignmentResult {
    fn unmatched(num_detections: usize, num_tracks: usize) -> Self {
        Self {
            matches: Vec::new(),
            unmatched_detections: (0..num_detections).collect(),
            unmatched_tracks: (0..num_tracks).collect(),
        }
    }
}

/// Solve a maximum-weight assignment over a non-negative integer
/// similarity matrix (detections as rows, tracks as columns).
///
/// The matrix is zero-padded to a square, solved with Kuhn-Munkres, and
/// only pairs on real rows and columns whose similarity reaches
/// `thresh` are accepted.
pub fn linear_assignment(costs: &Array2<i64>, thresh: i64) -> AssignmentResult {
    let (num_detections, num_tracks) = costs.dim();
    if num_detections == 0 || num_tracks == 0 {
        return AssignmentResult::unmatched(num_detections, num_tracks);
    }

    let size = num_detections.max(num_tracks);
    let mut weights = Matrix::new(size, size, 0i64);
    for i in 0..num_detections {
        for j in 0..num_tracks {
            weights[(i, j)] = costs[[i, j]];
        }
    }

    let (_, assignment) = kuhn_munkres(&weights);

    let mut matches = Vec::new();
    let mut det_matched = vec![false; num_detections];
    let mut track_matched = vec![false; num_tracks];

    for (i, &j) in assignment.iter().enumerate().take(num_detections) {
        if j < num_tracks && costs[[i, j]] >= thresh {
            matches.push((i, j));
            det_matched[i] = true;
            track_matched[j] = true;
        }
    }

    let unmatched_detections = (0..num_detections).filter(|&i| !det_matched[i]).collect();
    let unmatched_tracks = (0..num_tracks).filter(|&j| !track_matched[j]).collect();

    AssignmentResult {
        matches,
        unmatched_detections,
        unmatched_tracks,
    }
}
