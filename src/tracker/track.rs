//! Single-object track entity and lifecycle state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::common::{Detection, Rect};
use crate::kalman::MotionFilter;

/// Maximum number of predicted boxes retained per track.
pub const MAX_HISTORY: usize = 50;

/// Global track id counter; ids start at 1 and are unique per run.
static TRACK_ID_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Reset the global track id counter. Call between unrelated sequences
/// so each starts from id 1.
pub fn reset_track_id_counter() {
    TRACK_ID_COUNTER.store(0, Ordering::SeqCst);
}

fn next_track_id() -> u32 {
    TRACK_ID_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

/// Lifecycle state of a track. Only `Tracked` counts as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Newly spawned, not yet confirmed by a match
    #[default]
    New,
    /// Actively tracked
    Tracked,
    /// Unmatched this frame but still within the loss budget
    Lost,
    /// Expired; reaped at the end of the frame
    Removed,
}

/// One hypothesized object identity with its own motion model.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique id, assigned at birth
    pub id: u32,
    /// Frames since birth, counting the birth frame
    pub age: u32,
    /// Frames since the last matched detection
    pub time_since_update: u32,
    /// Lifecycle state
    pub state: TrackState,
    history: VecDeque<Rect>,
    kf: MotionFilter,
}

impl Track {
    pub fn new(kf: MotionFilter) -> Self {
        Self {
            id: next_track_id(),
            age: 1,
            time_since_update: 0,
            state: TrackState::New,
            history: VecDeque::with_capacity(MAX_HISTORY),
            kf,
        }
    }

    /// Propagate the motion model one frame and log the predicted box.
    ///
    /// An inactive track first has its shape velocities zeroed so stale
    /// estimates do not drift while the object goes unobserved.
    pub fn predict(&mut self) {
        if !self.is_active() {
            self.kf.reset();
        }
        self.age += 1;
        self.time_since_update += 1;

        let predicted = self.kf.predict();
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(predicted);
    }

    /// Fold a matched detection into the track and mark it active.
    pub fn update(&mut self, det: &Detection) {
        self.time_since_update = 0;
        self.history.clear();
        self.mark_active();
        self.kf.update(det.bbox);
    }

    /// Current estimated box.
    pub fn bbox(&self) -> Rect {
        self.kf.bbox()
    }

    /// Current estimated center velocity.
    pub fn velocity(&self) -> (f32, f32) {
        self.kf.velocity()
    }

    /// Predicted boxes since the last match, oldest first.
    pub fn history(&self) -> &VecDeque<Rect> {
        &self.history
    }

    pub fn is_active(&self) -> bool {
        self.state == TrackState::Tracked
    }

    pub fn is_lost(&self) -> bool {
        self.state == TrackState::Lost
    }

    pub fn is_removed(&self) -> bool {
        self.state == TrackState::Removed
    }

    pub fn mark_active(&mut self) {
        self.state = TrackState::Tracked;
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }
}
