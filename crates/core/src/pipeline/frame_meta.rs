use serde::{Deserialize, Serialize};

use crate::shared::constants::{IDLE_MAX_FRAMES_ESTIMATE_MARGIN, MAX_FRAMES_ESTIMATE_MARGIN};

/// Run-level metadata the host passes alongside each batch of frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMeta {
    /// Total frame count of the generation run, when the host knows it.
    pub max_frames: Option<usize>,
    /// The run restarted; buffered frames belong to the previous run.
    #[serde(default)]
    pub reset: bool,
}

impl FrameMeta {
    pub fn new(max_frames: Option<usize>, reset: bool) -> Self {
        Self { max_frames, reset }
    }

    /// The host's max frame count if present, else an estimate from what
    /// has been seen so far.
    pub fn effective_max_frames(&self, incoming: usize, buffered: usize) -> usize {
        match self.max_frames {
            Some(n) => n,
            None if incoming == 0 => buffered + IDLE_MAX_FRAMES_ESTIMATE_MARGIN,
            None => incoming + buffered + MAX_FRAMES_ESTIMATE_MARGIN,
        }
    }
}
