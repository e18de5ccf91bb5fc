use serde::{Deserialize, Serialize};

/// Payload the save node reports to the host UI after each invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiStatus {
    /// Frames buffered after this invocation.
    pub counter: usize,
    pub should_dump: bool,
    /// Base64 WebP previews of the incoming frames.
    pub frames: Vec<String>,
    pub fps: u32,
}
