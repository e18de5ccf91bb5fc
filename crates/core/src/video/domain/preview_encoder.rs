use crate::shared::frame::Frame;

/// Encodes a frame into the base64 image string the host UI renders as a
/// live preview.
pub trait PreviewEncoder: Send {
    fn encode(&self, frame: &Frame) -> Result<String, Box<dyn std::error::Error>>;
}
