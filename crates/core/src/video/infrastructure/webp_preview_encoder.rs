use base64::Engine;
use image::codecs::webp::WebPEncoder;
use image::ExtendedColorType;

use crate::shared::frame::Frame;
use crate::video::domain::preview_encoder::PreviewEncoder;

/// Encodes preview frames as lossless WebP with the `image` crate and wraps
/// the bytes in standard base64.
pub struct WebpPreviewEncoder;

impl WebpPreviewEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebpPreviewEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewEncoder for WebpPreviewEncoder {
    fn encode(&self, frame: &Frame) -> Result<String, Box<dyn std::error::Error>> {
        let rgb = frame.to_rgb8();
        let mut bytes = Vec::new();
        WebPEncoder::new_lossless(&mut bytes).encode(
            &rgb,
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}
