use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::frame::Frame;
use crate::video::domain::encode_settings::EncodeSettings;

/// Turns a complete batch of frames (plus optional audio) into a single
/// video file.
///
/// Called synchronously by the accumulator when a batch is dumped; the call
/// blocks until the file is finalized or encoding fails.
pub trait SequenceEncoder: Send {
    fn encode(
        &mut self,
        path: &Path,
        frames: &[Frame],
        settings: &EncodeSettings,
        audio: Option<&AudioSegment>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
