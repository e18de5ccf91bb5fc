use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::encode_settings::EncodeSettings;

/// Abstracts video encoding so the accumulator can write output without
/// depending on a specific codec library.
pub trait VideoWriter: Send {
    fn open(&mut self, path: &Path, settings: &EncodeSettings)
        -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes the encoder and finalizes the container.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
