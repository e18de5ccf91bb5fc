use serde::{Deserialize, Serialize};

use crate::shared::name_conversions::impl_name_conversions;
use crate::shared::constants::{
    DEFAULT_FILENAME_PREFIX, DEFAULT_FPS, DEFAULT_QUALITY, MAX_FPS, MAX_PERIOD_LENGTH,
    MAX_QUALITY, MIN_FPS, MIN_QUALITY,
};
use crate::shared::node_error::NodeError;
use crate::video::domain::encode_settings::{
    ContainerFormat, EncodeSettings, PixelFormat, VideoCodec,
};

/// How the accumulator decides that a batch is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DumpMode {
    /// Dump once the buffer holds the run's max frame count.
    #[serde(rename = "max_frames")]
    MaxFrames,
    /// Dump every `period_length` frames.
    #[serde(rename = "per_N_frames")]
    PerNFrames,
}

impl DumpMode {
    pub const ALL: &[DumpMode] = &[DumpMode::MaxFrames, DumpMode::PerNFrames];

    pub fn as_str(self) -> &'static str {
        match self {
            DumpMode::MaxFrames => "max_frames",
            DumpMode::PerNFrames => "per_N_frames",
        }
    }
}

impl_name_conversions!(DumpMode, as_str, "dump mode");

/// Per-invocation settings of the save node.
///
/// Missing fields in a settings file fall back to the node defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveVideoConfig {
    pub filename_prefix: String,
    pub fps: u32,
    pub codec: VideoCodec,
    pub pixel_format: PixelFormat,
    pub container: ContainerFormat,
    pub quality: u8,
    pub dump_by: DumpMode,
    pub dump_every: usize,
    pub dump_now: bool,
    pub skip_save: bool,
    pub skip_return: bool,
    pub enable_preview: bool,
}

impl Default for SaveVideoConfig {
    fn default() -> Self {
        Self {
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            fps: DEFAULT_FPS,
            codec: VideoCodec::Libx265,
            pixel_format: PixelFormat::Yuv420p,
            container: ContainerFormat::Mp4,
            quality: DEFAULT_QUALITY,
            dump_by: DumpMode::MaxFrames,
            dump_every: 0,
            dump_now: false,
            skip_save: false,
            skip_return: true,
            enable_preview: true,
        }
    }
}

impl SaveVideoConfig {
    /// Rejects out-of-range values before any accumulator state changes.
    pub fn validate(&self) -> Result<(), NodeError> {
        if !(MIN_FPS..=MAX_FPS).contains(&self.fps) {
            return Err(NodeError::InvalidConfig(format!(
                "fps must be in {MIN_FPS}..={MAX_FPS}, got {}",
                self.fps
            )));
        }
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(NodeError::InvalidConfig(format!(
                "quality must be in {MIN_QUALITY}..={MAX_QUALITY}, got {}",
                self.quality
            )));
        }
        if self.dump_every > MAX_PERIOD_LENGTH {
            return Err(NodeError::InvalidConfig(format!(
                "dump_every must be at most {MAX_PERIOD_LENGTH}, got {}",
                self.dump_every
            )));
        }
        if self.filename_prefix.trim().is_empty() {
            return Err(NodeError::InvalidConfig(
                "filename_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Encoder settings for a batch of `width` x `height` frames.
    pub fn encode_settings(&self, width: u32, height: u32) -> EncodeSettings {
        EncodeSettings {
            width,
            height,
            fps: self.fps,
            codec: self.codec,
            pixel_format: self.pixel_format,
            container: self.container,
            quality: self.quality,
        }
    }
}
