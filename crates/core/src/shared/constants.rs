/// File extensions the loader node offers from the input directory.
pub const VIDEO_EXTENSIONS: &[&str] = &["webm", "mp4", "mkv", "gif"];

/// Node category both nodes are registered under.
pub const NODE_CATEGORY: &str = "deforum/video";

pub const LOAD_VIDEO_NODE_ID: &str = "DeforumLoadVideo";
pub const SAVE_VIDEO_NODE_ID: &str = "DeforumVideoSaveNode";

pub const DEFAULT_FILENAME_PREFIX: &str = "Deforum";
pub const DEFAULT_FPS: u32 = 24;
pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 10_000;
pub const DEFAULT_QUALITY: u8 = 10;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 10;
pub const MAX_PERIOD_LENGTH: usize = 4096;

/// A batch shorter than this is not a motion sequence and is never encoded.
pub const MIN_DUMP_FRAMES: usize = 2;

/// Margin added to the local max-frames estimate when frames arrive.
pub const MAX_FRAMES_ESTIMATE_MARGIN: usize = 2;

/// Margin added to the local max-frames estimate on an invocation without frames.
pub const IDLE_MAX_FRAMES_ESTIMATE_MARGIN: usize = 5;

/// Audio is always muxed as AAC; this is the fallback frame size when the
/// encoder does not report one.
pub const AAC_FALLBACK_FRAME_SIZE: usize = 1024;
