use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sequential frame decoder over a single video source.
///
/// Implementations handle codec and container details and hand out RGB
/// frames one at a time, so a caller can keep a decode handle open across
/// many host invocations.
pub trait VideoReader: Send {
    /// Opens a video file, replacing any source that was open, and returns
    /// its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Decodes the next frame in presentation order, or `None` at end of
    /// stream.
    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Seeks back to the first frame.
    fn rewind(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// Index of the next frame to be decoded (frames read since open or
    /// the last rewind).
    fn position(&self) -> usize;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
