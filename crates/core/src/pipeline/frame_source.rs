use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::node_error::NodeError;
use crate::video::domain::video_reader::VideoReader;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// One frame handed out by [`FrameSource::next`].
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFrame {
    pub frame: Frame,
    /// Zero-based index of `frame` within the source.
    pub current_index: usize,
    /// Decoder position after the read. This is one past `current_index`
    /// rather than the length of the source.
    pub total_frames: usize,
}

/// Hands out one decoded frame per call, wrapping around to the first
/// frame at end of stream.
///
/// The decode handle stays open between calls and is reopened when the
/// path changes, a reset is requested, or the decoder has reached the
/// frame count reported when the source was opened.
pub struct FrameSource {
    reader: Box<dyn VideoReader>,
    source_path: Option<PathBuf>,
    cursor: i64,
    total_frames: usize,
}

impl FrameSource {
    pub fn new(reader: Box<dyn VideoReader>) -> Self {
        Self {
            reader,
            source_path: None,
            cursor: -1,
            total_frames: 0,
        }
    }

    /// A source decoding through ffmpeg.
    pub fn ffmpeg() -> Self {
        Self::new(Box::new(FfmpegReader::new()))
    }

    /// Host input validation: the path must name an existing file.
    pub fn validate_source(path: &Path) -> Result<(), NodeError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(NodeError::source_unavailable(path, "file does not exist"))
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Index of the last frame handed out, -1 before the first read.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn next(&mut self, path: &Path, force_reset: bool) -> Result<SourceFrame, NodeError> {
        if self.needs_reopen(path, force_reset) {
            self.reopen(path)?;
        }

        let frame = match self.reader.read_frame() {
            Ok(Some(frame)) => {
                self.cursor += 1;
                frame
            }
            Ok(None) => self.wrap_around(path, None)?,
            Err(e) => self.wrap_around(path, Some(e))?,
        };

        let current_index = usize::try_from(self.cursor).unwrap_or_default();
        Ok(SourceFrame {
            frame: frame.with_index(current_index),
            current_index,
            total_frames: self.reader.position(),
        })
    }

    fn needs_reopen(&self, path: &Path, force_reset: bool) -> bool {
        let Some(open_path) = self.source_path.as_deref() else {
            return true;
        };
        let exhausted = self.total_frames > 0 && self.reader.position() >= self.total_frames;
        exhausted || open_path != path || force_reset
    }

    fn reopen(&mut self, path: &Path) -> Result<(), NodeError> {
        self.reader.close();
        self.source_path = None;
        self.cursor = -1;

        let metadata = self
            .reader
            .open(path)
            .map_err(|e| NodeError::source_unavailable(path, e))?;
        log::debug!(
            "Opened {} ({}x{}, ~{} frames @ {:.2} fps)",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.total_frames,
            metadata.fps
        );

        self.total_frames = metadata.total_frames;
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Rewinds to the start and reads the first frame again.
    fn wrap_around(
        &mut self,
        path: &Path,
        cause: Option<Box<dyn std::error::Error>>,
    ) -> Result<Frame, NodeError> {
        if let Some(e) = &cause {
            log::debug!("Read failed at frame {} of {}: {e}", self.cursor + 1, path.display());
        }

        self.reader
            .rewind()
            .map_err(|e| NodeError::decode(path, e))?;
        match self.reader.read_frame() {
            Ok(Some(frame)) => {
                self.cursor = 0;
                Ok(frame)
            }
            Ok(None) => Err(NodeError::decode(path, "no frames after rewinding to the start")),
            Err(e) => Err(NodeError::decode(path, e)),
        }
    }
}
