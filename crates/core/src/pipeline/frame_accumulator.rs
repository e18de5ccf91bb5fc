use std::path::PathBuf;
use std::time::Instant;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::constants::MIN_DUMP_FRAMES;
use crate::shared::frame::Frame;
use crate::shared::node_error::NodeError;
use crate::video::domain::output_path_resolver::OutputPathResolver;
use crate::video::domain::preview_encoder::PreviewEncoder;
use crate::video::domain::sequence_encoder::SequenceEncoder;
use crate::video::infrastructure::counter_path_resolver::CounterPathResolver;
use crate::video::infrastructure::muxing_sequence_encoder::MuxingSequenceEncoder;
use crate::video::infrastructure::webp_preview_encoder::WebpPreviewEncoder;

use super::frame_meta::FrameMeta;
use super::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use super::save_video_config::{DumpMode, SaveVideoConfig};
use super::ui_status::UiStatus;

/// Result of one [`FrameAccumulator::push`].
#[derive(Debug, Clone, PartialEq)]
pub struct PushOutcome {
    /// The dumped batch, when a dump happened and returning it was not
    /// skipped.
    pub batch: Option<Vec<Frame>>,
    pub ui: UiStatus,
}

/// Buffers generated frames across invocations and encodes them as one
/// video once a batch is complete.
///
/// A batch completes when the buffer reaches the run's max frame count
/// (or the configured period), when a dump is forced, or when the host
/// signals a reset. Batches shorter than two frames are never encoded.
pub struct FrameAccumulator {
    encoder: Box<dyn SequenceEncoder>,
    path_resolver: Box<dyn OutputPathResolver>,
    preview_encoder: Box<dyn PreviewEncoder>,
    logger: Box<dyn PipelineLogger>,
    buffer: Vec<Frame>,
}

impl FrameAccumulator {
    pub fn new(
        encoder: Box<dyn SequenceEncoder>,
        path_resolver: Box<dyn OutputPathResolver>,
        preview_encoder: Box<dyn PreviewEncoder>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            encoder,
            path_resolver,
            preview_encoder,
            logger,
            buffer: Vec::new(),
        }
    }

    /// An accumulator writing videos into `output_dir` with ffmpeg.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            Box::new(MuxingSequenceEncoder::ffmpeg()),
            Box::new(CounterPathResolver::new(output_dir)),
            Box::new(WebpPreviewEncoder::new()),
            Box::new(LogPipelineLogger::new()),
        )
    }

    pub fn buffered(&self) -> &[Frame] {
        &self.buffer
    }

    pub fn push(
        &mut self,
        frames: Vec<Frame>,
        config: &SaveVideoConfig,
        meta: &FrameMeta,
        audio: Option<&AudioSegment>,
    ) -> Result<PushOutcome, NodeError> {
        config.validate()?;

        let incoming = frames.len();
        let max_frames = meta.effective_max_frames(incoming, self.buffer.len());
        let previews = if config.enable_preview {
            self.previews(&frames)
        } else {
            Vec::new()
        };

        // On reset the incoming frames start the next batch instead of
        // joining the current one
        let mut reseed = None;
        if meta.reset && incoming > 0 {
            reseed = Some(frames);
        } else {
            self.buffer.extend(frames);
        }
        self.logger.buffered(incoming, self.buffer.len());

        let threshold = match config.dump_by {
            DumpMode::MaxFrames => self.buffer.len() >= max_frames,
            DumpMode::PerNFrames => self.buffer.len() >= config.dump_every,
        };
        let should_dump = threshold || meta.reset || config.dump_now;

        let mut batch = None;
        let mut saved = Ok(());
        if should_dump && self.buffer.len() >= MIN_DUMP_FRAMES {
            let dumped = std::mem::take(&mut self.buffer);
            saved = self.dump(&dumped, config, audio);
            if saved.is_ok() && !config.skip_return {
                batch = Some(dumped);
            }
        }

        if let Some(frames) = reseed {
            if !self.buffer.is_empty() {
                log::debug!("Reset discarded {} buffered frames", self.buffer.len());
            }
            self.buffer = frames;
        }
        saved?;

        Ok(PushOutcome {
            batch,
            ui: UiStatus {
                counter: self.buffer.len(),
                should_dump,
                frames: previews,
                fps: config.fps,
            },
        })
    }

    /// Forces out the buffered frames when the run ends before a
    /// completion condition fired. Buffers shorter than two frames are
    /// left alone.
    pub fn flush(
        &mut self,
        config: &SaveVideoConfig,
        meta: &FrameMeta,
        audio: Option<&AudioSegment>,
    ) -> Result<Option<PushOutcome>, NodeError> {
        if self.buffer.len() < MIN_DUMP_FRAMES {
            return Ok(None);
        }
        self.logger
            .info(&format!("Flushing {} remaining frames", self.buffer.len()));
        let forced = SaveVideoConfig {
            dump_now: true,
            ..config.clone()
        };
        self.push(Vec::new(), &forced, meta, audio).map(Some)
    }

    /// Emits the end-of-run summary through the logger.
    pub fn summary(&self) {
        self.logger.summary();
    }

    fn dump(
        &mut self,
        frames: &[Frame],
        config: &SaveVideoConfig,
        audio: Option<&AudioSegment>,
    ) -> Result<(), NodeError> {
        if config.skip_save {
            self.logger.dumped(None, frames.len(), 0.0);
            return Ok(());
        }
        let Some(first) = frames.first() else {
            return Ok(());
        };

        let path = self
            .path_resolver
            .resolve(&config.filename_prefix, config.container.extension())
            .map_err(|source| NodeError::OutputPath {
                path: PathBuf::from(&config.filename_prefix),
                source,
            })?;
        let settings = config.encode_settings(first.width(), first.height());

        log::info!("Saving video: {}", path.display());
        let start = Instant::now();
        self.encoder
            .encode(&path, frames, &settings, audio)
            .map_err(|e| NodeError::encode(&path, e))?;
        let encode_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.logger.dumped(Some(path.as_path()), frames.len(), encode_ms);
        Ok(())
    }

    fn previews(&self, frames: &[Frame]) -> Vec<String> {
        frames
            .iter()
            .filter_map(|frame| match self.preview_encoder.encode(frame) {
                Ok(encoded) => Some(encoded),
                Err(e) => {
                    log::warn!("Skipping preview for frame {}: {e}", frame.index());
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::encode_settings::{ContainerFormat, EncodeSettings};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct EncodeCall {
        path: PathBuf,
        frames: Vec<usize>,
        settings: EncodeSettings,
        audio: Option<AudioSegment>,
    }

    struct StubEncoder {
        calls: Arc<Mutex<Vec<EncodeCall>>>,
        fail: bool,
    }

    impl SequenceEncoder for StubEncoder {
        fn encode(
            &mut self,
            path: &Path,
            frames: &[Frame],
            settings: &EncodeSettings,
            audio: Option<&AudioSegment>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(EncodeCall {
                path: path.to_path_buf(),
                frames: frames.iter().map(Frame::index).collect(),
                settings: settings.clone(),
                audio: audio.cloned(),
            });
            if self.fail {
                Err("encoder crashed".into())
            } else {
                Ok(())
            }
        }
    }

    struct StubResolver {
        next: Mutex<usize>,
        fail: bool,
    }

    impl OutputPathResolver for StubResolver {
        fn resolve(&self, filename_prefix: &str, extension: &str) -> std::io::Result<PathBuf> {
            if self.fail {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                ));
            }
            let mut next = self.next.lock().unwrap();
            let path = PathBuf::from(format!("/out/{filename_prefix}_{next}.{extension}"));
            *next += 1;
            Ok(path)
        }
    }

    struct StubPreview {
        fail_on: Option<usize>,
    }

    impl PreviewEncoder for StubPreview {
        fn encode(&self, frame: &Frame) -> Result<String, Box<dyn std::error::Error>> {
            if self.fail_on == Some(frame.index()) {
                return Err("webp failed".into());
            }
            Ok(format!("preview-{}", frame.index()))
        }
    }

    #[derive(Default)]
    struct Options {
        fail_encode: bool,
        fail_resolve: bool,
        fail_preview_on: Option<usize>,
    }

    fn accumulator(options: Options) -> (FrameAccumulator, Arc<Mutex<Vec<EncodeCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let acc = FrameAccumulator::new(
            Box::new(StubEncoder {
                calls: calls.clone(),
                fail: options.fail_encode,
            }),
            Box::new(StubResolver {
                next: Mutex::new(0),
                fail: options.fail_resolve,
            }),
            Box::new(StubPreview {
                fail_on: options.fail_preview_on,
            }),
            Box::new(crate::pipeline::pipeline_logger::NullPipelineLogger),
        );
        (acc, calls)
    }

    fn frame(index: usize) -> Frame {
        Frame::filled(8, 6, 3, 0.5, index)
    }

    fn by_period(n: usize) -> SaveVideoConfig {
        SaveVideoConfig {
            dump_by: DumpMode::PerNFrames,
            dump_every: n,
            ..Default::default()
        }
    }

    fn meta(max_frames: Option<usize>) -> FrameMeta {
        FrameMeta::new(max_frames, false)
    }

    fn reset() -> FrameMeta {
        FrameMeta::new(None, true)
    }

    struct RecordingLogger {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn buffered(&mut self, _incoming: usize, _buffered: usize) {}
        fn dumped(&mut self, _path: Option<&Path>, _frames: usize, _encode_ms: f64) {}
        fn info(&mut self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_period_dump_on_fifth_frame() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = by_period(5);

        for i in 0..4 {
            let out = acc.push(vec![frame(i)], &config, &meta(None), None).unwrap();
            assert!(!out.ui.should_dump, "call {} should not dump", i + 1);
            assert_eq!(out.ui.counter, i + 1);
        }

        let out = acc.push(vec![frame(4)], &config, &meta(None), None).unwrap();
        assert!(out.ui.should_dump);
        assert_eq!(out.ui.counter, 0);
        assert!(acc.buffered().is_empty());

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].frames, vec![0, 1, 2, 3, 4]);
        assert_eq!(calls[0].path, PathBuf::from("/out/Deforum_0.mp4"));
    }

    #[test]
    fn test_max_frames_dumps_when_buffer_first_reaches_it() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig::default();

        for i in 0..2 {
            let out = acc.push(vec![frame(i)], &config, &meta(Some(3)), None).unwrap();
            assert!(!out.ui.should_dump);
        }
        assert!(calls.lock().unwrap().is_empty());

        let out = acc.push(vec![frame(2)], &config, &meta(Some(3)), None).unwrap();
        assert!(out.ui.should_dump);
        assert_eq!(out.ui.counter, 0);
        assert_eq!(calls.lock().unwrap()[0].frames, vec![0, 1, 2]);
    }

    #[test]
    fn test_estimated_max_frames_never_fires_alone() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig::default();

        for i in 0..10 {
            let out = acc.push(vec![frame(i)], &config, &meta(None), None).unwrap();
            assert!(!out.ui.should_dump);
        }
        assert_eq!(acc.buffered().len(), 10);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reset_dumps_buffer_then_reseeds() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig::default();
        for i in 0..3 {
            acc.push(vec![frame(i)], &config, &meta(None), None).unwrap();
        }

        let out = acc.push(vec![frame(100)], &config, &reset(), None).unwrap();
        assert!(out.ui.should_dump);
        assert_eq!(out.ui.counter, 1);
        assert_eq!(acc.buffered()[0].index(), 100);
        assert_eq!(calls.lock().unwrap()[0].frames, vec![0, 1, 2]);
    }

    #[test]
    fn test_reset_discards_short_stale_buffer() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig::default();
        acc.push(vec![frame(0)], &config, &meta(None), None).unwrap();

        let out = acc
            .push(vec![frame(7), frame(8)], &config, &reset(), None)
            .unwrap();
        assert!(out.ui.should_dump);
        assert!(calls.lock().unwrap().is_empty());
        let kept: Vec<_> = acc.buffered().iter().map(Frame::index).collect();
        assert_eq!(kept, vec![7, 8]);
    }

    #[test]
    fn test_single_frame_never_encodes_even_when_forced() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig {
            dump_now: true,
            ..Default::default()
        };

        let out = acc.push(vec![frame(0)], &config, &meta(None), None).unwrap();
        assert!(out.ui.should_dump);
        assert_eq!(out.ui.counter, 1);
        assert!(calls.lock().unwrap().is_empty());

        let out = acc.push(vec![frame(1)], &config, &meta(None), None).unwrap();
        assert_eq!(out.ui.counter, 0);
        assert_eq!(calls.lock().unwrap()[0].frames, vec![0, 1]);
    }

    #[test]
    fn test_encode_failure_clears_buffer() {
        let (mut acc, calls) = accumulator(Options {
            fail_encode: true,
            ..Default::default()
        });
        let config = by_period(2);
        acc.push(vec![frame(0)], &config, &meta(None), None).unwrap();

        let err = acc
            .push(vec![frame(1)], &config, &meta(None), None)
            .unwrap_err();
        assert!(matches!(err, NodeError::Encode { .. }));
        assert!(err.to_string().contains("encoder crashed"));
        assert!(acc.buffered().is_empty());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_encode_failure_on_reset_still_reseeds() {
        let (mut acc, _) = accumulator(Options {
            fail_encode: true,
            ..Default::default()
        });
        let config = SaveVideoConfig::default();
        acc.push(vec![frame(0), frame(1)], &config, &meta(None), None)
            .unwrap();

        assert!(acc.push(vec![frame(9)], &config, &reset(), None).is_err());
        assert_eq!(acc.buffered().len(), 1);
        assert_eq!(acc.buffered()[0].index(), 9);
    }

    #[test]
    fn test_output_path_failure_is_reported() {
        let (mut acc, calls) = accumulator(Options {
            fail_resolve: true,
            ..Default::default()
        });
        let err = acc
            .push(vec![frame(0), frame(1)], &by_period(2), &meta(None), None)
            .unwrap_err();
        assert!(matches!(err, NodeError::OutputPath { .. }));
        assert!(calls.lock().unwrap().is_empty());
        assert!(acc.buffered().is_empty());
    }

    #[test]
    fn test_skip_save_still_returns_batch() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig {
            skip_save: true,
            skip_return: false,
            ..by_period(2)
        };

        let out = acc
            .push(vec![frame(0), frame(1)], &config, &meta(None), None)
            .unwrap();
        let batch = out.batch.unwrap();
        assert_eq!(batch.len(), 2);
        assert!(calls.lock().unwrap().is_empty());
        assert!(acc.buffered().is_empty());
    }

    #[test]
    fn test_batch_withheld_by_default() {
        let (mut acc, _) = accumulator(Options::default());
        let out = acc
            .push(vec![frame(0), frame(1)], &by_period(2), &meta(None), None)
            .unwrap();
        assert!(out.ui.should_dump);
        assert!(out.batch.is_none());
    }

    #[test]
    fn test_encode_uses_config_and_frame_size() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig {
            fps: 12,
            container: ContainerFormat::Mov,
            filename_prefix: "clips/run".into(),
            ..by_period(2)
        };
        let audio = AudioSegment::new(vec![0.0; 100], 8000, 1);

        acc.push(vec![frame(0), frame(1)], &config, &meta(None), Some(&audio))
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].path, PathBuf::from("/out/clips/run_0.mov"));
        assert_eq!((calls[0].settings.width, calls[0].settings.height), (8, 6));
        assert_eq!(calls[0].settings.fps, 12);
        assert_eq!(calls[0].audio.as_ref(), Some(&audio));
    }

    #[test]
    fn test_previews_cover_incoming_frames() {
        let (mut acc, _) = accumulator(Options {
            fail_preview_on: Some(1),
            ..Default::default()
        });
        let config = SaveVideoConfig::default();

        let out = acc
            .push(vec![frame(0), frame(1), frame(2)], &config, &meta(None), None)
            .unwrap();
        assert_eq!(out.ui.frames, vec!["preview-0", "preview-2"]);
        assert_eq!(out.ui.fps, 24);

        let quiet = SaveVideoConfig {
            enable_preview: false,
            ..Default::default()
        };
        let out = acc.push(vec![frame(3)], &quiet, &meta(None), None).unwrap();
        assert!(out.ui.frames.is_empty());
    }

    #[test]
    fn test_push_without_frames_checks_buffer() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig::default();
        acc.push(vec![frame(0), frame(1), frame(2)], &config, &meta(None), None)
            .unwrap();

        let out = acc.push(Vec::new(), &config, &meta(None), None).unwrap();
        assert!(!out.ui.should_dump);
        assert_eq!(out.ui.counter, 3);
        assert!(out.ui.frames.is_empty());

        let out = acc.push(Vec::new(), &config, &meta(Some(3)), None).unwrap();
        assert!(out.ui.should_dump);
        assert_eq!(out.ui.counter, 0);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reset_without_frames_keeps_nothing_new() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig::default();
        acc.push(vec![frame(0), frame(1)], &config, &meta(None), None)
            .unwrap();

        let out = acc.push(Vec::new(), &config, &reset(), None).unwrap();
        assert!(out.ui.should_dump);
        assert_eq!(out.ui.counter, 0);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_config_leaves_buffer_untouched() {
        let (mut acc, _) = accumulator(Options::default());
        let config = SaveVideoConfig::default();
        acc.push(vec![frame(0)], &config, &meta(None), None).unwrap();

        let bad = SaveVideoConfig {
            fps: 0,
            ..Default::default()
        };
        let err = acc.push(vec![frame(1)], &bad, &meta(None), None).unwrap_err();
        assert!(matches!(err, NodeError::InvalidConfig(_)));
        assert_eq!(acc.buffered().len(), 1);
    }

    #[test]
    fn test_successive_batches_get_new_paths() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = by_period(2);
        for i in 0..4 {
            acc.push(vec![frame(i)], &config, &meta(None), None).unwrap();
        }
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].path, PathBuf::from("/out/Deforum_1.mp4"));
        assert_eq!(calls[1].frames, vec![2, 3]);
    }

    #[test]
    fn test_multi_frame_push_past_max_frames_dumps_everything() {
        let (mut acc, calls) = accumulator(Options::default());
        let config = SaveVideoConfig {
            skip_return: false,
            ..Default::default()
        };

        let out = acc
            .push(vec![frame(0), frame(1)], &config, &meta(Some(3)), None)
            .unwrap();
        assert!(!out.ui.should_dump);
        assert_eq!(out.ui.counter, 2);

        let out = acc
            .push(vec![frame(2), frame(3)], &config, &meta(Some(3)), None)
            .unwrap();
        assert!(out.ui.should_dump);
        assert_eq!(out.ui.counter, 0);
        let returned: Vec<_> = out.batch.unwrap().iter().map(Frame::index).collect();
        assert_eq!(returned, vec![0, 1, 2, 3]);
        assert_eq!(calls.lock().unwrap()[0].frames, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_flush_writes_remaining_frames() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let messages = Arc::new(Mutex::new(Vec::new()));
        let mut acc = FrameAccumulator::new(
            Box::new(StubEncoder {
                calls: calls.clone(),
                fail: false,
            }),
            Box::new(StubResolver {
                next: Mutex::new(0),
                fail: false,
            }),
            Box::new(StubPreview { fail_on: None }),
            Box::new(RecordingLogger {
                messages: messages.clone(),
            }),
        );
        let config = SaveVideoConfig::default();

        acc.push(vec![frame(0)], &config, &meta(None), None).unwrap();
        assert!(acc.flush(&config, &meta(None), None).unwrap().is_none());
        assert!(messages.lock().unwrap().is_empty());

        acc.push(vec![frame(1), frame(2)], &config, &meta(None), None)
            .unwrap();
        let out = acc.flush(&config, &meta(None), None).unwrap().unwrap();
        assert!(out.ui.should_dump);
        assert!(acc.buffered().is_empty());
        assert_eq!(calls.lock().unwrap()[0].frames, vec![0, 1, 2]);
        assert_eq!(
            *messages.lock().unwrap(),
            vec!["Flushing 3 remaining frames".to_string()]
        );
    }
}
