use std::path::Path;

use crate::audio::domain::audio_fit::fit_audio_to_video;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::frame::Frame;
use crate::video::domain::audio_writer::AudioWriter;
use crate::video::domain::encode_settings::EncodeSettings;
use crate::video::domain::sequence_encoder::SequenceEncoder;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::ffmpeg_audio_writer::FfmpegAudioWriter;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Encodes a batch into a staging file next to the destination, muxes the
/// fitted audio track into it, then moves it into place.
///
/// The staging file is deleted on every failure path, so a failed dump never
/// leaves a half-written video at the output path.
pub struct MuxingSequenceEncoder {
    writer: Box<dyn VideoWriter>,
    audio_writer: Box<dyn AudioWriter>,
}

impl MuxingSequenceEncoder {
    pub fn new(writer: Box<dyn VideoWriter>, audio_writer: Box<dyn AudioWriter>) -> Self {
        Self {
            writer,
            audio_writer,
        }
    }

    /// The ffmpeg-backed encoder used outside of tests.
    pub fn ffmpeg() -> Self {
        Self::new(Box::new(FfmpegWriter::new()), Box::new(FfmpegAudioWriter))
    }

    fn write_frames(
        &mut self,
        path: &Path,
        frames: &[Frame],
        settings: &EncodeSettings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.open(path, settings)?;
        for frame in frames {
            if let Err(e) = self.writer.write(frame) {
                let _ = self.writer.close();
                return Err(e);
            }
        }
        self.writer.close()
    }
}

impl SequenceEncoder for MuxingSequenceEncoder {
    fn encode(
        &mut self,
        path: &Path,
        frames: &[Frame],
        settings: &EncodeSettings,
        audio: Option<&AudioSegment>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frames.is_empty() {
            return Err("cannot encode an empty batch".into());
        }
        if let Some(track) = audio {
            track.check_format()?;
        }

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .suffix(&format!(".{}", settings.container.extension()))
            .tempfile_in(dir)?
            .into_temp_path();

        self.write_frames(&staging, frames, settings)?;

        match audio {
            Some(track) if settings.container.supports_audio() => {
                let fitted = fit_audio_to_video(track, frames.len(), settings.fps);
                self.audio_writer.write_audio(&staging, &fitted)?;
            }
            Some(_) => log::warn!(
                "{} containers cannot carry audio; writing {} without it",
                settings.container,
                path.display()
            ),
            None => {}
        }

        staging.persist(path)?;
        Ok(())
    }
}
