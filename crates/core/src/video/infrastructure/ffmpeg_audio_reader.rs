use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::video::domain::audio_reader::AudioReader;

/// Decodes the audio track of a media file using ffmpeg-next.
///
/// Samples are converted to packed f32 at the stream's own sample rate and
/// channel count, so the segment is handed to the encoder unresampled.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(&self, path: &Path) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;

        let audio_stream = match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
            Some(stream) => stream,
            None => return Ok(None),
        };

        let audio_stream_index = audio_stream.index();
        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;

        let sample_rate = decoder.rate();
        let channels = decoder.channels() as u16;
        check_stream_format(sample_rate, channels)?;
        let layout = if decoder.channel_layout().is_empty() {
            ffmpeg_next::ChannelLayout::default(channels as i32)
        } else {
            decoder.channel_layout()
        };

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            layout,
            sample_rate,
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Packed),
            layout,
            sample_rate,
        )?;

        let mut all_samples: Vec<f32> = Vec::new();
        let mut decoded_frame = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled_frame = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                resampler.run(&decoded_frame, &mut resampled_frame)?;
                extract_f32_samples(&resampled_frame, channels, &mut all_samples);
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            resampler.run(&decoded_frame, &mut resampled_frame)?;
            extract_f32_samples(&resampled_frame, channels, &mut all_samples);
        }

        // The resampler may still hold buffered samples
        if let Ok(Some(delay)) = resampler.flush(&mut resampled_frame) {
            if delay.output > 0 {
                extract_f32_samples(&resampled_frame, channels, &mut all_samples);
            }
        }

        log::debug!(
            "Decoded {} audio samples ({} Hz, {} ch) from {}",
            all_samples.len(),
            sample_rate,
            channels,
            path.display()
        );

        Ok(Some(AudioSegment::new(all_samples, sample_rate, channels)))
    }
}

/// Streams without a channel count or sample rate cannot be muxed later.
fn check_stream_format(sample_rate: u32, channels: u16) -> Result<(), String> {
    if channels == 0 {
        return Err("audio stream reports no channels".to_string());
    }
    if sample_rate == 0 {
        return Err("audio stream reports a zero sample rate".to_string());
    }
    Ok(())
}

/// Appends the interleaved f32 samples of a packed frame.
fn extract_f32_samples(
    frame: &ffmpeg_next::util::frame::audio::Audio,
    channels: u16,
    out: &mut Vec<f32>,
) {
    let count = frame.samples() * channels as usize;
    if count == 0 {
        return;
    }
    let data = frame.data(0);
    out.extend(
        data[..count * 4]
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]])),
    );
}
