use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::constants::AAC_FALLBACK_FRAME_SIZE;
use crate::video::domain::audio_writer::AudioWriter;

/// Muxes audio into an existing video file using ffmpeg-next.
///
/// The writer opens the existing video-only file, writes a staging file next
/// to it holding the original video stream plus the newly encoded AAC audio,
/// then renames the staging file over the original. The staging file is
/// removed if anything fails.
pub struct FfmpegAudioWriter;

impl AudioWriter for FfmpegAudioWriter {
    fn write_audio(
        &self,
        video_path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), Box<dyn std::error::Error>> {
        audio.check_format()?;
        ffmpeg_next::init()?;

        let ext = video_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let dir = match video_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let temp_path = tempfile::Builder::new()
            .prefix(".audio-mux-")
            .suffix(&format!(".{ext}"))
            .tempfile_in(dir)?
            .into_temp_path();

        let mut ictx = ffmpeg_next::format::input(video_path)?;
        let mut octx = ffmpeg_next::format::output_as(&temp_path, ext)?;

        let video_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream in source file")?;
        let video_src_idx = video_stream.index();
        let video_in_tb = video_stream.time_base();

        let mut ost_video =
            octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost_video.set_parameters(video_stream.parameters());
        // Safety: the parameters pointer belongs to the stream we just added
        // and no other reference to it is alive.
        unsafe {
            (*ost_video.parameters().as_mut_ptr()).codec_tag = 0;
        }
        let video_ost_idx = ost_video.index();

        let aac_codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC)
            .ok_or("AAC encoder not found")?;
        let mut ost_audio = octx.add_stream(Some(aac_codec))?;
        let audio_ost_idx = ost_audio.index();

        let layout = channel_layout(audio.channels());
        let mut audio_encoder = ffmpeg_next::codec::context::Context::new_with_codec(aac_codec)
            .encoder()
            .audio()?;

        audio_encoder.set_rate(audio.sample_rate() as i32);
        audio_encoder.set_channel_layout(layout);
        audio_encoder.set_format(ffmpeg_next::format::Sample::F32(
            ffmpeg_next::format::sample::Type::Planar,
        ));

        let mut audio_encoder = audio_encoder.open_as(aac_codec)?;
        ost_audio.set_parameters(&audio_encoder);

        let audio_time_base = audio_encoder.time_base();
        let frame_size = audio_encoder.frame_size() as usize;

        octx.write_header()?;

        let ost_video_tb = octx
            .stream(video_ost_idx)
            .ok_or("video output stream missing")?
            .time_base();
        let ost_audio_tb = octx
            .stream(audio_ost_idx)
            .ok_or("audio output stream missing")?
            .time_base();

        for (stream, mut packet) in ictx.packets() {
            if stream.index() != video_src_idx {
                continue;
            }
            packet.rescale_ts(video_in_tb, ost_video_tb);
            packet.set_position(-1);
            packet.set_stream(video_ost_idx);
            packet.write_interleaved(&mut octx)?;
        }

        encode_audio_segment(
            &mut audio_encoder,
            audio,
            layout,
            &mut octx,
            audio_ost_idx,
            audio_time_base,
            ost_audio_tb,
            frame_size,
        )?;

        octx.write_trailer()?;

        // Close both files before the rename
        drop(octx);
        drop(ictx);

        temp_path.persist(video_path)?;
        Ok(())
    }
}

fn channel_layout(channels: u16) -> ffmpeg_next::ChannelLayout {
    match channels {
        1 => ffmpeg_next::ChannelLayout::MONO,
        2 => ffmpeg_next::ChannelLayout::STEREO,
        n => ffmpeg_next::ChannelLayout::default(n as i32),
    }
}

/// Encode an AudioSegment into AAC packets and write them to the output.
#[allow(clippy::too_many_arguments)]
fn encode_audio_segment(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    audio: &AudioSegment,
    layout: ffmpeg_next::ChannelLayout,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
    frame_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let planes = audio.planes();
    let total = audio.frame_count();
    let effective_frame_size = if frame_size == 0 {
        AAC_FALLBACK_FRAME_SIZE
    } else {
        frame_size
    };

    let mut start = 0usize;
    while start < total {
        let len = effective_frame_size.min(total - start);
        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            len,
            layout,
        );
        frame.set_rate(audio.sample_rate());
        frame.set_pts(Some(start as i64));

        for (channel, plane) in planes.iter().enumerate() {
            let dst = frame.data_mut(channel);
            for (bytes, sample) in dst.chunks_exact_mut(4).zip(&plane[start..start + len]) {
                bytes.copy_from_slice(&sample.to_ne_bytes());
            }
        }

        encoder.send_frame(&frame)?;
        flush_audio_packets(encoder, octx, stream_idx, enc_time_base, ost_time_base)?;

        start += len;
    }

    encoder.send_eof()?;
    flush_audio_packets(encoder, octx, stream_idx, enc_time_base, ost_time_base)?;

    Ok(())
}

fn flush_audio_packets(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_idx);
        encoded.rescale_ts(enc_time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_write_audio_nonexistent_file() {
        let writer = FfmpegAudioWriter;
        let audio = AudioSegment::new(vec![0.0; 16000], 16000, 1);
        let path = if cfg!(windows) {
            Path::new("Z:\\nonexistent\\file.mp4")
        } else {
            Path::new("/nonexistent/file.mp4")
        };
        assert!(writer.write_audio(path, &audio).is_err());
    }

    #[test]
    fn test_failed_mux_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not_a_video.mp4");
        std::fs::write(&bogus, b"definitely not mp4").unwrap();

        let writer = FfmpegAudioWriter;
        let audio = AudioSegment::new(vec![0.0; 8000], 8000, 2);
        assert!(writer.write_audio(&bogus, &audio).is_err());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_malformed_audio_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"").unwrap();

        let audio = AudioSegment::new(vec![0.0; 16], 0, 1);
        let err = FfmpegAudioWriter.write_audio(&path, &audio).unwrap_err();
        assert!(err.to_string().contains("sample rate"));
    }

    #[test]
    fn test_channel_layouts() {
        assert_eq!(channel_layout(1), ffmpeg_next::ChannelLayout::MONO);
        assert_eq!(channel_layout(2), ffmpeg_next::ChannelLayout::STEREO);
    }
}
