use std::borrow::Cow;

use super::audio_segment::AudioSegment;

/// Length of `frame_count` frames played at `fps`, in seconds.
pub fn video_duration(frame_count: usize, fps: u32) -> f64 {
    frame_count as f64 / fps as f64
}

/// Fits an audio track to a video of `frame_count` frames at `fps`.
///
/// Audio longer than the video is cut to `[0, video_duration]`. Shorter
/// audio is returned untouched and the tail of the video plays silent;
/// the track is never looped.
pub fn fit_audio_to_video(audio: &AudioSegment, frame_count: usize, fps: u32) -> Cow<'_, AudioSegment> {
    let target = video_duration(frame_count, fps);
    if audio.duration() > target {
        log::debug!(
            "Trimming audio from {:.3}s to {:.3}s ({frame_count} frames @ {fps} fps)",
            audio.duration(),
            target
        );
        Cow::Owned(audio.truncated(target))
    } else {
        Cow::Borrowed(audio)
    }
}
