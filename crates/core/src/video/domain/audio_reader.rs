use crate::audio::domain::audio_segment::AudioSegment;
use std::path::Path;

/// Domain interface for decoding an audio track from a media file.
pub trait AudioReader: Send {
    /// Decode the best audio stream to interleaved PCM at its native sample
    /// rate and channel count. Returns None if the file has no audio.
    fn read_audio(&self, path: &Path) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;
}
