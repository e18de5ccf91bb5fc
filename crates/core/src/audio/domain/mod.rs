pub mod audio_fit;
pub mod audio_segment;
