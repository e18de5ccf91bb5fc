pub mod counter_path_resolver;
pub mod ffmpeg_audio_reader;
pub mod ffmpeg_audio_writer;
pub mod ffmpeg_reader;
pub mod ffmpeg_writer;
pub mod muxing_sequence_encoder;
pub mod webp_preview_encoder;
