pub mod audio_reader;
pub mod audio_writer;
pub mod encode_settings;
pub mod output_path_resolver;
pub mod preview_encoder;
pub mod sequence_encoder;
pub mod video_reader;
pub mod video_writer;
