pub mod frame_accumulator;
pub mod frame_meta;
pub mod frame_source;
pub mod pipeline_logger;
pub mod save_video_config;
pub mod ui_status;
