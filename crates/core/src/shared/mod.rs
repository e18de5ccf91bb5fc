pub mod constants;
pub mod frame;
pub(crate) mod name_conversions;
pub mod node_error;
pub mod video_metadata;
