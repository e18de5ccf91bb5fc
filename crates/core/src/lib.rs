pub mod audio;
pub mod nodes;
pub mod pipeline;
pub mod shared;
pub mod video;
