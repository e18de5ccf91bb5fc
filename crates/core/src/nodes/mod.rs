pub mod node_descriptor;
pub mod node_registry;
pub mod video_nodes;
