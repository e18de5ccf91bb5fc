use crate::shared::node_error::NodeError;

use super::node_descriptor::NodeDescriptor;

/// Host-side catalogue the nodes are registered into.
pub trait NodeRegistry {
    /// Adds a node; ids must be unique.
    fn register(&mut self, descriptor: NodeDescriptor) -> Result<(), NodeError>;
}

/// Registry that keeps descriptors in registration order.
#[derive(Debug, Default)]
pub struct InMemoryNodeRegistry {
    nodes: Vec<NodeDescriptor>,
}

impl InMemoryNodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All descriptors as a pretty-printed JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.nodes)
    }
}

impl NodeRegistry for InMemoryNodeRegistry {
    fn register(&mut self, descriptor: NodeDescriptor) -> Result<(), NodeError> {
        if self.get(&descriptor.id).is_some() {
            return Err(NodeError::DuplicateNode(descriptor.id));
        }
        log::debug!("Registered node {} ({})", descriptor.id, descriptor.display_name);
        self.nodes.push(descriptor);
        Ok(())
    }
}
