use serde::Serialize;

/// Type of a node input, with the widget parameters the host needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputKind {
    Image,
    String { default: String },
    Int { default: i64, min: i64, max: i64 },
    Boolean { default: bool },
    /// One of a fixed list of strings; the first is the default.
    Combo { choices: Vec<String> },
    DeforumFrameData,
    Audio,
}

/// Type of a node output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputKind {
    Image,
    Int,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: InputKind,
    pub required: bool,
}

impl InputSpec {
    pub fn required(name: &str, kind: InputKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: &str, kind: InputKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OutputKind,
}

impl OutputSpec {
    pub fn new(name: &str, kind: OutputKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Everything the host needs to list a node and wire its ports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDescriptor {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
    /// The node produces a side effect (a file) and must run even when
    /// nothing consumes its outputs.
    pub output_node: bool,
    /// The node is stateful, so the host must not cache its results.
    pub always_reevaluate: bool,
}

impl NodeDescriptor {
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }
}
