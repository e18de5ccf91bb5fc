use std::fs;
use std::io;
use std::path::Path;

use crate::shared::constants::{
    DEFAULT_FILENAME_PREFIX, DEFAULT_FPS, DEFAULT_QUALITY, LOAD_VIDEO_NODE_ID, MAX_FPS,
    MAX_PERIOD_LENGTH, MAX_QUALITY, MIN_FPS, MIN_QUALITY, NODE_CATEGORY, SAVE_VIDEO_NODE_ID,
    VIDEO_EXTENSIONS,
};
use crate::pipeline::save_video_config::DumpMode;
use crate::shared::node_error::NodeError;
use crate::video::domain::encode_settings::{ContainerFormat, PixelFormat, VideoCodec};

use super::node_descriptor::{InputKind, InputSpec, NodeDescriptor, OutputKind, OutputSpec};
use super::node_registry::NodeRegistry;

/// Sorted names of the files in `input_dir` with a loadable video
/// extension.
pub fn list_video_files(input_dir: &Path) -> io::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_video = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext));
        if is_video {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

pub fn load_video_descriptor(input_dir: &Path) -> io::Result<NodeDescriptor> {
    Ok(NodeDescriptor {
        id: LOAD_VIDEO_NODE_ID.to_string(),
        display_name: "Load Video".to_string(),
        category: NODE_CATEGORY.to_string(),
        inputs: vec![
            InputSpec::required(
                "video",
                InputKind::Combo {
                    choices: list_video_files(input_dir)?,
                },
            ),
            InputSpec::required("reset", InputKind::Boolean { default: false }),
        ],
        outputs: vec![
            OutputSpec::new("IMAGE", OutputKind::Image),
            OutputSpec::new("FRAME_IDX", OutputKind::Int),
            OutputSpec::new("MAX_FRAMES", OutputKind::Int),
        ],
        output_node: false,
        always_reevaluate: true,
    })
}

pub fn save_video_descriptor() -> NodeDescriptor {
    fn combo<T: Copy>(all: &[T], name: impl Fn(T) -> &'static str) -> InputKind {
        InputKind::Combo {
            choices: all.iter().map(|&v| name(v).to_string()).collect(),
        }
    }
    fn flag(default: bool) -> InputKind {
        InputKind::Boolean { default }
    }

    NodeDescriptor {
        id: SAVE_VIDEO_NODE_ID.to_string(),
        display_name: "Save Video".to_string(),
        category: NODE_CATEGORY.to_string(),
        inputs: vec![
            InputSpec::required("image", InputKind::Image),
            InputSpec::required(
                "filename_prefix",
                InputKind::String {
                    default: DEFAULT_FILENAME_PREFIX.to_string(),
                },
            ),
            InputSpec::required(
                "fps",
                InputKind::Int {
                    default: DEFAULT_FPS.into(),
                    min: MIN_FPS.into(),
                    max: MAX_FPS.into(),
                },
            ),
            InputSpec::required("codec", combo(VideoCodec::ALL, VideoCodec::as_str)),
            InputSpec::required("pixel_format", combo(PixelFormat::ALL, PixelFormat::as_str)),
            InputSpec::required("format", combo(ContainerFormat::ALL, ContainerFormat::extension)),
            InputSpec::required(
                "quality",
                InputKind::Int {
                    default: DEFAULT_QUALITY.into(),
                    min: MIN_QUALITY.into(),
                    max: MAX_QUALITY.into(),
                },
            ),
            InputSpec::required("dump_by", combo(DumpMode::ALL, DumpMode::as_str)),
            InputSpec::required(
                "dump_every",
                InputKind::Int {
                    default: 0,
                    min: 0,
                    max: MAX_PERIOD_LENGTH as i64,
                },
            ),
            InputSpec::required("dump_now", flag(false)),
            InputSpec::required("skip_save", flag(false)),
            InputSpec::required("skip_return", flag(true)),
            InputSpec::required("enable_preview", flag(true)),
            InputSpec::optional("deforum_frame_data", InputKind::DeforumFrameData),
            InputSpec::optional("audio", InputKind::Audio),
        ],
        outputs: vec![OutputSpec::new("IMAGE", OutputKind::Image)],
        output_node: true,
        always_reevaluate: true,
    }
}

/// Registers both video nodes, offering the videos found in `input_dir`.
pub fn register_video_nodes(
    registry: &mut dyn NodeRegistry,
    input_dir: &Path,
) -> Result<(), NodeError> {
    let loader = load_video_descriptor(input_dir)
        .map_err(|e| NodeError::source_unavailable(input_dir, e))?;
    registry.register(loader)?;
    registry.register(save_video_descriptor())
}
