use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use deforum_video_core::nodes::node_registry::InMemoryNodeRegistry;
use deforum_video_core::nodes::video_nodes::register_video_nodes;
use deforum_video_core::pipeline::frame_accumulator::FrameAccumulator;
use deforum_video_core::pipeline::frame_meta::FrameMeta;
use deforum_video_core::pipeline::frame_source::FrameSource;
use deforum_video_core::pipeline::save_video_config::{DumpMode, SaveVideoConfig};
use deforum_video_core::video::domain::audio_reader::AudioReader;
use deforum_video_core::video::domain::encode_settings::{
    ContainerFormat, PixelFormat, VideoCodec,
};
use deforum_video_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;

/// Deforum video loader and save nodes, driven from the command line.
#[derive(Parser)]
#[command(name = "deforum-video", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Feed frames from a video into the save node, one per step.
    Run(RunArgs),
    /// Print the node descriptors as JSON.
    Describe {
        /// Directory the loader lists videos from.
        #[arg(long, default_value = ".")]
        input_dir: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Source video file.
    input: PathBuf,

    /// Folder saved videos are written to.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Number of invocations to run (defaults to --max-frames).
    #[arg(long)]
    steps: Option<usize>,

    /// Frame count of the run, as the animation settings would report it.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Settings file (defaults to the saved settings in the config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the config dir.
    #[arg(long)]
    save_config: bool,

    /// Media file whose audio track is muxed into saved videos.
    #[arg(long)]
    audio: Option<PathBuf>,

    #[arg(long)]
    filename_prefix: Option<String>,

    #[arg(long)]
    fps: Option<u32>,

    #[arg(long)]
    codec: Option<VideoCodec>,

    #[arg(long)]
    pixel_format: Option<PixelFormat>,

    /// Container: mp4, mov, gif or avi.
    #[arg(long)]
    format: Option<ContainerFormat>,

    /// Quality from 1 (smallest) to 10 (best).
    #[arg(long)]
    quality: Option<u8>,

    /// Batch completion rule: max_frames or per_N_frames.
    #[arg(long)]
    dump_by: Option<DumpMode>,

    /// Period for per_N_frames.
    #[arg(long)]
    dump_every: Option<usize>,

    /// Dump batches without writing video files.
    #[arg(long)]
    skip_save: bool,

    /// Do not render preview images.
    #[arg(long)]
    no_preview: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Run(args) => run_frames(args),
        Command::Describe { input_dir } => describe(&input_dir),
    }
}

fn run_frames(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    if args.save_config {
        save_config(&config)?;
    }

    FrameSource::validate_source(&args.input)?;
    let steps = args
        .steps
        .or(args.max_frames)
        .ok_or("--steps or --max-frames is required")?;

    let audio = match &args.audio {
        Some(path) => {
            let track = FfmpegAudioReader.read_audio(path)?;
            if track.is_none() {
                log::warn!("{} has no audio stream", path.display());
            }
            track
        }
        None => None,
    };

    let mut source = FrameSource::ffmpeg();
    let mut accumulator = FrameAccumulator::with_output_dir(&args.output_dir);
    let meta = FrameMeta::new(args.max_frames, false);

    for step in 1..=steps {
        let loaded = source.next(&args.input, false)?;
        let outcome = accumulator.push(vec![loaded.frame], &config, &meta, audio.as_ref())?;
        eprint!(
            "\rStep {step}/{steps}: frame {} (buffered {})",
            loaded.current_index, outcome.ui.counter
        );
    }
    eprintln!();

    accumulator.flush(&config, &meta, audio.as_ref())?;
    accumulator.summary();
    Ok(())
}

fn describe(input_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = InMemoryNodeRegistry::new();
    register_video_nodes(&mut registry, input_dir)?;
    println!("{}", registry.to_json()?);
    Ok(())
}

fn build_config(args: &RunArgs) -> Result<SaveVideoConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => load_saved_config(),
    };

    if let Some(prefix) = &args.filename_prefix {
        config.filename_prefix = prefix.clone();
    }
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(codec) = args.codec {
        config.codec = codec;
    }
    if let Some(pixel_format) = args.pixel_format {
        config.pixel_format = pixel_format;
    }
    if let Some(container) = args.format {
        config.container = container;
    }
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if let Some(dump_by) = args.dump_by {
        config.dump_by = dump_by;
    }
    if let Some(dump_every) = args.dump_every {
        config.dump_every = dump_every;
    }
    if args.skip_save {
        config.skip_save = true;
    }
    if args.no_preview {
        config.enable_preview = false;
    }

    config.validate()?;
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("DeforumVideo").join("save_video.json"))
}

fn load_saved_config() -> SaveVideoConfig {
    config_path()
        .and_then(|path| fs::read_to_string(path).ok())
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

fn save_config(config: &SaveVideoConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path().ok_or("no config directory on this platform")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    log::info!("Saved settings to {}", path.display());
    Ok(())
}
