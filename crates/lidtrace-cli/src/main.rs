use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lidtrace_frame::{FrameConverter, FrameTransformer, RawLayout, RgbBuffer, Rotation, Yuv420Frame};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod replay;

use config::Config;
use engine::Admission;

#[derive(Parser)]
#[command(name = "lidtrace", about = "Eyelid overlay pipeline for YUV420 camera frames")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one raw frame through the full pipeline and save the annotated result
    Render {
        #[command(flatten)]
        frame: FrameArgs,
        /// JSON file of recorded faces (68 landmarks each, working-buffer coordinates)
        #[arg(short, long)]
        landmarks: PathBuf,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Convert and crop one raw frame without overlays
    Convert {
        #[command(flatten)]
        frame: FrameArgs,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the direct and mirrored eyelid control points as JSON
    Table,
}

#[derive(Args)]
struct FrameArgs {
    /// Raw YUV420 frame file
    #[arg(short, long)]
    input: PathBuf,
    /// Frame width in pixels
    #[arg(long)]
    width: u32,
    /// Frame height in pixels
    #[arg(long)]
    height: u32,
    /// Memory layout of the raw file (i420, nv12, nv21)
    #[arg(long, default_value = "nv21")]
    layout: RawLayout,
    /// Rotation of the working buffer in degrees (-90, 0, 90)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "display")]
    rotation: Option<i32>,
    /// Display size as WIDTHxHEIGHT; portrait displays rotate by -90
    #[arg(long, value_parser = parse_display)]
    display: Option<(u32, u32)>,
}

impl FrameArgs {
    fn rotation(&self) -> Result<Rotation> {
        Ok(match (self.rotation, self.display) {
            (Some(degrees), _) => Rotation::try_from(degrees)?,
            (None, Some((w, h))) => Rotation::for_display(w, h),
            (None, None) => Rotation::None,
        })
    }

    fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.input).with_context(|| format!("reading {}", self.input.display()))
    }
}

fn parse_display(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s}"))?;
    let w = w.trim().parse().map_err(|e| format!("bad display width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad display height: {e}"))?;
    Ok((w, h))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Render {
            frame,
            landmarks,
            output,
        } => render(&config, &frame, &landmarks, &output).await,
        Commands::Convert { frame, output } => convert(&config, &frame, &output),
        Commands::Table => print_table(&config),
    }
}

async fn render(config: &Config, args: &FrameArgs, landmarks: &Path, output: &Path) -> Result<()> {
    let renderer = config.renderer().context("loading eyelid control table")?;
    let detector = replay::ReplayDetector::load(landmarks)?;
    let (mut frames, mut outcomes) = engine::spawn_frame_loop(detector, renderer, config.output_size)?;

    let data = args.read()?;
    let frame = Yuv420Frame::from_raw(&data, args.width, args.height, args.layout)?;
    let rotation = args.rotation()?;

    let sequence = match frames.submit(&frame, rotation)? {
        Admission::Admitted(sequence) => sequence,
        Admission::Dropped => bail!("frame dropped: worker still busy"),
    };
    tracing::info!(sequence, rotation = rotation.degrees(), "frame admitted");

    let outcome = outcomes
        .recv()
        .await
        .context("frame worker exited before finishing")?;
    println!(
        "frame {}: {} face(s), {} overlay(s) drawn, {} skipped",
        outcome.sequence, outcome.faces, outcome.overlays_drawn, outcome.overlays_skipped
    );

    save_png(&outcome.image, output)?;
    tracing::debug!(idle = frames.is_idle(), "frame loop finished");
    frames.recycle(outcome.image);
    Ok(())
}

fn convert(config: &Config, args: &FrameArgs, output: &Path) -> Result<()> {
    let transformer = FrameTransformer::new(config.output_size, config.output_size)?;
    let data = args.read()?;
    let frame = Yuv420Frame::from_raw(&data, args.width, args.height, args.layout)?;

    let mut converter = FrameConverter::new();
    let rgb = converter.convert(&frame)?;
    let working = transformer.transform(rgb, args.rotation()?);

    save_png(&working, output)
}

fn print_table(config: &Config) -> Result<()> {
    let table = config.lid_table().context("loading eyelid control table")?;
    let json = serde_json::json!({
        "name": table.name(),
        "direct": table.direct(),
        "mirrored": table.mirrored(),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn save_png(buffer: &RgbBuffer, path: &Path) -> Result<()> {
    buffer
        .to_rgba_image()
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), width = buffer.width, height = buffer.height, "saved frame");
    Ok(())
}
