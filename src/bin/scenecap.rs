//! scenecap - interactive RGB-D scene capture.
//!
//! Streams aligned color + depth frames from the configured source and, on
//! SPACE, persists the current pair into the BOP-style scene directory.
//! ESC, `q` or ctrl-c end the session; per-frame camera metadata is flushed
//! to scene_camera.json on the way out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use scenecap::{open_source, CaptureConfig, CaptureSession, CommandSource, SceneLayout};

#[derive(Parser, Debug)]
#[command(name = "scenecap", about = "RGB-D scene capture for 6D pose datasets")]
struct Args {
    /// Dataset root directory
    #[arg(long)]
    root: Option<std::path::PathBuf>,

    /// Dataset split name (train, val, test, ...)
    #[arg(long)]
    split: Option<String>,

    /// Scene index within the split
    #[arg(long)]
    scene: Option<u32>,

    /// Frame source url (stub://<name> or realsense://)
    #[arg(long)]
    source: Option<String>,

    /// Stream width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Stream height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Stream rate in frames per second
    #[arg(long)]
    fps: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = CaptureConfig::load()?;
    apply_args(&mut cfg, args);

    let layout = SceneLayout::new(&cfg.dataset_root, &cfg.split, cfg.scene);

    let source = open_source(&cfg.stream.url, cfg.stream.stream_config())
        .with_context(|| format!("open frame source {}", cfg.stream.url))?;
    log::info!(
        "streaming {} at {}x{} @ {} fps",
        cfg.stream.url,
        cfg.stream.width,
        cfg.stream.height,
        cfg.stream.fps
    );

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))
            .context("install ctrl-c handler")?;
    }
    let mut commands = make_commands(cancel);

    log::info!("press SPACE to capture, ESC or q to quit");
    let session = CaptureSession::start(layout, source)?;
    let summary = session.run(commands.as_mut())?;

    log::info!(
        "captured {} frames into {}",
        summary.frames_captured,
        summary.scene_dir.display()
    );
    Ok(())
}

fn apply_args(cfg: &mut CaptureConfig, args: Args) {
    if let Some(root) = args.root {
        cfg.dataset_root = root;
    }
    if let Some(split) = args.split {
        cfg.split = split;
    }
    if let Some(scene) = args.scene {
        cfg.scene = scene;
    }
    if let Some(source) = args.source {
        cfg.stream.url = source;
    }
    if let Some(width) = args.width {
        cfg.stream.width = width;
    }
    if let Some(height) = args.height {
        cfg.stream.height = height;
    }
    if let Some(fps) = args.fps {
        cfg.stream.fps = fps;
    }
}

#[cfg(feature = "terminal-input")]
fn make_commands(cancel: Arc<AtomicBool>) -> Box<dyn CommandSource> {
    match scenecap::TerminalCommands::new(cancel.clone()) {
        Ok(terminal) => Box::new(terminal),
        Err(e) => {
            log::warn!("terminal input unavailable ({:#}); ctrl-c cancels only", e);
            Box::new(scenecap::FlagCommands::new(cancel))
        }
    }
}

#[cfg(not(feature = "terminal-input"))]
fn make_commands(cancel: Arc<AtomicBool>) -> Box<dyn CommandSource> {
    Box::new(scenecap::FlagCommands::new(cancel))
}
