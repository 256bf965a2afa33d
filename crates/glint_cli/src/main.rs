//! Glint CLI
//!
//! Run the demo scene headlessly and inspect engine configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use glint_runtime::{Engine, EngineConfig, EngineStats, HeadlessRenderer, RenderLoop, CONFIG_FILE};

mod scene;

use scene::Scene;

#[derive(Parser)]
#[command(name = "glint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Glint scene engine CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo scene for a number of frames
    Run {
        /// Frames to render
        #[arg(short, long, default_value = "180")]
        frames: u64,

        /// Override the configured frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Render on the background loop in real time instead of stepping
        #[arg(long)]
        realtime: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective engine configuration
    Config,

    /// Show version and node kind information
    Info,
}

/// What `glint run` reports
#[derive(Debug, Serialize)]
struct RunSummary {
    frames: u64,
    nodes_created: usize,
    callbacks_completed: usize,
    callbacks_failed: usize,
    elapsed_ms: u128,
    engine: EngineStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = EngineConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Run {
            frames,
            fps,
            realtime,
            json,
        } => cmd_run(config, frames, fps, realtime, json),
        Commands::Config => cmd_config(&config),
        Commands::Info => cmd_info(),
    }
}

fn cmd_run(
    mut config: EngineConfig,
    frames: u64,
    fps: Option<u32>,
    realtime: bool,
    json: bool,
) -> Result<()> {
    if let Some(fps) = fps {
        config.target_fps = fps;
        // Re-validate through the same path a file would take
        config = EngineConfig::from_toml_str(&config.to_toml_string()?)
            .context("Invalid frame rate")?;
    }

    let resources = scene::resources(&config).context("Failed to set up resources")?;
    let engine = Engine::new(config.clone(), resources, Box::new(HeadlessRenderer::new()));
    let mut controller = engine.controller();
    let scene = Scene::build(&mut controller).context("Failed to build the demo scene")?;
    let nodes_created = scene.node_count();
    let log = scene.log.clone();

    info!(
        "Running {} frames at {} fps ({})",
        frames,
        config.target_fps,
        if realtime { "realtime" } else { "stepped" }
    );
    let started = Instant::now();

    let stats = if realtime {
        let mut render_loop = RenderLoop::new(engine);
        render_loop.start_background();
        while render_loop.frames() < frames {
            std::thread::sleep(config.frame_duration());
            controller.dispatch();
        }
        render_loop.stop_background();

        scene.teardown(&mut controller)?;
        render_loop.with_engine(|engine| {
            engine.tick(frames as f64 / config.target_fps as f64);
        });
        controller.dispatch();
        render_loop.stats()
    } else {
        let mut engine = engine;
        let step = 1.0 / config.target_fps as f64;
        for frame in 0..frames {
            engine.tick(frame as f64 * step);
            controller.dispatch();
        }

        scene.teardown(&mut controller)?;
        engine.tick(frames as f64 * step);
        controller.dispatch();
        engine.stats()
    };

    let summary = RunSummary {
        frames: stats.frames,
        nodes_created,
        callbacks_completed: log.completed(),
        callbacks_failed: log.failed(),
        elapsed_ms: started.elapsed().as_millis(),
        engine: stats,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!(
            "Rendered {} frames in {:?}: {} requests, {} failed, {} animations finished",
            summary.frames,
            Duration::from_millis(summary.elapsed_ms as u64),
            summary.engine.requests,
            summary.engine.failed,
            summary.engine.animations_finished
        );
        info!(
            "Nodes: {} created, {} reclaimed, {} live",
            summary.nodes_created, summary.engine.nodes_reclaimed, summary.engine.nodes_live
        );
        info!(
            "Textures: {} created, {} deleted, {} live",
            summary.engine.textures_created,
            summary.engine.textures_deleted,
            summary.engine.textures_live
        );
        info!(
            "Callbacks: {} completed, {} failed",
            summary.callbacks_completed, summary.callbacks_failed
        );
    }

    Ok(())
}

fn cmd_config(config: &EngineConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn cmd_info() -> Result<()> {
    use glint_runtime::prelude::NodeKind;

    println!("Glint scene engine");
    println!("==================");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Node kinds:");

    let mut engine = Engine::headless(EngineConfig::default());
    let mut controller = engine.controller();
    for kind in [
        NodeKind::Group,
        NodeKind::Rect,
        NodeKind::Text,
        NodeKind::Polygon,
    ] {
        let node = controller.create_node(kind);
        let names: Vec<&str> = node.properties().map(|p| p.name()).collect();
        println!("  - {:?}: {}", kind, names.join(", "));
        controller.destroy_node(&node)?;
    }
    engine.tick(0.0);

    Ok(())
}
