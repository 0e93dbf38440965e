use anyhow::Context;
use clap::{Parser, Subcommand};
use debugview_ecs::sample::{pose_arm, sample_scene};
use debugview_render::geometry::{self, HIGHLIGHT_X_AXIS, HIGHLIGHT_Z_AXIS};
use debugview_render::{DebugCategory, DebugConfig, DebugSystem, FrameRecorder};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "debugview-cli", about = "Headless debug overlay tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Overlay config (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Record one overlay frame of the sample scene and print its draw calls
    Frame {
        /// Print calls and stats as JSON
        #[arg(long)]
        json: bool,
        /// Hide a category (grid, frusta, colliders, icons, joints); repeatable
        #[arg(long)]
        hide: Vec<DebugCategory>,
        /// Turn the master switch off before drawing
        #[arg(long)]
        inactive: bool,
        /// Animation time used to pose the sample skeletons
        #[arg(short, long, default_value = "0.0")]
        time: f32,
        /// Main camera aspect ratio
        #[arg(long, default_value = "1.7777778")]
        aspect: f32,
    },
    /// Print statistics of the ground grid geometry
    Grid {
        /// Overrides the configured grid size
        #[arg(long)]
        size: Option<f32>,
        /// Overrides the configured division count
        #[arg(long)]
        divisions: Option<u32>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DebugConfig> {
    match path {
        Some(path) => {
            let config = DebugConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            tracing::info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => Ok(DebugConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("debugview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", debugview_render::crate_info());
            println!(
                "categories: {}",
                DebugCategory::ALL.map(|c| c.label()).join(", ")
            );
            println!(
                "grid: size={} divisions={}",
                config.grid.size, config.grid.divisions
            );
            println!("start_active: {}", config.start_active);
        }
        Commands::Frame {
            json,
            hide,
            inactive,
            time,
            aspect,
        } => {
            let mut scene = sample_scene(aspect);
            for arm in &scene.arms {
                pose_arm(&mut scene.store, *arm, time);
            }

            let mut system = DebugSystem::initialize(FrameRecorder::new(), config);
            system.late_initialize(&scene.store)?;
            system.backend_mut().take_calls();
            if inactive {
                system.set_active(false);
            }
            for category in hide {
                system.set_visible(category, false);
            }

            let stats = system.update(1.0 / 60.0, &scene.store);
            let calls = system.backend_mut().take_calls();

            if json {
                let report = serde_json::json!({
                    "main_camera": scene.main_camera.to_string(),
                    "stats": stats,
                    "calls": calls,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Frame: main camera {}, {} entities, {} skeletons cached",
                    scene.main_camera.short(),
                    scene.store.entity_count(),
                    system.skeleton_cache_len()
                );
                for call in &calls {
                    println!("{call}");
                }
                println!(
                    "Draws: grid={} frusta={} colliders={} icons={} joints={} total={}",
                    stats.grid,
                    stats.frusta,
                    stats.colliders,
                    stats.icons,
                    stats.joints,
                    stats.total()
                );
            }
        }
        Commands::Grid { size, divisions } => {
            let size = size.unwrap_or(config.grid.size);
            let divisions = divisions.unwrap_or(config.grid.divisions);
            anyhow::ensure!(divisions > 0, "grid needs at least one division");

            let grid = geometry::grid(size, divisions);
            let highlighted = |slot: f32| {
                grid.vertices
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.color_index == slot)
                    .map(|(i, _)| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            println!("Grid: size={size} divisions={divisions}");
            println!("  vertices: {}", grid.vertices.len());
            println!("  indices:  {}", grid.index_count());
            println!("  lines:    {}", grid.index_count() / 2);
            println!("  z-axis highlight vertices: [{}]", highlighted(HIGHLIGHT_Z_AXIS));
            println!("  x-axis highlight vertices: [{}]", highlighted(HIGHLIGHT_X_AXIS));
        }
    }

    Ok(())
}
