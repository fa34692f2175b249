use anyhow::Context;
use clap::{Parser, Subcommand};
use paturage_common::Transform;
use paturage_kernel::{Breed, Pasture, PastureConfig};
use paturage_render::{DebugTextRenderer, DrawList, Renderer};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paturage-cli", about = "Headless tool for the cow pasture")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default herd
    Info,
    /// Run the pasture headless at a fixed frame rate
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Seconds between frames
        #[arg(long, default_value = "0.016")]
        dt: f64,
        /// RNG seed for a reproducible herd
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Pasture config file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Frame numbers at which to click the pasture
        #[arg(long, value_delimiter = ',')]
        click_at: Vec<u64>,
        /// Print every frame's draw list instead of a summary
        #[arg(long)]
        draws: bool,
    },
    /// Print the camera matrices for one frame
    Matrices {
        /// Vertical field of view in radians (defaults to the configured target)
        #[arg(long)]
        fov: Option<f32>,
        /// Viewport width divided by height
        #[arg(long, default_value = "1.0")]
        aspect: f32,
        /// Seconds since start, drives the camera orbit
        #[arg(long, default_value = "0.0")]
        time: f32,
    },
    /// Load and validate a config file, then print it resolved
    CheckConfig {
        /// Path to the config file
        path: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PastureConfig> {
    match path {
        Some(path) => PastureConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PastureConfig::default()),
    }
}

fn print_matrix(name: &str, m: &Transform) {
    println!("{name}:");
    for row in 0..4 {
        println!(
            "  [{:>9.4} {:>9.4} {:>9.4} {:>9.4}]",
            m.get(0, row),
            m.get(1, row),
            m.get(2, row),
            m.get(3, row)
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = PastureConfig::default();
            println!("paturage-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", paturage_kernel::crate_info());
            println!("render: {}", paturage_render::crate_info());
            println!("herd: {} cows", config.herd_size());
            for breed in Breed::ALL {
                let count = config.herd.get(&breed).copied().unwrap_or(0);
                println!("  {:<16} {count}", breed.name());
            }
            println!(
                "bounds: {}, gravity: {}",
                config.physics.bounds,
                config.physics.effective_gravity()
            );
        }
        Commands::Simulate {
            frames,
            dt,
            seed,
            config,
            click_at,
            draws,
        } => {
            let config = load_config(config.as_deref())?;
            config.validate()?;

            let mut pasture = Pasture::with_seed(config, seed);
            let mut renderer = DebugTextRenderer::new();
            println!(
                "Simulating {} cows: seed={seed}, frames={frames}, dt={dt}",
                pasture.cows().len()
            );

            for frame in 0..frames {
                if click_at.contains(&frame) {
                    pasture.click();
                }
                let view = pasture.frame(frame as f64 * dt, 1.0);
                if draws {
                    let list = DrawList::build(&pasture, &view);
                    print!("{}", renderer.render(&list)?);
                }
            }

            let events = pasture.drain_events();
            let summary = pasture.summary();
            println!(
                "frame={}, grounded={}/{}, mean_height={:.3}, fov={:.3}, events={}",
                summary.frame,
                summary.grounded,
                summary.cow_count,
                summary.mean_height,
                summary.fov,
                events.len()
            );
            let centre = pasture.herd_centre();
            println!(
                "herd centre: ({:.2}, {:.2}, {:.2})",
                centre.x, centre.y, centre.z
            );
        }
        Commands::Matrices { fov, aspect, time } => {
            let pasture = Pasture::with_seed(PastureConfig::default(), 0);
            let camera = &pasture.config().camera;
            let fov = fov.unwrap_or(camera.target_fov);

            let mut projection = Transform::identity();
            projection.perspective(fov, aspect, camera.near, camera.far);
            let view = pasture.frame_view(time, aspect).view;

            println!("fov={fov:.4} aspect={aspect} time={time}");
            print_matrix("projection", &projection);
            print_matrix("view", &view);
            print_matrix("view_projection", &(projection * view));
        }
        Commands::CheckConfig { path } => {
            let config = load_config(Some(&path))?;
            config.validate()?;
            println!("{}: OK ({} cows)", path.display(), config.herd_size());
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}
