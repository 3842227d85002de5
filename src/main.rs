//! Blob Bounce
//!
//! Generates an animation of soft blobs bouncing around a box.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;

use blob_bounce::config::SimulationConfig;
use blob_bounce::export::{export_animation, export_frame};
use blob_bounce::scenario::ScenarioGenerator;
use blob_bounce::{Domain, DomainSettings, Rgb};

/// Generate a bouncing animation.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the output file is written to
    #[arg(short, long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Hex color code for foreground
    #[arg(short, long)]
    foreground: Option<Rgb>,

    /// Hex color code for background
    #[arg(short, long)]
    background: Option<Rgb>,

    /// Number of objects on the plane
    #[arg(short, long)]
    n_objects: Option<u32>,

    /// Initial magnitude of velocity for the objects
    #[arg(short, long)]
    velocity: Option<f64>,

    /// Standard deviation for the objects
    #[arg(short = 'd', long)]
    std: Option<f64>,

    /// Range of random standard deviation for the objects
    #[arg(short = 'D', long)]
    std_range: Option<f64>,

    /// The seed used to spawn the objects
    #[arg(short = 'S', long)]
    seed: Option<u64>,

    /// Width of the output
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Height of the output
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Distance on the plane between each pixel
    #[arg(short, long)]
    resolution: Option<f64>,

    /// FPS for the output
    #[arg(short = 'q', long)]
    fps: Option<u32>,

    /// Time resolution for each step
    #[arg(short, long)]
    time_step: Option<f64>,

    /// Total steps to run
    #[arg(short = 's', long)]
    total_steps: Option<u32>,

    /// Render every n steps
    #[arg(short = 'p', long)]
    render_steps: Option<u32>,

    /// Rainbow colors for the objects
    #[arg(short = 'R', long)]
    rainbow: bool,

    /// Worker threads for force and render tasks
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

impl Args {
    fn apply(&self, config: &mut SimulationConfig) {
        let scene = &mut config.scene;
        if let Some(color) = self.foreground {
            scene.foreground = color;
        }
        if let Some(color) = self.background {
            scene.background = color;
        }
        if let Some(n_objects) = self.n_objects {
            scene.n_objects = n_objects;
        }
        if let Some(velocity) = self.velocity {
            scene.velocity = velocity;
        }
        if let Some(std) = self.std {
            scene.std = std;
        }
        if let Some(std_range) = self.std_range {
            scene.std_range = std_range;
        }
        if self.seed.is_some() {
            scene.seed = self.seed;
        }
        if let Some(width) = self.width {
            scene.width = width;
        }
        if let Some(height) = self.height {
            scene.height = height;
        }
        if let Some(resolution) = self.resolution {
            scene.resolution = resolution;
        }
        scene.rainbow |= self.rainbow;

        let run = &mut config.run;
        if let Some(fps) = self.fps {
            run.fps = fps;
        }
        if let Some(time_step) = self.time_step {
            run.time_step = time_step;
        }
        if let Some(total_steps) = self.total_steps {
            run.total_steps = total_steps;
        }
        if let Some(render_steps) = self.render_steps {
            run.render_steps = render_steps;
        }

        if self.threads.is_some() {
            config.physics.threads = self.threads;
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match args.config {
        Some(ref path) => {
            let config = SimulationConfig::from_file(path)?;
            log::info!("Loaded config from {}", path.display());
            config
        }
        None => SimulationConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let mut generator = ScenarioGenerator::new(config.scene.clone());
    let bounds = generator.bounds()?;
    let blobs = generator.generate()?;
    let settings = DomainSettings {
        repulsion: config.physics.repulsion_model(),
        threads: config.physics.threads,
    };
    let mut domain = Domain::with_settings(blobs, bounds, config.scene.background, settings)?;

    log::info!(
        "Starting simulation: {} blobs, {}x{} px, {} steps of {}s on {} threads",
        config.scene.n_objects,
        config.scene.width,
        config.scene.height,
        config.run.total_steps,
        config.run.time_step,
        domain.thread_count()
    );

    let started = Instant::now();
    let mut frames = Vec::new();
    let report_every = (config.run.total_steps / 10).max(1);
    for index in 0..config.run.total_steps {
        domain.step(config.run.time_step)?;
        if index % config.run.render_steps == 0 {
            frames.push(domain.render(config.scene.resolution)?);
        }
        if (index + 1) % report_every == 0 {
            log::info!(
                "Running: {}/{} steps, {} frames, {:.1}s elapsed",
                index + 1,
                config.run.total_steps,
                frames.len(),
                started.elapsed().as_secs_f64()
            );
        }
    }

    std::fs::create_dir_all(&args.output_dir)?;
    let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let path = output_path(&args.output_dir, stamp, frames.len());
    match frames.as_slice() {
        [single] => {
            export_frame(&path, single)?;
            log::info!("Saved {}", path.display());
        }
        _ => export_animation(&path, &frames, config.run.fps)?,
    }
    Ok(())
}

/// `<dir>/<unix seconds>.png` for a single frame, `.gif` otherwise.
fn output_path(dir: &Path, stamp: u64, frame_count: usize) -> PathBuf {
    let extension = if frame_count == 1 { "png" } else { "gif" };
    dir.join(format!("{}.{}", stamp, extension))
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(error) = run(args) {
        log::error!("{}", error);
        std::process::exit(1);
    }
}
