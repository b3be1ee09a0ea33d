use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use cppn_art::encoding::FfmpegPipe;
use cppn_art::latent::scale_from_speed;
use cppn_art::sink::{write_png, PngSequence};
use cppn_art::weights::MAX_LAYERS;
use cppn_art::{AnimationScheduler, DisplaySurface, FramePacer, RenderSettings};

#[derive(Debug, Parser)]
#[command(name = "cppn-art")]
#[command(about = "Render animated CPPN imagery")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct SettingsArgs {
    /// YAML settings file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override a setting, e.g. --set layers=4 --set activation=sin
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<RenderSettings> {
        let mut settings = RenderSettings::load(self.config.as_deref())?;
        for raw in &self.overrides {
            settings
                .apply_override(raw)
                .with_context(|| format!("failed applying --set {raw}"))?;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate settings and print a summary
    Check {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Print the resolved settings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render a single frame to a PNG
    Still {
        #[command(flatten)]
        settings: SettingsArgs,

        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Frames to advance the latent clock before capturing
        #[arg(long, default_value_t = 1)]
        at_frame: u64,
    },
    /// Render an animation as a numbered PNG sequence
    Frames {
        #[command(flatten)]
        settings: SettingsArgs,

        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        #[arg(long)]
        frames: Option<u64>,

        /// Pace frames at the configured fps instead of rendering flat out
        #[arg(long)]
        realtime: bool,
    },
    /// Stream an animation into ffmpeg
    Encode {
        #[command(flatten)]
        settings: SettingsArgs,

        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        #[arg(long)]
        frames: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cppn_art=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { settings, json } => run_check(&settings.resolve()?, json),
        Commands::Still {
            settings,
            output,
            at_frame,
        } => run_still(&settings.resolve()?, &output, at_frame),
        Commands::Frames {
            settings,
            output,
            frames,
            realtime,
        } => {
            let settings = settings.resolve()?;
            let mut surface = PngSequence::create(&output)?;
            let pacer = if realtime {
                FramePacer::new(settings.fps)?
            } else {
                FramePacer::unpaced()
            };
            run_animation(&settings, frames, &mut surface, pacer)?;
            eprintln!(
                "[cppn] wrote {} frame(s) to {}",
                surface.frames_written(),
                output.display()
            );
            Ok(())
        }
        Commands::Encode {
            settings,
            output,
            frames,
        } => {
            let settings = settings.resolve()?;
            let size = settings.resolution as u32;
            let mut ffmpeg = FfmpegPipe::spawn(size, size, settings.fps, &output)?;
            run_animation(&settings, frames, &mut ffmpeg, FramePacer::unpaced())?;
            ffmpeg.finish()?;
            println!("Wrote {}", output.display());
            Ok(())
        }
    }
}

fn run_check(settings: &RenderSettings, json: bool) -> Result<()> {
    if json {
        let summary = json!({
            "settings": settings,
            "z1_scale": scale_from_speed(settings.z1_speed),
            "z2_scale": scale_from_speed(settings.z2_speed),
            "max_layers": MAX_LAYERS,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "OK: {}x{} @ {} fps, {} layer(s) of {} ({}), stdev {}",
        settings.resolution,
        settings.resolution,
        settings.fps,
        settings.layers,
        settings.hidden_width,
        settings.activation,
        settings.weight_stdev
    );
    println!(
        "Latent scales: z1={} z2={}",
        scale_from_speed(settings.z1_speed),
        scale_from_speed(settings.z2_speed)
    );
    match settings.seed {
        Some(seed) => println!("Seed: {seed}"),
        None => println!("Seed: random"),
    }
    Ok(())
}

fn run_still(settings: &RenderSettings, output: &Path, at_frame: u64) -> Result<()> {
    let mut cppn = settings.build_cppn()?;
    let mut frame = cppn.render_frame()?;
    for _ in 1..at_frame {
        frame = cppn.render_frame()?;
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output dir {}", parent.display()))?;
        }
    }
    write_png(&frame, output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn run_animation<S: DisplaySurface>(
    settings: &RenderSettings,
    frames: Option<u64>,
    surface: &mut S,
    mut pacer: FramePacer,
) -> Result<()> {
    let total = frames
        .or(settings.frames)
        .unwrap_or(u64::from(settings.fps) * 3);
    let mut cppn = settings.build_cppn()?;
    let mut scheduler = AnimationScheduler::new().with_frame_limit(total);

    eprintln!(
        "[cppn] rendering {} frame(s) at {}x{} to {}",
        total,
        settings.resolution,
        settings.resolution,
        surface.label()
    );
    scheduler.start(&mut cppn, surface, &mut pacer)
}
