#![deny(unsafe_code)]
//! CLI binary for the contour-art engine.
//!
//! Subcommands:
//! - `render <images..>`: animate contours over source images, write a PNG
//! - `list`: print available engines and their parameter schema

mod error;

use clap::{ArgAction, Parser, Subcommand};
use contour_art_core::Engine;
use contour_art_engines::EngineKind;
use error::CliError;
use glam::Vec2;
use std::path::PathBuf;
use std::process;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "contour-art", about = "Animated contour art from images")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Animate contours over one or more images and write the last frame.
    Render {
        /// Source images (PNG or JPEG), shown in order.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Viewport width in pixels.
        #[arg(short = 'W', long, default_value_t = 512)]
        width: usize,

        /// Viewport height in pixels.
        #[arg(short = 'H', long, default_value_t = 512)]
        height: usize,

        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 120)]
        frames: u64,

        /// Simulated frame rate; sets the clock the transitions run on.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Switch to the next image every N frames (0 disables).
        #[arg(long, default_value_t = 0)]
        advance_every: u64,

        /// Pointer position as `x,y` in viewport pixels.
        #[arg(long, value_parser = parse_pointer)]
        pointer: Option<Vec2>,

        /// Seed for the noise permutation.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Engine parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Output PNG path.
        #[arg(short, long, default_value = "output.png")]
        output: PathBuf,

        /// Also write the last frame's segments as JSON.
        #[arg(long)]
        segments: Option<PathBuf>,
    },
    /// List available engines and their parameters.
    List,
}

fn parse_pointer(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok(Vec2::new(x, y))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let engines = EngineKind::list_engines();
            if cli.json {
                let schemas = engines
                    .iter()
                    .map(|name| Ok((name.to_string(), EngineKind::schema_for(name)?)))
                    .collect::<Result<serde_json::Map<_, _>, CliError>>()?;
                println!("{}", serde_json::to_string_pretty(&schemas)?);
            } else {
                for name in engines {
                    println!("{name}");
                    let schema = EngineKind::schema_for(name)?;
                    if let Some(params) = schema.as_object() {
                        for (key, entry) in params {
                            println!(
                                "  {key:<24} default {:<10} {}",
                                entry["default"].to_string(),
                                entry["description"].as_str().unwrap_or_default()
                            );
                        }
                    }
                }
            }
        }
        Command::Render {
            images,
            width,
            height,
            frames,
            fps,
            advance_every,
            pointer,
            seed,
            params,
            output,
            segments,
        } => {
            let params: serde_json::Value = serde_json::from_str(&params)
                .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
            if !(fps.is_finite() && fps > 0.0) {
                return Err(CliError::Input(format!("--fps must be positive, got {fps}")));
            }

            let sources = images
                .iter()
                .map(|path| {
                    contour_art_engines::snapshot::load_source(path).map_err(|source| {
                        CliError::ImageLoad {
                            path: path.clone(),
                            source,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            tracing::info!(count = sources.len(), "loaded source images");

            let mut eng =
                EngineKind::from_name("image-metaballs", sources, width, height, seed, &params)?;
            eng.set_pointer(pointer);

            let frame_ms = 1000.0 / fps;
            let mut last = None;
            for i in 0..frames {
                let now_ms = i as f64 * frame_ms;
                if advance_every > 0 && i > 0 && i % advance_every == 0 {
                    eng.next_image(now_ms)?;
                }
                last = Some(eng.step(now_ms)?);
            }
            let frame = last.unwrap_or_default();

            contour_art_engines::snapshot::write_png(&frame, width, height, &output).map_err(
                |source| CliError::Snapshot {
                    path: output.clone(),
                    source,
                },
            )?;
            if let Some(path) = &segments {
                let body = serde_json::to_string_pretty(&frame)?;
                std::fs::write(path, body).map_err(|source| CliError::SegmentDump {
                    path: path.clone(),
                    source,
                })?;
            }

            if cli.json {
                let info = serde_json::json!({
                    "images": images.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                    "width": width,
                    "height": height,
                    "frames": frames,
                    "seed": seed,
                    "segments": frame.segments.len(),
                    "threshold": frame.threshold,
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {} image(s) ({width}x{height}, {frames} frames, seed {seed}, {} segments) -> {}",
                    images.len(),
                    frame.segments.len(),
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
