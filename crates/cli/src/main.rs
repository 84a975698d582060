#![deny(unsafe_code)]
//! CLI binary for the flowfield engine.
//!
//! Subcommands:
//! - `render`: build a scene, run N frames, write SVG or JSON
//! - `list`: print visualization modes, source kinds and noise bases
//! - `schema`: print the parameter schema

mod error;

use clap::{Parser, Subcommand, ValueEnum};
use error::CliError;
use flowfield_core::field_source::SourceKind;
use flowfield_core::particles::BoundaryPolicy;
use flowfield_core::settings::{NoiseBasis, VisualizationMode};
use flowfield_core::{Engine, Scene};
use flowfield_export::{write_json, write_svg, SvgStyle};
use flowfield_turbulence::TurbulenceEngine;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "flowfield", about = "Flow-field visualization CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Svg,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the engine for N frames and write the last frame.
    Render {
        /// Canvas width in canvas units.
        #[arg(short = 'W', long, default_value_t = 800.0)]
        width: f64,

        /// Canvas height in canvas units.
        #[arg(short = 'H', long, default_value_t = 600.0)]
        height: f64,

        /// Number of animation ticks before capture.
        #[arg(short, long)]
        frames: Option<usize>,

        /// Length of one tick in seconds.
        #[arg(long)]
        dt: Option<f64>,

        /// PRNG seed for deterministic output.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Visualization mode (vector, streamline, particle).
        #[arg(short, long)]
        mode: Option<String>,

        /// Output format; inferred from the output extension when omitted.
        #[arg(long, value_enum)]
        format: Option<Format>,

        /// Output file path.
        #[arg(short, long, default_value = "output.svg")]
        output: PathBuf,

        /// Engine parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Scene file to load instead of --params, -W, -H and --seed.
        #[arg(long, conflicts_with = "params")]
        scene: Option<PathBuf>,
    },
    /// List visualization modes, source kinds, noise bases and boundary policies.
    List,
    /// Print the parameter schema.
    Schema,
}

fn load_scene(path: &Path) -> Result<Scene, CliError> {
    let text = fs::read_to_string(path).map_err(|e| CliError::SceneRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| CliError::SceneFormat {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn output_format(format: Option<Format>, output: &Path) -> Format {
    format.unwrap_or_else(|| match output.extension().and_then(|e| e.to_str()) {
        Some("json") => Format::Json,
        _ => Format::Svg,
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let modes: Vec<&str> = VisualizationMode::ALL.iter().map(|m| m.name()).collect();
            let kinds: Vec<&str> = SourceKind::ALL.iter().map(|k| k.name()).collect();
            let bases = [NoiseBasis::Value.name(), NoiseBasis::Perlin.name()];
            let boundaries = [BoundaryPolicy::Wrap.name(), BoundaryPolicy::Respawn.name()];
            if cli.json {
                let info = serde_json::json!({
                    "modes": modes,
                    "source_kinds": kinds,
                    "noise_bases": bases,
                    "boundaries": boundaries,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Modes:");
                for name in &modes {
                    println!("  {name}");
                }
                println!("Source kinds:");
                println!("  {}", kinds.join(", "));
                println!("Noise bases:");
                println!("  {}", bases.join(", "));
                println!("Boundaries:");
                println!("  {}", boundaries.join(", "));
            }
        }
        Command::Schema => {
            let engine = TurbulenceEngine::new(1.0, 1.0, 0)?;
            println!("{}", serde_json::to_string_pretty(&engine.param_schema())?);
        }
        Command::Render {
            width,
            height,
            frames,
            dt,
            seed,
            mode,
            format,
            output,
            params,
            scene,
        } => {
            let mut scene = match scene {
                Some(path) => load_scene(&path)?,
                None => {
                    let params: serde_json::Value = serde_json::from_str(&params)
                        .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
                    Scene::from_params(width, height, seed, &params)
                        .map_err(|e| CliError::Input(format!("invalid --params: {e}")))?
                }
            };
            if let Some(frames) = frames {
                scene.frames = frames;
            }
            if let Some(dt) = dt {
                scene.dt = dt;
            }
            if let Some(name) = mode {
                scene.turbulence.mode = VisualizationMode::from_name(&name)
                    .map_err(|e| CliError::Input(e.to_string()))?;
            }

            let mut engine = TurbulenceEngine::from_scene(&scene)?;
            (0..scene.frames).try_for_each(|_| engine.step(scene.dt))?;
            let frame = engine.geometry();

            match output_format(format, &output) {
                Format::Svg => write_svg(&frame, &SvgStyle::default(), &output)?,
                Format::Json => write_json(&frame, &output)?,
            }
            log::info!(
                "rendered {} {} shapes at t={:.3}",
                frame.shapes.len(),
                frame.shapes.mode().name(),
                frame.time
            );

            if cli.json {
                let info = serde_json::json!({
                    "mode": frame.shapes.mode().name(),
                    "width": scene.width,
                    "height": scene.height,
                    "frames": scene.frames,
                    "seed": scene.seed,
                    "shapes": frame.shapes.len(),
                    "sources": engine.sources().len(),
                    "time": frame.time,
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {} ({}x{}, {} frames, seed {}) -> {}",
                    frame.shapes.mode().name(),
                    scene.width,
                    scene.height,
                    scene.frames,
                    scene.seed,
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
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

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert!(matches!(output_format(None, Path::new("a.json")), Format::Json));
        assert!(matches!(output_format(None, Path::new("a.svg")), Format::Svg));
        assert!(matches!(output_format(None, Path::new("a")), Format::Svg));
        assert!(matches!(
            output_format(Some(Format::Svg), Path::new("a.json")),
            Format::Svg
        ));
    }

    #[test]
    fn render_args_parse() {
        let cli = Cli::try_parse_from([
            "flowfield", "render", "-W", "320", "-H", "200", "--frames", "5", "--mode",
            "streamline", "-o", "out.json",
        ])
        .unwrap();
        match cli.command {
            Command::Render {
                width,
                frames,
                mode,
                ..
            } => {
                assert_eq!(width, 320.0);
                assert_eq!(frames, Some(5));
                assert_eq!(mode.as_deref(), Some("streamline"));
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn missing_scene_file_is_read_error() {
        let err = load_scene(Path::new("/nonexistent/scene.json")).err().unwrap();
        assert!(matches!(err, CliError::SceneRead { .. }), "got {err}");
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn malformed_scene_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        fs::write(&path, r#"{"width": 320.0}"#).unwrap();
        let err = load_scene(&path).err().unwrap();
        assert!(matches!(err, CliError::SceneFormat { .. }), "got {err}");
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn unknown_mode_is_input_error() {
        let cli = Cli::try_parse_from(["flowfield", "render", "--mode", "hatching"]).unwrap();
        let err = run(cli).err().unwrap();
        assert_eq!(err.exit_code(), 12);
    }
}
