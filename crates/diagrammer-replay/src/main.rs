//! Replay a gesture script against a diagram and print the event stream.

use clap::Parser;
use diagrammer_core::CanvasConfig;
use diagrammer_render::Theme;
use diagrammer_replay::{
    Replay, ReplayConfig, ReplayResult, Script, load_config, load_diagram,
};
use kurbo::Size;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "diagrammer-replay", version, about)]
struct Args {
    /// Diagram JSON file
    diagram: PathBuf,
    /// Gesture script JSON file
    script: PathBuf,
    /// Canvas config JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the final frame as SVG
    #[arg(long)]
    svg: Option<PathBuf>,
    #[arg(long, default_value_t = 800.0)]
    width: f64,
    #[arg(long, default_value_t = 600.0)]
    height: f64,
    /// Device pixel ratio for the SVG output
    #[arg(long, default_value_t = 1.0)]
    scale_factor: f64,
    /// Use the dark palette
    #[arg(long)]
    dark: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> ReplayResult<()> {
    let canvas_config = match &args.config {
        Some(path) => load_config(path)?,
        None => CanvasConfig::default(),
    };
    let config = ReplayConfig {
        viewport: Size::new(args.width, args.height),
        theme: if args.dark { Theme::dark() } else { Theme::light() },
        scale_factor: args.scale_factor,
        ..Default::default()
    };

    let mut replay = Replay::new(canvas_config, config)?;
    replay.load(load_diagram(&args.diagram)?);
    let script = Script::load(&args.script)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for step in &script.steps {
        for event in replay.step(step)? {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }
    }
    out.flush()?;

    if let Some(path) = &args.svg {
        replay.save_svg(path)?;
    }
    log::info!("Replay finished after {} frames", replay.frames());
    Ok(())
}
