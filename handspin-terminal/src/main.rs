/// Handspin terminal viewer
///
/// Shows a model as ASCII art and turns it to follow the "hand". The mouse
/// pointer stands in for a tracked hand: moving it across the terminal sets
/// the target rotation, and the model eases toward it.
/// Controls:
///   - Mouse: Move the hand
///   - H: Show/hide the hand
///   - Q/ESC: Quit
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use handspin_core::{
    normalize_scene, FileAssetSource, Material, Mesh, ModelSlot, NormalizeOptions,
    NormalizedModel, SceneGraph, TrackingConfig,
};
use handspin_terminal::TerminalApp;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "handspin-terminal", about = "Spin a 3D model with your hand, in the terminal")]
struct Cli {
    /// STL, glTF or GLB file to display (defaults to a cube)
    model: Option<PathBuf>,

    /// Smoothing rate toward the hand-driven target, per second
    #[arg(long, default_value = "5.0", value_parser = positive_f32)]
    rate: f32,

    /// Largest dimension of the model after display scaling
    #[arg(long, default_value = "4.0", value_parser = positive_f32)]
    target_size: f32,

    /// Amplitude of the idle vertical bob
    #[arg(long, default_value = "0.1")]
    bob: f32,

    /// Tracker initialization attempts
    #[arg(long, default_value = "1")]
    attempts: u32,

    /// Write logs to this file; the terminal itself is busy rendering
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn positive_f32(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("`{s}` is not a number: {e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("`{s}` must be a finite number greater than zero"))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_ansi(false);
    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            subscriber.with_writer(Mutex::new(file)).init();
        }
        None => subscriber.with_writer(std::io::sink).init(),
    }

    let options = NormalizeOptions {
        target_size: cli.target_size,
    };
    let model = load_model(cli.model.as_deref(), options)?;
    println!(
        "Loaded {} ({} surfaces, display scale {:.3})",
        model.source_url,
        model.scene.surface_count(),
        model.display_scale
    );

    let config = TrackingConfig {
        smoothing_rate: cli.rate,
        bob_amplitude: cli.bob,
        init_attempts: cli.attempts,
        ..TrackingConfig::default()
    };

    let mut app = TerminalApp::new(model, config)?;
    app.run()?;

    Ok(())
}

fn load_model(
    path: Option<&std::path::Path>,
    options: NormalizeOptions,
) -> anyhow::Result<NormalizedModel> {
    let Some(path) = path else {
        let cube = SceneGraph::from_mesh("cube", Mesh::cube(2.0), Material::default());
        return Ok(normalize_scene(&cube, "builtin:cube", &options));
    };

    let url = path.to_string_lossy();
    let mut slot = ModelSlot::new(options);
    let mut source = FileAssetSource::new();
    let model = slot
        .load(&url, &mut source)
        .with_context(|| format!("loading model {}", path.display()))?;
    Ok(model.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_rates_and_sizes() {
        for bad in ["-5", "0", "NaN", "inf", "fast"] {
            assert!(Cli::try_parse_from(["handspin-terminal", "--rate", bad]).is_err(), "{bad}");
            assert!(
                Cli::try_parse_from(["handspin-terminal", "--target-size", bad]).is_err(),
                "{bad}"
            );
        }
    }

    #[test]
    fn accepts_defaults_and_positive_values() {
        let cli = Cli::try_parse_from(["handspin-terminal"]).unwrap();
        assert_eq!(cli.rate, 5.0);
        assert_eq!(cli.target_size, 4.0);

        let cli = Cli::try_parse_from(["handspin-terminal", "--rate", "2.5", "model.stl"]).unwrap();
        assert_eq!(cli.rate, 2.5);
        assert!(cli.model.is_some());
    }
}
