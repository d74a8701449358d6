use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use common::log_setup::setup_logging;
use startrail::{CpuBackend, ImageBackend, StackOutcome, StartrailConfig, run};

const USAGE: &str = "usage: startrail <config.yaml|config.json> <output image>";

fn main() -> Result<()> {
    let mut args = std::env::args_os().skip(1);
    let (Some(config_path), Some(output_path)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let config_path = PathBuf::from(config_path);
    let output_path = PathBuf::from(output_path);

    setup_logging("info", Path::new("logs"), "startrail")?;

    let config = StartrailConfig::load(&config_path)
        .with_context(|| format!("Loading {}", config_path.display()))?;

    let mut backend = CpuBackend::new();
    if config.live_display {
        backend = backend.with_preview(preview_path(&output_path));
    }

    match run(&mut backend, &config)? {
        StackOutcome::Composite(image) => {
            backend
                .save(&image, &output_path)
                .with_context(|| format!("Saving {}", output_path.display()))?;
            tracing::info!(output = %output_path.display(), "Star trail saved");
        }
        outcome @ StackOutcome::NoImages => {
            tracing::warn!("{}", outcome.reason().unwrap_or_default());
        }
    }

    Ok(())
}

/// `trails.jpg` previews to `trails.preview.jpg` next to it.
fn preview_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "startrail".to_string());
    let extension = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jpg".to_string());
    output.with_file_name(format!("{stem}.preview.{extension}"))
}
