use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log to stderr and to `report/<name>.log`. The log file is the evidence
/// trail an operator inspects before resuming a halted run.
pub fn init(name: &str) -> Result<()> {
    let dir = Path::new("report");
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
    let file = std::fs::File::create(dir.join(format!("{name}.log")))
        .with_context(|| format!("Failed to create {name}.log"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Arc::new(file)),
        )
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}
