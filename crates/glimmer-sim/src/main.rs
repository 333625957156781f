//! # Glimmer Sim
//!
//! Main entry point for the headless staff effect simulation.
//!
//! Usage: `glimmer-sim [CONFIG_PATH]` (defaults to `glimmer-sim.toml`).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use glimmer_sim::{run, SimConfig, CONFIG_FILE};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("glimmer=info".parse()?))
        .init();

    info!("Glimmer sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = SimConfig::load_from(&path);

    let report = run(&config);

    info!(
        "Ran {} frames: {} particles emitted, {} expired, peak {} live",
        report.frames_run,
        report.particles_emitted,
        report.particles_expired,
        report.peak_particles
    );
    match report.drained_at_frame {
        Some(frame) => info!(
            "All {} effects drained by frame {frame} ({} owners notified)",
            report.effects_destroyed, report.flags_raised
        ),
        None if config.recall_at_frame.is_some() => {
            warn!("Effects were recalled but had not drained when the run ended");
        },
        None => info!("Run ended with effects still active"),
    }

    info!("Glimmer sim shutdown complete");
    Ok(())
}
