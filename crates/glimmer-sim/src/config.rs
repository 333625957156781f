//! Simulation configuration.
//!
//! Describes one headless run: how long, how fast the anchors move, when the
//! LOD changes and when the effects are recalled. Loaded from and saved to
//! TOML.

use glimmer_common::{GlimmerError, GlimmerResult};
use glimmer_fx::{EngineSettings, StaffKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "glimmer-sim.toml";

/// A scheduled global LOD change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodChange {
    /// Frame at which the LOD is forced.
    pub frame: u64,
    /// LOD to force.
    pub lod: f32,
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run ===
    /// Frames to simulate before giving up on draining
    pub frames: u64,
    /// Frame length in microseconds
    pub frame_micros: u64,
    /// RNG seed (None = random)
    pub seed: Option<u64>,
    /// Frames between progress reports (0 = only the summary)
    pub report_every: u64,

    // === Effects ===
    /// Number of staff effects, alternating kinds
    pub effects: usize,
    /// Kinds to cycle through when spawning
    pub kinds: Vec<StaffKind>,
    /// LOD ceiling granted to each effect
    pub desired_lod: u16,
    /// Frame at which every effect is recalled (None = never)
    pub recall_at_frame: Option<u64>,

    // === Anchors ===
    /// Radius of the circle each anchor walks
    pub anchor_radius: f32,
    /// Angular speed of the anchors in radians per second
    pub anchor_angular_speed: f32,

    // === Schedules ===
    /// Global LOD changes
    pub lod_schedule: Vec<LodChange>,

    // === Engine ===
    /// Engine tunables
    pub engine: EngineSettings,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Run
            frames: 600,
            frame_micros: 16_667,
            seed: None,
            report_every: 60,

            // Effects
            effects: 4,
            kinds: StaffKind::ALL.to_vec(),
            desired_lod: 10,
            recall_at_frame: Some(450),

            // Anchors
            anchor_radius: 1.0,
            anchor_angular_speed: std::f32::consts::PI,

            lod_schedule: vec![
                LodChange { frame: 150, lod: 4.0 },
                LodChange { frame: 300, lod: 10.0 },
            ],

            engine: EngineSettings::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load config file: {e}");
                Self::default()
            },
        }
    }

    /// Load configuration from a path, reporting every failure.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> GlimmerResult<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&contents).map_err(|e| GlimmerError::Config(e.to_string()))?;
        config.validate();
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.frames = self.frames.clamp(1, 1_000_000);
        self.frame_micros = self.frame_micros.clamp(1_000, 1_000_000);
        self.effects = self.effects.clamp(1, 1024);
        if self.kinds.is_empty() {
            self.kinds = StaffKind::ALL.to_vec();
        }
        if !self.anchor_radius.is_finite() {
            self.anchor_radius = 1.0;
        }
        self.anchor_radius = self.anchor_radius.clamp(0.0, 1_000.0);
        if !self.anchor_angular_speed.is_finite() {
            self.anchor_angular_speed = 0.0;
        }
        self.lod_schedule.retain(|change| change.lod.is_finite());
        self.lod_schedule.sort_by_key(|change| change.frame);
        self.engine.validate();
    }
}
