//! Scripted headless run.
//!
//! Every anchor walks a horizontal circle; effects alternate kinds. The
//! configured LOD schedule and recall frame are applied as the run reaches
//! them, and the run ends early once every effect has been destroyed.

use crate::config::SimConfig;
use glam::Vec3;
use glimmer_fx::{Anchor, EffectEngine, FastRandom, LivenessFlag, StaffKind};
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Height of the anchor circle.
const ANCHOR_HEIGHT: f32 = 1.5;

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimReport {
    /// Frames actually simulated.
    pub frames_run: u64,
    /// Particles accepted by the pool over the run.
    pub particles_emitted: u64,
    /// Particles that faded out or were recalled.
    pub particles_expired: u64,
    /// Highest live particle count seen at the end of a frame.
    pub peak_particles: usize,
    /// Effects destroyed after draining.
    pub effects_destroyed: usize,
    /// Frame on which the last effect was destroyed.
    pub drained_at_frame: Option<u64>,
    /// Effects whose liveness flag was raised.
    pub flags_raised: usize,
}

/// Position of anchor `index` at `seconds` into the run.
#[must_use]
pub fn anchor_position(config: &SimConfig, index: usize, seconds: f32) -> Vec3 {
    let phase = index as f32 * TAU / config.effects.max(1) as f32;
    let angle = phase + config.anchor_angular_speed * seconds;
    Vec3::new(
        config.anchor_radius * angle.cos(),
        ANCHOR_HEIGHT,
        config.anchor_radius * angle.sin(),
    )
}

/// Run the scenario described by `config`.
pub fn run(config: &SimConfig) -> SimReport {
    let rng = config.seed.map_or_else(FastRandom::new, FastRandom::with_seed);
    let mut engine = EffectEngine::new(config.engine.clone(), rng);

    let anchors: Vec<Anchor> = (0..config.effects)
        .map(|index| Anchor::new(anchor_position(config, index, 0.0)))
        .collect();
    let flags: Vec<LivenessFlag> = anchors
        .iter()
        .zip(assigned_kinds(config, config.effects))
        .map(|(anchor, kind)| engine.spawn_staff(anchor, kind, config.desired_lod).1)
        .collect();
    info!(
        "Simulating {} effects for up to {} frames of {}us",
        anchors.len(),
        config.frames,
        config.frame_micros
    );

    let seconds_per_frame = config.frame_micros as f32 / 1_000_000.0;
    let mut schedule = config.lod_schedule.iter().peekable();
    let mut report = SimReport::default();

    for frame in 0..config.frames {
        let seconds = frame as f32 * seconds_per_frame;
        for (index, anchor) in anchors.iter().enumerate() {
            anchor.set(anchor_position(config, index, seconds));
        }

        while let Some(change) = schedule.next_if(|change| change.frame <= frame) {
            info!("Frame {frame}: forcing lod {}", change.lod);
            engine.force_lod(change.lod);
        }

        if config.recall_at_frame == Some(frame) {
            info!("Frame {frame}: recalling all effects");
            engine.recall_all();
        }

        let stats = engine.idle(config.frame_micros);
        report.frames_run = frame + 1;
        report.particles_emitted += stats.particles_emitted as u64;
        report.particles_expired += stats.particles_expired as u64;
        report.peak_particles = report.peak_particles.max(stats.particles_live);
        report.effects_destroyed += stats.effects_removed;

        if config.report_every > 0 && (frame + 1) % config.report_every == 0 {
            info!(
                "Frame {}: {} effects, {} live particles, {} emitted so far",
                frame + 1,
                stats.effects_active,
                stats.particles_live,
                report.particles_emitted
            );
        }

        if stats.effects_active == 0 {
            debug!("All effects drained on frame {frame}");
            report.drained_at_frame = Some(frame);
            break;
        }
    }

    report.flags_raised = flags.iter().filter(|flag| flag.is_dead()).count();
    report
}

/// Kinds assigned to the first `count` effects.
#[must_use]
pub fn assigned_kinds(config: &SimConfig, count: usize) -> Vec<StaffKind> {
    (0..count)
        .map(|index| {
            config
                .kinds
                .get(index % config.kinds.len().max(1))
                .copied()
                .unwrap_or_default()
        })
        .collect()
}
