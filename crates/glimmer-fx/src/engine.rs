//! Effect registry and frame driver.
//!
//! The engine owns the particle pool and every live emitter. Each frame it
//! advances emitters first (which may push new particles), then moves and
//! ages every particle. Emitters that report they are finished are dropped
//! and their owner's [`LivenessFlag`] is raised.

use crate::emitter::{EmitterEffect, StaffKind, DEFAULT_MAX_EMISSIONS_PER_FRAME};
use crate::link::{Anchor, EffectLink, LivenessFlag};
use crate::math::MathCache;
use crate::mover::LinearMover;
use crate::pool::ParticlePool;
use crate::random::{FastRandom, RandomSource};
use glimmer_common::{EffectId, EngineError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Tunables for an [`EffectEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum number of live particles across all effects.
    pub pool_capacity: usize,
    /// Per-effect ceiling on emission draws in one frame.
    pub max_emissions_per_frame: u32,
    /// LOD in force before the first `force_lod` call.
    pub initial_lod: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pool_capacity: 4096,
            max_emissions_per_frame: DEFAULT_MAX_EMISSIONS_PER_FRAME,
            initial_lod: 10.0,
        }
    }
}

impl EngineSettings {
    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.pool_capacity = self.pool_capacity.clamp(1, 1 << 20);
        self.max_emissions_per_frame = self.max_emissions_per_frame.clamp(1, 4096);
        if !self.initial_lod.is_finite() {
            self.initial_lod = Self::default().initial_lod;
        }
        self.initial_lod = self.initial_lod.clamp(0.0, f32::from(u16::MAX));
    }
}

/// What happened during one [`EffectEngine::idle`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Effects still registered after the frame.
    pub effects_active: usize,
    /// Effects destroyed this frame.
    pub effects_removed: usize,
    /// Particles accepted by the pool this frame.
    pub particles_emitted: usize,
    /// Particles removed by aging this frame.
    pub particles_expired: usize,
    /// Particles alive after the frame.
    pub particles_live: usize,
}

#[derive(Debug)]
struct EffectSlot {
    id: EffectId,
    effect: EmitterEffect,
    liveness: LivenessFlag,
}

/// Drives staff effects and their particles frame by frame.
#[derive(Debug)]
pub struct EffectEngine<R = FastRandom> {
    settings: EngineSettings,
    effects: Vec<EffectSlot>,
    pool: ParticlePool,
    mover: LinearMover,
    math: MathCache,
    rng: R,
    last_forced_lod: f32,
    frame: u64,
}

impl EffectEngine<FastRandom> {
    /// Create an engine with a randomly seeded generator.
    #[must_use]
    pub fn with_settings(settings: EngineSettings) -> Self {
        Self::new(settings, FastRandom::new())
    }
}

impl<R: RandomSource> EffectEngine<R> {
    /// Create an engine drawing randomness from `rng`.
    #[must_use]
    pub fn new(mut settings: EngineSettings, rng: R) -> Self {
        settings.validate();
        debug!(
            "Effect engine created (pool {}, lod {})",
            settings.pool_capacity, settings.initial_lod
        );
        Self {
            pool: ParticlePool::with_capacity(settings.pool_capacity),
            mover: LinearMover,
            math: MathCache::new(),
            rng,
            last_forced_lod: settings.initial_lod,
            frame: 0,
            effects: Vec::new(),
            settings,
        }
    }

    /// Attach a staff glow to `anchor`.
    ///
    /// The effect starts scaled for the last forced LOD, capped at
    /// `desired_lod`. The returned flag is raised once the effect has been
    /// recalled, drained and destroyed.
    pub fn spawn_staff(
        &mut self,
        anchor: &Anchor,
        kind: StaffKind,
        desired_lod: u16,
    ) -> (EffectId, LivenessFlag) {
        let id = EffectId::new();
        let liveness = LivenessFlag::new();
        let effect = EmitterEffect::new(
            EffectLink::new(),
            anchor.clone(),
            kind,
            desired_lod,
            self.last_forced_lod,
        )
        .with_max_emissions(self.settings.max_emissions_per_frame);

        debug!("Spawned {} ({:?})", id, kind);
        self.effects.push(EffectSlot {
            id,
            effect,
            liveness: liveness.clone(),
        });
        (id, liveness)
    }

    /// Set the global LOD and forward it to every effect.
    pub fn force_lod(&mut self, lod: f32) {
        debug!("Forcing lod {lod} on {} effects", self.effects.len());
        self.last_forced_lod = lod;
        for slot in &mut self.effects {
            slot.effect.request_lod(lod);
        }
    }

    /// Recall one effect.
    pub fn recall(&mut self, id: EffectId) -> Result<(), EngineError> {
        let slot = self
            .effects
            .iter()
            .find(|slot| slot.id == id)
            .ok_or(EngineError::UnknownEffect(id))?;
        slot.effect.recall();
        Ok(())
    }

    /// Recall every effect.
    pub fn recall_all(&mut self) {
        for slot in &self.effects {
            slot.effect.recall();
        }
    }

    /// Advance everything by `delta_micros`.
    pub fn idle(&mut self, delta_micros: u64) -> FrameStats {
        self.frame += 1;
        let mut stats = FrameStats::default();

        let pool = &mut self.pool;
        let rng = &mut self.rng;
        let math = &self.math;
        self.effects.retain_mut(|slot| {
            let alive = slot.effect.idle(delta_micros, pool, rng, math);
            stats.particles_emitted += slot.effect.last_emitted() as usize;
            if !alive {
                debug!("Destroying drained {}", slot.id);
                slot.liveness.mark_dead();
                stats.effects_removed += 1;
            }
            alive
        });

        stats.particles_expired = self.pool.advance(delta_micros, &self.mover, &self.math);
        stats.effects_active = self.effects.len();
        stats.particles_live = self.pool.len();

        trace!(
            "Frame {}: {} effects, +{} -{} particles ({} live)",
            self.frame,
            stats.effects_active,
            stats.particles_emitted,
            stats.particles_expired,
            stats.particles_live
        );
        stats
    }

    /// Look up a live effect.
    #[must_use]
    pub fn effect(&self, id: EffectId) -> Option<&EmitterEffect> {
        self.effects
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.effect)
    }

    /// Number of registered effects.
    #[must_use]
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Number of live particles.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.pool.len()
    }

    /// The shared particle pool.
    #[must_use]
    pub const fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    /// LOD most recently forced (or the initial LOD).
    #[must_use]
    pub const fn last_forced_lod(&self) -> f32 {
        self.last_forced_lod
    }

    /// Frames advanced so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const FRAME: u64 = 33_333;

    fn engine(seed: u64) -> EffectEngine {
        EffectEngine::new(EngineSettings::default(), FastRandom::with_seed(seed))
    }

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.pool_capacity, 4096);
        assert_eq!(settings.max_emissions_per_frame, 64);
        assert_eq!(settings.initial_lod, 10.0);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = EngineSettings {
            pool_capacity: 0,
            max_emissions_per_frame: 0,
            initial_lod: f32::NAN,
        };
        settings.validate();
        assert_eq!(settings.pool_capacity, 1);
        assert_eq!(settings.max_emissions_per_frame, 1);
        assert_eq!(settings.initial_lod, 10.0);
    }

    #[test]
    fn test_spawn_uses_last_forced_lod() {
        let mut engine = engine(1);
        let anchor = Anchor::new(Vec3::ZERO);

        engine.force_lod(4.0);
        let (id, flag) = engine.spawn_staff(&anchor, StaffKind::Mage, 8);
        assert!(!flag.is_dead());
        assert_eq!(engine.effect(id).map(EmitterEffect::lod), Some(4));

        let (capped, _) = engine.spawn_staff(&anchor, StaffKind::Mage, 2);
        assert_eq!(engine.effect(capped).map(EmitterEffect::lod), Some(2));
        assert_eq!(engine.effect_count(), 2);
    }

    #[test]
    fn test_force_lod_reaches_existing_effects() {
        let mut engine = engine(2);
        let anchor = Anchor::new(Vec3::ZERO);
        let (id, _) = engine.spawn_staff(&anchor, StaffKind::Protection, 10);
        assert_eq!(engine.effect(id).map(EmitterEffect::lod), Some(10));

        engine.force_lod(3.0);
        assert_eq!(engine.last_forced_lod(), 3.0);
        assert_eq!(engine.effect(id).map(EmitterEffect::lod), Some(3));
    }

    #[test]
    fn test_recall_unknown_effect() {
        let mut engine = engine(3);
        let missing = EffectId::from_raw(u64::MAX);
        assert_eq!(
            engine.recall(missing),
            Err(EngineError::UnknownEffect(missing))
        );
    }

    #[test]
    fn test_full_lifecycle() {
        let mut engine = engine(4);
        let anchor = Anchor::new(Vec3::ZERO);
        let (id, flag) = engine.spawn_staff(&anchor, StaffKind::Mage, 10);

        let mut emitted = 0;
        for frame in 0..120 {
            anchor.set(Vec3::new((frame as f32 * 0.2).cos(), 1.0, 0.0));
            emitted += engine.idle(FRAME).particles_emitted;
        }
        assert!(emitted > 0);
        assert!(engine.particle_count() > 0);

        engine.recall(id).expect("effect is registered");
        assert_eq!(
            engine.effect(id).map(EmitterEffect::is_recalling),
            Some(true)
        );

        // Recall kills every particle on its next aging step.
        let stats = engine.idle(FRAME);
        assert_eq!(stats.particles_emitted, 0);
        assert_eq!(stats.particles_live, 0);
        assert_eq!(stats.effects_active, 1);
        assert!(!flag.is_dead());

        // Drained: the effect goes away and the owner is told.
        let stats = engine.idle(FRAME);
        assert_eq!(stats.effects_removed, 1);
        assert_eq!(stats.effects_active, 0);
        assert!(flag.is_dead());
        assert!(engine.effect(id).is_none());
    }

    #[test]
    fn test_recall_only_affects_target() {
        let mut engine = engine(5);
        let anchor = Anchor::new(Vec3::ZERO);
        let (first, first_flag) = engine.spawn_staff(&anchor, StaffKind::Mage, 10);
        let (second, second_flag) = engine.spawn_staff(&anchor, StaffKind::Protection, 10);

        engine.recall(first).expect("effect is registered");
        engine.idle(FRAME);
        engine.idle(FRAME);

        assert!(first_flag.is_dead());
        assert!(!second_flag.is_dead());
        assert!(engine.effect(second).is_some());

        engine.recall_all();
        engine.idle(FRAME);
        engine.idle(FRAME);
        assert!(second_flag.is_dead());
        assert_eq!(engine.effect_count(), 0);
    }

    #[test]
    fn test_pool_capacity_bounds_particles() {
        let settings = EngineSettings {
            pool_capacity: 16,
            ..EngineSettings::default()
        };
        let mut engine = EffectEngine::new(settings, FastRandom::with_seed(6));
        let anchor = Anchor::new(Vec3::ZERO);
        for _ in 0..4 {
            engine.spawn_staff(&anchor, StaffKind::Mage, 10);
        }

        for frame in 0..200 {
            anchor.set(Vec3::new(frame as f32 * 0.5, 0.0, 0.0));
            let stats = engine.idle(FRAME);
            assert!(stats.particles_live <= 16);
        }
        assert_eq!(engine.pool().capacity(), 16);
        assert_eq!(engine.frame(), 200);
    }
}
