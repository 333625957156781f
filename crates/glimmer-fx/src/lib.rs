//! # Glimmer FX
//!
//! Adaptive staff glow effect for the Glimmer particle engine.
//!
//! This crate provides:
//! - `EmittedParticle`: jittered glow particle with half-life opacity decay
//! - `EmitterEffect`: speed-adaptive stochastic emitter with LOD rescaling
//! - `ParticlePool` and `ParticleSink`: bounded particle ownership
//! - `EffectEngine`: registry that drives effects and particles per frame
//! - Cached power/sqrt approximations and pluggable random sources

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod emitter;
pub mod engine;
pub mod link;
pub mod math;
pub mod mover;
pub mod particle;
pub mod pool;
pub mod random;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::emitter::*;
    pub use crate::engine::*;
    pub use crate::link::*;
    pub use crate::math::*;
    pub use crate::mover::*;
    pub use crate::particle::*;
    pub use crate::pool::*;
    pub use crate::random::*;
    pub use glimmer_common::prelude::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_glow_follows_anchor() {
        let mut engine = EffectEngine::new(EngineSettings::default(), FastRandom::with_seed(99));
        let anchor = Anchor::new(Vec3::ZERO);
        engine.spawn_staff(&anchor, StaffKind::Mage, 10);

        for frame in 0..60 {
            anchor.set(Vec3::new(frame as f32 * 0.1, 2.0, 0.0));
            engine.idle(33_333);
        }

        assert!(engine.particle_count() > 0);
        for particle in engine.pool().iter() {
            assert!(particle.position.y <= 2.0);
            assert!(particle.size() <= MAX_SIZE);
        }
    }

    #[test]
    fn test_lod_drop_grows_new_particles() {
        let anchor = Anchor::new(Vec3::ZERO);
        let high = EmitterEffect::new(EffectLink::new(), anchor.clone(), StaffKind::Mage, 20, 20.0);
        let low = EmitterEffect::new(EffectLink::new(), anchor, StaffKind::Mage, 20, 2.0);
        assert!(low.size() > high.size());
    }
}
