//! Particle position integration.

use crate::particle::EmittedParticle;

const MICROS_PER_SECOND: f32 = 1_000_000.0;

/// Advances a particle's position for one frame.
pub trait ParticleMover {
    /// Moves `particle` forward by `delta_micros`.
    fn advance(&self, particle: &mut EmittedParticle, delta_micros: u64);
}

/// Straight-line motion at the particle's own velocity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearMover;

impl ParticleMover for LinearMover {
    fn advance(&self, particle: &mut EmittedParticle, delta_micros: u64) {
        let seconds = delta_micros as f32 / MICROS_PER_SECOND;
        particle.position += particle.velocity * seconds;
    }
}
