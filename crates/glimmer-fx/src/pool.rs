//! Bounded storage for live particles.
//!
//! The pool is the exclusive owner of every particle pushed into it. Emitters
//! hand particles over through [`ParticleSink`] and never see them again.

use crate::math::MathCache;
use crate::mover::ParticleMover;
use crate::particle::EmittedParticle;
use glimmer_common::PoolError;

/// Anything that accepts freshly emitted particles.
pub trait ParticleSink {
    /// Takes ownership of `particle`.
    ///
    /// On rejection the particle is dropped and its effect stops counting it.
    fn push_particle(&mut self, particle: EmittedParticle) -> Result<(), PoolError>;
}

/// Unbounded sink, mostly useful for inspecting what an emitter produced.
impl ParticleSink for Vec<EmittedParticle> {
    fn push_particle(&mut self, particle: EmittedParticle) -> Result<(), PoolError> {
        self.push(particle);
        Ok(())
    }
}

/// Capacity-bounded particle pool.
#[derive(Debug, Default)]
pub struct ParticlePool {
    particles: Vec<EmittedParticle>,
    capacity: usize,
}

impl ParticlePool {
    /// Create a new pool holding at most `capacity` particles.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of live particles.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the pool holds no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Whether another push would be rejected.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.capacity
    }

    /// Live particles, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EmittedParticle> {
        self.particles.iter()
    }

    /// Moves and ages every particle, dropping the ones that report dead.
    ///
    /// Returns how many particles were removed.
    pub fn advance<M: ParticleMover + ?Sized>(
        &mut self,
        delta_micros: u64,
        mover: &M,
        math: &MathCache,
    ) -> usize {
        let before = self.particles.len();
        self.particles.retain_mut(|particle| {
            mover.advance(particle, delta_micros);
            particle.idle(delta_micros, math)
        });
        before - self.particles.len()
    }

    /// Drops every particle.
    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

impl ParticleSink for ParticlePool {
    fn push_particle(&mut self, particle: EmittedParticle) -> Result<(), PoolError> {
        if self.is_full() {
            return Err(PoolError::AtCapacity {
                capacity: self.capacity,
            });
        }
        self.particles.push(particle);
        Ok(())
    }
}
