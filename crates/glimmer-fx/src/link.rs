//! Shared handles between an effect, its particles and its owner.
//!
//! The simulation is single-threaded and frame-stepped: exactly one caller
//! advances a given effect or particle per tick, and the anchor owner only
//! writes between ticks. Plain `Rc<Cell<_>>` sharing is enough; none of
//! these handles are `Send`.

use glam::Vec3;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// An externally owned point an effect is attached to.
///
/// Cloning the handle shares the same point. The owner (for example a
/// character's hand bone) moves it between frames; the effect only reads.
#[derive(Clone, Default)]
pub struct Anchor(Rc<Cell<Vec3>>);

impl Anchor {
    /// Creates an anchor at the given position.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self(Rc::new(Cell::new(position)))
    }

    /// Current position.
    #[must_use]
    pub fn get(&self) -> Vec3 {
        self.0.get()
    }

    /// Moves the anchor.
    pub fn set(&self, position: Vec3) {
        self.0.set(position);
    }

    /// Moves the anchor by an offset.
    pub fn translate(&self, offset: Vec3) {
        self.0.set(self.0.get() + offset);
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Anchor").field(&self.get()).finish()
    }
}

/// Caller-owned flag raised once the engine destroys an effect.
#[derive(Clone, Default)]
pub struct LivenessFlag(Rc<Cell<bool>>);

impl LivenessFlag {
    /// Creates a flag in the "alive" state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the effect behind this flag has been destroyed.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.0.get()
    }

    /// Marks the effect as destroyed.
    pub fn mark_dead(&self) {
        self.0.set(true);
    }
}

impl fmt::Debug for LivenessFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LivenessFlag").field(&self.is_dead()).finish()
    }
}

#[derive(Debug, Default)]
struct LinkState {
    recalling: Cell<bool>,
    live_particles: Cell<usize>,
}

/// Link between an effect and the particles it emitted.
///
/// Carries the one-way recall flag and counts live particles without the
/// effect owning them: each particle holds a [`ParticleTicket`] that
/// registers on creation and releases on drop.
#[derive(Clone, Default)]
pub struct EffectLink(Rc<LinkState>);

impl EffectLink {
    /// Creates a link for a fresh, non-recalled effect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals recall. There is no way back.
    pub fn recall(&self) {
        self.0.recalling.set(true);
    }

    /// Whether recall has been signalled.
    #[must_use]
    pub fn is_recalling(&self) -> bool {
        self.0.recalling.get()
    }

    /// Number of particles emitted through this link that are still alive.
    #[must_use]
    pub fn live_particles(&self) -> usize {
        self.0.live_particles.get()
    }

    /// Registers one live particle.
    #[must_use]
    pub fn ticket(&self) -> ParticleTicket {
        self.0.live_particles.set(self.0.live_particles.get() + 1);
        ParticleTicket(self.0.clone())
    }
}

impl fmt::Debug for EffectLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectLink")
            .field("recalling", &self.is_recalling())
            .field("live_particles", &self.live_particles())
            .finish()
    }
}

/// A particle's registration with its effect.
pub struct ParticleTicket(Rc<LinkState>);

impl ParticleTicket {
    /// Whether the owning effect has been recalled.
    #[must_use]
    pub fn is_recalling(&self) -> bool {
        self.0.recalling.get()
    }
}

impl Clone for ParticleTicket {
    fn clone(&self) -> Self {
        self.0.live_particles.set(self.0.live_particles.get() + 1);
        Self(self.0.clone())
    }
}

impl Drop for ParticleTicket {
    fn drop(&mut self) {
        self.0
            .live_particles
            .set(self.0.live_particles.get().saturating_sub(1));
    }
}

impl fmt::Debug for ParticleTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleTicket")
            .field("recalling", &self.is_recalling())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_is_shared() {
        let anchor = Anchor::new(Vec3::ZERO);
        let view = anchor.clone();
        anchor.set(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(view.get(), Vec3::new(1.0, 2.0, 3.0));

        view.translate(Vec3::X);
        assert_eq!(anchor.get(), Vec3::new(2.0, 2.0, 3.0));
    }

    #[test]
    fn test_liveness_flag() {
        let flag = LivenessFlag::new();
        let engine_side = flag.clone();
        assert!(!flag.is_dead());
        engine_side.mark_dead();
        assert!(flag.is_dead());
    }

    #[test]
    fn test_tickets_track_live_count() {
        let link = EffectLink::new();
        assert_eq!(link.live_particles(), 0);

        let a = link.ticket();
        let b = a.clone();
        assert_eq!(link.live_particles(), 2);

        drop(a);
        assert_eq!(link.live_particles(), 1);
        drop(b);
        assert_eq!(link.live_particles(), 0);
    }

    #[test]
    fn test_recall_is_visible_to_tickets() {
        let link = EffectLink::new();
        let ticket = link.ticket();
        assert!(!ticket.is_recalling());
        link.recall();
        assert!(ticket.is_recalling());
        assert!(link.is_recalling());
    }
}
