//! Staff glow particles.
//!
//! A particle owns only its own decaying visual state. Position and velocity
//! are advanced by a [`crate::mover::ParticleMover`]; opacity by
//! [`EmittedParticle::idle`].

use crate::link::{EffectLink, ParticleTicket};
use crate::math::{fast_sqrt, MathCache};
use crate::random::RandomSource;
use glam::Vec3;
use glimmer_common::TextureId;

/// Particles below this opacity are discarded.
pub const VISIBILITY_THRESHOLD: f32 = 0.01;

/// Reference window for the half-life decay, in microseconds.
pub const DECAY_REFERENCE_MICROS: f32 = 300_000.0;

/// Maximum per-channel color jitter (either direction).
pub const COLOR_JITTER: f32 = 0.125;

/// Largest size a particle may have.
pub const MAX_SIZE: f32 = 1.0;

/// Renderer twinkle amplitude.
pub const FLARE_MAX: f32 = 2.5;
/// Renderer twinkle exponent.
pub const FLARE_EXPONENT: f32 = 0.5;
/// Renderer twinkle frequency.
pub const FLARE_FREQUENCY: f32 = 0.05;

/// Keeps `velocity / size` finite for degenerate base sizes.
const MIN_SIZE: f32 = 1e-4;

/// Base values a particle is built from, before jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleParams {
    /// Spawn position.
    pub position: Vec3,
    /// Inherited velocity (rescaled by size at construction).
    pub velocity: Vec3,
    /// Base size (multiplied by a random factor in `[0.2, 1.2)`).
    pub size: f32,
    /// Initial opacity.
    pub alpha: f32,
    /// Base RGB color (jittered per channel).
    pub color: [f32; 3],
    /// Texture tag for the renderer.
    pub texture: TextureId,
    /// Detail level for the renderer.
    pub lod: u16,
}

/// One short-lived glow particle.
#[derive(Debug, Clone)]
pub struct EmittedParticle {
    /// World position.
    pub position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    color: [f32; 3],
    size: f32,
    alpha: f32,
    texture: TextureId,
    flare_max: f32,
    flare_exponent: f32,
    flare_frequency: f32,
    lod: u16,
    ticket: ParticleTicket,
}

impl EmittedParticle {
    /// Creates a particle registered with `link`.
    ///
    /// Draws four values from `rng`: one jitter per color channel, then the
    /// size multiplier. Smaller particles get proportionally faster velocity.
    pub fn new<R: RandomSource + ?Sized>(
        link: &EffectLink,
        params: ParticleParams,
        rng: &mut R,
    ) -> Self {
        let mut color = [0.0; 3];
        for (channel, base) in color.iter_mut().zip(params.color) {
            *channel = (base + rng.uniform(-COLOR_JITTER, COLOR_JITTER)).clamp(0.0, 1.0);
        }

        let size = (params.size * (0.2 + rng.next_unit())).clamp(MIN_SIZE, MAX_SIZE);

        Self {
            position: params.position,
            velocity: params.velocity / size,
            color,
            size,
            alpha: params.alpha,
            texture: params.texture,
            flare_max: FLARE_MAX,
            flare_exponent: FLARE_EXPONENT,
            flare_frequency: FLARE_FREQUENCY,
            lod: params.lod,
            ticket: link.ticket(),
        }
    }

    /// Ages the particle by `delta_micros`.
    ///
    /// Returns `false` once the particle should be removed: immediately when
    /// its effect is recalled, or when opacity has dropped below
    /// [`VISIBILITY_THRESHOLD`]. Otherwise opacity is multiplied by
    /// `sqrt(0.5^(delta / 300ms))`, a half-life of 600ms independent of tick
    /// length.
    pub fn idle(&mut self, delta_micros: u64, math: &MathCache) -> bool {
        if self.ticket.is_recalling() {
            return false;
        }

        if self.alpha < VISIBILITY_THRESHOLD {
            return false;
        }

        let scalar = math.pow_half(delta_micros as f32 / DECAY_REFERENCE_MICROS);
        self.alpha *= fast_sqrt(scalar).min(1.0);

        true
    }

    /// Jittered RGB color, each channel in `[0, 1]`.
    #[must_use]
    pub const fn color(&self) -> [f32; 3] {
        self.color
    }

    /// Size, at most [`MAX_SIZE`].
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// Current opacity.
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Texture tag.
    #[must_use]
    pub const fn texture(&self) -> TextureId {
        self.texture
    }

    /// Detail level captured at creation.
    #[must_use]
    pub const fn lod(&self) -> u16 {
        self.lod
    }

    /// Twinkle amplitude.
    #[must_use]
    pub const fn flare_max(&self) -> f32 {
        self.flare_max
    }

    /// Twinkle exponent.
    #[must_use]
    pub const fn flare_exponent(&self) -> f32 {
        self.flare_exponent
    }

    /// Twinkle frequency.
    #[must_use]
    pub const fn flare_frequency(&self) -> f32 {
        self.flare_frequency
    }

    /// Whether the owning effect has been recalled.
    #[must_use]
    pub fn is_recalled(&self) -> bool {
        self.ticket.is_recalling()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FastRandom, ScriptedRandom};
    use proptest::prelude::*;

    fn params() -> ParticleParams {
        ParticleParams {
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::new(0.0, -0.2, 0.0),
            size: 0.5,
            alpha: 0.8,
            color: [1.0, 0.0, 0.6],
            texture: TextureId::Flare,
            lod: 7,
        }
    }

    #[test]
    fn test_construction_with_scripted_draws() {
        let link = EffectLink::new();
        // Channel jitters +0.1, -0.125, 0; size multiplier 0.2 + 0.3.
        let mut rng = ScriptedRandom::new(vec![0.9, 0.0, 0.5, 0.3]);
        let particle = EmittedParticle::new(&link, params(), &mut rng);

        assert_eq!(rng.taken(), 4);
        assert_eq!(particle.color()[0], 1.0);
        assert_eq!(particle.color()[1], 0.0);
        assert!((particle.color()[2] - 0.6).abs() < 1e-6);
        assert!((particle.size() - 0.25).abs() < 1e-6);
        assert!((particle.velocity.y - (-0.8)).abs() < 1e-5);
        assert_eq!(particle.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(particle.alpha(), 0.8);
        assert_eq!(particle.texture(), TextureId::Flare);
        assert_eq!(particle.lod(), 7);
        assert_eq!(particle.flare_max(), 2.5);
        assert_eq!(particle.flare_exponent(), 0.5);
        assert_eq!(particle.flare_frequency(), 0.05);
    }

    #[test]
    fn test_size_is_capped() {
        let link = EffectLink::new();
        let mut rng = ScriptedRandom::constant(0.99);
        let particle = EmittedParticle::new(
            &link,
            ParticleParams {
                size: 5.0,
                ..params()
            },
            &mut rng,
        );
        assert_eq!(particle.size(), MAX_SIZE);
    }

    #[test]
    fn test_degenerate_size_keeps_velocity_finite() {
        let link = EffectLink::new();
        let mut rng = ScriptedRandom::constant(0.5);
        let particle = EmittedParticle::new(
            &link,
            ParticleParams {
                size: -1.0,
                ..params()
            },
            &mut rng,
        );
        assert!(particle.size() > 0.0);
        assert!(particle.velocity.is_finite());
    }

    #[test]
    fn test_idle_decays_alpha() {
        let link = EffectLink::new();
        let math = MathCache::new();
        let mut rng = FastRandom::with_seed(1);
        let mut particle = EmittedParticle::new(&link, params(), &mut rng);

        // Two reference windows: alpha *= sqrt(0.25) = 0.5.
        assert!(particle.idle(600_000, &math));
        assert!((particle.alpha() - 0.4).abs() < 0.002);
    }

    #[test]
    fn test_idle_reports_dead_below_threshold() {
        let link = EffectLink::new();
        let math = MathCache::new();
        let mut rng = FastRandom::with_seed(2);
        let mut particle = EmittedParticle::new(
            &link,
            ParticleParams {
                alpha: 0.009,
                ..params()
            },
            &mut rng,
        );
        assert!(!particle.idle(16_000, &math));
    }

    #[test]
    fn test_particle_eventually_fades_out() {
        let link = EffectLink::new();
        let math = MathCache::new();
        let mut rng = FastRandom::with_seed(3);
        let mut particle = EmittedParticle::new(&link, params(), &mut rng);

        let mut frames = 0;
        while particle.idle(16_667, &math) {
            frames += 1;
            assert!(frames < 10_000, "particle never faded");
        }
        assert!(particle.alpha() < VISIBILITY_THRESHOLD);
    }

    #[test]
    fn test_recall_kills_regardless_of_alpha() {
        let link = EffectLink::new();
        let math = MathCache::new();
        let mut rng = FastRandom::with_seed(4);
        let mut particle = EmittedParticle::new(
            &link,
            ParticleParams {
                alpha: 1.0,
                ..params()
            },
            &mut rng,
        );
        assert!(particle.idle(1_000, &math));

        link.recall();
        assert!(particle.is_recalled());
        assert!(!particle.idle(1_000, &math));
    }

    #[test]
    fn test_particles_register_with_link() {
        let link = EffectLink::new();
        let mut rng = FastRandom::with_seed(5);
        let a = EmittedParticle::new(&link, params(), &mut rng);
        let b = EmittedParticle::new(&link, params(), &mut rng);
        assert_eq!(link.live_particles(), 2);
        drop(a);
        assert_eq!(link.live_particles(), 1);
        let c = b.clone();
        assert_eq!(link.live_particles(), 2);
        drop((b, c));
        assert_eq!(link.live_particles(), 0);
    }

    proptest! {
        #[test]
        fn prop_color_and_size_are_clamped(
            seed in any::<u64>(),
            r in -1.0f32..2.0,
            g in -1.0f32..2.0,
            b in -1.0f32..2.0,
            size in 0.0f32..4.0,
        ) {
            let link = EffectLink::new();
            let mut rng = FastRandom::with_seed(seed);
            let particle = EmittedParticle::new(
                &link,
                ParticleParams { color: [r, g, b], size, ..params() },
                &mut rng,
            );
            for channel in particle.color() {
                prop_assert!((0.0..=1.0).contains(&channel));
            }
            prop_assert!(particle.size() <= MAX_SIZE);
        }

        #[test]
        fn prop_alpha_never_increases(
            seed in any::<u64>(),
            deltas in proptest::collection::vec(1u64..2_000_000, 1..40),
        ) {
            let link = EffectLink::new();
            let math = MathCache::new();
            let mut rng = FastRandom::with_seed(seed);
            let mut particle = EmittedParticle::new(
                &link,
                ParticleParams { alpha: 1.0, ..params() },
                &mut rng,
            );
            let mut previous = particle.alpha();
            for delta in deltas {
                let was_visible = previous >= VISIBILITY_THRESHOLD;
                let alive = particle.idle(delta, &math);
                prop_assert_eq!(alive, was_visible);
                prop_assert!(particle.alpha() <= previous);
                previous = particle.alpha();
            }
        }
    }
}
