//! Staff glow emitter.
//!
//! An [`EmitterEffect`] follows a moving [`Anchor`] and sprinkles glow
//! particles behind it. The emission rate adapts to how fast the anchor moves
//! and the base size/opacity adapt to the current level of detail: low LOD
//! means bigger, fainter particles; high LOD smaller, more opaque ones.

use crate::link::{Anchor, EffectLink};
use crate::math::MathCache;
use crate::particle::{EmittedParticle, ParticleParams};
use crate::pool::ParticleSink;
use crate::random::RandomSource;
use glam::Vec3;
use glimmer_common::TextureId;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// LOD value a new effect starts from. Out of range for any real request, so
/// the first rescale always applies.
pub const LOD_SENTINEL: u16 = 100;

/// LOD requests closer than this to the current LOD are ignored.
pub const LOD_HYSTERESIS: f32 = 1.0;

/// Default ceiling on emission draws per frame.
pub const DEFAULT_MAX_EMISSIONS_PER_FRAME: u32 = 64;

/// Lower bound of the anchor speed factor.
pub const MIN_SPEED: f32 = 0.25;

/// Upper bound of the anchor speed factor.
pub const MAX_SPEED: f32 = 3.0;

const SPEED_SCALE: f32 = 0.666_667;
const EMISSION_RATE: f32 = 0.000_015;
const ACCEPT_BIAS: f32 = 0.5;
const ACCENT_CHANCE: f32 = 0.1;

/// Fixed look of an accent particle.
const ACCENT_SIZE: f32 = 1.5;
const ACCENT_ALPHA: f32 = 1.0;
const ACCENT_COLOR: [f32; 3] = [2.0, 2.0, 2.0];

/// Staff effect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StaffKind {
    /// Magenta flare glow.
    #[default]
    Mage,
    /// Deep blue twin-flare glow.
    Protection,
}

impl StaffKind {
    /// All variants.
    pub const ALL: [Self; 2] = [Self::Mage, Self::Protection];

    /// Base constants for this variant.
    #[must_use]
    pub const fn profile(self) -> StaffProfile {
        match self {
            Self::Mage => StaffProfile {
                color: [1.0, 0.0, 0.6],
                texture: TextureId::Flare,
                size: 1.2,
                alpha: 1.0,
            },
            Self::Protection => StaffProfile {
                color: [0.0, 0.0, 1.0],
                texture: TextureId::TwinFlare,
                size: 1.25,
                alpha: 1.0,
            },
        }
    }
}

/// Per-variant base look, before LOD scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffProfile {
    /// Base RGB color.
    pub color: [f32; 3],
    /// Texture for normal particles.
    pub texture: TextureId,
    /// Base particle size.
    pub size: f32,
    /// Base particle opacity.
    pub alpha: f32,
}

/// Lifecycle of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// Emitting every frame.
    Active,
    /// Recalled; waiting for its particles to expire.
    Recalling,
    /// Recalled and empty; the engine may destroy it.
    Done,
}

/// Emission policy for one staff glow anchored to a moving point.
#[derive(Debug)]
pub struct EmitterEffect {
    link: EffectLink,
    anchor: Anchor,
    previous_anchor: Vec3,
    kind: StaffKind,
    profile: StaffProfile,
    size: f32,
    alpha: f32,
    lod: u16,
    desired_lod: u16,
    max_emissions: u32,
    last_emitted: u32,
    hit_ceiling: bool,
}

impl EmitterEffect {
    /// Creates an emitter and scales it for the engine's last forced LOD.
    #[must_use]
    pub fn new(
        link: EffectLink,
        anchor: Anchor,
        kind: StaffKind,
        desired_lod: u16,
        last_forced_lod: f32,
    ) -> Self {
        let profile = kind.profile();
        let mut effect = Self {
            previous_anchor: anchor.get(),
            link,
            anchor,
            kind,
            profile,
            size: profile.size,
            alpha: profile.alpha,
            lod: LOD_SENTINEL,
            desired_lod,
            max_emissions: DEFAULT_MAX_EMISSIONS_PER_FRAME,
            last_emitted: 0,
            hit_ceiling: false,
        };
        // Applied unconditionally: a forced LOD near the sentinel must still
        // honour the ceiling and leave size/alpha scaled.
        effect.apply_lod(last_forced_lod);

        debug!(
            "Staff effect created ({:?}, lod {} of {})",
            kind, effect.lod, desired_lod
        );
        effect
    }

    /// Sets the per-frame ceiling on emission draws (at least one).
    #[must_use]
    pub fn with_max_emissions(mut self, max_emissions: u32) -> Self {
        self.max_emissions = max_emissions.max(1);
        self
    }

    /// Asks the effect to run at `new_lod`.
    ///
    /// Requests within [`LOD_HYSTERESIS`] of the current LOD are ignored.
    /// The effect never goes above the LOD it was granted at construction.
    pub fn request_lod(&mut self, new_lod: f32) {
        if (new_lod - f32::from(self.lod)).abs() < LOD_HYSTERESIS {
            return;
        }
        self.apply_lod(new_lod);
    }

    fn apply_lod(&mut self, new_lod: f32) {
        // `as` saturates: negative and NaN requests land on 0.
        let rounded = new_lod.round() as u16;
        self.lod = rounded.min(self.desired_lod);

        let lod = f32::from(self.lod);
        self.size = self.profile.size * (40.0 / (lod + 17.0));
        self.alpha = self.profile.alpha / (13.0 / (lod + 3.0));

        trace!(
            "Staff effect rescaled to lod {} (size {:.3}, alpha {:.3})",
            self.lod,
            self.size,
            self.alpha
        );
    }

    /// Stops emission. Existing particles die on their next aging step.
    pub fn recall(&self) {
        if !self.link.is_recalling() {
            debug!("Staff effect recalled ({:?})", self.kind);
        }
        self.link.recall();
    }

    /// Speed factor of the anchor over the last `delta_micros`.
    ///
    /// Squared anchor speed (units per second) scaled by 2/3 and clamped to
    /// [`MIN_SPEED`]..=[`MAX_SPEED`]. A zero delta yields the floor.
    #[must_use]
    pub fn anchor_speed(&self, delta_micros: u64) -> f32 {
        if delta_micros == 0 {
            return MIN_SPEED;
        }

        let distance = (self.previous_anchor - self.anchor.get()).length();
        let per_second = distance * 1_000_000.0 / delta_micros as f32;
        let speed = per_second * per_second * SPEED_SCALE;
        if speed.is_nan() {
            return MIN_SPEED;
        }
        speed.clamp(MIN_SPEED, MAX_SPEED)
    }

    /// Runs one frame of emission.
    ///
    /// Returns `false` once the effect is recalled and all its particles are
    /// gone, meaning the engine may destroy it.
    ///
    /// Emission is a run of independent draws: each draw `u` emits while
    /// `u^(delta * 1.5e-5 * speed) < 0.5`, which succeeds with probability
    /// `0.5^(1 / exponent)`. Faster anchors and longer frames therefore emit
    /// more. The run stops at the first failed draw, at the first pool
    /// rejection, or at the per-frame ceiling.
    pub fn idle<S, R>(
        &mut self,
        delta_micros: u64,
        sink: &mut S,
        rng: &mut R,
        math: &MathCache,
    ) -> bool
    where
        S: ParticleSink + ?Sized,
        R: RandomSource + ?Sized,
    {
        self.last_emitted = 0;
        self.hit_ceiling = false;

        if self.link.is_recalling() {
            self.previous_anchor = self.anchor.get();
            return self.link.live_particles() > 0;
        }

        let speed = self.anchor_speed(delta_micros);
        let exponent = delta_micros as f32 * EMISSION_RATE * speed;

        let mut draws = 0;
        let mut halted = false;
        while draws < self.max_emissions
            && math.pow_unit(rng.next_unit(), exponent) < ACCEPT_BIAS
        {
            draws += 1;

            let position = self.anchor.get();
            let velocity = Vec3::new(0.0, -rng.unit_scaled(0.25), 0.0);
            let params = ParticleParams {
                position,
                velocity,
                size: self.size - 0.125 + rng.unit_scaled(0.25),
                alpha: 0.5 + rng.unit_scaled(0.5),
                color: self.profile.color,
                texture: self.profile.texture,
                lod: self.lod,
            };
            let particle = EmittedParticle::new(&self.link, params, rng);
            if let Err(e) = sink.push_particle(particle) {
                trace!("Staff emission halted: {e}");
                halted = true;
                break;
            }
            self.last_emitted += 1;

            if rng.next_unit() < ACCENT_CHANCE {
                let accent = EmittedParticle::new(
                    &self.link,
                    ParticleParams {
                        position,
                        velocity,
                        size: ACCENT_SIZE,
                        alpha: ACCENT_ALPHA,
                        color: ACCENT_COLOR,
                        texture: TextureId::Crystal,
                        lod: self.lod,
                    },
                    rng,
                );
                if sink.push_particle(accent).is_ok() {
                    self.last_emitted += 1;
                }
            }
        }

        self.hit_ceiling = !halted && draws == self.max_emissions;
        if self.hit_ceiling {
            warn!(
                "Staff effect hit the emission ceiling ({} draws, speed {:.2}, delta {}us)",
                draws, speed, delta_micros
            );
        }

        self.previous_anchor = self.anchor.get();
        true
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EffectState {
        match (self.link.is_recalling(), self.link.live_particles()) {
            (false, _) => EffectState::Active,
            (true, 0) => EffectState::Done,
            (true, _) => EffectState::Recalling,
        }
    }

    /// Whether recall has been signalled.
    #[must_use]
    pub fn is_recalling(&self) -> bool {
        self.link.is_recalling()
    }

    /// Effect variant.
    #[must_use]
    pub const fn kind(&self) -> StaffKind {
        self.kind
    }

    /// Current effective LOD.
    #[must_use]
    pub const fn lod(&self) -> u16 {
        self.lod
    }

    /// LOD ceiling granted at construction.
    #[must_use]
    pub const fn desired_lod(&self) -> u16 {
        self.desired_lod
    }

    /// LOD-scaled base particle size.
    #[must_use]
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// LOD-scaled base particle opacity.
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Base color of normal particles.
    #[must_use]
    pub const fn color(&self) -> [f32; 3] {
        self.profile.color
    }

    /// Texture of normal particles.
    #[must_use]
    pub const fn texture(&self) -> TextureId {
        self.profile.texture
    }

    /// The anchor this effect follows.
    #[must_use]
    pub const fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// Link shared with this effect's particles.
    #[must_use]
    pub const fn link(&self) -> &EffectLink {
        &self.link
    }

    /// Number of this effect's particles still alive.
    #[must_use]
    pub fn live_particles(&self) -> usize {
        self.link.live_particles()
    }

    /// Particles accepted by the sink during the last `idle` call.
    #[must_use]
    pub const fn last_emitted(&self) -> u32 {
        self.last_emitted
    }

    /// Whether the last `idle` call stopped at the per-frame ceiling rather
    /// than on a failed draw or a pool rejection.
    #[must_use]
    pub const fn hit_emission_ceiling(&self) -> bool {
        self.hit_ceiling
    }

    /// Per-frame ceiling on emission draws.
    #[must_use]
    pub const fn max_emissions(&self) -> u32 {
        self.max_emissions
    }
}

impl Drop for EmitterEffect {
    fn drop(&mut self) {
        debug!("Staff effect destroyed ({:?})", self.kind);
    }
}
