//! Random sources for particle jitter and emission draws.

/// A source of uniformly distributed draws in `[0, 1)`.
///
/// Every random decision in the emitter and particles goes through this
/// trait, so a seeded or scripted source replays a run exactly.
pub trait RandomSource {
    /// Next draw in `[0, 1)`.
    fn next_unit(&mut self) -> f32;

    /// Uniform draw in `[lo, hi)`.
    fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_unit() * (hi - lo)
    }

    /// Uniform draw in `[0, scale)`.
    fn unit_scaled(&mut self, scale: f32) -> f32 {
        self.next_unit() * scale
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f32 {
        (**self).next_unit()
    }
}

/// Production random source backed by `fastrand`.
#[derive(Debug, Clone)]
pub struct FastRandom {
    rng: fastrand::Rng,
}

impl Default for FastRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl FastRandom {
    /// Creates a generator with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Creates a generator with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl RandomSource for FastRandom {
    fn next_unit(&mut self) -> f32 {
        self.rng.f32()
    }
}

/// Replays a fixed list of draws, cycling when it runs out.
///
/// Used to reproduce a recorded frame or to force specific branches of the
/// emission loop. Values are clamped into `[0, 1)`; an empty script always
/// yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    draws: Vec<f32>,
    cursor: usize,
    taken: usize,
}

impl ScriptedRandom {
    /// Creates a scripted source from the given draws.
    #[must_use]
    pub fn new(draws: impl Into<Vec<f32>>) -> Self {
        let draws = draws
            .into()
            .into_iter()
            .map(|d| d.clamp(0.0, 1.0 - f32::EPSILON))
            .collect();
        Self {
            draws,
            cursor: 0,
            taken: 0,
        }
    }

    /// A source that returns the same value forever.
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }

    /// Number of draws consumed so far.
    #[must_use]
    pub const fn taken(&self) -> usize {
        self.taken
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f32 {
        self.taken += 1;
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.cursor];
        self.cursor = (self.cursor + 1) % self.draws.len();
        value
    }
}
