//! Cached approximations used on the per-particle hot path.
//!
//! Every live particle evaluates a power curve each frame, and every emitter
//! evaluates one per emission draw. The tables here trade a few kilobytes for
//! avoiding `powf`/`log2` in those loops. Only the shape of the curves
//! matters to the visuals, so the documented tolerances are loose on purpose.

/// Upper end of the tabulated `0.5^x` range.
const HALF_POW_RANGE: f32 = 8.0;

/// Table samples per unit of exponent.
const HALF_POW_STEPS_PER_UNIT: usize = 128;

/// Table samples across the unit interval of bases.
const LOG2_STEPS: usize = 1024;

/// Bases below this use an exact `log2` (the curve is too steep to tabulate).
const LOG2_TABLE_FLOOR: f32 = 1.0 / 64.0;

/// Precomputed lookup tables for approximate power functions.
///
/// Accuracy:
/// - [`MathCache::pow_half`]: absolute error below `1e-4`.
/// - [`MathCache::pow_unit`]: absolute error below `1e-3` for bases in `[0, 1]`.
/// - [`fast_sqrt`]: relative error below `0.2%`.
///
/// All approximations are monotone in the same direction as the exact
/// function they replace.
#[derive(Debug, Clone)]
pub struct MathCache {
    half_pow: Vec<f32>,
    log2: Vec<f32>,
}

impl Default for MathCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MathCache {
    /// Builds the lookup tables.
    #[must_use]
    pub fn new() -> Self {
        let half_len = HALF_POW_RANGE as usize * HALF_POW_STEPS_PER_UNIT + 1;
        let half_pow = (0..half_len)
            .map(|i| 0.5f32.powf(i as f32 / HALF_POW_STEPS_PER_UNIT as f32))
            .collect();

        let log2 = (0..=LOG2_STEPS)
            .map(|i| {
                let base = i as f32 / LOG2_STEPS as f32;
                if base > 0.0 {
                    base.log2()
                } else {
                    f32::NEG_INFINITY
                }
            })
            .collect();

        Self { half_pow, log2 }
    }

    /// Approximates `0.5^x` for `x >= 0`.
    ///
    /// Negative exponents are treated as zero. Exponents past the table fall
    /// back to the exact power, which is already close to zero there.
    #[must_use]
    pub fn pow_half(&self, x: f32) -> f32 {
        if x.is_nan() || x <= 0.0 {
            return 1.0;
        }
        if x >= HALF_POW_RANGE {
            return 0.5f32.powf(x);
        }

        let scaled = x * HALF_POW_STEPS_PER_UNIT as f32;
        let index = scaled as usize;
        let frac = scaled - index as f32;
        let lo = self.half_pow[index];
        let hi = self.half_pow[(index + 1).min(self.half_pow.len() - 1)];
        lo + (hi - lo) * frac
    }

    /// Approximates `base^exponent` for `base` in `[0, 1]` and `exponent >= 0`.
    ///
    /// Computed as `0.5^(-log2(base) * exponent)` with both factors read from
    /// the tables. The result is increasing in `base` and, for `base < 1`,
    /// decreasing in `exponent`.
    #[must_use]
    pub fn pow_unit(&self, base: f32, exponent: f32) -> f32 {
        if exponent <= 0.0 {
            return 1.0;
        }
        if base <= 0.0 {
            return 0.0;
        }
        if base >= 1.0 {
            return 1.0;
        }

        self.pow_half(-self.log2_unit(base) * exponent)
    }

    /// Table-driven `log2` for bases in `(0, 1)`.
    fn log2_unit(&self, base: f32) -> f32 {
        if base < LOG2_TABLE_FLOOR {
            return base.log2();
        }

        let scaled = base * LOG2_STEPS as f32;
        let index = (scaled as usize).min(LOG2_STEPS - 1);
        let frac = scaled - index as f32;
        let lo = self.log2[index];
        let hi = self.log2[index + 1];
        lo + (hi - lo) * frac
    }
}

/// Approximate square root via the bit-level inverse square root estimate
/// refined by one Newton step.
///
/// Never overestimates by more than rounding, so `fast_sqrt(x) <= 1` for
/// `x <= 1`. Non-positive input yields zero.
#[must_use]
pub fn fast_sqrt(x: f32) -> f32 {
    if x.is_nan() || x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return x;
    }
    x * fast_inv_sqrt(x)
}

/// Approximate `1 / sqrt(x)` for positive, finite `x`.
#[must_use]
pub fn fast_inv_sqrt(x: f32) -> f32 {
    let half = 0.5 * x;
    let estimate = f32::from_bits(0x5f37_59df - (x.to_bits() >> 1));
    estimate * (1.5 - half * estimate * estimate)
}
