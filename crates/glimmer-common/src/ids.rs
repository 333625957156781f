//! ID types for effects and render resources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for effect IDs.
static EFFECT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an active effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(u64);

impl EffectId {
    /// Creates a new unique effect ID.
    #[must_use]
    pub fn new() -> Self {
        Self(EFFECT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an effect ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid effect ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) effect ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Opaque texture tag carried by particles.
///
/// The renderer resolves these to real texture handles; nothing in the
/// simulation looks past the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TextureId {
    /// Soft round flare.
    Flare = 0,
    /// Two crossed flares.
    TwinFlare = 1,
    /// Hard-edged crystal glint.
    Crystal = 2,
}

impl TextureId {
    /// Converts from raw u8 value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Flare),
            1 => Some(Self::TwinFlare),
            2 => Some(Self::Crystal),
            _ => None,
        }
    }

    /// Asset name used when the renderer looks the texture up.
    #[must_use]
    pub const fn asset_name(self) -> &'static str {
        match self {
            Self::Flare => "flare",
            Self::TwinFlare => "twinflare",
            Self::Crystal => "crystal",
        }
    }
}
