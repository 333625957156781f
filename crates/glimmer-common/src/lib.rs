//! # Glimmer Common
//!
//! Shared types for the Glimmer particle effects.
//!
//! This crate provides the small vocabulary every other crate speaks:
//! - ID types (EffectId, TextureId)
//! - Common error types
//! - The `Vec3` math type
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

pub use glam::Vec3;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use glam::Vec3;
}

pub use prelude::*;
