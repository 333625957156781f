//! # Glimmer Sim
//!
//! Headless driver for Glimmer staff effects.
//!
//! Runs a scripted scenario (moving anchors, LOD changes, recall) against the
//! effect engine and reports what happened.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod scenario;

pub use config::{LodChange, SimConfig, CONFIG_FILE};
pub use scenario::{run, SimReport};
