#![allow(missing_docs)] // Public items carry their own docs in the submodules

//! Collision engine: bunch layout, slice fields, kicks, stepping and pass sequencing.

pub mod config;
pub mod diagnostics;
pub mod field;
pub mod grid;
pub mod particle;
pub mod sim;
pub mod stepper;

pub use config::Config;
pub use diagnostics::CentroidSample;
pub use grid::build_initial_state;
pub use particle::{Bunch, BunchId, Direction, Particle, Slice};
pub use sim::{ParticleState, SequencerState, Simulation, SliceField, Snapshot};
