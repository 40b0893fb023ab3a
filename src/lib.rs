//! 2D beam-beam collision engine.
//!
//! Two counter-propagating bunches, each a grid of slices × particles, pass
//! through each other along Z. Whenever two slices share a Z coordinate, each
//! kicks the vertical velocity of the other's particles with a counting field
//! (particles above minus particles below). [`core::Simulation`] sequences one
//! pass and can replay it from the identical initial condition.
//!
//! ```
//! use beambeam::core::{BunchId, Config, SequencerState, Simulation};
//!
//! # fn main() -> beambeam::error::Result<()> {
//! let mut sim = Simulation::new(Config::default())?;
//! sim.run_pass()?;
//! assert_eq!(sim.sequencer_state(), SequencerState::PassComplete);
//! let (_, y_a) = sim.centroid(BunchId::A);
//! assert!(y_a.is_finite());
//! sim.reset()?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod python;
