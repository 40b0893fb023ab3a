//! Initial layout of the two bunches.

use crate::core::config::Config;
use crate::core::particle::{Bunch, Direction, Particle, Slice};
use crate::error::Result;

/// Build the two bunches for `config`.
///
/// Bunch A occupies Z = -N·dz ..= -dz and moves toward +Z; bunch B occupies
/// Z = dz ..= N·dz and moves toward -Z. The ranges are adjacent, disjoint and
/// mirror images of each other. Within a slice, particle `j` of `n` sits at
/// `(j - (n-1)/2)·dy`; bunch A is then shifted by `-y_offset/2`, bunch B by
/// `+y_offset/2`. All velocities start at 0.
///
/// Errors:
/// - `Error::InvalidConfig` if `config` fails validation.
pub fn build_initial_state(config: &Config) -> Result<(Bunch, Bunch)> {
    config.validate()?;
    let half_offset = config.y_offset / 2.0;
    let a = build_bunch(
        config,
        Direction::Forward,
        -(config.slice_count as f64) * config.dz,
        -half_offset,
    )?;
    let b = build_bunch(config, Direction::Backward, config.dz, half_offset)?;
    Ok((a, b))
}

fn build_bunch(config: &Config, direction: Direction, offset: f64, y_shift: f64) -> Result<Bunch> {
    let center = (config.particles_per_slice as f64 - 1.0) / 2.0;
    let mut slices = Vec::with_capacity(config.slice_count);
    for index in 0..config.slice_count {
        let particles = (0..config.particles_per_slice)
            .map(|j| Particle::at_rest((j as f64 - center) * config.dy + y_shift))
            .collect::<Result<Vec<_>>>()?;
        slices.push(Slice::new(index, particles));
    }
    Ok(Bunch::new(direction, offset, config.dz, slices))
}
