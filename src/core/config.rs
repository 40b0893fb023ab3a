use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Extra steps past the crossing time in the default pass length, so the exit is visible.
pub const EXIT_MARGIN_STEPS: usize = 20;

/// Run configuration for one beam-beam collision setup.
///
/// Every field has a default matching the reference electron/positron run
/// (50 slices of 21 particles, offset collision), so partial parameter sets
/// deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of slices per bunch (> 0).
    pub slice_count: usize,
    /// Number of particles per slice (> 0).
    pub particles_per_slice: usize,
    /// Longitudinal spacing between slices; also the distance a bunch moves per step (> 0).
    pub dz: f64,
    /// Initial vertical spacing between particles of a slice (> 0).
    pub dy: f64,
    /// Velocity kick per unit field. Positive pulls particles toward the opposing slice's center.
    pub dy_kick: f64,
    /// Total vertical separation of the bunch centers.
    /// Bunch A gets -y_offset/2, bunch B +y_offset/2.
    pub y_offset: f64,
    /// Steps a pass runs after the first slice contact (> 0).
    /// A pass never ends while the bunches still overlap.
    pub max_steps: usize,
    /// Z distance under which two slices count as overlapping (< dz / 2). 0 means exact equality.
    pub overlap_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        let slice_count = 50;
        Self {
            slice_count,
            particles_per_slice: 21,
            dz: 1.0,
            dy: 0.5,
            dy_kick: 0.0025,
            y_offset: 2.0,
            max_steps: slice_count + EXIT_MARGIN_STEPS,
            overlap_tolerance: 0.0,
        }
    }
}

impl Config {
    /// Centered collision with the default grid and the given kick coefficient.
    pub fn centered(dy_kick: f64) -> Self {
        Self {
            dy_kick,
            y_offset: 0.0,
            ..Self::default()
        }
    }

    /// Check every parameter.
    ///
    /// Errors:
    /// - `Error::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.slice_count == 0 {
            return Err(Error::InvalidConfig("slice_count must be > 0".into()));
        }
        if self.particles_per_slice == 0 {
            return Err(Error::InvalidConfig("particles_per_slice must be > 0".into()));
        }
        if !self.dz.is_finite() || self.dz <= 0.0 {
            return Err(Error::InvalidConfig("dz must be finite and > 0".into()));
        }
        if !self.dy.is_finite() || self.dy <= 0.0 {
            return Err(Error::InvalidConfig("dy must be finite and > 0".into()));
        }
        if !self.dy_kick.is_finite() {
            return Err(Error::InvalidConfig("dy_kick must be finite".into()));
        }
        if !self.y_offset.is_finite() {
            return Err(Error::InvalidConfig("y_offset must be finite".into()));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidConfig("max_steps must be > 0".into()));
        }
        if !self.overlap_tolerance.is_finite() || self.overlap_tolerance < 0.0 {
            return Err(Error::InvalidConfig(
                "overlap_tolerance must be finite and >= 0".into(),
            ));
        }
        // Each slice may face at most one opposing slice per step.
        if self.overlap_tolerance >= self.dz / 2.0 {
            return Err(Error::InvalidConfig("overlap_tolerance must be < dz / 2".into()));
        }
        if !self.z_extent().is_finite() {
            return Err(Error::InvalidConfig(
                "dz too large: slice Z coordinates overflow during a pass".into(),
            ));
        }
        if !self.y_extent().is_finite() {
            return Err(Error::InvalidConfig(
                "dy or y_offset too large: vertical extent overflows".into(),
            ));
        }
        Ok(())
    }

    /// Length of a bunch along Z, first slice to last.
    #[inline]
    pub fn bunch_length(&self) -> f64 {
        (self.slice_count.saturating_sub(1)) as f64 * self.dz
    }

    /// Vertical half-extent of a centered slice.
    #[inline]
    pub fn y_max(&self) -> f64 {
        (self.particles_per_slice.saturating_sub(1)) as f64 * self.dy / 2.0
    }

    /// Largest |Z| any slice can reach before the step limit stops a pass.
    pub fn z_extent(&self) -> f64 {
        let slices = self.slice_count.saturating_mul(2);
        let steps = self.max_steps.saturating_add(self.crossing_steps());
        slices.saturating_add(steps) as f64 * self.dz
    }

    /// Largest initial |Y| of any particle in either bunch.
    pub fn y_extent(&self) -> f64 {
        self.y_max() + self.y_offset.abs() / 2.0
    }

    /// Steps until the two bunches have fully passed through each other.
    #[inline]
    pub fn crossing_steps(&self) -> usize {
        self.slice_count + 1
    }

    /// Particles in one bunch.
    #[inline]
    pub fn particles_per_bunch(&self) -> usize {
        self.slice_count * self.particles_per_slice
    }
}
