use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A macro-particle: vertical position and velocity only.
///
/// Z is not stored; it comes from the owning slice and the bunch offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Vertical position.
    pub y: f64,
    /// Vertical velocity (distance per step).
    pub vy: f64,
}

impl Particle {
    /// Create a particle at rest at `y`.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `y` is NaN/inf.
    pub fn at_rest(y: f64) -> Result<Self> {
        if !y.is_finite() {
            return Err(Error::InvalidParam("particle y must be finite".into()));
        }
        Ok(Self { y, vy: 0.0 })
    }

    /// Unit-time drift: `y += vy`.
    #[inline]
    pub fn drift(&mut self) {
        self.y += self.vy;
    }
}

/// Which of the two colliding bunches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BunchId {
    /// Starts on the left, moves toward +Z.
    A,
    /// Starts on the right, moves toward -Z.
    B,
}

/// Longitudinal direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// +1.0 or -1.0.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// A fixed-index group of particles sharing one Z coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    index: usize,
    /// Particles, in their initial vertical order.
    pub particles: Vec<Particle>,
    /// Mean field felt by this slice's particles during the last step (0 if it overlapped nothing).
    pub last_field: f64,
}

impl Slice {
    pub fn new(index: usize, particles: Vec<Particle>) -> Self {
        Self {
            index,
            particles,
            last_field: 0.0,
        }
    }

    /// Position of this slice within its bunch.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current vertical positions.
    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.particles.iter().map(|p| p.y)
    }

    /// Mean vertical position, or 0 for an empty slice.
    pub fn mean_y(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        self.ys().sum::<f64>() / self.particles.len() as f64
    }
}

/// One bunch: slices translating rigidly along Z.
///
/// Slice `i` sits at `offset + i * dz`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bunch {
    direction: Direction,
    offset: f64,
    dz: f64,
    /// Slices ordered by index.
    pub slices: Vec<Slice>,
}

impl Bunch {
    pub fn new(direction: Direction, offset: f64, dz: f64, slices: Vec<Slice>) -> Self {
        Self {
            direction,
            offset,
            dz,
            slices,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current longitudinal offset (Z of slice 0).
    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Z coordinate of slice `index`.
    #[inline]
    pub fn slice_z(&self, index: usize) -> f64 {
        self.offset + index as f64 * self.dz
    }

    /// (min Z, max Z) over all slices, or `None` for an empty bunch.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        let last = self.slices.len().checked_sub(1)?;
        Some((self.slice_z(0), self.slice_z(last)))
    }

    /// Total particle count.
    pub fn num_particles(&self) -> usize {
        self.slices.iter().map(|s| s.particles.len()).sum()
    }

    /// Every particle with its current Z, slice by slice.
    pub fn iter_particles(&self) -> impl Iterator<Item = (f64, &Particle)> + '_ {
        self.slices.iter().flat_map(move |s| {
            let z = self.slice_z(s.index);
            s.particles.iter().map(move |p| (z, p))
        })
    }

    /// Apply `y += vy` to every particle.
    pub fn drift(&mut self) {
        for p in self.slices.iter_mut().flat_map(|s| s.particles.iter_mut()) {
            p.drift();
        }
    }

    /// Move the whole bunch one slice spacing along its direction.
    #[inline]
    pub fn translate(&mut self) {
        self.offset += self.direction.sign() * self.dz;
    }

    /// Clear the per-step field record of every slice.
    pub fn clear_fields(&mut self) {
        for s in &mut self.slices {
            s.last_field = 0.0;
        }
    }

    /// Copy the mutable state (offset, positions, velocities, field records) from `template`.
    ///
    /// Topology must match; slices and particle vectors are reused in place.
    ///
    /// Errors:
    /// - `Error::InvalidState` if the slice or particle counts differ.
    pub fn restore_from(&mut self, template: &Bunch) -> Result<()> {
        if self.slices.len() != template.slices.len()
            || self
                .slices
                .iter()
                .zip(&template.slices)
                .any(|(a, b)| a.particles.len() != b.particles.len())
        {
            return Err(Error::InvalidState(
                "cannot restore a bunch from a template with different topology".into(),
            ));
        }
        self.direction = template.direction;
        self.offset = template.offset;
        self.dz = template.dz;
        for (dst, src) in self.slices.iter_mut().zip(&template.slices) {
            dst.particles.copy_from_slice(&src.particles);
            dst.last_field = src.last_field;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_slice_bunch() -> Result<Bunch> {
        let s0 = Slice::new(0, vec![Particle::at_rest(-1.0)?, Particle::at_rest(1.0)?]);
        let s1 = Slice::new(1, vec![Particle::at_rest(0.0)?, Particle::at_rest(2.0)?]);
        Ok(Bunch::new(Direction::Backward, 3.0, 0.5, vec![s0, s1]))
    }

    #[test]
    fn non_finite_particle_rejected() {
        let err = Particle::at_rest(f64::NAN).unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn slice_z_follows_offset() -> Result<()> {
        let mut b = two_slice_bunch()?;
        assert_eq!(b.slice_z(0), 3.0);
        assert_eq!(b.slice_z(1), 3.5);
        assert_eq!(b.z_range(), Some((3.0, 3.5)));
        b.translate();
        assert_eq!(b.offset(), 2.5);
        assert_eq!(b.z_range(), Some((2.5, 3.0)));
        Ok(())
    }

    #[test]
    fn drift_applies_velocity() -> Result<()> {
        let mut b = two_slice_bunch()?;
        b.slices[1].particles[0].vy = 0.25;
        b.drift();
        assert_eq!(b.slices[1].particles[0].y, 0.25);
        assert_eq!(b.slices[0].particles[0].y, -1.0);
        Ok(())
    }

    #[test]
    fn iter_particles_carries_slice_z() -> Result<()> {
        let b = two_slice_bunch()?;
        let zs: Vec<f64> = b.iter_particles().map(|(z, _)| z).collect();
        assert_eq!(zs, vec![3.0, 3.0, 3.5, 3.5]);
        assert_eq!(b.num_particles(), 4);
        Ok(())
    }

    #[test]
    fn restore_copies_state_back() -> Result<()> {
        let template = two_slice_bunch()?;
        let mut b = template.clone();
        b.slices[0].particles[1].vy = 0.3;
        b.slices[0].last_field = 2.0;
        b.drift();
        b.translate();
        b.restore_from(&template)?;
        assert_eq!(b, template);
        Ok(())
    }

    #[test]
    fn restore_rejects_other_topology() -> Result<()> {
        let template = two_slice_bunch()?;
        let mut b = template.clone();
        b.slices.pop();
        assert!(matches!(
            b.restore_from(&template),
            Err(Error::InvalidState(_))
        ));
        Ok(())
    }
}
