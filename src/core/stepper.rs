//! One discrete collision step: overlap detection, two-way kicks, drift, translation.

use crate::core::config::Config;
use crate::core::field::apply_kick;
use crate::core::particle::Bunch;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::collections::BTreeMap;

/// Slice index pairs `(index in a, index in b)` that share a Z coordinate.
///
/// With `tolerance == 0` the coordinates must be exactly equal; otherwise
/// `|z_a - z_b| <= tolerance`. The tolerance is kept below half a slice
/// spacing by `Config::validate`, so every slice has at most one partner.
///
/// Errors:
/// - `Error::MathError` if a slice coordinate is NaN.
pub fn overlapping_pairs(a: &Bunch, b: &Bunch, tolerance: f64) -> Result<Vec<(usize, usize)>> {
    let mut by_z: BTreeMap<NotNan<f64>, usize> = BTreeMap::new();
    for k in 0..b.slices.len() {
        by_z.insert(not_nan(b.slice_z(k))?, k);
    }

    let mut pairs = Vec::new();
    for i in 0..a.slices.len() {
        let z = a.slice_z(i);
        let lo = not_nan(z - tolerance)?;
        let hi = not_nan(z + tolerance)?;
        if let Some((_, &k)) = by_z.range(lo..=hi).next() {
            pairs.push((i, k));
        }
    }
    Ok(pairs)
}

/// True while any slice of `a` lies within the Z range of `b` (or touches it).
pub fn ranges_overlap(a: &Bunch, b: &Bunch, tolerance: f64) -> bool {
    match (a.z_range(), b.z_range()) {
        (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => {
            a_lo <= b_hi + tolerance && b_lo <= a_hi + tolerance
        }
        _ => false,
    }
}

/// Advance both bunches by one step and return the number of slice pairs that interacted.
///
/// In order:
/// 1. find overlapping slice pairs at the current offsets;
/// 2. kick each pair both ways (velocities only, so every field sees the
///    positions the step started with);
/// 3. drift every particle, `y += vy`;
/// 4. translate each bunch by `direction * dz`.
///
/// Nothing is mutated if step 1 fails.
pub fn advance(a: &mut Bunch, b: &mut Bunch, config: &Config) -> Result<usize> {
    let pairs = overlapping_pairs(a, b, config.overlap_tolerance)?;

    a.clear_fields();
    b.clear_fields();
    for &(i, k) in &pairs {
        apply_kick(&mut a.slices[i], &b.slices[k], config.dy_kick);
        apply_kick(&mut b.slices[k], &a.slices[i], config.dy_kick);
    }

    a.drift();
    b.drift();

    a.translate();
    b.translate();

    Ok(pairs.len())
}

fn not_nan(z: f64) -> Result<NotNan<f64>> {
    NotNan::new(z).map_err(|_| Error::MathError("slice Z coordinate is NaN".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::build_initial_state;

    fn small_config() -> Config {
        Config {
            slice_count: 4,
            particles_per_slice: 3,
            dy: 1.0,
            dy_kick: 0.1,
            y_offset: 1.0,
            max_steps: 10,
            ..Config::default()
        }
    }

    #[test]
    fn no_pairs_before_contact() -> Result<()> {
        let (a, b) = build_initial_state(&small_config())?;
        assert!(overlapping_pairs(&a, &b, 0.0)?.is_empty());
        assert!(!ranges_overlap(&a, &b, 0.0));
        Ok(())
    }

    #[test]
    fn first_contact_after_one_step() -> Result<()> {
        let cfg = small_config();
        let (mut a, mut b) = build_initial_state(&cfg)?;
        // a: -4..=-1, b: 1..=4; after one translation a: -3..=0, b: 0..=3
        assert_eq!(advance(&mut a, &mut b, &cfg)?, 0);
        assert_eq!(overlapping_pairs(&a, &b, 0.0)?, vec![(3, 0)]);
        assert!(ranges_overlap(&a, &b, 0.0));
        Ok(())
    }

    #[test]
    fn step_without_overlap_leaves_velocities_alone() -> Result<()> {
        let cfg = small_config();
        let (mut a, mut b) = build_initial_state(&cfg)?;
        let (a0, b0) = (a.clone(), b.clone());
        advance(&mut a, &mut b, &cfg)?;
        for (bunch, before) in [(&a, &a0), (&b, &b0)] {
            for (s, s0) in bunch.slices.iter().zip(&before.slices) {
                assert_eq!(s.particles, s0.particles);
                assert_eq!(s.last_field, 0.0);
            }
        }
        assert_eq!(a.offset(), a0.offset() + 1.0);
        assert_eq!(b.offset(), b0.offset() - 1.0);
        Ok(())
    }

    #[test]
    fn overlapping_pair_kicks_both_ways_then_drifts() -> Result<()> {
        let cfg = small_config();
        let (mut a, mut b) = build_initial_state(&cfg)?;
        advance(&mut a, &mut b, &cfg)?;
        assert_eq!(advance(&mut a, &mut b, &cfg)?, 1);

        // a slice 3 sits at -1.5, -0.5, 0.5; b slice 0 at -0.5, 0.5, 1.5
        let a3 = &a.slices[3].particles;
        let b0 = &b.slices[0].particles;
        let expect_a = [3.0 * 0.1, 2.0 * 0.1, 0.0];
        let expect_b = [0.0, -2.0 * 0.1, -3.0 * 0.1];
        for j in 0..3 {
            assert!((a3[j].vy - expect_a[j]).abs() < 1e-15);
            assert!((b0[j].vy - expect_b[j]).abs() < 1e-15);
        }
        assert!((a3[0].y - (-1.5 + 0.3)).abs() < 1e-15);
        assert!((b0[2].y - (1.5 - 0.3)).abs() < 1e-15);

        // slices that met nothing are untouched
        assert_eq!(a.slices[0].particles[0].vy, 0.0);
        assert_eq!(b.slices[3].particles[0].vy, 0.0);
        Ok(())
    }

    #[test]
    fn kicks_use_pre_step_positions() -> Result<()> {
        let cfg = small_config();
        let (mut a, mut b) = build_initial_state(&cfg)?;
        advance(&mut a, &mut b, &cfg)?;

        // Compute expected kicks by hand from a frozen copy.
        let pairs = overlapping_pairs(&a, &b, 0.0)?;
        let (fa, fb) = (a.clone(), b.clone());
        advance(&mut a, &mut b, &cfg)?;
        for (i, k) in pairs {
            for (p, p0) in a.slices[i].particles.iter().zip(&fa.slices[i].particles) {
                let f = crate::core::field::field_at(p0.y, &fb.slices[k]);
                assert!((p.vy - cfg.dy_kick * f).abs() < 1e-15);
            }
            for (p, p0) in b.slices[k].particles.iter().zip(&fb.slices[k].particles) {
                let f = crate::core::field::field_at(p0.y, &fa.slices[i]);
                assert!((p.vy - cfg.dy_kick * f).abs() < 1e-15);
            }
        }
        Ok(())
    }

    #[test]
    fn tolerance_matches_near_coordinates() -> Result<()> {
        let cfg = small_config();
        let (mut a, b) = build_initial_state(&cfg)?;
        // nudge a so that its last slice is 1e-12 short of b's first slice
        for _ in 0..2 {
            a.translate();
        }
        let nudged = Bunch::new(
            a.direction(),
            a.offset() - 1e-12,
            cfg.dz,
            a.slices.clone(),
        );
        assert!(overlapping_pairs(&nudged, &b, 0.0)?.is_empty());
        assert_eq!(overlapping_pairs(&nudged, &b, 1e-9)?, vec![(3, 0)]);
        Ok(())
    }
}
