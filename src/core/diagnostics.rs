//! Read-only views of a bunch for plotting: centroid, vertical histogram, phase space.

use crate::core::particle::Bunch;
use crate::error::{Error, Result};

/// Centroids of both bunches at one step of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidSample {
    /// Steps taken since the pass started (0 = initial layout).
    pub step: usize,
    /// (mean Z, mean Y) of bunch A.
    pub a: (f64, f64),
    /// (mean Z, mean Y) of bunch B.
    pub b: (f64, f64),
}

/// Mean (Z, Y) over every particle of `bunch`; (0, 0) for an empty bunch.
pub fn centroid(bunch: &Bunch) -> (f64, f64) {
    let n = bunch.num_particles();
    if n == 0 {
        return (0.0, 0.0);
    }
    let (sz, sy) = bunch
        .iter_particles()
        .fold((0.0, 0.0), |(sz, sy), (z, p)| (sz + z, sy + p.y));
    (sz / n as f64, sy / n as f64)
}

/// (y, vy) of every particle in slice `index`.
///
/// Errors:
/// - `Error::InvalidParam` if `index` is out of range.
pub fn phase_space(bunch: &Bunch, index: usize) -> Result<Vec<(f64, f64)>> {
    let slice = bunch.slices.get(index).ok_or_else(|| {
        Error::InvalidParam(format!(
            "slice index {} out of range (bunch has {} slices)",
            index,
            bunch.slices.len()
        ))
    })?;
    Ok(slice.particles.iter().map(|p| (p.y, p.vy)).collect())
}

/// Histogram of vertical positions with `bins` equal-width bins.
///
/// Returns `(edges, counts)` with `bins + 1` edges. Without `range` the data
/// min/max is used (widened by 0.5 on each side if all values coincide).
/// Values outside an explicit range are dropped; a value equal to the upper
/// edge lands in the last bin.
///
/// Errors:
/// - `Error::InvalidParam` if `bins == 0`, the range is empty or non-finite, or
///   its width overflows.
pub fn y_histogram(
    bunch: &Bunch,
    bins: usize,
    range: Option<(f64, f64)>,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if bins == 0 {
        return Err(Error::InvalidParam("bins must be > 0".into()));
    }
    let (lo, hi) = match range {
        Some((lo, hi)) => {
            if !lo.is_finite() || !hi.is_finite() || hi <= lo {
                return Err(Error::InvalidParam(
                    "histogram range must be finite with min < max".into(),
                ));
            }
            (lo, hi)
        }
        None => {
            let (lo, hi) = bunch
                .iter_particles()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, p)| {
                    (lo.min(p.y), hi.max(p.y))
                });
            if !lo.is_finite() || !hi.is_finite() {
                return Err(Error::InvalidParam(
                    "cannot infer histogram range from an empty bunch".into(),
                ));
            }
            if hi > lo {
                (lo, hi)
            } else {
                (lo - 0.5, hi + 0.5)
            }
        }
    };

    let width = (hi - lo) / bins as f64;
    if !width.is_finite() || width <= 0.0 {
        return Err(Error::InvalidParam(format!(
            "histogram range [{lo}, {hi}] does not split into {bins} finite bins"
        )));
    }
    let edges: Vec<f64> = (0..=bins).map(|k| lo + k as f64 * width).collect();
    let mut counts = vec![0.0_f64; bins];
    for (_, p) in bunch.iter_particles() {
        if p.y < lo || p.y > hi {
            continue;
        }
        let k = (((p.y - lo) / width) as usize).min(bins - 1);
        counts[k] += 1.0;
    }
    Ok((edges, counts))
}
