//! Beam-beam field of one slice and the velocity kick it produces.

use crate::core::particle::Slice;

/// Field felt at `target_y` from the particles of `opposing`.
///
/// Counts opposing particles strictly above minus those strictly below; a
/// particle at exactly `target_y` contributes nothing. An empty slice gives 0.
#[inline]
pub fn field_at(target_y: f64, opposing: &Slice) -> f64 {
    let mut above = 0i64;
    let mut below = 0i64;
    for y in opposing.ys() {
        if y > target_y {
            above += 1;
        } else if y < target_y {
            below += 1;
        }
    }
    (above - below) as f64
}

/// Kick every particle of `target` with the field of `opposing`: `vy += kick * field`.
///
/// Only velocities are written, so fields computed for the rest of the step
/// still see the positions as they were when the step started. Records the
/// mean field on `target.last_field`.
pub fn apply_kick(target: &mut Slice, opposing: &Slice, kick: f64) {
    if target.particles.is_empty() {
        target.last_field = 0.0;
        return;
    }
    let mut total = 0.0;
    for p in &mut target.particles {
        let field = field_at(p.y, opposing);
        p.vy += kick * field;
        total += field;
    }
    target.last_field = total / target.particles.len() as f64;
}
