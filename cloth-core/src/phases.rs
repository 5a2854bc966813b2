//! Phases of one position-based cloth step.
//!
//! [`crate::kernel::PbdKernel`] runs them in order:
//! 1. [`predict_phase`] - free points of the read grid fall under gravity.
//! 2. [`grab_phase`] - points near an active grab point are pulled toward it.
//! 3. [`constraint_phase`] - Gauss-Seidel relaxation of the distance
//!    constraints, followed by the pin tethers.
//! 4. [`finalize_phase`] - the pinned row and any non-finite point are put
//!    back to their read values.
//!
//! The scheme is position-only: no velocity is carried from one step to
//! the next. Every phase writes into the destination grid only; the read
//! grid is never modified.

use crate::{
    config::KernelConfig, constraints::DistanceConstraint, grid::Grid,
    interaction::InteractionState, types::GridPoint,
};

/// Predicts the next position of every point.
///
/// Free points move by `gravity * h²`. Pinned points copy `read`. The `w`
/// channel is carried over from `read` unchanged.
///
/// ### Parameters
/// - `read` - Result of the last step.
/// - `cfg` - Supplies gravity.
/// - `h` - Time advanced by this step, in seconds.
/// - `write` - Destination; every point is overwritten.
pub fn predict_phase(read: &Grid, cfg: &KernelConfig, h: f32, write: &mut Grid) {
    let fall = (cfg.gravity * (h * h)).extend(0.0);
    let n = read.resolution();

    for (id, (out, cur)) in write.points_mut().iter_mut().zip(read.points()).enumerate() {
        *out = if id < n { *cur } else { *cur + fall };
    }
}

/// Pulls free points near the active grab point toward it.
///
/// Points whose `xy` distance `d` to the grab point is below
/// `cfg.grab_radius` move in the plane by
/// `(grab - p.xy) * grab_strength * (1 - d / grab_radius)`, so the pull
/// fades out toward the edge of the radius.
///
/// Nothing happens unless the interaction is dragging with a grab point.
///
/// ### Returns
/// The number of points that were moved.
pub fn grab_phase(write: &mut Grid, interaction: &InteractionState, cfg: &KernelConfig) -> usize {
    let Some(grab) = interaction.active_grab() else {
        return 0;
    };
    if cfg.grab_radius <= 0.0 || cfg.grab_strength <= 0.0 {
        return 0;
    }

    let n = write.resolution();
    let mut pulled = 0;
    for p in write.points_mut().iter_mut().skip(n) {
        let to_grab = grab - p.truncate().truncate();
        let d = to_grab.length();
        if d >= cfg.grab_radius {
            continue;
        }
        let falloff = 1.0 - d / cfg.grab_radius;
        let step = to_grab * (cfg.grab_strength * falloff);
        p.x += step.x;
        p.y += step.y;
        pulled += 1;
    }
    pulled
}

/// Relaxes distance constraints for `cfg.iterations` passes.
///
/// Each pass walks `constraints` in order and corrects every one in place,
/// so later constraints already see earlier corrections. The correction
/// moves the endpoints until they sit `rest` apart along their current
/// direction, scaled by `cfg.stiffness * cfg.relaxation` and split by
/// inverse mass. Pinned points have zero inverse mass.
///
/// When the endpoints coincide, or `b` has turned over to the wrong side
/// of `a` (`(b - a) · rest_dir <= 0`), the constraint places them along
/// `rest_dir` instead. This is what unfolds the collapsed rest layout.
///
/// With `cfg.tethers`, every pass ends with [`tether_pass`].
///
/// ### Parameters
/// - `write` - Grid being solved, updated in place.
/// - `constraints` - Constraints built for this grid's resolution.
/// - `cfg` - Supplies iterations, stiffness, relaxation and tethers.
pub fn constraint_phase(write: &mut Grid, constraints: &[DistanceConstraint], cfg: &KernelConfig) {
    let n = write.resolution();
    let spacing = write.rest_spacing();
    let scale = cfg.stiffness * cfg.relaxation;
    let points = write.points_mut();

    for _ in 0..cfg.iterations {
        for k in constraints {
            project(points, n, k, scale);
        }
        if cfg.tethers {
            tether_pass(points, n, spacing);
        }
    }
}

fn project(points: &mut [GridPoint], n: usize, k: &DistanceConstraint, scale: f32) {
    let wa = if k.a < n { 0.0 } else { 1.0 };
    let wb = if k.b < n { 0.0 } else { 1.0 };
    let w_sum = wa + wb;
    if w_sum == 0.0 {
        return;
    }

    let d = points[k.b].truncate() - points[k.a].truncate();
    let len = d.length();
    if !len.is_finite() {
        return;
    }
    let dir = if len > 1e-9 && d.dot(k.rest_dir) > 0.0 {
        d / len
    } else {
        k.rest_dir
    };

    let corr = (d - dir * k.rest) * scale;
    points[k.a] += (corr * (wa / w_sum)).extend(0.0);
    points[k.b] -= (corr * (wb / w_sum)).extend(0.0);
}

/// Pulls every free point that drifted further from the pinned point at
/// the top of its column than `row * spacing` back onto that distance.
///
/// Tethers only ever shorten; a point closer to its pin is left alone.
pub fn tether_pass(points: &mut [GridPoint], n: usize, spacing: f32) {
    for id in n..points.len() {
        let (row, col) = (id / n, id % n);
        let anchor = points[col].truncate();
        let d = points[id].truncate() - anchor;
        let len = d.length();
        let max = row as f32 * spacing;
        if len > max && len.is_finite() {
            let p = anchor + d * (max / len);
            points[id] = p.extend(points[id].w);
        }
    }
}

/// Restores the pinned row and rejects non-finite points.
///
/// ### Returns
/// The number of free points whose write was rejected.
pub fn finalize_phase(read: &Grid, write: &mut Grid) -> usize {
    write.restore_invalid_from(read)
}
