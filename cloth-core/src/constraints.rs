use crate::{grid::Grid, types::PointId};
use glam::Vec3;
use std::f32::consts::{FRAC_1_SQRT_2, SQRT_2};

/// Keeps two points at a fixed distance from each other.
///
/// `rest_dir` is the unit direction from `a` to `b` in the hanging sheet.
/// The solver falls back to it when the endpoints coincide or the link has
/// turned over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceConstraint {
    pub a: PointId,
    pub b: PointId,
    pub rest: f32,
    pub rest_dir: Vec3,
}

const RIGHT: Vec3 = Vec3::X;
const DOWN: Vec3 = Vec3::NEG_Y;
const DOWN_RIGHT: Vec3 = Vec3::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0);
const DOWN_LEFT: Vec3 = Vec3::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0);

/// Builds the distance constraints of a square grid.
///
/// Every point is tied to its right and lower neighbour at the rest column
/// spacing. With `shear`, both diagonals of every cell are added at
/// `spacing * √2`.
///
/// All structural links come first, row by row, followed by the diagonals.
/// A sequential solver walking this list settles every column from the
/// pinned row downward before shear is applied.
pub fn grid_constraints(grid: &Grid, shear: bool) -> Vec<DistanceConstraint> {
    let n = grid.resolution();
    if n < 2 {
        return Vec::new();
    }

    let spacing = grid.rest_spacing();
    let diagonal = spacing * SQRT_2;
    let cells = (n - 1) * (n - 1);
    let mut out = Vec::with_capacity(2 * n * (n - 1) + if shear { 2 * cells } else { 0 });

    let link = |a, b, rest, rest_dir| DistanceConstraint {
        a,
        b,
        rest,
        rest_dir,
    };

    for row in 0..n {
        for col in 0..n {
            let id = grid.index(row, col);
            if col + 1 < n {
                out.push(link(id, grid.index(row, col + 1), spacing, RIGHT));
            }
            if row + 1 < n {
                out.push(link(id, grid.index(row + 1, col), spacing, DOWN));
            }
        }
    }

    if shear {
        for row in 0..n - 1 {
            for col in 0..n - 1 {
                out.push(link(
                    grid.index(row, col),
                    grid.index(row + 1, col + 1),
                    diagonal,
                    DOWN_RIGHT,
                ));
                out.push(link(
                    grid.index(row, col + 1),
                    grid.index(row + 1, col),
                    diagonal,
                    DOWN_LEFT,
                ));
            }
        }
    }
    out
}
