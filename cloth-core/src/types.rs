use glam::Vec4;

/// One cloth mass point: `xyz` is the simulation-space position, `w` is a
/// reserved channel that is seeded with `1.0` and carried through untouched.
pub type GridPoint = Vec4;

/// Identifier for a point in a [`crate::grid::Grid`].
///
/// This is a row-major index (`row * resolution + col`) and is only
/// meaningful for grids of one resolution.
pub type PointId = usize;

/// Half width of the rest cloth along x.
pub const CLOTH_HALF_EXTENT: f32 = 0.6;

/// Rest height of the pinned top row.
pub const PINNED_ROW_Y: f32 = 0.6;

/// Rest height of every row below the pinned one.
pub const HANGING_ROW_Y: f32 = 0.4;

/// Scale of the world → simulation-space affine map.
pub const SIM_SCALE: f32 = 0.6;

/// Vertical offset of the world → simulation-space affine map.
pub const SIM_OFFSET_Y: f32 = 0.3;
