use crate::error::{ClothError, Result};
use crate::types::{CLOTH_HALF_EXTENT, GridPoint, HANGING_ROW_Y, PINNED_ROW_Y, PointId};
use glam::Vec4;

/// A square, row-major field of cloth points.
///
/// Row `0` is the pinned top edge. Points are addressed by exact
/// `(row, col)` only; there is no interpolation between neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    resolution: usize,
    points: Vec<GridPoint>,
}

impl Grid {
    /// Builds the rest configuration for an `n × n` cloth.
    ///
    /// Columns are spread evenly over `[-0.6, 0.6]` (a single column sits
    /// at `-0.6`). The top row hangs at `y = 0.6`, every other row at
    /// `y = 0.4`; `z = 0` and `w = 1` everywhere.
    ///
    /// ### Errors
    /// [`ClothError::InvalidResolution`] if `n == 0` or `n * n` overflows.
    pub fn rest(n: usize) -> Result<Self> {
        let len = n
            .checked_mul(n)
            .filter(|&len| len > 0)
            .ok_or(ClothError::InvalidResolution(n))?;

        let mut points = Vec::with_capacity(len);
        for row in 0..n {
            let y = if row == 0 { PINNED_ROW_Y } else { HANGING_ROW_Y };
            for col in 0..n {
                points.push(Vec4::new(rest_x(col, n), y, 0.0, 1.0));
            }
        }

        Ok(Self {
            resolution: n,
            points,
        })
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> PointId {
        row * self.resolution + col
    }

    /// Returns the point at `(row, col)`.
    ///
    /// ### Panics
    /// Panics if either coordinate is out of range.
    #[inline]
    pub fn point(&self, row: usize, col: usize) -> GridPoint {
        assert!(row < self.resolution && col < self.resolution);
        self.points[self.index(row, col)]
    }

    #[inline]
    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    #[inline]
    pub fn points_mut(&mut self) -> &mut [GridPoint] {
        &mut self.points
    }

    pub fn row(&self, row: usize) -> &[GridPoint] {
        let start = row * self.resolution;
        &self.points[start..start + self.resolution]
    }

    /// Whether the point lives on the pinned top row.
    #[inline]
    pub fn is_pinned(&self, id: PointId) -> bool {
        id < self.resolution
    }

    /// Distance between neighbouring columns in the rest configuration.
    ///
    /// `0.0` for a single-column grid.
    pub fn rest_spacing(&self) -> f32 {
        if self.resolution < 2 {
            0.0
        } else {
            2.0 * CLOTH_HALF_EXTENT / (self.resolution - 1) as f32
        }
    }

    /// The four corner points, in the order
    /// `(0, 0)`, `(0, n-1)`, `(n-1, 0)`, `(n-1, n-1)`.
    pub fn corners(&self) -> [GridPoint; 4] {
        let last = self.resolution - 1;
        [
            self.point(0, 0),
            self.point(0, last),
            self.point(last, 0),
            self.point(last, last),
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    /// Overwrites every point with the matching point of `src`.
    ///
    /// ### Panics
    /// Panics if the two grids have different resolutions.
    pub fn copy_from(&mut self, src: &Grid) {
        assert_eq!(self.resolution, src.resolution);
        self.points.copy_from_slice(&src.points);
    }

    /// Puts back any point that breaks a grid invariant.
    ///
    /// The pinned row is copied from `reference` unconditionally, and any
    /// other point with a non-finite component falls back to its value in
    /// `reference`.
    ///
    /// ### Returns
    /// The number of non-pinned points that had to be restored.
    ///
    /// ### Panics
    /// Panics if the two grids have different resolutions.
    pub fn restore_invalid_from(&mut self, reference: &Grid) -> usize {
        assert_eq!(self.resolution, reference.resolution);
        let n = self.resolution;
        self.points[..n].copy_from_slice(&reference.points[..n]);

        let mut restored = 0;
        for (p, r) in self.points[n..].iter_mut().zip(&reference.points[n..]) {
            if !p.is_finite() {
                *p = *r;
                restored += 1;
            }
        }
        restored
    }
}

fn rest_x(col: usize, n: usize) -> f32 {
    if n == 1 {
        return -CLOTH_HALF_EXTENT;
    }
    ((col as f32 / (n - 1) as f32) * 2.0 - 1.0) * CLOTH_HALF_EXTENT
}
