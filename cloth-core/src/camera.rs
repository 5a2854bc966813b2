//! Viewing transform used to turn pointer positions into world-space rays.

use crate::error::ProjectionError;
use glam::{Mat4, Vec2, Vec3};

/// A ray with a unit-length direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

/// A plane `{ p : normal · p = offset }`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    /// The `z = 0` plane the cloth hangs in front of.
    pub const REFERENCE: Plane = Plane {
        normal: Vec3::Z,
        offset: 0.0,
    };
}

impl Ray {
    /// Intersects the ray with `plane`.
    ///
    /// ### Errors
    /// - [`ProjectionError::ParallelToPlane`] if the ray never meets the plane.
    /// - [`ProjectionError::BehindRay`] if the plane is only reached backwards.
    pub fn intersect_plane(&self, plane: &Plane) -> Result<Vec3, ProjectionError> {
        let denom = plane.normal.dot(self.dir);
        if denom.abs() < 1e-6 {
            return Err(ProjectionError::ParallelToPlane);
        }

        let t = (plane.offset - plane.normal.dot(self.origin)) / denom;
        if !t.is_finite() {
            return Err(ProjectionError::ParallelToPlane);
        }
        if t < 0.0 {
            return Err(ProjectionError::BehindRay);
        }

        Ok(self.origin + self.dir * t)
    }
}

/// View and projection matrices plus the viewport they map onto.
///
/// Projections follow glam's `_rh` conventions (clip depth in `[0, 1]`).
/// The viewport is in device pixels with the origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(view: Mat4, projection: Mat4, viewport: Vec2) -> Self {
        Self {
            view,
            projection,
            viewport,
        }
    }

    /// Orthographic camera where one world unit spans `zoom` pixels.
    pub fn orthographic(eye: Vec3, target: Vec3, zoom: f32, viewport: Vec2) -> Self {
        let half = viewport * 0.5 / zoom;
        Self::new(
            Mat4::look_at_rh(eye, target, Vec3::Y),
            Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, 0.1, 2000.0),
            viewport,
        )
    }

    /// Perspective camera with a vertical field of view in radians.
    pub fn perspective(eye: Vec3, target: Vec3, fov_y: f32, viewport: Vec2) -> Self {
        let aspect = viewport.x / viewport.y.max(1.0);
        Self::new(
            Mat4::look_at_rh(eye, target, Vec3::Y),
            Mat4::perspective_rh(fov_y, aspect, 0.01, 100.0),
            viewport,
        )
    }

    /// The demo camera: orthographic, three units in front of the origin,
    /// 220 pixels per world unit.
    pub fn demo(viewport: Vec2) -> Self {
        Self::orthographic(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, 220.0, viewport)
    }

    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Converts a pixel position into normalized device coordinates
    /// (`x` right, `y` up, both in `[-1, 1]` inside the viewport).
    pub fn screen_to_ndc(&self, screen: Vec2) -> Result<Vec2, ProjectionError> {
        if !screen.is_finite() {
            return Err(ProjectionError::NonFiniteInput);
        }
        if !(self.viewport.x > 0.0 && self.viewport.y > 0.0) || !self.viewport.is_finite() {
            return Err(ProjectionError::EmptyViewport);
        }
        Ok(Vec2::new(
            screen.x / self.viewport.x * 2.0 - 1.0,
            -(screen.y / self.viewport.y) * 2.0 + 1.0,
        ))
    }

    /// Inverse of [`Camera::screen_to_ndc`].
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }

    /// Builds the world-space ray under a pixel.
    ///
    /// The ray starts on the near plane and points toward the far plane.
    pub fn screen_ray(&self, screen: Vec2) -> Result<Ray, ProjectionError> {
        let ndc = self.screen_to_ndc(screen)?;

        let inv = self.view_projection().inverse();
        if !inv.is_finite() {
            return Err(ProjectionError::SingularCamera);
        }

        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        let dir = (far - near).normalize_or_zero();
        if !near.is_finite() || dir == Vec3::ZERO || !dir.is_finite() {
            return Err(ProjectionError::SingularCamera);
        }

        Ok(Ray { origin: near, dir })
    }

    /// Projects a world-space point onto the screen.
    ///
    /// ### Returns
    /// The pixel position and the clip-space depth, or `None` when the point
    /// cannot be projected (for example when it sits on the eye plane of a
    /// perspective camera).
    pub fn world_to_screen(&self, p: Vec3) -> Option<(Vec2, f32)> {
        let clip = self.view_projection() * p.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !ndc.is_finite() {
            return None;
        }
        Some((self.ndc_to_screen(ndc.truncate()), ndc.z))
    }
}
