//! Pointer input → simulation-space grab/hover state.
//!
//! The tracker runs on its own schedule: pointer events may arrive any
//! number of times between frames and simply overwrite the current state.
//! The frame loop takes one [`InteractionState`] copy per tick through
//! [`InteractionTracker::snapshot`].

use crate::{
    camera::{Camera, Plane},
    error::ProjectionError,
    types::{SIM_OFFSET_Y, SIM_SCALE},
};
use glam::{Vec2, Vec3};

/// What the simulation kernel sees of the pointer in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InteractionState {
    /// Latest pointer position, refreshed on every move.
    pub hover: Vec2,
    pub dragging: bool,
    /// Where the current drag started; `Some` only while dragging.
    pub grab_point: Option<Vec2>,
}

impl InteractionState {
    /// The grab point if a drag is in progress.
    #[inline]
    pub fn active_grab(&self) -> Option<Vec2> {
        if self.dragging { self.grab_point } else { None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
}

/// Maps a world-space point on the reference plane into simulation space.
#[inline]
pub fn world_to_sim(world: Vec3) -> Vec2 {
    Vec2::new(world.x * SIM_SCALE, world.y * SIM_SCALE + SIM_OFFSET_Y)
}

/// Inverse of [`world_to_sim`] restricted to the reference plane.
#[inline]
pub fn sim_to_world(sim: Vec2) -> Vec3 {
    Vec3::new(sim.x / SIM_SCALE, (sim.y - SIM_OFFSET_Y) / SIM_SCALE, 0.0)
}

#[derive(Debug)]
pub struct InteractionTracker {
    camera: Camera,
    state: InteractionState,
}

impl InteractionTracker {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            state: InteractionState::default(),
        }
    }

    /// Replaces the camera used for later samples, e.g. after a resize.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Maps a pixel position into simulation space.
    ///
    /// The pixel is unprojected into a ray, the ray is intersected with
    /// [`Plane::REFERENCE`] and the hit goes through [`world_to_sim`].
    pub fn screen_to_sim(&self, screen: Vec2) -> Result<Vec2, ProjectionError> {
        let hit = self
            .camera
            .screen_ray(screen)?
            .intersect_plane(&Plane::REFERENCE)?;
        let sim = world_to_sim(hit);
        if !sim.is_finite() {
            return Err(ProjectionError::NonFiniteResult);
        }
        Ok(sim)
    }

    /// Starts a drag at the given pixel.
    ///
    /// A sample that cannot be projected is dropped and the tracker keeps
    /// its previous state, including staying idle.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Result<Vec2, ProjectionError> {
        let p = self.sample(x, y)?;
        self.state.grab_point = Some(p);
        self.state.dragging = true;
        tracing::debug!(grab.x = p.x, grab.y = p.y, "grab started");
        Ok(p)
    }

    /// Refreshes the hover position, whether or not a drag is active.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Result<Vec2, ProjectionError> {
        let p = self.sample(x, y)?;
        self.state.hover = p;
        Ok(p)
    }

    /// Ends any drag and returns to idle.
    pub fn pointer_up(&mut self) {
        if self.state.dragging {
            tracing::debug!("grab released");
        }
        self.state.dragging = false;
        self.state.grab_point = None;
    }

    /// Forgets all pointer state, including the hover position.
    pub fn reset(&mut self) {
        self.state = InteractionState::default();
    }

    pub fn phase(&self) -> DragPhase {
        if self.state.dragging {
            DragPhase::Dragging
        } else {
            DragPhase::Idle
        }
    }

    /// A coherent copy of the latest pointer state.
    #[inline]
    pub fn snapshot(&self) -> InteractionState {
        self.state
    }

    fn sample(&self, x: f32, y: f32) -> Result<Vec2, ProjectionError> {
        self.screen_to_sim(Vec2::new(x, y)).inspect_err(|err| {
            tracing::debug!(x, y, %err, "pointer sample dropped");
        })
    }
}
