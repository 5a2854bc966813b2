use crate::error::{ClothError, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Parameters of the default position-based kernel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Constant acceleration applied to every free point.
    pub gravity: Vec3,
    /// Constraint relaxation passes per step.
    pub iterations: u32,
    /// Fraction of each distance error corrected per pass (`0..=1`).
    pub stiffness: f32,
    /// Also constrain cell diagonals, which resists shearing.
    pub shear: bool,
    /// Keep every free point within its rest path length of the pinned
    /// point at the top of its column, which stops long columns from
    /// stretching.
    pub tethers: bool,
    /// Over-relaxation factor applied to every constraint correction.
    pub relaxation: f32,
    /// Radius around the grab point inside which points are pulled.
    pub grab_radius: f32,
    /// Fraction of the distance to the grab point covered per step at the
    /// center of the radius (`0..=1`).
    pub grab_strength: f32,
    /// Upper bound on the time advanced by one step, in seconds.
    pub max_dt: f32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            iterations: 16,
            stiffness: 1.0,
            shear: true,
            tethers: true,
            relaxation: 1.0,
            grab_radius: 0.1,
            grab_strength: 0.5,
            max_dt: 1.0 / 30.0,
        }
    }
}

impl KernelConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(invalid("gravity", "must be finite"));
        }
        unit_interval("stiffness", self.stiffness)?;
        unit_interval("grab_strength", self.grab_strength)?;
        if !(self.relaxation > 0.0 && self.relaxation < 2.0) {
            return Err(invalid("relaxation", "must lie in (0, 2)"));
        }
        if !(self.grab_radius >= 0.0 && self.grab_radius.is_finite()) {
            return Err(invalid("grab_radius", "must be finite and non-negative"));
        }
        if !(self.max_dt > 0.0 && self.max_dt.is_finite()) {
            return Err(invalid("max_dt", "must be finite and positive"));
        }
        Ok(())
    }
}

/// Largest accepted grid side; keeps `resolution²` points addressable.
pub const MAX_RESOLUTION: usize = 4096;

/// Top-level simulation settings.
///
/// [`crate::sim::ClothSimulation`] keeps the value it was built with;
/// kernel parameters edited afterwards live in the kernel itself.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Points per grid side.
    pub resolution: usize,
    /// Completed steps between diagnostic snapshots; `0` turns them off.
    pub diagnostic_interval: u64,
    pub kernel: KernelConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            resolution: 100,
            diagnostic_interval: 60,
            kernel: KernelConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(ClothError::InvalidResolution(self.resolution));
        }
        self.kernel.validate()
    }
}

fn invalid(field: &'static str, reason: &str) -> ClothError {
    ClothError::InvalidConfig {
        field,
        reason: reason.to_owned(),
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must lie in [0, 1]"))
    }
}
