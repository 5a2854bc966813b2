//! The step function that advances the cloth by one frame.

use crate::{
    config::KernelConfig,
    constraints::{DistanceConstraint, grid_constraints},
    grid::Grid,
    interaction::InteractionState,
    phases,
};

/// Bookkeeping returned by a kernel step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Free points whose new value was non-finite and got replaced by the
    /// read value.
    pub rejected: usize,
    /// Points moved by the grab pull.
    pub pulled: usize,
}

/// A state transition from one cloth grid to the next.
///
/// Implementations must uphold, for every call:
/// - row `0` of `write` equals row `0` of `read`;
/// - a `dt` that is not a positive finite number leaves `write == read`;
/// - no component of `write` is non-finite;
/// - while `interaction` is dragging, points near its grab point are
///   pulled toward it.
///
/// `&mut self` exists for scratch storage only; the result of a step must
/// depend on the arguments alone.
pub trait SimulationKernel {
    /// Computes the grid that follows `read` into `write`.
    ///
    /// `previous` is the grid presented before this step and can be used
    /// for velocity-free (position differencing) integration.
    fn step(
        &mut self,
        read: &Grid,
        previous: &Grid,
        interaction: &InteractionState,
        dt: f32,
        write: &mut Grid,
    ) -> StepStats;
}

/// Position-only cloth kernel: gravity, grab pull, then Gauss-Seidel
/// distance constraints and pin tethers.
///
/// No velocity survives a step, so the cloth settles instead of swinging
/// and `previous` is not consulted.
#[derive(Debug)]
pub struct PbdKernel {
    cfg: KernelConfig,
    constraints: Vec<DistanceConstraint>,
    built_for: Option<(usize, bool)>,
}

impl PbdKernel {
    pub fn new(cfg: KernelConfig) -> Self {
        Self {
            cfg,
            constraints: Vec::new(),
            built_for: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &KernelConfig {
        &self.cfg
    }

    /// Mutable access to the parameters; topology changes (such as
    /// toggling `shear`) take effect on the next step.
    #[inline]
    pub fn config_mut(&mut self) -> &mut KernelConfig {
        &mut self.cfg
    }

    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }

    fn prepare(&mut self, grid: &Grid) {
        let key = (grid.resolution(), self.cfg.shear);
        if self.built_for != Some(key) {
            self.constraints = grid_constraints(grid, self.cfg.shear);
            self.built_for = Some(key);
            tracing::debug!(
                resolution = key.0,
                shear = key.1,
                constraints = self.constraints.len(),
                "built cloth constraints"
            );
        }
    }
}

impl Default for PbdKernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl SimulationKernel for PbdKernel {
    fn step(
        &mut self,
        read: &Grid,
        _previous: &Grid,
        interaction: &InteractionState,
        dt: f32,
        write: &mut Grid,
    ) -> StepStats {
        if !(dt > 0.0) || !dt.is_finite() {
            write.copy_from(read);
            return StepStats::default();
        }

        let h = dt.min(self.cfg.max_dt);
        self.prepare(read);

        phases::predict_phase(read, &self.cfg, h, write);
        let pulled = phases::grab_phase(write, interaction, &self.cfg);
        phases::constraint_phase(write, &self.constraints, &self.cfg);
        let rejected = phases::finalize_phase(read, write);

        StepStats { rejected, pulled }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn step_once(
        kernel: &mut PbdKernel,
        read: &Grid,
        interaction: &InteractionState,
        dt: f32,
    ) -> (Grid, StepStats) {
        let mut write = read.clone();
        for p in write.points_mut() {
            // garbage that a correct step must overwrite
            p.x = 42.0;
        }
        let stats = kernel.step(read, read, interaction, dt, &mut write);
        (write, stats)
    }

    #[test]
    fn zero_dt_copies_read() {
        let mut kernel = PbdKernel::default();
        let read = Grid::rest(6).unwrap();
        for dt in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let (write, stats) = step_once(&mut kernel, &read, &InteractionState::default(), dt);
            assert_eq!(write, read, "dt = {dt}");
            assert_eq!(stats, StepStats::default());
        }
    }

    #[test]
    fn step_keeps_pins_and_lets_cloth_fall() {
        let mut kernel = PbdKernel::default();
        let read = Grid::rest(8).unwrap();

        let idle = InteractionState::default();
        let (write, stats) = step_once(&mut kernel, &read, &idle, 1.0 / 60.0);

        assert_eq!(stats.rejected, 0);
        assert_eq!(write.row(0), read.row(0));
        assert!(write.is_finite());
        let last = read.resolution() - 1;
        assert!(write.point(last, 3).y < read.point(last, 3).y);
        for (w, r) in write.points().iter().zip(read.points()) {
            assert_eq!(w.w, r.w);
        }
    }

    #[test]
    fn large_dt_is_clamped() {
        let mut kernel = PbdKernel::default();
        let read = Grid::rest(4).unwrap();
        let max_dt = kernel.config().max_dt;

        let (clamped, _) = step_once(&mut kernel, &read, &InteractionState::default(), 10.0);
        let (reference, _) = step_once(&mut kernel, &read, &InteractionState::default(), max_dt);

        assert_eq!(clamped, reference);
    }

    #[test]
    fn drag_pulls_points_toward_grab() {
        let mut cfg = KernelConfig::default();
        cfg.gravity = Vec3::ZERO;
        cfg.iterations = 0;
        let mut kernel = PbdKernel::new(cfg);
        let read = Grid::rest(5).unwrap();
        let grab = Vec2::new(0.0, 0.35);
        let drag = InteractionState {
            hover: grab,
            dragging: true,
            grab_point: Some(grab),
        };

        let (write, stats) = step_once(&mut kernel, &read, &drag, 1.0 / 60.0);

        assert_eq!(stats.pulled, 4);
        let before = read.point(2, 2).truncate().truncate();
        let after = write.point(2, 2).truncate().truncate();
        assert!(after.distance(grab) < before.distance(grab));
    }

    #[test]
    fn constraints_rebuild_when_resolution_changes() {
        let mut kernel = PbdKernel::default();
        let small = Grid::rest(3).unwrap();
        let large = Grid::rest(5).unwrap();
        let idle = InteractionState::default();

        step_once(&mut kernel, &small, &idle, 0.01);
        let n_small = kernel.constraints().len();
        step_once(&mut kernel, &large, &idle, 0.01);
        let n_large = kernel.constraints().len();

        assert_eq!(n_small, grid_constraints(&small, true).len());
        assert_eq!(n_large, grid_constraints(&large, true).len());

        kernel.config_mut().shear = false;
        step_once(&mut kernel, &large, &idle, 0.01);
        assert_eq!(kernel.constraints().len(), grid_constraints(&large, false).len());
    }

    /// Steps `grid` `steps` times at 60 Hz, feeding each result back in.
    fn settle(kernel: &mut PbdKernel, mut grid: Grid, steps: usize) -> Grid {
        let idle = InteractionState::default();
        for _ in 0..steps {
            let (next, stats) = step_once(kernel, &grid, &idle, 1.0 / 60.0);
            assert_eq!(stats.rejected, 0);
            grid = next;
        }
        grid
    }

    #[test]
    fn cloth_settles_into_a_straight_drape() {
        for n in [2, 4, 10, 20] {
            let mut kernel = PbdKernel::default();
            let grid = settle(&mut kernel, Grid::rest(n).unwrap(), 240);
            let spacing = grid.rest_spacing();

            for col in 0..n {
                for row in 1..n {
                    let upper = grid.point(row - 1, col);
                    let lower = grid.point(row, col);
                    assert!(lower.y < upper.y, "n = {n}, ({row}, {col}) folded");
                    let link = (lower - upper).truncate().length();
                    assert!(
                        (link - spacing).abs() < 0.02 * spacing,
                        "n = {n}, ({row}, {col}): link {link} vs {spacing}"
                    );
                }
                let bottom = grid.point(n - 1, col);
                assert!((bottom.y + 0.6).abs() < 1e-2, "n = {n}: bottom at {}", bottom.y);
            }
        }
    }

    #[test]
    fn settled_drape_is_a_fixed_point() {
        let mut kernel = PbdKernel::default();
        let settled = settle(&mut kernel, Grid::rest(6).unwrap(), 240);
        let again = settle(&mut kernel, settled.clone(), 60);
        for (a, b) in settled.points().iter().zip(again.points()) {
            assert!((*a - *b).abs().max_element() < 1e-4);
        }
    }

    #[test]
    fn previous_grid_does_not_change_the_step() {
        let mut kernel = PbdKernel::default();
        let read = Grid::rest(5).unwrap();
        let mut previous = read.clone();
        for p in previous.points_mut() {
            p.y += 0.3;
        }
        let idle = InteractionState::default();

        let mut a = read.clone();
        let mut b = read.clone();
        kernel.step(&read, &read, &idle, 0.016, &mut a);
        kernel.step(&read, &previous, &idle, 0.016, &mut b);

        assert_eq!(a, b);
    }

    #[test]
    fn repeated_steps_are_bit_identical() {
        let read = Grid::rest(10).unwrap();
        let idle = InteractionState::default();
        let (a, _) = step_once(&mut PbdKernel::default(), &read, &idle, 0.016);
        let (b, _) = step_once(&mut PbdKernel::default(), &read, &idle, 0.016);
        assert_eq!(a, b);
    }
}
