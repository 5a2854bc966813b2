//! Frame orchestration: the per-tick driver tying the store, the tracker,
//! the kernel and the present stage together.
//!
//! A tick runs:
//! 1. skip if [`ClothSimulation::init`] has not run yet;
//! 2. take the elapsed time;
//! 3. borrow the read/write/display grids from the [`GridStore`];
//! 4. snapshot the [`InteractionTracker`];
//! 5. run the [`SimulationKernel`] and re-check the pin and finiteness
//!    invariants on its output;
//! 6. present the written grid;
//! 7. advance the store parity.
//!
//! After that the display grid is ready for the renderer.

use crate::{
    camera::Camera,
    config::SimConfig,
    error::{ProjectionError, Result},
    grid::Grid,
    interaction::{InteractionState, InteractionTracker},
    kernel::{PbdKernel, SimulationKernel},
    store::{GridStore, StepBuffers},
    types::GridPoint,
};
use glam::Vec2;

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickStatus {
    /// Buffers are not set up yet; nothing happened.
    NotInitialized,
    /// A step completed and its result is now displayed.
    Stepped {
        /// Completed steps including this one.
        step: u64,
        dt: f32,
        /// Points whose write was rejected as non-finite.
        rejected: usize,
    },
}

/// Turns absolute timestamps into per-tick elapsed time.
///
/// The first sample after construction or [`FrameClock::reset`] yields
/// `0`. Timestamps that go backwards or are not finite also yield `0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Seconds since the previous call.
    pub fn delta(&mut self, now: f64) -> f32 {
        if !now.is_finite() {
            return 0.0;
        }
        let dt = match self.last {
            Some(last) if now > last => (now - last) as f32,
            _ => 0.0,
        };
        self.last = Some(now);
        dt
    }
}

/// Periodic snapshot for observability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameDiagnostics {
    pub step: u64,
    /// Display corners, see [`Grid::corners`].
    pub corners: [GridPoint; 4],
    pub interaction: InteractionState,
}

/// A single cloth with an explicit `init` / `tick` / `shutdown` lifecycle.
#[derive(Debug)]
pub struct ClothSimulation<K = PbdKernel> {
    config: SimConfig,
    kernel: K,
    store: Option<GridStore>,
    tracker: InteractionTracker,
    clock: FrameClock,
    elapsed: f64,
    last_dt: f32,
    diagnostics: Option<FrameDiagnostics>,
}

impl ClothSimulation<PbdKernel> {
    /// Creates a simulation driven by a [`PbdKernel`] built from
    /// `config.kernel`.
    pub fn with_config(config: SimConfig, camera: Camera) -> Result<Self> {
        Self::new(config, PbdKernel::new(config.kernel), camera)
    }
}

impl<K: SimulationKernel> ClothSimulation<K> {
    /// Creates an uninitialized simulation.
    ///
    /// ### Errors
    /// Returns the first invalid field of `config`.
    pub fn new(config: SimConfig, kernel: K, camera: Camera) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            kernel,
            store: None,
            tracker: InteractionTracker::new(camera),
            clock: FrameClock::default(),
            elapsed: 0.0,
            last_dt: 0.0,
            diagnostics: None,
        })
    }

    /// Seeds both alternating grids and the display grid with the rest
    /// configuration. Does nothing if already initialized.
    pub fn init(&mut self) -> Result<()> {
        if self.store.is_some() {
            return Ok(());
        }
        let rest = Grid::rest(self.config.resolution)?;
        self.store = Some(GridStore::new(rest));
        self.clock.reset();
        self.elapsed = 0.0;
        self.last_dt = 0.0;
        tracing::info!(resolution = self.config.resolution, "cloth initialized");
        Ok(())
    }

    /// Throws the current cloth away and starts over from rest.
    /// Pointer state is kept.
    pub fn reset(&mut self) -> Result<()> {
        self.store = None;
        self.diagnostics = None;
        self.init()
    }

    /// Releases all grids and forgets pointer state.
    pub fn shutdown(&mut self) {
        if self.store.take().is_some() {
            tracing::info!("cloth shut down");
        }
        self.tracker.reset();
        self.clock.reset();
        self.diagnostics = None;
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    /// Runs one tick using `now` (seconds, any epoch) to derive the
    /// elapsed time.
    pub fn tick_at(&mut self, now: f64) -> TickStatus {
        if self.store.is_none() {
            tracing::trace!("tick skipped: cloth not initialized");
            return TickStatus::NotInitialized;
        }
        let dt = self.clock.delta(now);
        self.tick(dt)
    }

    /// Runs one tick that advances the cloth by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickStatus {
        let Some(store) = self.store.as_mut() else {
            tracing::trace!("tick skipped: cloth not initialized");
            return TickStatus::NotInitialized;
        };

        let interaction = self.tracker.snapshot();
        let rejected = {
            let StepBuffers {
                read,
                write,
                display,
            } = store.step_buffers();
            let stats = self.kernel.step(read, display, &interaction, dt, write);
            let guarded = write.restore_invalid_from(read);
            if guarded > 0 {
                tracing::debug!(guarded, "kernel output repaired before present");
            }
            stats.rejected + guarded
        };
        store.present();
        store.advance();
        let step = store.step_count();

        if dt.is_finite() && dt > 0.0 {
            self.elapsed += f64::from(dt);
        }
        self.last_dt = dt;

        if rejected > 0 {
            tracing::warn!(step, rejected, "rejected non-finite cloth points");
        }

        let interval = self.config.diagnostic_interval;
        if interval > 0 && step % interval == 0 {
            let diag = FrameDiagnostics {
                step,
                corners: store.display().corners(),
                interaction,
            };
            tracing::debug!(
                step,
                dt,
                corners = ?diag.corners,
                interaction = ?diag.interaction,
                "cloth diagnostics"
            );
            self.diagnostics = Some(diag);
        }

        TickStatus::Stepped { step, dt, rejected }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> std::result::Result<Vec2, ProjectionError> {
        self.tracker.pointer_down(x, y)
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> std::result::Result<Vec2, ProjectionError> {
        self.tracker.pointer_move(x, y)
    }

    pub fn pointer_up(&mut self) {
        self.tracker.pointer_up();
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.tracker.set_camera(camera);
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        self.tracker.camera()
    }

    #[inline]
    pub fn interaction(&self) -> InteractionState {
        self.tracker.snapshot()
    }

    #[inline]
    pub fn tracker(&self) -> &InteractionTracker {
        &self.tracker
    }

    /// The latest completed grid, if initialized.
    #[inline]
    pub fn display(&self) -> Option<&Grid> {
        self.store.as_ref().map(GridStore::display)
    }

    #[inline]
    pub fn store(&self) -> Option<&GridStore> {
        self.store.as_ref()
    }

    /// Completed steps since the last init; `0` when not initialized.
    pub fn step_count(&self) -> u64 {
        self.store.as_ref().map_or(0, GridStore::step_count)
    }

    /// Simulated seconds since the last init.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }

    #[inline]
    pub fn last_diagnostics(&self) -> Option<&FrameDiagnostics> {
        self.diagnostics.as_ref()
    }

    /// The config this simulation was built with.
    ///
    /// Its `kernel` field keeps the startup values; parameters changed
    /// later through [`Self::kernel_mut`] are only visible on the kernel.
    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    #[inline]
    pub fn kernel_mut(&mut self) -> &mut K {
        &mut self.kernel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{interaction::sim_to_world, kernel::StepStats};
    use glam::Vec3;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn config(resolution: usize) -> SimConfig {
        SimConfig {
            resolution,
            ..SimConfig::default()
        }
    }

    fn sim(resolution: usize) -> ClothSimulation {
        let mut s =
            ClothSimulation::with_config(config(resolution), Camera::demo(VIEWPORT)).unwrap();
        s.init().unwrap();
        s
    }

    fn pixel_for(sim: Vec2) -> Vec2 {
        let world = sim_to_world(sim);
        Vec2::new(400.0 + world.x * 220.0, 300.0 - world.y * 220.0)
    }

    /// Copies its input and remembers what it was handed.
    #[derive(Debug, Default)]
    struct RecordingKernel {
        seen: Vec<(InteractionState, f32)>,
    }

    impl SimulationKernel for RecordingKernel {
        fn step(
            &mut self,
            read: &Grid,
            _previous: &Grid,
            interaction: &InteractionState,
            dt: f32,
            write: &mut Grid,
        ) -> StepStats {
            self.seen.push((*interaction, dt));
            write.copy_from(read);
            StepStats::default()
        }
    }

    /// Breaks every invariant it can.
    #[derive(Debug, Default)]
    struct CorruptingKernel;

    impl SimulationKernel for CorruptingKernel {
        fn step(
            &mut self,
            _read: &Grid,
            _previous: &Grid,
            _interaction: &InteractionState,
            _dt: f32,
            write: &mut Grid,
        ) -> StepStats {
            for p in write.points_mut() {
                p.x = f32::NAN;
                p.y += 1.0;
            }
            StepStats::default()
        }
    }

    fn random_run(seed: u64, steps: usize) -> Vec<Grid> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut s = sim(12);
        let mut frames = Vec::with_capacity(steps);

        for _ in 0..steps {
            if rng.random_bool(0.3) {
                let x = rng.random_range(0.0..VIEWPORT.x);
                let y = rng.random_range(0.0..VIEWPORT.y);
                let _ = s.pointer_move(x, y);
            }
            if rng.random_bool(0.05) {
                let x = rng.random_range(200.0..600.0);
                let y = rng.random_range(100.0..400.0);
                let _ = s.pointer_down(x, y);
            }
            if rng.random_bool(0.05) {
                s.pointer_up();
            }
            let dt = rng.random_range(0.0..0.05);
            s.tick(dt);
            frames.push(s.display().unwrap().clone());
        }
        frames
    }

    #[test]
    fn tick_before_init_is_a_no_op() {
        let mut s = ClothSimulation::with_config(config(4), Camera::demo(VIEWPORT)).unwrap();
        assert!(!s.is_initialized());
        assert_eq!(s.tick(0.016), TickStatus::NotInitialized);
        assert_eq!(s.tick_at(1.0), TickStatus::NotInitialized);
        assert!(s.display().is_none());
        assert_eq!(s.step_count(), 0);

        s.init().unwrap();
        assert!(matches!(s.tick(0.016), TickStatus::Stepped { step: 1, .. }));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = ClothSimulation::with_config(config(0), Camera::demo(VIEWPORT));
        assert!(result.is_err());
    }

    #[test]
    fn init_seeds_display_with_rest_grid() {
        let s = sim(4);
        let display = s.display().unwrap();
        assert_eq!(display, &Grid::rest(4).unwrap());

        let xs = [-0.6, -0.2, 0.2, 0.6];
        for (col, x) in xs.into_iter().enumerate() {
            let p = display.point(0, col);
            assert!((p.x - x).abs() < 1e-6);
            assert_eq!((p.y, p.z, p.w), (0.6, 0.0, 1.0));
            for row in 1..4 {
                let q = display.point(row, col);
                assert!((q.x - x).abs() < 1e-6);
                assert_eq!((q.y, q.z, q.w), (0.4, 0.0, 1.0));
            }
        }
    }

    #[test]
    fn zero_dt_tick_leaves_display_unchanged() {
        let mut s = sim(6);
        let rest = s.display().unwrap().clone();

        let status = s.tick(0.0);

        assert_eq!(
            status,
            TickStatus::Stepped {
                step: 1,
                dt: 0.0,
                rejected: 0
            }
        );
        assert_eq!(s.display().unwrap(), &rest);
        assert_eq!(s.store().unwrap().read_buffer(), &rest);
    }

    #[test]
    fn grab_without_step_does_not_touch_the_grid() {
        let mut s = sim(5);
        let rest = s.display().unwrap().clone();
        let px = pixel_for(Vec2::new(0.1, 0.1));

        let grab = s.pointer_down(px.x, px.y).unwrap();
        assert!((grab - Vec2::new(0.1, 0.1)).length() < 1e-4);
        assert!(s.interaction().dragging);
        assert!(s.interaction().grab_point.is_some());

        s.pointer_up();
        assert!(!s.interaction().dragging);
        assert_eq!(s.interaction().grab_point, None);
        assert_eq!(s.display().unwrap(), &rest);
        assert_eq!(s.step_count(), 0);
    }

    #[test]
    fn kernel_sees_only_the_latest_hover() {
        let mut s = ClothSimulation::new(
            config(3),
            RecordingKernel::default(),
            Camera::demo(VIEWPORT),
        )
        .unwrap();
        s.init().unwrap();
        s.tick(0.01);

        let first = pixel_for(Vec2::new(0.3, 0.3));
        let second = pixel_for(Vec2::new(-0.2, 0.1));
        s.pointer_move(first.x, first.y).unwrap();
        s.pointer_move(second.x, second.y).unwrap();
        s.tick(0.01);

        let seen = &s.kernel().seen;
        assert_eq!(seen.len(), 2);
        let (interaction, dt) = seen[1];
        assert_eq!(dt, 0.01);
        assert!((interaction.hover - Vec2::new(-0.2, 0.1)).length() < 1e-4);
    }

    #[test]
    fn buffers_alternate_every_step() {
        let mut s = sim(5);
        let mut writes = Vec::new();
        let mut reads = Vec::new();

        for _ in 0..9 {
            let store = s.store().unwrap();
            reads.push(store.read_index());
            writes.push(store.write_index());
            s.tick(1.0 / 60.0);

            // the next step reads exactly what was just displayed
            let store = s.store().unwrap();
            assert_eq!(store.read_buffer(), store.display());
        }

        for k in 1..reads.len() {
            assert_eq!(reads[k], writes[k - 1], "step {k}");
            assert_ne!(reads[k], writes[k]);
        }
    }

    #[test]
    fn pinned_row_never_moves() {
        let mut s = sim(10);
        let pinned = s.display().unwrap().row(0).to_vec();
        let grab = pixel_for(Vec2::new(0.0, 0.58));

        for k in 0..120 {
            if k == 10 {
                s.pointer_down(grab.x, grab.y).unwrap();
            }
            if k == 80 {
                s.pointer_up();
            }
            s.tick(1.0 / 60.0);
            assert_eq!(s.display().unwrap().row(0), pinned.as_slice(), "step {k}");
        }
    }

    #[test]
    fn identical_inputs_give_bit_identical_frames() {
        let a = random_run(17, 150);
        let b = random_run(17, 150);
        assert_eq!(a, b);
        // and the cloth actually moved
        assert_ne!(a.first(), a.last());
    }

    #[test]
    fn random_runs_stay_finite_and_pinned() {
        for seed in 0..4 {
            let frames = random_run(seed, 120);
            let pinned = Grid::rest(12).unwrap().row(0).to_vec();
            for (k, frame) in frames.iter().enumerate() {
                assert!(frame.is_finite(), "seed {seed}, step {k}");
                assert_eq!(frame.row(0), pinned.as_slice());
            }
        }
    }

    #[test]
    fn corrupt_kernel_output_never_reaches_display() {
        let mut s =
            ClothSimulation::new(config(4), CorruptingKernel, Camera::demo(VIEWPORT)).unwrap();
        s.init().unwrap();
        let rest = s.display().unwrap().clone();

        let status = s.tick(0.016);

        assert_eq!(
            status,
            TickStatus::Stepped {
                step: 1,
                dt: 0.016,
                rejected: 12
            }
        );
        assert_eq!(s.display().unwrap(), &rest);
    }

    #[test]
    fn degenerate_pointer_rays_keep_the_cloth_finite() {
        let mut s = sim(6);
        let px = pixel_for(Vec2::new(0.0, 0.2));
        s.pointer_move(px.x, px.y).unwrap();
        let before = s.interaction();

        s.set_camera(Camera::orthographic(
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::ZERO,
            220.0,
            VIEWPORT,
        ));
        assert!(s.pointer_down(100.0, 100.0).is_err());
        assert!(s.pointer_move(120.0, 90.0).is_err());
        assert_eq!(s.interaction(), before);

        for _ in 0..30 {
            s.tick(1.0 / 60.0);
            assert!(s.display().unwrap().is_finite());
        }
    }

    #[test]
    fn default_cloth_hangs_straight_after_a_few_seconds() {
        let mut s = sim(10);
        for _ in 0..300 {
            s.tick(1.0 / 60.0);
        }

        let grid = s.display().unwrap();
        let spacing = grid.rest_spacing();
        for col in 0..10 {
            let ys: Vec<f32> = (0..10).map(|row| grid.point(row, col).y).collect();
            assert!(ys.windows(2).all(|w| w[1] < w[0]), "col {col}: {ys:?}");
            for row in 1..10 {
                let link = (grid.point(row, col) - grid.point(row - 1, col)).truncate().length();
                assert!((link - spacing).abs() < 0.02 * spacing, "col {col}: {link}");
            }
        }
    }

    #[test]
    fn config_keeps_startup_values_while_kernel_is_tuned() {
        let mut s = sim(4);
        s.kernel_mut().config_mut().iterations = 3;

        assert_eq!(s.kernel().config().iterations, 3);
        assert_eq!(s.config().kernel, SimConfig::default().kernel);
    }

    #[test]
    fn diagnostics_are_captured_on_interval() {
        let mut s = sim(4);
        for _ in 0..59 {
            s.tick(0.0);
        }
        assert!(s.last_diagnostics().is_none());

        s.tick(0.0);
        let diag = s.last_diagnostics().copied().unwrap();
        assert_eq!(diag.step, 60);
        assert_eq!(diag.corners, Grid::rest(4).unwrap().corners());
        assert_eq!(diag.interaction, InteractionState::default());
    }

    #[test]
    fn tick_at_derives_dt_from_timestamps() {
        let mut s = ClothSimulation::new(
            config(3),
            RecordingKernel::default(),
            Camera::demo(VIEWPORT),
        )
        .unwrap();
        s.init().unwrap();

        s.tick_at(10.0);
        s.tick_at(10.5);
        s.tick_at(10.25);

        let dts: Vec<f32> = s.kernel().seen.iter().map(|&(_, dt)| dt).collect();
        assert_eq!(dts, vec![0.0, 0.5, 0.0]);
        assert_eq!(s.elapsed(), 0.5);
    }

    #[test]
    fn frame_clock_ignores_bad_timestamps() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.delta(1.0), 0.0);
        assert_eq!(clock.delta(f64::NAN), 0.0);
        assert_eq!(clock.delta(1.25), 0.25);
        clock.reset();
        assert_eq!(clock.delta(5.0), 0.0);
    }

    #[test]
    fn reset_and_shutdown_follow_the_lifecycle() {
        let mut s = sim(4);
        let px = pixel_for(Vec2::new(0.1, 0.2));
        s.pointer_down(px.x, px.y).unwrap();
        for _ in 0..5 {
            s.tick(1.0 / 60.0);
        }
        assert_eq!(s.step_count(), 5);

        s.reset().unwrap();
        assert_eq!(s.step_count(), 0);
        assert_eq!(s.display().unwrap(), &Grid::rest(4).unwrap());
        assert!(s.interaction().dragging);

        s.shutdown();
        assert!(!s.is_initialized());
        assert_eq!(s.interaction(), InteractionState::default());
        assert_eq!(s.tick(0.016), TickStatus::NotInitialized);

        s.init().unwrap();
        assert!(s.is_initialized());
    }
}
