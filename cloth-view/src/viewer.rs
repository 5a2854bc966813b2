//! Interactive cloth viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`ClothSimulation`] and
//! implements [`eframe::App`] to drive it with pointer input, render its
//! display grid and expose the kernel parameters through an egui UI.

use crate::render::{ClothMesh, grid_point_to_world};
use cloth_core::{
    camera::Camera,
    config::{KernelConfig, SimConfig},
    error::ClothError,
    interaction::sim_to_world,
    sim::{ClothSimulation, TickStatus},
};
use eframe::App;
use glam::Vec2;

/// Fixed time step used by the "Step" button.
const MANUAL_DT: f32 = 1.0 / 60.0;

/// Pointer state sampled from egui once per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerInput {
    pub pos: Option<egui::Pos2>,
    pub moved: bool,
    pub pressed: bool,
    pub released: bool,
}

impl PointerInput {
    fn from_ctx(ctx: &egui::Context) -> Self {
        ctx.input(|i| Self {
            pos: i.pointer.latest_pos(),
            moved: i.pointer.delta() != egui::Vec2::ZERO,
            pressed: i.pointer.primary_pressed(),
            released: i.pointer.primary_released(),
        })
    }
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Match the camera to the size of the central panel.
/// 2. Forward pointer input to the simulation's interaction tracker.
/// 3. If `running`, tick the simulation with the egui clock.
/// 4. Paint the display grid plus hover/grab markers.
///
/// ### Fields
/// - `sim` - The cloth simulation, including its interaction tracker.
/// - `mesh` - Triangle topology and scratch space for painting.
/// - `running` - Whether the simulation advances every frame.
/// - `viewport` - Size of the drawing area in device pixels.
/// - `last_status` - Outcome of the most recent tick (for the status bar).
pub struct Viewer {
    sim: ClothSimulation,
    mesh: ClothMesh,
    running: bool,
    viewport: Vec2,
    last_status: TickStatus,
}

impl Viewer {
    /// Creates a viewer with an initialized cloth at rest.
    ///
    /// ### Errors
    /// Returns an error if `cfg` is invalid.
    pub fn new(cfg: SimConfig) -> Result<Self, ClothError> {
        let viewport = Vec2::new(800.0, 600.0);
        let mut sim = ClothSimulation::with_config(cfg, Camera::demo(viewport))?;
        sim.init()?;

        Ok(Self {
            sim,
            mesh: ClothMesh::new(cfg.resolution),
            running: true,
            viewport,
            last_status: TickStatus::NotInitialized,
        })
    }

    /// Puts the cloth back to rest and pauses. Kernel parameters are kept.
    fn reset(&mut self) {
        if let Err(err) = self.sim.reset() {
            tracing::error!(%err, "cloth reset failed");
        }
        self.last_status = TickStatus::NotInitialized;
        self.running = false;
    }

    /// Advances the simulation by one fixed step.
    fn step_once(&mut self) {
        self.last_status = self.sim.tick(MANUAL_DT);
    }

    /// Rebuilds the camera when the drawing area changes size.
    fn fit_camera(&mut self, viewport: Vec2) {
        if viewport != self.viewport && viewport.x > 0.0 && viewport.y > 0.0 {
            self.viewport = viewport;
            self.sim.set_camera(Camera::demo(viewport));
        }
    }

    /// Forwards one frame of pointer input to the simulation.
    ///
    /// Positions are converted to device pixels relative to `rect`. A press
    /// only starts a grab when it lands inside `rect`; a release always ends
    /// it. Samples the tracker cannot project are dropped there.
    fn apply_pointer(&mut self, input: PointerInput, rect: egui::Rect, pixels_per_point: f32) {
        let to_px = |p: egui::Pos2| (p - rect.min) * pixels_per_point;

        if let Some(pos) = input.pos {
            let px = to_px(pos);
            if input.moved || input.pressed {
                let _ = self.sim.pointer_move(px.x, px.y);
            }
            if input.pressed && rect.contains(pos) {
                let _ = self.sim.pointer_down(px.x, px.y);
            }
        }

        if input.released {
            self.sim.pointer_up();
        }
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `u32` [`egui::DragValue`].
    fn labeled_drag_u32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut u32,
        range: std::ops::RangeInclusive<u32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, reset).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }
            });
        });
    }

    /// Builds the bottom status bar (step, timing, pointer state).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        let interaction = self.sim.interaction();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.4} s", self.sim.last_dt()));
                ui.label(format!("t = {:.2} s", self.sim.elapsed()));
                ui.label(format!("step = {}", self.sim.step_count()));
                ui.separator();
                if let TickStatus::Stepped { rejected, .. } = self.last_status
                    && rejected > 0
                {
                    ui.colored_label(egui::Color32::RED, format!("rejected = {rejected}"));
                }
                ui.label(format!(
                    "hover = ({:.3}, {:.3})",
                    interaction.hover.x, interaction.hover.y
                ));
                match interaction.active_grab() {
                    Some(g) => ui.label(format!("grab = ({:.3}, {:.3})", g.x, g.y)),
                    None => ui.label("idle"),
                };
            });
        });
    }

    /// Builds the right-hand panel for kernel parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");
                let cfg = self.sim.kernel_mut().config_mut();

                ui.separator();
                ui.label("Forces");
                Self::labeled_drag_f32(ui, "gravity.y:", &mut cfg.gravity.y, -30.0..=0.0, 0.1);

                ui.separator();
                ui.label("Constraints");
                Self::labeled_drag_u32(ui, "iterations:", &mut cfg.iterations, 0..=128, 1.0);
                Self::labeled_drag_f32(ui, "stiffness:", &mut cfg.stiffness, 0.0..=1.0, 0.01);
                Self::labeled_drag_f32(ui, "relaxation:", &mut cfg.relaxation, 0.1..=1.9, 0.01);
                ui.checkbox(&mut cfg.shear, "shear diagonals");
                ui.checkbox(&mut cfg.tethers, "pin tethers");

                ui.separator();
                ui.label("Grab");
                Self::labeled_drag_f32(ui, "radius:", &mut cfg.grab_radius, 0.0..=1.0, 0.005);
                Self::labeled_drag_f32(ui, "strength:", &mut cfg.grab_strength, 0.0..=1.0, 0.01);

                ui.separator();
                ui.label("Timing");
                Self::labeled_drag_f32(ui, "max_dt:", &mut cfg.max_dt, 0.001..=0.1, 0.001);

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    *cfg = KernelConfig::default();
                }
            });
    }

    /// Draws a ring at the hover position and a dot at the grab point.
    fn ui_pointer_markers(&self, painter: &egui::Painter, rect: egui::Rect, pixels_per_point: f32) {
        let camera = self.sim.camera();
        let to_screen = |sim: Vec2| {
            camera
                .world_to_screen(sim_to_world(sim))
                .map(|(px, _)| rect.min + egui::vec2(px.x, px.y) / pixels_per_point)
        };

        let interaction = self.sim.interaction();
        if let Some(p) = to_screen(interaction.hover) {
            painter.circle_stroke(p, 6.0, egui::Stroke::new(1.5, egui::Color32::YELLOW));
        }
        if let Some(p) = interaction.active_grab().and_then(to_screen) {
            painter.circle_filled(p, 4.0, egui::Color32::RED);
        }
    }

    /// Builds the central panel where the cloth is drawn and grabbed.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::from_rgb(204, 231, 255)))
            .show(ctx, |ui| {
                let response =
                    ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
                let rect = response.rect;
                let painter = ui.painter_at(rect);
                let ppp = ctx.pixels_per_point();

                self.fit_camera(Vec2::new(rect.width(), rect.height()) * ppp);
                self.apply_pointer(PointerInput::from_ctx(ctx), rect, ppp);

                if self.running {
                    let now = ctx.input(|i| i.time);
                    self.last_status = self.sim.tick_at(now);
                    ctx.request_repaint();
                }

                if let Some(grid) = self.sim.display() {
                    let mesh = self.mesh.build(grid, self.sim.camera(), rect, ppp);
                    painter.add(egui::Shape::mesh(mesh));

                    // pinned corners
                    let camera = self.sim.camera();
                    for corner in &grid.corners()[..2] {
                        let world = grid_point_to_world(*corner);
                        if let Some((px, _)) = camera.world_to_screen(world) {
                            let p = rect.min + egui::vec2(px.x, px.y) / ppp;
                            painter.circle_filled(p, 3.0, egui::Color32::DARK_GRAY);
                        }
                    }
                }

                self.ui_pointer_markers(&painter, rect, ppp);
            });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.sim.shutdown();
    }
}
