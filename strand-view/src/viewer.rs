//! Interactive preview of the strand mesh built with eframe/egui.
//!
//! [`Viewer`] owns a skeleton, the pipeline configuration and the output of
//! the last run, and draws the result with a simple orthographic orbit
//! camera: wireframe triangles, strand polylines and the skeleton itself.

use std::time::Instant;

use eframe::App;
use glam::{Quat, Vec3};
use log::{info, warn};
use strand_core::{
    config::Config,
    graph::PlantGraph,
    pipeline::{PipelineOutput, StrandPipeline, demo_graph},
};

/// Main application state for the preview.
///
/// ### Fields
/// - `graph` - Skeleton being meshed.
/// - `cfg` - Pipeline parameters edited in the side panel.
/// - `seed` - Placement seed of the next rebuild.
/// - `output` - Result of the last successful run.
/// - `error` - Message of the last rejected configuration.
///
/// - `yaw`, `pitch` - Orbit camera angles in radians.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space pan offset in pixels.
/// - `target` - World point the camera orbits around.
pub struct Viewer {
    graph: PlantGraph,
    cfg: Config,
    seed: u64,
    output: Option<PipelineOutput>,
    error: Option<String>,

    yaw: f32,
    pitch: f32,
    zoom: f32,
    pan: egui::Vec2,
    target: Vec3,

    show_mesh: bool,
    show_strands: bool,
    show_skeleton: bool,

    last_build_ms: f64,
}

impl Viewer {
    /// Creates a viewer on the demo skeleton with a random seed and runs
    /// the pipeline once.
    pub fn new() -> Self {
        let mut viewer = Self {
            graph: demo_graph(),
            cfg: Config::default(),
            seed: rand::random(),
            output: None,
            error: None,
            yaw: 0.6,
            pitch: 0.25,
            zoom: 120.0,
            pan: egui::vec2(0.0, 0.0),
            target: Vec3::new(0.3, 2.4, 0.0),
            show_mesh: true,
            show_strands: false,
            show_skeleton: true,
            last_build_ms: 0.0,
        };
        viewer.rebuild();
        viewer
    }

    /// Runs the pipeline with the current configuration and seed.
    ///
    /// An invalid configuration keeps the previous output on screen and
    /// stores the error message for the status bar.
    fn rebuild(&mut self) {
        let cfg = Config {
            seed: Some(self.seed),
            ..self.cfg
        };

        match StrandPipeline::new(&self.graph, cfg) {
            Ok(pipeline) => {
                let start = Instant::now();
                let out = pipeline.run();
                self.last_build_ms = start.elapsed().as_secs_f64() * 1000.0;
                info!(
                    "rebuilt mesh in {:.1} ms ({} diagnostics)",
                    self.last_build_ms,
                    out.diagnostics.len()
                );
                for d in &out.diagnostics {
                    warn!("{d}");
                }
                self.output = Some(out);
                self.error = None;
            }
            Err(e) => {
                warn!("rejected configuration: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Draws a new seed and rebuilds.
    fn reseed(&mut self) {
        self.seed = rand::random();
        self.rebuild();
    }

    /// Camera rotation: yaw about world Y, then pitch about the view X axis.
    fn rotation(&self) -> Quat {
        Quat::from_rotation_x(self.pitch) * Quat::from_rotation_y(self.yaw)
    }

    /// Projects a world-space point onto the screen.
    ///
    /// The point is rotated about `target` into view space and dropped onto
    /// the view plane. The y-axis is flipped so that world up stays up.
    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        let v = self.rotation() * (p - self.target);
        let center = rect.center();
        egui::pos2(
            center.x + v.x * self.zoom + self.pan.x,
            center.y - v.y * self.zoom + self.pan.y,
        )
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed))
                .changed()
        })
        .inner
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed))
                .changed()
        })
        .inner
    }

    /// Builds the top panel (rebuild controls, layer toggles, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Rebuild").clicked() {
                    self.rebuild();
                }
                if ui.button("Reseed").clicked() {
                    self.reseed();
                }

                ui.separator();
                ui.checkbox(&mut self.show_mesh, "Mesh");
                ui.checkbox(&mut self.show_strands, "Strands");
                ui.checkbox(&mut self.show_skeleton, "Skeleton");

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 10.0..=600.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (mesh size, seed, build time).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("build = {:.1} ms", self.last_build_ms));
                ui.label(format!("seed = {}", self.seed));
                ui.separator();
                if let Some(out) = &self.output {
                    ui.label(format!("diagnostics = {}", out.diagnostics.len()));
                    ui.label(format!("triangles = {}", out.mesh.triangle_count()));
                    ui.label(format!("vertices = {}", out.mesh.vertex_count()));
                    ui.label(format!("strands = {}", out.strands.len()));
                }
                if let Some(err) = &self.error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
        });
    }

    /// Builds the right-hand panel for pipeline parameters. Any edit
    /// triggers a rebuild with the current seed.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");
                let mut changed = false;

                ui.separator();
                ui.label("Placement");
                changed |= Self::labeled_drag_usize(
                    ui,
                    "strands_per_leaf:",
                    &mut self.cfg.strands_per_leaf,
                    1..=60,
                    1.0,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "particle_radius:",
                    &mut self.cfg.particle_radius,
                    0.001..=0.1,
                    0.001,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "leaf_profile_radius:",
                    &mut self.cfg.leaf_profile_radius,
                    0.01..=1.0,
                    0.005,
                );

                ui.separator();
                ui.label("Packing");
                changed |= Self::labeled_drag_f32(
                    ui,
                    "node_profile_radius:",
                    &mut self.cfg.node_profile_radius,
                    0.01..=1.0,
                    0.005,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "packing_density:",
                    &mut self.cfg.packing_density,
                    0.1..=1.0,
                    0.01,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "attraction_gain:",
                    &mut self.cfg.attraction_gain,
                    0.0..=1000.0,
                    1.0,
                );
                changed |= Self::labeled_drag_f32(
                    ui,
                    "damping:",
                    &mut self.cfg.damping,
                    0.0..=0.99,
                    0.005,
                );
                changed |= Self::labeled_drag_usize(
                    ui,
                    "solver_passes:",
                    &mut self.cfg.solver_passes,
                    1..=100,
                    1.0,
                );
                changed |= Self::labeled_drag_usize(
                    ui,
                    "iterations_per_strand:",
                    &mut self.cfg.iterations_per_strand,
                    0..=50,
                    1.0,
                );

                ui.separator();
                ui.label("Sections");
                changed |= Self::labeled_drag_usize(
                    ui,
                    "spline_steps:",
                    &mut self.cfg.spline_steps,
                    1..=32,
                    1.0,
                );
                changed |= ui
                    .checkbox(&mut self.cfg.compute_normals, "compute_normals")
                    .changed();

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config::default();
                    changed = true;
                }

                if changed {
                    self.rebuild();
                }
            });
    }

    /// Builds the central panel where the mesh is drawn and the camera is
    /// controlled.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Orbit with the primary button, pan with the secondary one.
            if response.dragged_by(egui::PointerButton::Primary) {
                let delta = response.drag_delta();
                self.yaw += delta.x * 0.01;
                self.pitch = (self.pitch + delta.y * 0.01).clamp(-1.5, 1.5);
            } else if response.dragged_by(egui::PointerButton::Secondary) {
                self.pan += response.drag_delta();
            }

            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 && response.hovered() {
                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(10.0, 600.0);
            }

            let Some(out) = &self.output else {
                return;
            };

            if self.show_mesh {
                let stroke = egui::Stroke::new(0.5, egui::Color32::from_gray(170));
                let screen: Vec<egui::Pos2> = out
                    .mesh
                    .positions
                    .iter()
                    .map(|&p| self.world_to_screen(p, rect))
                    .collect();
                for &[a, b, c] in &out.mesh.indices {
                    let [a, b, c] = [a, b, c].map(|i| screen[i as usize]);
                    painter.line_segment([a, b], stroke);
                    painter.line_segment([b, c], stroke);
                    painter.line_segment([c, a], stroke);
                }
            }

            if self.show_strands {
                let stroke = egui::Stroke::new(1.0, egui::Color32::LIGHT_GREEN);
                for line in &out.polylines {
                    let points: Vec<egui::Pos2> =
                        line.iter().map(|&p| self.world_to_screen(p, rect)).collect();
                    painter.add(egui::Shape::line(points, stroke));
                }
            }

            if self.show_skeleton {
                let stroke = egui::Stroke::new(2.0, egui::Color32::from_rgb(200, 140, 60));
                for (parent, child) in self.graph.edges() {
                    let a = self.world_to_screen(self.graph.node(parent).pos, rect);
                    let b = self.world_to_screen(self.graph.node(child).pos, rect);
                    painter.line_segment([a, b], stroke);
                }
                for node in self.graph.nodes() {
                    let p = self.world_to_screen(node.pos, rect);
                    painter.circle_filled(p, 3.0, egui::Color32::LIGHT_BLUE);
                }
            }
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
