//! Paints the display grid as a shaded, double-sided surface.
//!
//! egui has no depth buffer, so triangles are sorted back to front every
//! frame before being emitted as a single [`egui::Mesh`].

use cloth_core::{
    camera::Camera,
    grid::Grid,
    interaction::sim_to_world,
    types::{GridPoint, SIM_SCALE},
};
use glam::{Vec2, Vec3};

const LIGHT_DIR: Vec3 = Vec3::new(0.4082483, 0.4082483, 0.8164966);
const SHADOW_RGB: [f32; 3] = [46.0, 74.0, 120.0];
const LIT_RGB: [f32; 3] = [150.0, 190.0, 245.0];

/// Maps a simulated point into the world frame the camera looks at.
pub fn grid_point_to_world(p: GridPoint) -> Vec3 {
    sim_to_world(Vec2::new(p.x, p.y)) + Vec3::Z * (p.z / SIM_SCALE)
}

/// Lambert-style shade for a triangle, lit from both sides.
pub fn shade(a: Vec3, b: Vec3, c: Vec3) -> egui::Color32 {
    let normal = (b - a).cross(c - a).normalize_or_zero();
    let t = 0.25 + 0.75 * normal.dot(LIGHT_DIR).abs();
    let mix = |i: usize| (SHADOW_RGB[i] + (LIT_RGB[i] - SHADOW_RGB[i]) * t).round() as u8;
    egui::Color32::from_rgb(mix(0), mix(1), mix(2))
}

struct Projected {
    screen: egui::Pos2,
    world: Vec3,
    depth: f32,
}

/// Persistent triangle topology plus per-frame scratch space.
pub struct ClothMesh {
    resolution: usize,
    triangles: Vec<[u32; 3]>,
    projected: Vec<Option<Projected>>,
    order: Vec<(f32, usize)>,
}

impl ClothMesh {
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            triangles: grid_triangles(resolution),
            projected: Vec::new(),
            order: Vec::new(),
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn ensure_resolution(&mut self, resolution: usize) {
        if self.resolution != resolution {
            self.resolution = resolution;
            self.triangles = grid_triangles(resolution);
        }
    }

    /// Builds the shaded surface for `grid` as seen through `camera`.
    ///
    /// ### Parameters
    /// - `grid` - The display grid.
    /// - `camera` - Camera whose viewport is in device pixels.
    /// - `rect` - Screen rectangle the viewport maps onto.
    /// - `pixels_per_point` - egui scale factor.
    pub fn build(
        &mut self,
        grid: &Grid,
        camera: &Camera,
        rect: egui::Rect,
        pixels_per_point: f32,
    ) -> egui::Mesh {
        self.ensure_resolution(grid.resolution());

        self.projected.clear();
        self.projected.extend(grid.points().iter().map(|&p| {
            let world = grid_point_to_world(p);
            camera.world_to_screen(world).map(|(px, depth)| Projected {
                screen: rect.min + egui::vec2(px.x, px.y) / pixels_per_point,
                world,
                depth,
            })
        }));

        self.order.clear();
        for (i, tri) in self.triangles.iter().enumerate() {
            let depth = tri
                .iter()
                .map(|&v| self.projected[v as usize].as_ref().map(|p| p.depth))
                .sum::<Option<f32>>();
            if let Some(depth) = depth {
                self.order.push((depth, i));
            }
        }
        // farthest first
        self.order.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut mesh = egui::Mesh::default();
        for &(_, i) in &self.order {
            let [a, b, c] = self.triangles[i].map(|v| self.projected[v as usize].as_ref());
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                continue;
            };
            let color = shade(a.world, b.world, c.world);
            let base = mesh.vertices.len() as u32;
            for p in [a, b, c] {
                mesh.colored_vertex(p.screen, color);
            }
            mesh.add_triangle(base, base + 1, base + 2);
        }
        mesh
    }
}

/// Two triangles per grid cell, indexing row-major points.
pub fn grid_triangles(n: usize) -> Vec<[u32; 3]> {
    if n < 2 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(2 * (n - 1) * (n - 1));
    let idx = |row: usize, col: usize| (row * n + col) as u32;
    for row in 0..n - 1 {
        for col in 0..n - 1 {
            let (a, b) = (idx(row, col), idx(row, col + 1));
            let (c, d) = (idx(row + 1, col), idx(row + 1, col + 1));
            out.push([a, c, b]);
            out.push([b, c, d]);
        }
    }
    out
}
