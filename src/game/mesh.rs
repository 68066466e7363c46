//! Boundary ring tessellation for the active capture zone
//!
//! The ring is two stacked triangle strips following the zone outline plus
//! a translucent floor quad. Strip positions are cached and only rebuilt
//! when the segment count or the shape changes; colors and UVs are rebuilt
//! on every call because they carry the scroll animation and the distance
//! fade.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3, Vec4};
use tracing::trace;

use super::host::RenderSink;
use super::volume::{ZoneShape, ZoneVolume};

pub const MIN_SEGMENTS: usize = 4;
pub const MAX_SEGMENTS: usize = 64;
/// Target outline length covered by one segment
pub const SEGMENT_LENGTH: f32 = 2.0;

/// Scroll phase advance per tick
pub const SCROLL_SPEED: f32 = 0.007;
/// UV margins that keep sampling off the texture's transparent border
pub const UV_TRIM_U: f32 = 0.0;
pub const UV_TRIM_V: f32 = 0.25;
/// Horizontal UV shear between the two vertices of a step
pub const UV_SKEW: f32 = 0.3;

/// Half thickness of each strip along the zone's up axis
pub const STRIP_HALF_HEIGHT: f32 = 1.0;
/// Distance between the lower and upper ring
pub const RING_SPACING: f32 = 2.0;
/// Floor quad sits this far below the ring
pub const FLOOR_DROP: f32 = 1.0;

const LOWER_RING_ALPHA: [u32; 2] = [0x10, 0x50];
const UPPER_RING_ALPHA: [u32; 2] = [0x10, 0x30];
pub const FLOOR_ALPHA: u32 = 0x30;

const FLOOR_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
];

/// Packed color: alpha in the top byte, RGB below
pub fn with_alpha(rgb: u32, alpha: u32) -> u32 {
    (alpha.min(0xFF) << 24) | (rgb & 0x00FF_FFFF)
}

/// Opacity falloff by viewer distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSettings {
    /// Fully opaque up to this distance
    pub start: f32,
    /// Distance over which opacity drops to zero
    pub range: f32,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            start: 52.0,
            range: 12.0,
        }
    }
}

impl FadeSettings {
    pub fn factor(&self, distance: f32) -> f32 {
        if !distance.is_finite() {
            return 0.0;
        }
        if distance <= self.start {
            return 1.0;
        }
        if self.range <= 0.0 {
            return 0.0;
        }
        1.0 - ((distance - self.start) / self.range).clamp(0.0, 1.0)
    }
}

/// Texture scroll animation phase in `[0, 1)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollPhase(f32);

impl ScrollPhase {
    pub fn value(self) -> f32 {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 += SCROLL_SPEED;
        if self.0 >= 1.0 {
            self.0 -= 1.0;
        }
    }
}

/// Per-call shading inputs
#[derive(Debug, Clone, Copy)]
pub struct Shading {
    pub color: u32,
    pub scroll: f32,
    pub viewer: Option<Vec3>,
    pub fade: FadeSettings,
}

impl Shading {
    pub fn new(color: u32, scroll: f32) -> Self {
        Self {
            color,
            scroll,
            viewer: None,
            fade: FadeSettings::default(),
        }
    }

    pub fn with_viewer(mut self, viewer: Vec3) -> Self {
        self.viewer = Some(viewer);
        self
    }
}

/// One triangle strip of the ring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingStrip {
    pub positions: Vec<Vec3>,
    pub colors: Vec<u32>,
    pub uvs: Vec<Vec2>,
}

impl RingStrip {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Floor tint under the ring
#[derive(Debug, Clone, PartialEq)]
pub struct FloorQuad {
    pub shape: ZoneShape,
    pub points: [Vec3; 4],
    pub colors: [u32; 4],
    pub uvs: [Vec2; 4],
}

impl Default for FloorQuad {
    fn default() -> Self {
        Self {
            shape: ZoneShape::Cylinder,
            points: [Vec3::ZERO; 4],
            colors: [0; 4],
            uvs: FLOOR_UVS,
        }
    }
}

/// Rotate `v` about `axis` by `angle` (Rodrigues), keeping `v.w`
pub fn rotate_about_axis(v: Vec4, axis: Vec3, angle: f32) -> Vec4 {
    let k = axis.normalize_or_zero();
    let vec = v.truncate();
    let (sin, cos) = angle.sin_cos();
    let rotated = vec * cos + k.cross(vec) * sin + k * k.dot(vec) * (1.0 - cos);
    rotated.extend(v.w)
}

/// Ring segment count for a volume's outline
pub fn segment_count(volume: &ZoneVolume) -> usize {
    let outline = match volume.shape {
        ZoneShape::Cylinder => TAU * volume.radius(),
        ZoneShape::Box => (volume.width_axis().length() + volume.depth_axis().length()) * 2.0,
    };
    ((outline / SEGMENT_LENGTH) as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

/// Split `segments` over the four box edges by edge length.
///
/// Edges 0 and 2 run along the width, 1 and 3 along the depth. The rounding
/// remainder lands on edge 0, so the result always sums to `segments`.
pub fn distribute_box_segments(width: f32, depth: f32, segments: usize) -> [usize; 4] {
    let perimeter = (width + depth) * 2.0;
    if !perimeter.is_finite() || perimeter <= 0.0 {
        return [segments, 0, 0, 0];
    }

    let along_width = (((width / perimeter) * segments as f32) as usize).min(segments / 2);
    let along_depth =
        (((depth / perimeter) * segments as f32) as usize).min((segments - 2 * along_width) / 2);

    let mut edges = [along_width, along_depth, along_width, along_depth];
    let assigned: usize = edges.iter().sum();
    edges[0] += segments - assigned;
    edges
}

/// Point for outline step `step` along the box edges
fn box_outline_point(corners: &[Vec3; 4], per_edge: &[usize; 4], step: usize) -> Vec3 {
    let mut start = 0;
    for (edge, &count) in per_edge.iter().enumerate() {
        if count > 0 && step < start + count {
            let t = (step - start) as f32 / count as f32;
            return corners[edge].lerp(corners[(edge + 1) % 4], t);
        }
        start += count;
    }

    // Closing step: end of the last edge that carries segments
    let last = per_edge.iter().rposition(|&count| count > 0).unwrap_or(3);
    corners[(last + 1) % 4]
}

fn outline_corners(center: Vec3, half_x: Vec3, half_z: Vec3) -> [Vec3; 4] {
    [
        center - half_x - half_z,
        center + half_x - half_z,
        center + half_x + half_z,
        center - half_x + half_z,
    ]
}

/// Cached ring + floor geometry for one zone
#[derive(Debug, Clone, Default)]
pub struct BoundaryMesh {
    cache_key: Option<(usize, ZoneShape)>,
    rings: [RingStrip; 2],
    floor: FloorQuad,
    rebuilds: u64,
}

impl BoundaryMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the next build to regenerate positions
    pub fn invalidate(&mut self) {
        self.cache_key = None;
    }

    /// Segment count of the cached positions
    pub fn segments(&self) -> Option<usize> {
        self.cache_key.map(|(segments, _)| segments)
    }

    /// How many times positions have been generated
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Lower and upper ring
    pub fn rings(&self) -> &[RingStrip; 2] {
        &self.rings
    }

    pub fn floor(&self) -> &FloorQuad {
        &self.floor
    }

    /// Update geometry for `volume`. Returns false and leaves the buffers
    /// alone when the volume is degenerate.
    pub fn build(&mut self, volume: &ZoneVolume, shading: &Shading) -> bool {
        if !volume.is_valid() {
            return false;
        }

        let segments = segment_count(volume);
        let key = (segments, volume.shape);
        if self.cache_key != Some(key) {
            self.generate_positions(volume, segments);
            self.cache_key = Some(key);
            self.rebuilds += 1;
            trace!(segments, shape = ?volume.shape, "Regenerated hill ring");
        }

        let fade = shading
            .viewer
            .map(|viewer| shading.fade.factor(viewer.distance(volume.center)))
            .unwrap_or(1.0);
        self.shade(segments, shading.color, shading.scroll, fade);
        true
    }

    /// Hand the strips and the floor quad to the renderer
    pub fn submit<R: RenderSink + ?Sized>(&self, sink: &mut R) {
        if self.cache_key.is_none() {
            return;
        }
        for ring in &self.rings {
            sink.submit_strip(ring);
        }
        sink.submit_quad(&self.floor);
    }

    fn generate_positions(&mut self, volume: &ZoneVolume, segments: usize) {
        let rotation = volume.rotation_matrix();
        let center = volume.center;
        let half_x = rotation * volume.width_axis() * 0.5;
        let half_z = rotation * volume.depth_axis() * 0.5;
        let up = (rotation * volume.height_axis()).normalize_or_zero();

        for ring in &mut self.rings {
            ring.positions.clear();
            ring.positions.reserve((segments + 1) * 2);
        }

        match volume.shape {
            ZoneShape::Cylinder => {
                let step = TAU / segments as f32;
                let mut radius = half_x.extend(0.0);
                for _ in 0..=segments {
                    let arm = radius.truncate();
                    let offset = up.cross(arm).normalize_or_zero();
                    self.push_step(center + arm, offset, up);
                    radius = rotate_about_axis(radius, up, step);
                }
            }
            ZoneShape::Box => {
                let corners = outline_corners(center, half_x, half_z);
                let per_edge = distribute_box_segments(
                    volume.width_axis().length(),
                    volume.depth_axis().length(),
                    segments,
                );
                for step in 0..=segments {
                    let point = box_outline_point(&corners, &per_edge, step);
                    self.push_step(point, Vec3::ZERO, up);
                }
            }
        }

        let floor_half_z = match volume.shape {
            ZoneShape::Cylinder => half_z.normalize_or_zero() * volume.radius(),
            ZoneShape::Box => half_z,
        };
        let drop = rotation * (Vec3::NEG_Z * FLOOR_DROP);
        let corners = outline_corners(center, half_x, floor_half_z);
        self.floor.shape = volume.shape;
        self.floor.points = [corners[1], corners[0], corners[2], corners[3]].map(|c| c + drop);
    }

    fn push_step(&mut self, point: Vec3, offset: Vec3, up: Vec3) {
        let lower = point + offset;
        let upper = lower + up * RING_SPACING;
        let half = up * STRIP_HALF_HEIGHT;

        self.rings[0].positions.extend([lower - half, lower + half]);
        self.rings[1].positions.extend([upper + half, upper - half]);
    }

    fn shade(&mut self, segments: usize, color: u32, scroll: f32, fade: f32) {
        let alpha = |base: u32| with_alpha(color, (base as f32 * fade).round() as u32);
        let lower = LOWER_RING_ALPHA.map(alpha);
        let upper = UPPER_RING_ALPHA.map(alpha);

        let u_range = 1.0 - 2.0 * UV_TRIM_U;
        let v_range = 1.0 - 2.0 * UV_TRIM_V;
        let u = UV_TRIM_U + (scroll - scroll.floor()) * u_range;

        for ring in &mut self.rings {
            ring.colors.clear();
            ring.uvs.clear();
        }

        for step in 0..=segments {
            let along = step as f32 / SEGMENT_LENGTH;
            let v = UV_TRIM_V + (along - along.floor()) * v_range;

            self.rings[0].colors.extend(lower);
            self.rings[1].colors.extend(upper);
            self.rings[0]
                .uvs
                .extend([Vec2::new(u, v), Vec2::new(u - UV_SKEW, v)]);
            self.rings[1]
                .uvs
                .extend([Vec2::new(u, v), Vec2::new(u + UV_SKEW, v)]);
        }

        self.floor.colors = [alpha(FLOOR_ALPHA); 4];
        self.floor.uvs = FLOOR_UVS;
    }
}
