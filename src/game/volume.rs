//! Capture zone volumes and the point-in-zone test

use glam::{Mat3, Vec3};
use serde::Serialize;

/// Axes shorter than this make a volume degenerate
pub const AXIS_EPSILON: f32 = 1e-4;

/// Zone footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneShape {
    Box,
    Cylinder,
}

/// Vertical extent accepted around a zone's floor.
///
/// Players slightly below the floor or mid-jump above the zone still count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabTolerance {
    pub below: f32,
    pub above: f32,
}

impl Default for SlabTolerance {
    fn default() -> Self {
        Self {
            below: 1.25,
            above: 6.0,
        }
    }
}

/// One capture zone's shape and pose for the current tick.
///
/// `basis` columns are the unrotated, scaled axes: full width, full depth
/// and height. `rotation` holds Euler angles in radians, applied X, then Y,
/// then Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneVolume {
    pub center: Vec3,
    pub rotation: Vec3,
    pub basis: Mat3,
    pub shape: ZoneShape,
}

impl ZoneVolume {
    pub fn new(center: Vec3, rotation: Vec3, basis: Mat3, shape: ZoneShape) -> Self {
        Self {
            center,
            rotation,
            basis,
            shape,
        }
    }

    /// Upright cylinder with the given radius and height
    pub fn cylinder(center: Vec3, radius: f32, height: f32) -> Self {
        let basis = Mat3::from_diagonal(Vec3::new(radius * 2.0, radius * 2.0, height));
        Self::new(center, Vec3::ZERO, basis, ZoneShape::Cylinder)
    }

    /// Box with the given half extents and height
    pub fn boxed(center: Vec3, half_width: f32, half_depth: f32, height: f32) -> Self {
        let basis = Mat3::from_diagonal(Vec3::new(half_width * 2.0, half_depth * 2.0, height));
        Self::new(center, Vec3::ZERO, basis, ZoneShape::Box)
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Scale the horizontal footprint, leaving height untouched
    pub fn scaled(mut self, factor: f32) -> Self {
        self.basis.x_axis *= factor;
        self.basis.y_axis *= factor;
        self
    }

    pub fn width_axis(&self) -> Vec3 {
        self.basis.x_axis
    }

    pub fn depth_axis(&self) -> Vec3 {
        self.basis.y_axis
    }

    pub fn height_axis(&self) -> Vec3 {
        self.basis.z_axis
    }

    pub fn half_width(&self) -> f32 {
        self.width_axis().length() * 0.5
    }

    pub fn half_depth(&self) -> f32 {
        self.depth_axis().length() * 0.5
    }

    pub fn height(&self) -> f32 {
        self.height_axis().length()
    }

    /// Cylinder radius; for a box this is the half width
    pub fn radius(&self) -> f32 {
        self.half_width()
    }

    /// Rotation matrix, X applied first and Z last
    pub fn rotation_matrix(&self) -> Mat3 {
        Mat3::from_rotation_z(self.rotation.z)
            * Mat3::from_rotation_y(self.rotation.y)
            * Mat3::from_rotation_x(self.rotation.x)
    }

    /// Every axis finite and longer than `AXIS_EPSILON`, center finite
    pub fn is_valid(&self) -> bool {
        let axes = [self.width_axis(), self.depth_axis(), self.height_axis()];
        self.center.is_finite()
            && self.rotation.is_finite()
            && axes.iter().all(|axis| {
                let len = axis.length();
                len.is_finite() && len > AXIS_EPSILON
            })
    }

    /// Express a world point in the zone's local frame
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        // Rotations are orthonormal, so the transpose is the inverse
        self.rotation_matrix().transpose() * (point - self.center)
    }

    /// Containment with the default vertical slab
    pub fn contains(&self, point: Vec3) -> bool {
        self.contains_with(point, SlabTolerance::default())
    }

    pub fn contains_with(&self, point: Vec3, slab: SlabTolerance) -> bool {
        if !self.is_valid() || !point.is_finite() {
            return false;
        }

        let local = self.to_local(point);
        if local.z < -slab.below || local.z > self.height() + slab.above {
            return false;
        }

        match self.shape {
            ZoneShape::Cylinder => {
                let radius = self.radius();
                local.x * local.x + local.y * local.y <= radius * radius
            }
            ZoneShape::Box => {
                local.x.abs() <= self.half_width() && local.y.abs() <= self.half_depth()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn center_is_inside_both_shapes() {
        let center = Vec3::new(519.6, 398.8, 201.4);
        assert!(ZoneVolume::cylinder(center, 10.0, 1.0).contains(center));
        assert!(ZoneVolume::boxed(center, 10.0, 15.0, 1.0).contains(center));
    }

    #[test]
    fn cylinder_radius_boundary() {
        let zone = ZoneVolume::cylinder(Vec3::ZERO, 10.0, 1.0);
        assert!(zone.contains(Vec3::new(9.99, 0.0, 0.0)));
        assert!(!zone.contains(Vec3::new(10.01, 0.0, 0.0)));

        let diagonal = 9.99 / 2f32.sqrt();
        assert!(zone.contains(Vec3::new(diagonal, diagonal, 0.0)));
        let diagonal = 10.01 / 2f32.sqrt();
        assert!(!zone.contains(Vec3::new(diagonal, -diagonal, 0.0)));
    }

    #[test]
    fn box_extents() {
        let zone = ZoneVolume::boxed(Vec3::ZERO, 10.0, 10.0, 5.0);
        assert!(zone.contains(Vec3::ZERO));
        assert!(zone.contains(Vec3::new(9.5, -9.5, 0.0)));
        assert!(!zone.contains(Vec3::new(11.0, 0.0, 0.0)));
        assert!(!zone.contains(Vec3::new(0.0, -11.0, 0.0)));
    }

    #[test]
    fn vertical_slab() {
        let zone = ZoneVolume::boxed(Vec3::ZERO, 10.0, 10.0, 5.0);

        // Jumping players stay inside up to the headroom margin
        assert!(zone.contains(Vec3::new(0.0, 0.0, 6.0)));
        assert!(zone.contains(Vec3::new(0.0, 0.0, 11.0)));
        assert!(!zone.contains(Vec3::new(0.0, 0.0, 11.01)));

        assert!(zone.contains(Vec3::new(0.0, 0.0, -1.25)));
        assert!(!zone.contains(Vec3::new(0.0, 0.0, -1.3)));

        let tight = SlabTolerance {
            below: 0.0,
            above: 0.0,
        };
        assert!(!zone.contains_with(Vec3::new(0.0, 0.0, 6.0), tight));
        assert!(zone.contains_with(Vec3::new(0.0, 0.0, 5.0), tight));
    }

    #[test]
    fn yaw_rotates_box_footprint() {
        // 10 wide, 30 deep; a quarter turn about Z swaps the footprint
        let zone = ZoneVolume::boxed(Vec3::ZERO, 5.0, 15.0, 1.0);
        let point = Vec3::new(12.0, 0.0, 0.0);
        assert!(!zone.contains(point));

        let turned = zone.with_rotation(Vec3::new(0.0, 0.0, FRAC_PI_2));
        assert!(turned.contains(point));
        assert!(!turned.contains(Vec3::new(0.0, 12.0, 0.0)));
    }

    #[test]
    fn tilt_is_applied_before_yaw() {
        // Roll a quarter turn about X, then yaw a quarter turn about Z:
        // width runs along world Y, depth along world Z, height along world X
        let zone = ZoneVolume::boxed(Vec3::ZERO, 10.0, 2.0, 1.0)
            .with_rotation(Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));

        let rotation = zone.rotation_matrix();
        assert!((rotation * Vec3::X - Vec3::Y).length() < 1e-5);
        assert!((rotation * Vec3::Y - Vec3::Z).length() < 1e-5);
        assert!((rotation * Vec3::Z - Vec3::X).length() < 1e-5);

        // Along the width, a few units up the slab
        assert!(zone.contains(Vec3::new(3.0, 8.0, 0.0)));
        assert!(!zone.contains(Vec3::new(-3.0, 8.0, 0.0)));
        // Past the depth
        assert!(!zone.contains(Vec3::new(0.0, 0.0, 8.0)));
        assert!(zone.contains(Vec3::new(0.0, 0.0, 1.5)));
    }

    #[test]
    fn pitch_tilts_the_slab() {
        // A quarter turn about Y points the height axis along world X
        let zone = ZoneVolume::cylinder(Vec3::ZERO, 10.0, 1.0)
            .with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert!((zone.rotation_matrix() * Vec3::Z - Vec3::X).length() < 1e-5);

        assert!(zone.contains(Vec3::new(5.0, 0.0, 9.0)));
        assert!(!zone.contains(Vec3::new(-5.0, 0.0, 0.0)));
        assert!(!zone.contains(Vec3::new(0.0, 0.0, 11.0)));
    }

    #[test]
    fn degenerate_axis_is_never_inside() {
        let mut zone = ZoneVolume::cylinder(Vec3::ZERO, 10.0, 1.0);
        zone.basis.x_axis = Vec3::ZERO;
        assert!(!zone.is_valid());
        assert!(!zone.contains(Vec3::ZERO));

        let mut zone = ZoneVolume::boxed(Vec3::ZERO, 10.0, 10.0, 1.0);
        zone.basis.z_axis = Vec3::new(f32::NAN, 0.0, 0.0);
        assert!(!zone.contains(Vec3::ZERO));
    }

    #[test]
    fn scaled_keeps_height() {
        let zone = ZoneVolume::cylinder(Vec3::ZERO, 10.0, 1.0).scaled(2.0);
        assert_eq!(zone.radius(), 20.0);
        assert_eq!(zone.height(), 1.0);
        assert!(zone.contains(Vec3::new(19.0, 0.0, 0.0)));
    }
}
