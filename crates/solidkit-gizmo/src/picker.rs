//! Hit-test shapes for gizmos.
//!
//! A picker is an invisible, usually generous shape around a gizmo's handle.
//! It is never rendered; it only answers whether the pointer ray touches the
//! handle.

use std::fmt;

use glam::Vec3;

use crate::camera::Ray;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub point: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Ray intersection against a shape placed at `center` and uniformly scaled by `scale`.
pub trait Picker: fmt::Debug {
    fn intersect(&self, ray: &Ray, center: Vec3, scale: f32) -> Option<Intersection>;

    /// Re-orient the shape for a new view direction. Most pickers are view independent.
    fn face(&mut self, _normal: Vec3) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpherePicker {
    pub radius: f32,
}

impl SpherePicker {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Picker for SpherePicker {
    fn intersect(&self, ray: &Ray, center: Vec3, scale: f32) -> Option<Intersection> {
        let radius = self.radius * scale;
        let to_center = center - ray.origin;
        let along = to_center.dot(ray.direction);
        let closest_sq = to_center.length_squared() - along * along;
        let radius_sq = radius * radius;
        if closest_sq > radius_sq {
            return None;
        }
        let half_chord = (radius_sq - closest_sq).sqrt();
        let near = along - half_chord;
        let t = if near >= 0.0 { near } else { along + half_chord };
        if t < 0.0 {
            return None;
        }
        Some(Intersection {
            point: ray.at(t),
            distance: t,
        })
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxPicker {
    pub half_extents: Vec3,
}

impl BoxPicker {
    pub fn new(half_extents: Vec3) -> Self {
        Self { half_extents }
    }

    pub fn cube(half_size: f32) -> Self {
        Self::new(Vec3::splat(half_size))
    }
}

impl Picker for BoxPicker {
    fn intersect(&self, ray: &Ray, center: Vec3, scale: f32) -> Option<Intersection> {
        let min = center - self.half_extents * scale;
        let max = center + self.half_extents * scale;

        // Slab test
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            if direction.abs() < 1e-8 {
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let (a, b) = ((min[axis] - origin) * inv, (max[axis] - origin) * inv);
            t_min = t_min.max(a.min(b));
            t_max = t_max.min(a.max(b));
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        let t = if t_min >= 0.0 { t_min } else { t_max };
        Some(Intersection {
            point: ray.at(t),
            distance: t,
        })
    }
}

/// Flat annulus, used as a stand-in for a torus around circular handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingPicker {
    pub radius: f32,
    /// Half width of the band around `radius`.
    pub tolerance: f32,
    pub normal: Vec3,
}

impl RingPicker {
    pub fn new(radius: f32, tolerance: f32) -> Self {
        Self {
            radius,
            tolerance,
            normal: Vec3::Z,
        }
    }
}

impl Picker for RingPicker {
    fn intersect(&self, ray: &Ray, center: Vec3, scale: f32) -> Option<Intersection> {
        let distance = ray.plane_distance(center, self.normal)?;
        let point = ray.at(distance);
        let off_center = point.distance(center);
        if (off_center - self.radius * scale).abs() > self.tolerance * scale {
            return None;
        }
        Some(Intersection { point, distance })
    }

    fn face(&mut self, normal: Vec3) {
        if normal != Vec3::ZERO {
            self.normal = normal;
        }
    }
}

/// What a gizmo sees of the pointer ray during an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Intersector {
    ray: Ray,
}

impl Intersector {
    pub fn new(ray: Ray) -> Self {
        Self { ray }
    }

    pub fn ray(&self) -> &Ray {
        &self.ray
    }

    pub fn raycast(&self, picker: &dyn Picker, center: Vec3, scale: f32) -> Option<Intersection> {
        picker.intersect(&self.ray, center, scale)
    }

    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        self.ray.intersect_plane(point, normal)
    }
}
