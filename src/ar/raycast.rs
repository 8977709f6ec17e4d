//! Ray queries against static surface geometry
//!
//! Broad phase is a slab test against a world AABB, narrow phase is
//! Möller–Trumbore per triangle.

use glam::Vec3;

/// A half-line with a length bound
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub dir: Vec3,
    pub max_len: f32,
}

impl Ray {
    /// Build a ray; `None` if the direction is degenerate
    pub fn new(origin: Vec3, dir: Vec3, max_len: f32) -> Option<Self> {
        let dir = dir.try_normalize()?;
        Some(Self {
            origin,
            dir,
            max_len,
        })
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box around a set of points; `None` for an empty set
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    /// Grow by `eps` on every side (flat planes have zero thickness)
    pub fn expand(&self, eps: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(eps),
            max: self.max + Vec3::splat(eps),
        }
    }

    /// Slab test; returns the entry distance if the ray touches the box
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv = ray.dir.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;
        let t_near = t0.min(t1).max_element().max(0.0);
        let t_far = t0.max(t1).min_element().min(ray.max_len);
        (t_near <= t_far).then_some(t_near)
    }
}

/// Ray-triangle intersection (two-sided). Returns the hit distance.
pub fn ray_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPS: f32 = 1e-7;
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        // Parallel
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0 && t <= ray.max_len).then_some(t)
}

/// Nearest hit of a ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit<Id> {
    pub id: Id,
    pub point: Vec3,
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray() -> Ray {
        Ray::new(Vec3::new(0.25, 1.0, 0.25), Vec3::NEG_Y, 3.0).unwrap()
    }

    #[test]
    fn test_ray_hits_floor_triangle() {
        let t = ray_triangle(&down_ray(), Vec3::ZERO, Vec3::X, Vec3::Z).unwrap();
        assert!((t - 1.0).abs() < 1e-6);
        assert!((down_ray().at(t) - Vec3::new(0.25, 0.0, 0.25)).length() < 1e-6);
    }

    #[test]
    fn test_ray_misses_outside_triangle() {
        let ray = Ray::new(Vec3::new(0.9, 1.0, 0.9), Vec3::NEG_Y, 3.0).unwrap();
        assert!(ray_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Z).is_none());
    }

    #[test]
    fn test_ray_length_bound() {
        let ray = Ray::new(Vec3::new(0.25, 5.0, 0.25), Vec3::NEG_Y, 3.0).unwrap();
        assert!(ray_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Z).is_none());
    }

    #[test]
    fn test_aabb_slab() {
        let aabb = Aabb::from_points([Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)])
            .unwrap()
            .expand(0.01);
        assert!(aabb.intersect_ray(&down_ray()).is_some());
        let away = Ray::new(Vec3::new(0.25, 1.0, 0.25), Vec3::Y, 3.0).unwrap();
        assert!(aabb.intersect_ray(&away).is_none());
    }

    #[test]
    fn test_degenerate_ray() {
        assert!(Ray::new(Vec3::ZERO, Vec3::ZERO, 1.0).is_none());
    }
}
