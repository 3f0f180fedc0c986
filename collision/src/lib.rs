#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collision geometry primitives shared by the Ruin Survival systems.
//!
//! Every function in this crate is pure: callers receive contacts, distances
//! or corrected values and decide themselves how to apply them. Vector
//! normalisation is always guarded so degenerate input produces "no contact"
//! rather than NaN values leaking into the simulation.

mod surface;

use glam::Vec3;

pub use surface::{CollisionSurface, SurfaceBuilder};

const EPSILON: f32 = 1e-6;
const CLOSEST_POINT_ITERATIONS: usize = 4;

/// Capsule collider defined by a segment and a constant radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Capsule {
    /// Lower endpoint of the capsule segment.
    pub start: Vec3,
    /// Upper endpoint of the capsule segment.
    pub end: Vec3,
    /// Radius swept around the segment.
    pub radius: f32,
}

impl Capsule {
    /// Creates a capsule from two endpoints and a radius.
    #[must_use]
    pub const fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
        Self { start, end, radius }
    }

    /// Moves both endpoints by the provided offset.
    pub fn translate(&mut self, offset: Vec3) {
        self.start += offset;
        self.end += offset;
    }

    /// Midpoint of the capsule segment.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    /// Axis-aligned bounds enclosing the capsule.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let radius = Vec3::splat(self.radius);
        Aabb::new(
            self.start.min(self.end) - radius,
            self.start.max(self.end) + radius,
        )
    }
}

/// Sphere collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    /// Center of the sphere.
    pub center: Vec3,
    /// Radius of the sphere.
    pub radius: f32,
}

impl Sphere {
    /// Creates a sphere from a center point and radius.
    #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Axis-aligned bounds enclosing the sphere.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let radius = Vec3::splat(self.radius);
        Aabb::new(self.center - radius, self.center + radius)
    }
}

/// Single triangle of static world geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    /// First vertex.
    pub a: Vec3,
    /// Second vertex.
    pub b: Vec3,
    /// Third vertex.
    pub c: Vec3,
}

impl Triangle {
    /// Creates a triangle from three vertices.
    #[must_use]
    pub const fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Unit normal following the vertex winding, or `None` for degenerate triangles.
    #[must_use]
    pub fn normal(&self) -> Option<Vec3> {
        (self.b - self.a).cross(self.c - self.a).try_normalize()
    }

    /// Axis-aligned bounds enclosing the triangle.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.a.min(self.b).min(self.c),
            self.a.max(self.b).max(self.c),
        )
    }

    /// Closest point on the triangle to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;

        let ap = point - a;
        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = point - b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = point - c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let total = va + vb + vc;
        if total.abs() <= EPSILON {
            return a;
        }
        let v = vb / total;
        let w = vc / total;
        a + ab * v + ac * w
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from its corners.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Reports whether two boxes overlap, touching faces included.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Reports whether the point lies inside the box, faces included.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        self.min.cmple(point).all() && point.cmple(self.max).all()
    }
}

/// Contact produced by an intersection test.
///
/// `normal` points away from the obstacle towards the queried shape and
/// `depth` is the distance the shape must travel along it to separate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Unit separation direction.
    pub normal: Vec3,
    /// Penetration depth along `normal`.
    pub depth: f32,
}

/// Closest point on the segment `a..b` to `point`.
#[must_use]
pub fn closest_point_on_segment(a: Vec3, b: Vec3, point: Vec3) -> Vec3 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared <= EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    a + ab * t
}

/// Tests a capsule against a single triangle.
#[must_use]
pub fn capsule_triangle(capsule: &Capsule, triangle: &Triangle) -> Option<Contact> {
    let plane_normal = triangle.normal()?;
    let start_side = plane_normal.dot(capsule.start - triangle.a);
    let end_side = plane_normal.dot(capsule.end - triangle.a);

    let mut on_segment = if start_side * end_side < 0.0 {
        let t = start_side / (start_side - end_side);
        capsule.start + (capsule.end - capsule.start) * t
    } else if start_side.abs() <= end_side.abs() {
        capsule.start
    } else {
        capsule.end
    };

    let mut on_triangle = triangle.closest_point(on_segment);
    for _ in 0..CLOSEST_POINT_ITERATIONS {
        on_segment = closest_point_on_segment(capsule.start, capsule.end, on_triangle);
        on_triangle = triangle.closest_point(on_segment);
    }

    let separation = on_segment - on_triangle;
    let distance = separation.length();
    if distance >= capsule.radius {
        return None;
    }

    let normal = if distance > EPSILON {
        separation / distance
    } else {
        facing(plane_normal, capsule.center() - triangle.a)
    };

    Some(Contact {
        normal,
        depth: capsule.radius - distance,
    })
}

/// Tests a sphere against a single triangle.
#[must_use]
pub fn sphere_triangle(sphere: &Sphere, triangle: &Triangle) -> Option<Contact> {
    let plane_normal = triangle.normal()?;
    let closest = triangle.closest_point(sphere.center);
    let separation = sphere.center - closest;
    let distance = separation.length();
    if distance >= sphere.radius {
        return None;
    }

    let normal = if distance > EPSILON {
        separation / distance
    } else {
        facing(plane_normal, sphere.center - triangle.a)
    };

    Some(Contact {
        normal,
        depth: sphere.radius - distance,
    })
}

/// Tests a sphere against a capsule, returning the contact from the sphere's side.
#[must_use]
pub fn sphere_capsule(sphere: &Sphere, capsule: &Capsule) -> Option<Contact> {
    let axis_point = closest_point_on_segment(capsule.start, capsule.end, sphere.center);
    let separation = sphere.center - axis_point;
    let reach = sphere.radius + capsule.radius;
    let distance_squared = separation.length_squared();
    if distance_squared >= reach * reach {
        return None;
    }

    let distance = distance_squared.sqrt();
    let normal = separation.try_normalize().unwrap_or(Vec3::Y);
    Some(Contact {
        normal,
        depth: reach - distance,
    })
}

/// Separates two overlapping spheres and exchanges the velocity components
/// along their contact normal.
///
/// Returns `true` when the spheres overlapped and were corrected. Coincident
/// centers are left untouched.
pub fn resolve_sphere_pair(
    first: &mut Sphere,
    first_velocity: &mut Vec3,
    second: &mut Sphere,
    second_velocity: &mut Vec3,
) -> bool {
    let reach = first.radius + second.radius;
    let offset = first.center - second.center;
    let distance_squared = offset.length_squared();
    if distance_squared >= reach * reach {
        return false;
    }

    let Some(normal) = offset.try_normalize() else {
        return false;
    };

    let first_normal = normal * first_velocity.dot(normal);
    let second_normal = normal * second_velocity.dot(normal);
    *first_velocity += second_normal - first_normal;
    *second_velocity += first_normal - second_normal;

    let push = (reach - distance_squared.sqrt()) * 0.5;
    first.center += normal * push;
    second.center -= normal * push;
    true
}

/// Reports whether `a` lies strictly within `radius` of `b`.
#[must_use]
pub fn within_distance(a: Vec3, b: Vec3, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

/// Distance between two points projected onto the horizontal plane.
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let delta = b - a;
    (delta.x * delta.x + delta.z * delta.z).sqrt()
}

/// Unit direction from `from` to `to` on the horizontal plane, if any.
#[must_use]
pub fn horizontal_direction(from: Vec3, to: Vec3) -> Option<Vec3> {
    let delta = to - from;
    Vec3::new(delta.x, 0.0, delta.z).try_normalize()
}

fn facing(normal: Vec3, towards: Vec3) -> Vec3 {
    if normal.dot(towards) >= 0.0 {
        normal
    } else {
        -normal
    }
}
