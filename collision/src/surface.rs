//! Static world collision surface backed by a uniform horizontal grid.

use std::collections::HashMap;

use glam::Vec3;

use crate::{capsule_triangle, sphere_triangle, Aabb, Capsule, Contact, Sphere, Triangle};

const DEFAULT_CELL_SIZE: f32 = 4.0;
const MAX_CELLS_PER_TRIANGLE: i64 = 4096;
const MIN_TRIANGLE_AREA: f32 = 1e-8;

/// Corner signs of each box face, wound consistently per face.
const BOX_FACES: [[[f32; 3]; 4]; 6] = [
    [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]],
    [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
    [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]],
    [[1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0]],
    [[-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
    [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
];

/// Read-only triangle soup partitioned into grid buckets on the XZ plane.
///
/// Built once when level geometry becomes available. Triangles whose
/// footprint spans too many buckets are kept in an overflow list that is
/// tested by every query.
#[derive(Clone, Debug)]
pub struct CollisionSurface {
    triangles: Vec<Triangle>,
    bounds: Vec<Aabb>,
    buckets: HashMap<(i32, i32), Vec<u32>>,
    oversized: Vec<u32>,
    cell_size: f32,
}

impl CollisionSurface {
    /// Surface without any geometry. Every query misses.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_triangles(Vec::new())
    }

    /// Indexes the provided triangles with the default bucket size.
    #[must_use]
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self::with_cell_size(triangles, DEFAULT_CELL_SIZE)
    }

    /// Indexes the provided triangles using buckets of `cell_size` world units.
    ///
    /// Degenerate triangles are discarded. Non-positive or non-finite cell
    /// sizes fall back to the default.
    #[must_use]
    pub fn with_cell_size(triangles: Vec<Triangle>, cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };

        let triangles: Vec<Triangle> = triangles
            .into_iter()
            .filter(|triangle| {
                let area = (triangle.b - triangle.a)
                    .cross(triangle.c - triangle.a)
                    .length_squared();
                area > MIN_TRIANGLE_AREA
                    && triangle.a.is_finite()
                    && triangle.b.is_finite()
                    && triangle.c.is_finite()
            })
            .collect();

        let bounds: Vec<Aabb> = triangles.iter().map(Triangle::bounds).collect();
        let mut surface = Self {
            triangles,
            bounds,
            buckets: HashMap::new(),
            oversized: Vec::new(),
            cell_size,
        };
        surface.rebuild_buckets();
        surface
    }

    /// Horizontal square plane centred on the origin at `height`.
    #[must_use]
    pub fn flat_plane(height: f32, half_extent: f32) -> Self {
        SurfaceBuilder::new().with_plane(height, half_extent).build()
    }

    /// Number of indexed triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Indexed triangles in insertion order.
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Resolves a capsule against every nearby triangle.
    ///
    /// Contacts are accumulated by translating a working copy of the capsule
    /// out of each intersected triangle in turn; the returned contact is the
    /// total displacement expressed as a unit normal and a depth.
    #[must_use]
    pub fn capsule_intersect(&self, capsule: &Capsule) -> Option<Contact> {
        let mut probe = *capsule;
        let region = capsule.bounds();
        for index in self.candidates(&region) {
            let triangle = &self.triangles[index];
            if let Some(contact) = capsule_triangle(&probe, triangle) {
                probe.translate(contact.normal * contact.depth);
            }
        }
        displacement_contact(probe.start - capsule.start)
    }

    /// Resolves a sphere against every nearby triangle.
    #[must_use]
    pub fn sphere_intersect(&self, sphere: &Sphere) -> Option<Contact> {
        let mut probe = *sphere;
        let region = sphere.bounds();
        for index in self.candidates(&region) {
            let triangle = &self.triangles[index];
            if let Some(contact) = sphere_triangle(&probe, triangle) {
                probe.center += contact.normal * contact.depth;
            }
        }
        displacement_contact(probe.center - sphere.center)
    }

    fn rebuild_buckets(&mut self) {
        self.buckets.clear();
        self.oversized.clear();

        for (index, bounds) in self.bounds.iter().enumerate() {
            let index = index as u32;
            let (min_cell, max_cell) = cell_range(bounds, self.cell_size);
            let span = (i64::from(max_cell.0) - i64::from(min_cell.0) + 1)
                * (i64::from(max_cell.1) - i64::from(min_cell.1) + 1);
            if span > MAX_CELLS_PER_TRIANGLE {
                self.oversized.push(index);
                continue;
            }

            for x in min_cell.0..=max_cell.0 {
                for z in min_cell.1..=max_cell.1 {
                    self.buckets.entry((x, z)).or_default().push(index);
                }
            }
        }
    }

    /// Indices of triangles whose bounds overlap `region`, each yielded once.
    ///
    /// A bucketed triangle is reported from the first grid cell it shares with
    /// the query, so no scratch storage is needed to drop duplicates.
    fn candidates<'a>(&'a self, region: &'a Aabb) -> impl Iterator<Item = usize> + 'a {
        let (min_cell, max_cell) = cell_range(region, self.cell_size);
        let bucketed = (min_cell.0..=max_cell.0)
            .flat_map(move |x| (min_cell.1..=max_cell.1).map(move |z| (x, z)))
            .filter_map(move |cell| self.buckets.get(&cell).map(|bucket| (cell, bucket)))
            .flat_map(move |(cell, bucket)| {
                bucket
                    .iter()
                    .copied()
                    .filter(move |&index| self.first_shared_cell(index, min_cell) == cell)
            });
        self.oversized
            .iter()
            .copied()
            .chain(bucketed)
            .map(|index| index as usize)
            .filter(move |&index| self.bounds[index].intersects(region))
    }

    fn first_shared_cell(&self, index: u32, query_min: (i32, i32)) -> (i32, i32) {
        let (own_min, _) = cell_range(&self.bounds[index as usize], self.cell_size);
        (own_min.0.max(query_min.0), own_min.1.max(query_min.1))
    }
}

impl Default for CollisionSurface {
    fn default() -> Self {
        Self::empty()
    }
}

/// Accumulates level geometry before indexing it into a [`CollisionSurface`].
#[derive(Clone, Debug)]
pub struct SurfaceBuilder {
    triangles: Vec<Triangle>,
    cell_size: f32,
}

impl SurfaceBuilder {
    /// Creates an empty builder using the default bucket size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
            cell_size: DEFAULT_CELL_SIZE,
        }
    }

    /// Overrides the bucket size used when indexing.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Appends arbitrary triangles, typically loaded level geometry.
    #[must_use]
    pub fn with_triangles<I>(mut self, triangles: I) -> Self
    where
        I: IntoIterator<Item = Triangle>,
    {
        self.triangles.extend(triangles);
        self
    }

    /// Appends a horizontal square plane centred on the origin.
    #[must_use]
    pub fn with_plane(mut self, height: f32, half_extent: f32) -> Self {
        let h = half_extent;
        let a = Vec3::new(-h, height, -h);
        let b = Vec3::new(-h, height, h);
        let c = Vec3::new(h, height, h);
        let d = Vec3::new(h, height, -h);
        self.triangles.push(Triangle::new(a, b, c));
        self.triangles.push(Triangle::new(a, c, d));
        self
    }

    /// Appends an axis-aligned box as twelve triangles.
    #[must_use]
    pub fn with_box(mut self, center: Vec3, half_extents: Vec3) -> Self {
        for face in BOX_FACES {
            let [a, b, c, d] = face.map(|signs| center + half_extents * Vec3::from_array(signs));
            self.triangles.push(Triangle::new(a, b, c));
            self.triangles.push(Triangle::new(a, c, d));
        }
        self
    }

    /// Indexes the accumulated geometry.
    #[must_use]
    pub fn build(self) -> CollisionSurface {
        CollisionSurface::with_cell_size(self.triangles, self.cell_size)
    }
}

impl Default for SurfaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn displacement_contact(displacement: Vec3) -> Option<Contact> {
    let depth = displacement.length();
    if depth <= f32::EPSILON || !depth.is_finite() {
        return None;
    }
    Some(Contact {
        normal: displacement / depth,
        depth,
    })
}

fn cell_range(bounds: &Aabb, cell_size: f32) -> ((i32, i32), (i32, i32)) {
    let to_cell = |value: f32| (value / cell_size).floor() as i32;
    (
        (to_cell(bounds.min.x), to_cell(bounds.min.z)),
        (to_cell(bounds.max.x), to_cell(bounds.max.z)),
    )
}
