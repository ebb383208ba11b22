//! Bounding volumes
//!
//! Boxes are stored as eight named corners so that oriented boxes survive a
//! model transform unchanged in topology. Corner layout:
//!
//! ```text
//!        e-------h
//!       /|      /|        a = (min x, min y, min z)
//!      f-------g |        b = (max x, min y, min z)
//!      | d-----|-c        c = (max x, min y, max z)
//!      |/      |/         d = (min x, min y, max z)
//!      a-------b          e..h mirror d, a, b, c at max y
//! ```

use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::foundation::math::constants::TAU;

/// Index pairs into [`BoundingBox::corners`] forming the twelve box edges
pub const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0), // bottom ring a-b-c-d
    (0, 5), (1, 6), (2, 7), (3, 4), // verticals a-f, b-g, c-h, d-e
    (5, 4), (4, 7), (7, 6), (6, 5), // top ring f-e-h-g
];

/// Box described by its eight corners a..h
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Corners in a..h order
    pub corners: [Point3; 8],
}

impl BoundingBox {
    /// Axis-aligned box spanning `min`..`max`
    pub fn from_min_max(min: &Point3, max: &Point3) -> Self {
        Self {
            corners: [
                Point3::new(min.x, min.y, min.z),
                Point3::new(max.x, min.y, min.z),
                Point3::new(max.x, min.y, max.z),
                Point3::new(min.x, min.y, max.z),
                Point3::new(min.x, max.y, max.z),
                Point3::new(min.x, max.y, min.z),
                Point3::new(max.x, max.y, min.z),
                Point3::new(max.x, max.y, max.z),
            ],
        }
    }

    /// Smallest axis-aligned box containing every point, `None` for no points
    pub fn enclosing_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((*first, *first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });
        Some(Self::from_min_max(&min, &max))
    }

    /// Corner `a`
    pub fn a(&self) -> Point3 {
        self.corners[0]
    }

    /// Componentwise minimum of all corners
    pub fn min(&self) -> Point3 {
        self.corners.iter().skip(1).fold(self.corners[0], |acc, p| acc.inf(p))
    }

    /// Componentwise maximum of all corners
    pub fn max(&self) -> Point3 {
        self.corners.iter().skip(1).fold(self.corners[0], |acc, p| acc.sup(p))
    }

    /// Every corner moved by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            corners: self.corners.map(|corner| matrix.transform_point(&corner)),
        }
    }

    /// Axis-aligned box enclosing this one
    pub fn external(&self) -> Self {
        Self::from_min_max(&self.min(), &self.max())
    }

    /// Axis-aligned box inside this one
    ///
    /// Per axis the eight corner coordinates are sorted and the two middle
    /// values become the bounds, so the box never grows when the source box
    /// is rotated.
    pub fn internal(&self) -> Self {
        let mut min = Point3::origin();
        let mut max = Point3::origin();
        for axis in 0..3 {
            let mut values = self.corners.map(|corner| corner[axis]);
            values.sort_by(f32::total_cmp);
            min[axis] = values[3];
            max[axis] = values[4];
        }
        Self::from_min_max(&min, &max)
    }

    /// Corner-wise average of two boxes
    pub fn midpoint(&self, other: &Self) -> Self {
        let mut corners = self.corners;
        for (corner, theirs) in corners.iter_mut().zip(other.corners.iter()) {
            *corner = nalgebra::center(corner, theirs);
        }
        Self { corners }
    }

    /// Edge list as flat xyz floats, two vertices per edge
    pub fn edge_lines(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(BOX_EDGES.len() * 6);
        for (from, to) in BOX_EDGES {
            for index in [from, to] {
                let p = self.corners[index];
                data.extend_from_slice(&[p.x, p.y, p.z]);
            }
        }
        data
    }
}

/// Three orthogonal great circles (XY, YZ, XZ planes) as a line list
///
/// Each circle contributes `segments` line segments, two vertices apiece.
pub fn great_circles(center: &Point3, radius: f32, segments: u32) -> Vec<f32> {
    let segments = segments.max(3);
    let step = TAU / segments as f32;
    let planes: [fn(f32, f32) -> Vec3; 3] = [
        |c, s| Vec3::new(c, s, 0.0),
        |c, s| Vec3::new(0.0, s, c),
        |c, s| Vec3::new(s, 0.0, c),
    ];

    let mut data = Vec::with_capacity((segments * 3 * 2 * 3) as usize);
    for plane in planes {
        let point_at = |i: u32| {
            let angle = step * i as f32;
            center + plane(angle.cos(), angle.sin()) * radius
        };
        for i in 0..segments {
            for p in [point_at(i), point_at(i + 1)] {
                data.extend_from_slice(&[p.x, p.y, p.z]);
            }
        }
    }
    data
}

/// World-space volumes of one entity under its current transform
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingVolumes {
    /// Object-space box carried through the model matrix
    pub object_box: BoundingBox,
    /// Axis-aligned box enclosing the object box
    pub external_aabb: BoundingBox,
    /// Axis-aligned box inside the object box
    pub internal_aabb: BoundingBox,
    /// Average of the internal and external boxes
    pub midpoint_aabb: BoundingBox,
    /// Axis-aligned box of the transformed vertices
    pub tight_aabb: BoundingBox,
    /// Largest sphere around the world position inside the external box
    pub internal_sphere: f32,
    /// Sphere around the world position through the farthest external corner
    pub external_sphere: f32,
    /// Sphere around the world position through the farthest vertex
    pub tight_sphere: f32,
}

impl BoundingVolumes {
    /// Compute all volumes from flat xyz positions
    pub fn compute(positions: &[f32], model: &Mat4, world_position: &Vec3) -> Self {
        let local: Vec<Point3> = positions
            .chunks_exact(3)
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect();
        let world: Vec<Point3> = local.iter().map(|p| model.transform_point(p)).collect();
        let center = Point3::from(*world_position);

        let object_space = BoundingBox::enclosing_points(&local)
            .unwrap_or_else(|| BoundingBox::from_min_max(&Point3::origin(), &Point3::origin()));
        let object_box = object_space.transformed(model);
        let external_aabb = object_box.external();
        let internal_aabb = object_box.internal();
        let midpoint_aabb = internal_aabb.midpoint(&external_aabb);
        let tight_aabb = BoundingBox::enclosing_points(&world)
            .unwrap_or_else(|| BoundingBox::from_min_max(&center, &center));

        let tight_sphere = world
            .iter()
            .map(|p| nalgebra::distance(&center, p))
            .fold(0.0, f32::max);
        let external_sphere = external_aabb
            .corners
            .iter()
            .map(|p| nalgebra::distance(&center, p))
            .fold(0.0, f32::max);
        let near = external_aabb.min() - center;
        let far = external_aabb.max() - center;
        let internal_sphere = (0..3)
            .map(|axis| near[axis].abs().min(far[axis].abs()))
            .fold(f32::INFINITY, f32::min);

        Self {
            object_box,
            external_aabb,
            internal_aabb,
            midpoint_aabb,
            tight_aabb,
            internal_sphere,
            external_sphere,
            tight_sphere,
        }
    }
}
