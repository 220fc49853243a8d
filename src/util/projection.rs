// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pinhole projection of oriented 3D boxes into content pixels.
//!
//! A box is rotated by its roll-pitch-yaw quaternion, translated to its
//! center, tilted by the fixed camera view rotation and projected with
//! intrinsics derived from the horizontal field of view. Corners behind the
//! camera are projected as-is; the resulting wireframe may be inverted.

use crate::models::detection::Box3D;
use nalgebra::{Matrix3, Point2, Point3, Rotation3, UnitQuaternion, Vector3};

/// Camera tilt about X: scene "up" maps to screen "down".
pub const VIEW_TILT_DEGREES: f64 = 90.0;

/// Height above the centroid (box-local Z, before tilt) at which labels float.
pub const LABEL_LIFT: f64 = 0.1;

/// Corner order from the `[x][y][z]` enumeration: top quad then bottom quad.
const CORNER_WINDING: [usize; 8] = [1, 3, 7, 5, 0, 2, 6, 4];

/// One wireframe edge in content pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedEdge {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    pub length: f64,
    /// Direction of the edge in radians, `atan2(dy, dx)`.
    pub angle: f64,
}

impl ProjectedEdge {
    pub fn between(start: Point2<f64>, end: Point2<f64>) -> Self {
        let delta = end - start;
        Self {
            start,
            end,
            length: delta.norm(),
            angle: delta.y.atan2(delta.x),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.start.iter().chain(self.end.iter()).all(|v| v.is_finite())
    }
}

/// Projected cuboid: 4 top edges, 4 bottom edges, 4 verticals, then the label.
#[derive(Debug, Clone, PartialEq)]
pub struct WireframeProjection {
    pub edges: [ProjectedEdge; 12],
    pub label_anchor: Point2<f64>,
    /// Set when any corner has non-positive depth.
    pub behind_camera: bool,
}

/// Pinhole camera covering the content rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct PinholeCamera {
    intrinsics: Matrix3<f64>,
    view: Rotation3<f64>,
}

impl PinholeCamera {
    /// Principal point at the viewport center, focal length from the
    /// horizontal field of view.
    pub fn new(viewport_width: f64, viewport_height: f64, fov_degrees: f64) -> Self {
        let focal = viewport_width / (2.0 * (fov_degrees.to_radians() / 2.0).tan());
        let (cx, cy) = (viewport_width / 2.0, viewport_height / 2.0);
        #[rustfmt::skip]
        let intrinsics = Matrix3::new(
            focal, 0.0,   cx,
            0.0,   focal, cy,
            0.0,   0.0,   1.0,
        );
        Self {
            intrinsics,
            view: Rotation3::from_axis_angle(&Vector3::x_axis(), VIEW_TILT_DEGREES.to_radians()),
        }
    }

    /// Project a world point; returns pixel position and depth.
    pub fn project(&self, world: &Point3<f64>) -> (Point2<f64>, f64) {
        let camera = self.view * world.coords;
        let image = self.intrinsics * camera;
        let depth = image.z;
        (Point2::new(image.x / depth, image.y / depth), depth)
    }
}

/// Rotation from roll (X), pitch (Y) and yaw (Z) in radians.
pub fn orientation(roll_pitch_yaw: [f64; 3]) -> UnitQuaternion<f64> {
    let [roll, pitch, yaw] = roll_pitch_yaw;
    UnitQuaternion::from_euler_angles(roll, pitch, yaw)
}

/// The 8 corners of an axis-aligned box with the given full extents,
/// ordered top-front-right, top-front-left, top-back-left, top-back-right,
/// then the same for the bottom face.
pub fn box_corners(size: [f64; 3]) -> [Vector3<f64>; 8] {
    let half = Vector3::from(size) / 2.0;
    let mut enumerated = [Vector3::zeros(); 8];
    let mut index = 0;
    for x in [-half.x, half.x] {
        for y in [-half.y, half.y] {
            for z in [-half.z, half.z] {
                enumerated[index] = Vector3::new(x, y, z);
                index += 1;
            }
        }
    }
    CORNER_WINDING.map(|i| enumerated[i])
}

/// Project an oriented box into a 12-edge wireframe plus label anchor.
pub fn project_box(bbox: &Box3D, camera: &PinholeCamera) -> WireframeProjection {
    let rotation = orientation(bbox.roll_pitch_yaw).to_rotation_matrix();
    let center = Vector3::from(bbox.center);

    let world: [Point3<f64>; 8] =
        box_corners(bbox.size).map(|corner| Point3::from(rotation * corner + center));

    let mut behind_camera = false;
    let vertices = world.map(|corner| {
        let (pixel, depth) = camera.project(&corner);
        behind_camera |= depth <= 0.0;
        pixel
    });

    let (top, bottom) = vertices.split_at(4);
    let edge = |i: usize| -> [ProjectedEdge; 3] {
        let next = (i + 1) % 4;
        [
            ProjectedEdge::between(top[i], top[next]),
            ProjectedEdge::between(bottom[i], bottom[next]),
            ProjectedEdge::between(top[i], bottom[i]),
        ]
    };
    let groups = [edge(0), edge(1), edge(2), edge(3)];
    let edges = std::array::from_fn(|k| groups[k % 4][k / 4]);

    let centroid = world
        .iter()
        .fold(Vector3::zeros(), |sum, corner| sum + corner.coords)
        / world.len() as f64;
    let lifted = Point3::from(centroid + Vector3::new(0.0, 0.0, LABEL_LIFT));
    let (label_anchor, _) = camera.project(&lifted);

    if behind_camera {
        log::debug!("3D box '{}' has corners behind the camera", bbox.label);
    }

    WireframeProjection {
        edges,
        label_anchor,
        behind_camera,
    }
}
