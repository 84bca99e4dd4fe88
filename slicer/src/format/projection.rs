use std::cmp::Reverse;

use common::{config::ExportConfig, rotation::rotate_x};
use nalgebra::Vector2;
use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::{geometry::Contour, slicer::SliceLayer, Pos};

/// Collinearity tolerance used when simplification is enabled.
const SIMPLIFY_TOLERANCE: f32 = 1e-4;

/// A contour flattened onto the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPath {
    pub points: Vec<Vector2<f32>>,
    /// Mean distance of the contour's points from the camera.
    pub depth: f32,
    pub closed: bool,
}

/// Pinhole camera on the +Z axis looking toward the origin.
#[derive(Debug, Clone)]
pub struct Projector {
    display_rotation: f32,
    focal_length: f32,
    camera_distance: f32,
    center: Vector2<f32>,
    simplify: bool,
}

impl Projector {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            display_rotation: config.display_rotation,
            focal_length: config.focal_length,
            camera_distance: config.camera_distance,
            center: config.center(),
            simplify: config.simplify,
        }
    }

    /// Projects a model space point to viewport coordinates, also returning
    /// its distance from the camera. Points at or behind the camera have no
    /// projection.
    pub fn project_point(&self, point: Pos) -> Option<(Vector2<f32>, f32)> {
        let point = rotate_x(point, self.display_rotation);
        let z = point.z - self.camera_distance;
        if !(z < 0.0) {
            return None;
        }

        let screen = Vector2::new(
            self.center.x - point.x / z * self.focal_length,
            self.center.y - point.y / z * self.focal_length,
        );
        Some((screen, -z))
    }

    pub fn project_contour(&self, contour: &Contour) -> Option<ProjectedPath> {
        let simplified;
        let contour = if self.simplify {
            simplified = contour.simplified(SIMPLIFY_TOLERANCE);
            &simplified
        } else {
            contour
        };

        if contour.is_empty() {
            return None;
        }

        let mut points = Vec::with_capacity(contour.len());
        let mut depth = 0.0;
        for &point in contour.points() {
            let (screen, distance) = self.project_point(point)?;
            points.push(screen);
            depth += distance;
        }

        Some(ProjectedPath {
            depth: depth / points.len() as f32,
            points,
            closed: contour.is_closed(),
        })
    }

    /// Projects the contours of every layer and orders them farthest first,
    /// so drawing them in order paints nearer contours over farther ones.
    /// Contours at equal depth keep their slicing order.
    pub fn project_layers(&self, layers: &[SliceLayer]) -> Vec<ProjectedPath> {
        let mut skipped = 0;
        let mut paths = Vec::new();

        for layer in layers {
            for contour in layer.contours.iter() {
                match self.project_contour(contour) {
                    Some(path) => paths.push(path),
                    None => skipped += 1,
                }
            }
            trace!("Projected layer at {}", layer.elevation);
        }

        if skipped > 0 {
            debug!("Skipped {skipped} contours reaching behind the camera");
        }

        paths.sort_by_key(|x| Reverse(OrderedFloat(x.depth)));
        paths
    }
}
