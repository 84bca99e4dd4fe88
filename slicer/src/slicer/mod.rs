use common::config::SliceConfig;
use tracing::{debug, trace, warn};

use crate::{
    geometry::{triangle::intersect_faces, Contour},
    mesh::{vertex_bounds, Mesh},
    Pos,
};

mod stitch;

pub use stitch::stitch;

/// Used to slice a mesh into contours along a family of parallel planes.
pub struct Slicer {
    slice_config: SliceConfig,
    mesh: Mesh,
}

/// The contours of one cutting plane, in model space.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceLayer {
    /// Position of the plane along the Y axis of the slice-aligned frame.
    pub elevation: f32,
    pub contours: Vec<Contour>,
}

impl Slicer {
    /// Creates a new slicer given a slice config and a mesh.
    pub fn new(slice_config: SliceConfig, mesh: Mesh) -> Self {
        Self { slice_config, mesh }
    }

    /// Mesh vertices rotated so the cutting planes are perpendicular to Y.
    fn aligned_vertices(&self) -> Vec<Pos> {
        let orientation = &self.slice_config.orientation;
        self.mesh
            .vertices()
            .iter()
            .map(|&v| orientation.to_slice_frame(v))
            .collect()
    }

    /// Elevations of every cutting plane, in ascending order.
    pub fn elevations(&self) -> Vec<f32> {
        if self.mesh.is_empty() {
            return Vec::new();
        }

        let (min, max) = vertex_bounds(&self.aligned_vertices());
        layer_elevations(min.y, max.y, self.slice_config.spacing)
    }

    /// Runs a full slicing pass. Every call recomputes everything from the
    /// mesh and config.
    pub fn slice(&self) -> Vec<SliceLayer> {
        if self.mesh.is_empty() {
            debug!("Mesh has no faces, nothing to slice");
            return Vec::new();
        }

        let config = &self.slice_config;
        let vertices = self.aligned_vertices();
        let (min, max) = vertex_bounds(&vertices);
        let elevations = layer_elevations(min.y, max.y, config.spacing);

        debug!(
            "Slicing {} faces into {} layers from {} to {}",
            self.mesh.face_count(),
            elevations.len(),
            min.y,
            max.y
        );

        let mut segments = Vec::new();
        elevations
            .into_iter()
            .map(|elevation| {
                segments.clear();
                intersect_faces(&vertices, self.mesh.faces(), elevation, &mut segments);
                trace!("Layer at {elevation}: {} segments", segments.len());

                let contours = stitch(&segments, config.tolerance, config.stitch)
                    .into_iter()
                    .map(|contour| contour.map(|x| config.orientation.to_model_frame(x)))
                    .collect();

                SliceLayer {
                    elevation,
                    contours,
                }
            })
            .collect()
    }
}

/// Slices `mesh` with the planes described by `config`.
pub fn slice_mesh(mesh: &Mesh, config: &SliceConfig) -> Vec<SliceLayer> {
    Slicer::new(config.clone(), mesh.clone()).slice()
}

/// Planes are centered in each spacing interval, so none sits exactly on the
/// extremes of the mesh.
fn layer_elevations(min: f32, max: f32, spacing: f32) -> Vec<f32> {
    if !(spacing.is_finite() && spacing > 0.0) {
        warn!("Invalid slice spacing {spacing}, skipping");
        return Vec::new();
    }

    let count = ((max - min) / spacing).floor();
    if !(count > 0.0) {
        return Vec::new();
    }

    // Below the float resolution of the mesh extent every plane would land on
    // the same few elevations.
    if !(count <= u32::MAX as f32) || min + spacing == min || max + spacing == max {
        warn!("Slice spacing {spacing} is too fine for a mesh spanning {min} to {max}, skipping");
        return Vec::new();
    }

    (0..count as usize)
        .map(|i| min + i as f32 * spacing + spacing / 2.0)
        .collect()
}
