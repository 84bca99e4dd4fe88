//! This crate contains the definition for the [`mesh::Mesh`] struct along with
//! the operations that cut it into contours and flatten them into drawings.

use nalgebra::Vector3;

pub mod format;
pub mod geometry;
pub mod mesh;
pub mod slicer;
pub mod workspace;

pub type Pos = Vector3<f32>;
