//! Flattening slice layers into 2D drawings.

mod projection;
pub mod svg;

pub use projection::{ProjectedPath, Projector};
