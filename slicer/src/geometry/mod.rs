use crate::Pos;

mod contour;
pub mod triangle;

pub use contour::Contour;

/// One intersection line between a triangle and a cutting plane.
pub type Segment = [Pos; 2];
