use crate::Pos;

/// A polygonal loop reconstructed from the segments of one slice. The closing
/// point is not repeated. A contour is only open when stitching ran out of
/// segments before getting back to the start.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Pos>,
    closed: bool,
}

impl Contour {
    pub fn new(points: Vec<Pos>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn points(&self) -> &[Pos] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Pos> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Applies `f` to every point, keeping order and closure.
    pub fn map(mut self, f: impl Fn(Pos) -> Pos) -> Self {
        self.points.iter_mut().for_each(|x| *x = f(*x));
        self
    }

    /// Removes points lying on the straight line between their neighbors
    /// (within `tolerance`). Contours that would collapse below three points
    /// are returned unchanged.
    pub fn simplified(&self, tolerance: f32) -> Contour {
        let n = self.points.len();
        if n < 3 {
            return self.clone();
        }

        let mut kept: Vec<Pos> = Vec::with_capacity(n);
        for (idx, &point) in self.points.iter().enumerate() {
            let next = match self.points.get(idx + 1) {
                Some(&next) => next,
                None if self.closed => kept.first().copied().unwrap_or(self.points[0]),
                None => {
                    kept.push(point);
                    continue;
                }
            };

            let prev = match kept.last() {
                Some(&prev) => prev,
                None if self.closed => self.points[n - 1],
                None => {
                    kept.push(point);
                    continue;
                }
            };

            if !collinear(prev, point, next, tolerance) {
                kept.push(point);
            }
        }

        // The first point was tested against the unsimplified last point.
        let last = kept.len().saturating_sub(1);
        if self.closed && last >= 3 && collinear(kept[last], kept[0], kept[1], tolerance) {
            kept.remove(0);
        }

        if kept.len() < 3 {
            return self.clone();
        }

        Contour {
            points: kept,
            closed: self.closed,
        }
    }
}

/// Checks if `point` lies on the segment from `prev` to `next`.
fn collinear(prev: Pos, point: Pos, next: Pos, tolerance: f32) -> bool {
    let direction = next - prev;
    let offset = point - prev;

    let length = direction.magnitude();
    if length < tolerance {
        return offset.magnitude() < tolerance;
    }

    let along = offset.dot(&direction) / length;
    let distance = offset.cross(&direction).magnitude() / length;
    distance < tolerance && along > -tolerance && along < length + tolerance
}
