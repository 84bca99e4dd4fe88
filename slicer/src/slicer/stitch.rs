use std::collections::HashMap;

use common::config::StitchMode;
use tracing::trace;

use crate::{
    geometry::{Contour, Segment},
    Pos,
};

/// Chains the unordered segments of one slice into contours.
///
/// Segments are joined at endpoints closer than `tolerance`. When several
/// unused segments touch the end of the chain, the one with the lowest index
/// wins, so branching slices are not disambiguated geometrically. Chains that
/// never get back to their start are kept as open contours if they have at
/// least three points and dropped otherwise. Segments shorter than
/// `tolerance` are ignored.
pub fn stitch(segments: &[Segment], tolerance: f32, mode: StitchMode) -> Vec<Contour> {
    match mode {
        StitchMode::Linear => {
            let lookup = LinearScan { segments, tolerance };
            join_segments(segments, tolerance, &lookup)
        }
        StitchMode::Hashed => {
            let lookup = EndpointHash::new(segments, tolerance);
            join_segments(segments, tolerance, &lookup)
        }
    }
}

/// Finds the unused segment continuing a chain.
trait EndpointLookup {
    /// Returns the index of the lowest unused segment with an endpoint within
    /// tolerance of `point`, along with its other endpoint.
    fn find(&self, point: &Pos, used: &[bool]) -> Option<(usize, Pos)>;
}

fn join_segments(
    segments: &[Segment],
    tolerance: f32,
    lookup: &impl EndpointLookup,
) -> Vec<Contour> {
    let mut used = segments
        .iter()
        .map(|[a, b]| (a - b).magnitude() < tolerance)
        .collect::<Vec<_>>();
    let mut contours = Vec::new();
    let mut dropped = 0;

    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }

        used[seed] = true;
        let [first, mut last] = segments[seed];
        let mut points = vec![first, last];

        let closed = loop {
            let Some((idx, next)) = lookup.find(&last, &used) else {
                break false;
            };

            used[idx] = true;
            if (next - first).magnitude() < tolerance {
                break true;
            }

            points.push(next);
            last = next;
        };

        if points.len() < 3 {
            dropped += 1;
            continue;
        }

        contours.push(Contour::new(points, closed));
    }

    trace!(
        "Stitched {} segments into {} contours ({} open, {} dropped)",
        segments.len(),
        contours.len(),
        contours.iter().filter(|x| !x.is_closed()).count(),
        dropped
    );

    contours
}

struct LinearScan<'a> {
    segments: &'a [Segment],
    tolerance: f32,
}

impl EndpointLookup for LinearScan<'_> {
    fn find(&self, point: &Pos, used: &[bool]) -> Option<(usize, Pos)> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(idx, _)| !used[*idx])
            .find_map(|(idx, &segment)| {
                other_endpoint(segment, point, self.tolerance).map(|other| (idx, other))
            })
    }
}

/// Segment endpoints bucketed on a grid with a cell size of `tolerance`, so
/// every point within tolerance of a query is in one of the 27 cells around
/// it.
struct EndpointHash<'a> {
    segments: &'a [Segment],
    tolerance: f32,
    cells: HashMap<[i64; 3], Vec<usize>>,
}

impl<'a> EndpointHash<'a> {
    fn new(segments: &'a [Segment], tolerance: f32) -> Self {
        let mut cells = HashMap::<_, Vec<usize>>::new();
        for (idx, segment) in segments.iter().enumerate() {
            let [a, b] = segment.map(|x| quantize(&x, tolerance));
            cells.entry(a).or_default().push(idx);
            if a != b {
                cells.entry(b).or_default().push(idx);
            }
        }

        Self {
            segments,
            tolerance,
            cells,
        }
    }
}

impl EndpointLookup for EndpointHash<'_> {
    fn find(&self, point: &Pos, used: &[bool]) -> Option<(usize, Pos)> {
        let [x, y, z] = quantize(point, self.tolerance);
        let mut best: Option<(usize, Pos)> = None;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(cell) = self.cells.get(&[x + dx, y + dy, z + dz]) else {
                        continue;
                    };

                    for &idx in cell {
                        if used[idx] || best.is_some_and(|(best, _)| best <= idx) {
                            continue;
                        }

                        let segment = self.segments[idx];
                        if let Some(other) = other_endpoint(segment, point, self.tolerance) {
                            best = Some((idx, other));
                        }
                    }
                }
            }
        }

        best
    }
}

/// If either end of `segment` is within `tolerance` of `point`, returns the
/// opposite end. The first endpoint is tested first.
fn other_endpoint([a, b]: Segment, point: &Pos, tolerance: f32) -> Option<Pos> {
    if (a - point).magnitude() < tolerance {
        Some(b)
    } else if (b - point).magnitude() < tolerance {
        Some(a)
    } else {
        None
    }
}

fn quantize(point: &Pos, cell: f32) -> [i64; 3] {
    [point.x, point.y, point.z].map(|x| (x / cell).floor() as i64)
}
