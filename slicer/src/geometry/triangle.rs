use crate::{geometry::Segment, Pos};

/// Intersects a triangle with the plane `y = elevation`.
///
/// Each vertex is classified as above the plane or not. A vertex lying exactly
/// on the plane counts as below it, so an intersection passing through a
/// vertex is still found and the triangles sharing that vertex agree on it.
/// Triangles that only touch the plane at a single vertex produce nothing.
pub fn plane_triangle_intersection([v0, v1, v2]: [Pos; 3], elevation: f32) -> Option<Segment> {
    // By subtracting the elevation from each vertex y coord, we can check if
    // each edge is crossing the plane if one end is above and one is not. We
    // can use xor to do this quickly.
    let (a, b, c) = (v0.y - elevation, v1.y - elevation, v2.y - elevation);
    let (a_pos, b_pos, c_pos) = (a > 0.0, b > 0.0, c > 0.0);

    let mut out = [Pos::zeros(); 2];
    let mut n = 0;

    // Called when the edge from v0 to v1 crosses the plane. t is how far along
    // the edge the intersection is. Only x and z are interpolated, the plane
    // coordinate is exact.
    let mut push_intersection = |a: f32, b: f32, v0: Pos, v1: Pos| {
        let t = a / (a - b);
        out[n] = Pos::new(
            v0.x + t * (v1.x - v0.x),
            elevation,
            v0.z + t * (v1.z - v0.z),
        );
        n += 1;
    };

    (a_pos ^ b_pos).then(|| push_intersection(a, b, v0, v1));
    (b_pos ^ c_pos).then(|| push_intersection(b, c, v1, v2));
    (c_pos ^ a_pos).then(|| push_intersection(c, a, v2, v0));

    (n == 2 && out[0] != out[1]).then_some(out)
}

/// Intersects every face with the plane `y = elevation`, pushing the
/// resulting segments onto `out` in face order.
pub fn intersect_faces(
    vertices: &[Pos],
    faces: &[[u32; 3]],
    elevation: f32,
    out: &mut Vec<Segment>,
) {
    out.extend(faces.iter().filter_map(|face| {
        let triangle = face.map(|idx| vertices[idx as usize]);
        plane_triangle_intersection(triangle, elevation)
    }));
}
