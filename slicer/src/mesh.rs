use std::{
    io::{BufReader, Read, Seek},
    sync::Arc,
};

use anyhow::{bail, ensure, Context, Result};
use obj::raw::{object::Polygon, parse_obj};
use tracing::{debug, warn};

use crate::Pos;

/// A read-only mesh made of vertices and triangular faces. Clones share the
/// same vertex and face buffers.
#[derive(Debug, Clone)]
pub struct Mesh {
    inner: Arc<MeshInner>,
}

#[derive(Debug)]
struct MeshInner {
    vertices: Box<[Pos]>,
    faces: Box<[[u32; 3]]>,
}

impl Mesh {
    /// Creates a new mesh from the given vertices and faces, checking that
    /// every face index is in bounds and every coordinate is finite.
    pub fn new(vertices: Vec<Pos>, faces: Vec<[u32; 3]>) -> Result<Self> {
        if let Some(idx) = vertices.iter().position(|v| !v.iter().all(|x| x.is_finite())) {
            bail!("Vertex {idx} has a non-finite coordinate");
        }

        let count = vertices.len();
        for (idx, face) in faces.iter().enumerate() {
            ensure!(
                face.iter().all(|&v| (v as usize) < count),
                "Face {idx} references a vertex out of bounds ({face:?}, {count} vertices)"
            );
        }

        Ok(Self {
            inner: Arc::new(MeshInner {
                vertices: vertices.into_boxed_slice(),
                faces: faces.into_boxed_slice(),
            }),
        })
    }

    pub fn vertices(&self) -> &[Pos] {
        self.inner.vertices.as_ref()
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        self.inner.faces.as_ref()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    pub fn face_count(&self) -> usize {
        self.faces().len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces().is_empty()
    }

    /// Get the minimum and maximum of each component of every vertex in the
    /// model. These points define the bounding box of the model.
    pub fn bounds(&self) -> (Pos, Pos) {
        vertex_bounds(self.vertices())
    }

    /// Returns a copy of the mesh centered at the origin and uniformly scaled
    /// so its largest bounding box extent is `size`.
    pub fn normalized(&self, size: f32) -> Mesh {
        if self.vertices().is_empty() {
            return self.clone();
        }

        let (min, max) = self.bounds();
        let center = (min + max) / 2.0;
        let extent = (max - min).max();
        let scale = if extent > 0.0 { size / extent } else { 1.0 };

        let vertices = self
            .vertices()
            .iter()
            .map(|v| (v - center) * scale)
            .collect::<Vec<_>>();

        Self {
            inner: Arc::new(MeshInner {
                vertices: vertices.into_boxed_slice(),
                faces: self.inner.faces.clone(),
            }),
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            inner: Arc::new(MeshInner {
                vertices: Box::new([]),
                faces: Box::new([]),
            }),
        }
    }
}

/// Loads a buffer into a mesh in a blocking manner.
/// Supported formats include `.stl` and `.obj`.
pub fn load_mesh<T: Read + Seek>(mut reader: T, format: &str) -> Result<Mesh> {
    let format = format.to_ascii_lowercase();
    let (vertices, faces) = match format.as_str() {
        "stl" => {
            let modal = stl_io::read_stl(&mut reader).context("Failed to parse STL")?;
            let vertices = modal
                .vertices
                .iter()
                .map(|v| Pos::new(v[0], v[1], v[2]))
                .collect::<Vec<_>>();
            let faces = modal
                .faces
                .iter()
                .map(|f| f.vertices.map(|x| x as u32))
                .collect::<Vec<_>>();
            (vertices, faces)
        }
        "obj" => {
            let raw = parse_obj(BufReader::new(reader)).context("Failed to parse OBJ")?;
            let vertices = raw
                .positions
                .iter()
                .map(|&(x, y, z, _)| Pos::new(x, y, z))
                .collect::<Vec<_>>();

            let mut faces = Vec::new();
            for polygon in raw.polygons.iter() {
                let indices = polygon_indices(polygon);
                if indices.len() < 3 {
                    warn!("Skipping polygon with {} vertices", indices.len());
                    continue;
                }

                // Triangulate as a fan around the first vertex.
                for pair in indices[1..].windows(2) {
                    faces.push([indices[0], pair[0], pair[1]].map(|x| x as u32));
                }
            }
            (vertices, faces)
        }
        _ => bail!("Unsupported format: {format}"),
    };

    debug!(
        "Parsed {format} mesh. {{ vert: {}, face: {} }}",
        vertices.len(),
        faces.len()
    );
    Mesh::new(vertices, faces)
}

fn polygon_indices(polygon: &Polygon) -> Vec<usize> {
    match polygon {
        Polygon::P(p) => p.clone(),
        Polygon::PT(p) => p.iter().map(|x| x.0).collect(),
        Polygon::PN(p) => p.iter().map(|x| x.0).collect(),
        Polygon::PTN(p) => p.iter().map(|x| x.0).collect(),
    }
}

/// Get the minimum and maximum of each component of every vertex.
/// These points define the bounding box of the model.
pub fn vertex_bounds(vertices: &[Pos]) -> (Pos, Pos) {
    vertices.iter().fold(
        (
            Pos::new(f32::MAX, f32::MAX, f32::MAX),
            Pos::new(f32::MIN, f32::MIN, f32::MIN),
        ),
        |(min, max), v| (min.inf(v), max.sup(v)),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use super::*;

    /// Axis aligned cube with corners at ±`half`, outward facing triangles.
    pub fn cube(half: f32) -> Mesh {
        let vertices = (0..8)
            .map(|i| {
                let sign = |bit: u32| if i & (1 << bit) != 0 { half } else { -half };
                Pos::new(sign(0), sign(1), sign(2))
            })
            .collect();
        let faces = vec![
            [0, 2, 3], [0, 3, 1], // -z
            [4, 5, 7], [4, 7, 6], // +z
            [0, 1, 5], [0, 5, 4], // -y
            [2, 6, 7], [2, 7, 3], // +y
            [0, 4, 6], [0, 6, 2], // -x
            [1, 3, 7], [1, 7, 5], // +x
        ];
        Mesh::new(vertices, faces).unwrap()
    }

    /// Latitude / longitude sphere, closed at the poles.
    pub fn uv_sphere(radius: f32, rings: u32, sectors: u32) -> Mesh {
        use std::f32::consts::{PI, TAU};

        let mut vertices = vec![Pos::new(0.0, radius, 0.0)];
        for ring in 1..rings {
            let phi = PI * ring as f32 / rings as f32;
            for sector in 0..sectors {
                let theta = TAU * sector as f32 / sectors as f32;
                vertices.push(Pos::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.cos(),
                    radius * phi.sin() * theta.sin(),
                ));
            }
        }
        let bottom = vertices.len() as u32;
        vertices.push(Pos::new(0.0, -radius, 0.0));

        let ring_start = |ring: u32| 1 + (ring - 1) * sectors;
        let mut faces = Vec::new();
        for sector in 0..sectors {
            let next = (sector + 1) % sectors;
            faces.push([0, ring_start(1) + next, ring_start(1) + sector]);

            let last = ring_start(rings - 1);
            faces.push([bottom, last + sector, last + next]);
        }
        for ring in 1..rings - 1 {
            let (a, b) = (ring_start(ring), ring_start(ring + 1));
            for sector in 0..sectors {
                let next = (sector + 1) % sectors;
                faces.push([a + sector, a + next, b + next]);
                faces.push([a + sector, b + next, b + sector]);
            }
        }

        Mesh::new(vertices, faces).unwrap()
    }

    #[test]
    fn rejects_bad_indices() {
        let vertices = vec![Pos::zeros(); 3];
        assert!(Mesh::new(vertices.clone(), vec![[0, 1, 2]]).is_ok());
        assert!(Mesh::new(vertices, vec![[0, 1, 3]]).is_err());
        assert!(Mesh::new(vec![Pos::new(0.0, f32::NAN, 0.0)], vec![]).is_err());
    }

    #[test]
    fn cube_bounds() {
        let (min, max) = cube(0.5).bounds();
        assert_eq!(min, Pos::repeat(-0.5));
        assert_eq!(max, Pos::repeat(0.5));
    }

    #[test]
    fn normalize() {
        let vertices = vec![
            Pos::new(10.0, 0.0, 0.0),
            Pos::new(14.0, 1.0, 0.0),
            Pos::new(10.0, 2.0, 1.0),
        ];
        let mesh = Mesh::new(vertices, vec![[0, 1, 2]]).unwrap().normalized(200.0);

        let (min, max) = mesh.bounds();
        assert!((min + max).magnitude() < 1e-4);
        assert!(((max - min).max() - 200.0).abs() < 1e-3);
        assert_eq!(mesh.faces(), &[[0, 1, 2]]);
    }

    #[test]
    fn normalize_empty() {
        let mesh = Mesh::default().normalized(200.0);
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.is_empty());
    }

    #[test]
    fn load_obj_quads() {
        let source = "\
# unit square made of one quad and one triangle
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
f 1 2 3 4
f 1 2 5
";
        let mesh = load_mesh(Cursor::new(source), "OBJ").unwrap();
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.faces(), &[[0, 1, 2], [0, 2, 3], [0, 1, 4]]);
    }

    #[test]
    fn load_stl() {
        use stl_io::{Normal, Triangle, Vertex};

        let triangle = |vertices: [[f32; 3]; 3]| Triangle {
            normal: Normal::new([0.0, 0.0, 1.0]),
            vertices: vertices.map(Vertex::new),
        };
        let triangles = [
            triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]),
            triangle([[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
        ];

        let mut buffer = Cursor::new(Vec::new());
        stl_io::write_stl(&mut buffer, triangles.iter()).unwrap();
        buffer.set_position(0);

        let mesh = load_mesh(buffer, "STL").unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.bounds(), (Pos::zeros(), Pos::new(1.0, 1.0, 0.0)));
        for &face in mesh.faces() {
            let [a, b, c] = face.map(|idx| mesh.vertices()[idx as usize]);
            assert!((b - a).cross(&(c - a)).z > 0.0);
        }
    }

    #[test]
    fn load_unknown_format() {
        assert!(load_mesh(Cursor::new(""), "ply").is_err());
    }

    #[test]
    fn sphere_is_closed() {
        use std::collections::HashMap;

        let mesh = uv_sphere(1.0, 8, 12);
        let mut edges = HashMap::<_, u8>::new();
        for &[a, b, c] in mesh.faces() {
            for (a, b) in [(a, b), (b, c), (c, a)] {
                *edges.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        assert!(edges.values().all(|&count| count == 2));
    }
}
