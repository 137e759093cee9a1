use std::f32::consts::PI;

/// Raw vertex data handed to the rendering backend. Positions are packed
/// xyz triples; `dirty` asks the backend to re-upload the buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<f32>,
    pub indices: Option<Vec<u32>>,
    pub dirty: bool,
}

impl Geometry {
    pub fn with_vertex_capacity(vertices: usize) -> Self {
        Self {
            positions: vec![0.0; vertices * 3],
            indices: None,
            dirty: true,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Closed set of 3D primitives available to the `shape` preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Cube,
    Sphere,
    Torus,
    Dodecahedron,
    Icosahedron,
    Octahedron,
    Tetrahedron,
}

impl ShapeKind {
    /// Build the primitive at the given nominal size. Out-of-range sizes
    /// (zero, negative) produce the degenerate geometry they imply.
    pub fn build(self, size: f32) -> Geometry {
        match self {
            Self::Cube => cube(size),
            Self::Sphere => sphere(size),
            Self::Torus => torus(size, size / 2.0),
            Self::Dodecahedron => polyhedron(&DODECAHEDRON_VERTICES, &DODECAHEDRON_INDICES, size),
            Self::Icosahedron => polyhedron(&ICOSAHEDRON_VERTICES, &ICOSAHEDRON_INDICES, size),
            Self::Octahedron => polyhedron(&OCTAHEDRON_VERTICES, &OCTAHEDRON_INDICES, size),
            Self::Tetrahedron => polyhedron(&TETRAHEDRON_VERTICES, &TETRAHEDRON_INDICES, size),
        }
    }
}

fn cube(size: f32) -> Geometry {
    let h = size / 2.0;
    let mut positions = Vec::with_capacity(8 * 3);
    for &z in &[-h, h] {
        for &y in &[-h, h] {
            for &x in &[-h, h] {
                positions.extend_from_slice(&[x, y, z]);
            }
        }
    }
    // Two triangles per face, CCW seen from outside.
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];
    Geometry {
        positions,
        indices: Some(indices),
        dirty: true,
    }
}

const SPHERE_SEGMENTS: u32 = 24;
const SPHERE_RINGS: u32 = 16;

fn sphere(radius: f32) -> Geometry {
    let mut positions = Vec::new();
    for ring in 0..=SPHERE_RINGS {
        let v = ring as f32 / SPHERE_RINGS as f32;
        let phi = v * PI;
        for seg in 0..=SPHERE_SEGMENTS {
            let u = seg as f32 / SPHERE_SEGMENTS as f32;
            let theta = u * 2.0 * PI;
            positions.extend_from_slice(&[
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            ]);
        }
    }
    let mut indices = Vec::new();
    let stride = SPHERE_SEGMENTS + 1;
    for ring in 0..SPHERE_RINGS {
        for seg in 0..SPHERE_SEGMENTS {
            let a = ring * stride + seg;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    Geometry {
        positions,
        indices: Some(indices),
        dirty: true,
    }
}

const TORUS_RADIAL: u32 = 12;
const TORUS_TUBULAR: u32 = 24;

fn torus(radius: f32, tube: f32) -> Geometry {
    let mut positions = Vec::new();
    for j in 0..=TORUS_RADIAL {
        let v = j as f32 / TORUS_RADIAL as f32 * 2.0 * PI;
        for i in 0..=TORUS_TUBULAR {
            let u = i as f32 / TORUS_TUBULAR as f32 * 2.0 * PI;
            let cx = radius + tube * v.cos();
            positions.extend_from_slice(&[cx * u.cos(), cx * u.sin(), tube * v.sin()]);
        }
    }
    let mut indices = Vec::new();
    let stride = TORUS_TUBULAR + 1;
    for j in 0..TORUS_RADIAL {
        for i in 0..TORUS_TUBULAR {
            let a = j * stride + i;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    Geometry {
        positions,
        indices: Some(indices),
        dirty: true,
    }
}

// Canonical polyhedron tables (golden-ratio construction), vertices
// normalized onto the unit sphere then scaled by `size`.

const T: f32 = 1.618_034; // (1 + sqrt 5) / 2
const R: f32 = 0.618_034; // 1 / T

const TETRAHEDRON_VERTICES: [[f32; 3]; 4] = [
    [1.0, 1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
];
const TETRAHEDRON_INDICES: [u32; 12] = [2, 1, 0, 0, 3, 2, 1, 3, 0, 2, 3, 1];

const OCTAHEDRON_VERTICES: [[f32; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
];
const OCTAHEDRON_INDICES: [u32; 24] = [
    0, 2, 4, 0, 4, 3, 0, 3, 5, 0, 5, 2, 1, 2, 5, 1, 5, 3, 1, 3, 4, 1, 4, 2,
];

const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = [
    [-1.0, T, 0.0],
    [1.0, T, 0.0],
    [-1.0, -T, 0.0],
    [1.0, -T, 0.0],
    [0.0, -1.0, T],
    [0.0, 1.0, T],
    [0.0, -1.0, -T],
    [0.0, 1.0, -T],
    [T, 0.0, -1.0],
    [T, 0.0, 1.0],
    [-T, 0.0, -1.0],
    [-T, 0.0, 1.0],
];
const ICOSAHEDRON_INDICES: [u32; 60] = [
    0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7, 1,
    8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9, 8, 1,
];

const DODECAHEDRON_VERTICES: [[f32; 3]; 20] = [
    [-1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
    [0.0, -R, -T],
    [0.0, -R, T],
    [0.0, R, -T],
    [0.0, R, T],
    [-R, -T, 0.0],
    [-R, T, 0.0],
    [R, -T, 0.0],
    [R, T, 0.0],
    [-T, 0.0, -R],
    [T, 0.0, -R],
    [-T, 0.0, R],
    [T, 0.0, R],
];
const DODECAHEDRON_INDICES: [u32; 108] = [
    3, 11, 7, 3, 7, 15, 3, 15, 13, 7, 19, 17, 7, 17, 6, 7, 6, 15, 17, 4, 8, 17, 8, 10, 17, 10, 6,
    8, 0, 16, 8, 16, 2, 8, 2, 10, 0, 12, 1, 0, 1, 18, 0, 18, 16, 6, 10, 2, 6, 2, 13, 6, 13, 15, 2,
    16, 18, 2, 18, 3, 2, 3, 13, 18, 1, 9, 18, 9, 11, 18, 11, 3, 4, 14, 12, 4, 12, 0, 4, 0, 8, 11,
    9, 5, 11, 5, 19, 11, 19, 7, 19, 5, 14, 19, 14, 4, 19, 4, 17, 1, 12, 14, 1, 14, 5, 1, 5, 9,
];

fn polyhedron(vertices: &[[f32; 3]], indices: &[u32], size: f32) -> Geometry {
    let mut positions = Vec::with_capacity(vertices.len() * 3);
    for v in vertices {
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        positions.extend_from_slice(&[
            v[0] / len * size,
            v[1] / len * size,
            v[2] / len * size,
        ]);
    }
    Geometry {
        positions,
        indices: Some(indices.to_vec()),
        dirty: true,
    }
}
