use std::collections::BTreeSet;
use std::f32::consts::{PI, TAU};

use bytemuck::NoUninit;
use wgpu::util::DeviceExt;

use crate::model::Shape;

/// Object-space vertex. Colour and transform come per instance, normals are
/// derived in the fragment shader for flat shading.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    fn push(&mut self, pos: [f32; 3]) -> u32 {
        self.vertices.push(Vertex { pos });
        self.vertices.len() as u32 - 1
    }

    /// Line-list index buffer with every distinct triangle edge once, over
    /// the same vertices.
    pub fn wire_edges(&self) -> Mesh {
        let mut edges = BTreeSet::new();
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                edges.insert((a.min(b), a.max(b)));
            }
        }
        Mesh {
            vertices: self.vertices.clone(),
            indices: edges.into_iter().flat_map(|(a, b)| [a, b]).collect(),
        }
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {

        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Unit mesh for a decorative shape, centred on the origin.
pub fn shape_mesh(shape: Shape) -> Mesh {
    match shape {
        Shape::Cube => create_cube_mesh(),
        Shape::Sphere => create_sphere_mesh(16, 12),
        Shape::Cone => create_cone_mesh(24),
    }
}

/// Unit cube (edge 1) centred on the origin, counter-clockwise faces.
pub fn create_cube_mesh() -> Mesh {
    let mut mesh = Mesh::empty();
    for x in [-0.5, 0.5] {
        for y in [-0.5, 0.5] {
            for z in [-0.5, 0.5] {
                mesh.push([x, y, z]);
            }
        }
    }
    // Vertex index is x*4 + y*2 + z over the {-0.5, 0.5} corners.
    mesh.indices = vec![
        4, 6, 7, 4, 7, 5, // +x
        0, 1, 3, 0, 3, 2, // -x
        2, 3, 7, 2, 7, 6, // +y
        0, 4, 5, 0, 5, 1, // -y
        1, 5, 7, 1, 7, 3, // +z
        0, 2, 6, 0, 6, 4, // -z
    ];
    mesh
}

/// UV sphere of radius 0.5.
pub fn create_sphere_mesh(segments: u32, rings: u32) -> Mesh {
    let mut mesh = Mesh::empty();
    for ring in 0..=rings {
        let theta = PI * ring as f32 / rings as f32;
        for seg in 0..=segments {
            let phi = TAU * seg as f32 / segments as f32;
            mesh.push([
                0.5 * theta.sin() * phi.cos(),
                0.5 * theta.cos(),
                0.5 * theta.sin() * phi.sin(),
            ]);
        }
    }
    let row = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * row + seg;
            let b = a + row;
            if ring != 0 {
                mesh.indices.extend([a, a + 1, b]);
            }
            if ring != rings - 1 {
                mesh.indices.extend([a + 1, b + 1, b]);
            }
        }
    }
    mesh
}

/// Cone of radius 0.5 and height 1, apex up, centred on the origin.
pub fn create_cone_mesh(segments: u32) -> Mesh {
    let mut mesh = Mesh::empty();
    let apex = mesh.push([0.0, 0.5, 0.0]);
    let base = mesh.push([0.0, -0.5, 0.0]);
    let first = mesh.vertices.len() as u32;
    for seg in 0..segments {
        let phi = TAU * seg as f32 / segments as f32;
        mesh.push([0.5 * phi.cos(), -0.5, 0.5 * phi.sin()]);
    }
    for seg in 0..segments {
        let a = first + seg;
        let b = first + (seg + 1) % segments;
        mesh.indices.extend([apex, b, a]);
        mesh.indices.extend([base, a, b]);
    }
    mesh
}

/// The pickup gem: an octahedron with unit height.
pub fn create_octahedron_mesh() -> Mesh {
    let mut mesh = Mesh::empty();
    for p in [
        [0.5, 0.0, 0.0],
        [-0.5, 0.0, 0.0],
        [0.0, 0.5, 0.0],
        [0.0, -0.5, 0.0],
        [0.0, 0.0, 0.5],
        [0.0, 0.0, -0.5],
    ] {
        mesh.push(p);
    }
    mesh.indices = vec![
        2, 4, 0, 2, 0, 5, 2, 5, 1, 2, 1, 4,
        3, 0, 4, 3, 5, 0, 3, 1, 5, 3, 4, 1,
    ];
    mesh
}

/// Square line grid on the y = 0 plane.
pub fn create_grid_mesh(size: f32, divisions: u32) -> Mesh {
    let mut mesh = Mesh::empty();
    let half = size / 2.0;
    let step = size / divisions.max(1) as f32;
    for i in 0..=divisions {
        let t = -half + step * i as f32;
        let a = mesh.push([t, 0.0, -half]);
        let b = mesh.push([t, 0.0, half]);
        let c = mesh.push([-half, 0.0, t]);
        let d = mesh.push([half, 0.0, t]);
        mesh.indices.extend([a, b, c, d]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_closed(mesh: &Mesh) -> bool {
        mesh.indices.len() % 3 == 0
            && mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len())
    }

    #[test]
    fn cube_wireframe_includes_face_diagonals() {
        let cube = create_cube_mesh();
        assert!(is_closed(&cube));
        assert_eq!(cube.indices.len(), 36);
        // 12 box edges plus one diagonal per face.
        assert_eq!(cube.wire_edges().indices.len() / 2, 18);
    }

    #[test]
    fn shapes_fit_in_a_unit_box() {
        for shape in Shape::ALL {
            let mesh = shape_mesh(shape);
            assert!(is_closed(&mesh));
            let ys: Vec<f32> = mesh.vertices.iter().map(|v| v.pos[1]).collect();
            let min = ys.iter().cloned().fold(f32::MAX, f32::min);
            let max = ys.iter().cloned().fold(f32::MIN, f32::max);
            assert!((max - min - shape.base_height()).abs() < 1e-5, "{shape:?}");
            assert!((max + min).abs() < 1e-5, "{shape:?} not centred");
        }
    }

    #[test]
    fn wire_edges_are_unique() {
        let gem = create_octahedron_mesh();
        let wire = gem.wire_edges();
        assert_eq!(wire.indices.len() / 2, 12);
        let pairs: BTreeSet<(u32, u32)> =
            wire.indices.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        assert_eq!(pairs.len(), 12);
    }

    #[test]
    fn grid_lines_span_the_size() {
        let grid = create_grid_mesh(1000.0, 200);
        assert_eq!(grid.indices.len(), 201 * 4);
        let max_x = grid.vertices.iter().map(|v| v.pos[0]).fold(f32::MIN, f32::max);
        assert!((max_x - 500.0).abs() < 1e-3);
        assert!(grid.vertices.iter().all(|v| v.pos[1] == 0.0));
    }
}
