// Common test utilities: hand-assembled map buffers and scene fixtures.
#![allow(dead_code)]

use map_codec::{Mesh, Node, Polygon, Scene, Texture, Vertex, MAP_INVALID_INDEX, MAP_SIGNATURE};

pub fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn push_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn push_cstr(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Overwrite a little-endian u32 field in place.
pub fn patch_u32(buf: &mut [u8], pos: usize, v: u32) {
    buf[pos..pos + 4].copy_from_slice(&v.to_le_bytes());
}

pub const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

// ----------------------------------------------------------------------------
// Hand-assembled minimal map: one mesh ("tri", 3 vertices, 1 triangle), one
// root node referencing it, zero textures. Field positions are exported so
// corruption tests can patch individual fields.
// ----------------------------------------------------------------------------

pub const SCENARIO_MESH_RECORD: usize = 28;
pub const SCENARIO_NODE_RECORD: usize = 48;
pub const SCENARIO_MESH_NAME: usize = 64;
pub const SCENARIO_VERTICES: usize = 68;
pub const SCENARIO_POLYGON: usize = 164;
pub const SCENARIO_NODE_NAME: usize = 181;
pub const SCENARIO_MATRIX: usize = 186;
pub const SCENARIO_LEN: usize = 250;

pub fn scenario_map() -> Vec<u8> {
    let mut buf = Vec::with_capacity(SCENARIO_LEN);

    // Header
    push_u32(&mut buf, MAP_SIGNATURE);
    push_u32(&mut buf, 1);
    push_u32(&mut buf, SCENARIO_MESH_RECORD as u32);
    push_u32(&mut buf, 1);
    push_u32(&mut buf, SCENARIO_NODE_RECORD as u32);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);

    // Mesh record
    push_u32(&mut buf, SCENARIO_MESH_NAME as u32);
    push_u32(&mut buf, 3);
    push_u32(&mut buf, SCENARIO_VERTICES as u32);
    push_u32(&mut buf, 1);
    push_u32(&mut buf, SCENARIO_POLYGON as u32);

    // Node record
    push_u32(&mut buf, SCENARIO_NODE_NAME as u32);
    push_u32(&mut buf, SCENARIO_MATRIX as u32);
    push_u32(&mut buf, MAP_INVALID_INDEX);
    push_u32(&mut buf, 0);

    // Payload
    push_cstr(&mut buf, "tri");
    for i in 0..3 {
        let v = scenario_vertex(i);
        for &f in v.position.iter().chain(&v.normal).chain(&v.uv) {
            push_f32(&mut buf, f);
        }
    }
    buf.push(3);
    for index in [0u32, 1, 2, 0] {
        push_u32(&mut buf, index);
    }
    push_cstr(&mut buf, "root");
    for row in &IDENTITY {
        for &f in row {
            push_f32(&mut buf, f);
        }
    }

    assert_eq!(buf.len(), SCENARIO_LEN);
    buf
}

pub fn scenario_vertex(i: u32) -> Vertex {
    Vertex {
        position: [i as f32, 0.0, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv: [i as f32, 1.0],
    }
}

/// The scene `scenario_map()` decodes to.
pub fn scenario_scene() -> Scene {
    Scene {
        meshes: vec![Mesh {
            name: "tri".into(),
            vertices: (0..3).map(scenario_vertex).collect(),
            polygons: vec![Polygon::triangle(0, 1, 2)],
        }],
        nodes: vec![Node {
            name: "root".into(),
            matrix: IDENTITY,
            parent_index: None,
            mesh_index: Some(0),
        }],
        textures: vec![],
    }
}

// ----------------------------------------------------------------------------
// A richer fixture exercising quads, verbatim unused index slots, a node
// hierarchy and empty texture strings.
// ----------------------------------------------------------------------------

pub fn sample_scene() -> Scene {
    let mut tri_with_spare_slot = Polygon::triangle(0, 1, 2);
    tri_with_spare_slot.indices[3] = 7; // past vertex count, must survive untouched

    let mut root_matrix = IDENTITY;
    root_matrix[3] = [10.0, 0.0, 0.0, 1.0];
    let mut child_matrix = IDENTITY;
    child_matrix[3] = [0.0, 5.0, 0.0, 1.0];

    Scene {
        meshes: vec![
            Mesh {
                name: "walls".into(),
                vertices: (0..4).map(scenario_vertex).collect(),
                polygons: vec![tri_with_spare_slot, Polygon::quad(0, 1, 2, 3)],
            },
            Mesh {
                name: "floor".into(),
                vertices: (0..3).map(scenario_vertex).collect(),
                polygons: vec![Polygon::triangle(2, 1, 0)],
            },
        ],
        nodes: vec![
            Node {
                name: "root".into(),
                matrix: root_matrix,
                parent_index: None,
                mesh_index: None,
            },
            Node {
                name: "walls".into(),
                matrix: child_matrix,
                parent_index: Some(0),
                mesh_index: Some(0),
            },
            Node {
                name: "floor".into(),
                matrix: IDENTITY,
                parent_index: Some(0),
                mesh_index: Some(1),
            },
        ],
        textures: vec![
            Texture {
                name: "stone".into(),
                filename: "stone.png".into(),
            },
            Texture {
                name: String::new(),
                filename: String::new(),
            },
        ],
    }
}
