//! Map binary writer — serialize a [`Scene`] back to the flat byte layout.
//!
//! Emits the header, then the three fixed-size record tables, then all
//! variable-length payload packed contiguously in scene order: per mesh
//! its name, vertex array and polygon array; per node its name and 64-byte
//! matrix; per texture its name and filename. Every offset field is
//! computed to point into the emitted buffer. Empty arrays encode offset 0.
//!
//! The writer re-validates the referential invariants the decoder enforces
//! (polygon arity and index bounds, node reference bounds, the forest
//! property) and fails with the matching error kind on an inconsistent
//! scene, so `decode(&encode(scene)?)` always succeeds and reproduces the
//! input structurally, unused polygon index slots included.

use crate::decode::{
    HEADER_SIZE, MATRIX_SIZE, MESH_RECORD_SIZE, NODE_RECORD_SIZE, POLYGON_SIZE,
    TEXTURE_RECORD_SIZE, VERTEX_SIZE,
};
use crate::error::{MapError, Result};
use crate::scene::{check_hierarchy, Mesh, Node, Scene, MAP_INVALID_INDEX, MAP_SIGNATURE};

// ============================================================================
// Validation
// ============================================================================

fn validate_mesh(mesh_index: usize, mesh: &Mesh) -> Result<()> {
    let vertex_count = mesh.vertices.len() as u32;
    for (i, polygon) in mesh.polygons.iter().enumerate() {
        if polygon.index_count != 3 && polygon.index_count != 4 {
            return Err(MapError::InvalidPolygon {
                polygon: i,
                detail: format!(
                    "mesh {}: index_count {} not 3 or 4",
                    mesh_index, polygon.index_count
                ),
            });
        }
        for &index in polygon.used_indices() {
            if index >= vertex_count {
                return Err(MapError::InvalidPolygon {
                    polygon: i,
                    detail: format!(
                        "mesh {}: index {} out of range for {} vertices",
                        mesh_index, index, vertex_count
                    ),
                });
            }
        }
    }
    Ok(())
}

fn validate_node(node_index: usize, node: &Node, node_count: u32, mesh_count: u32) -> Result<()> {
    let check = |field: &'static str, reference: Option<u32>, limit: u32| match reference {
        Some(index) if index >= limit => Err(MapError::InvalidIndex {
            node: node_index,
            field,
            index,
            limit,
        }),
        _ => Ok(()),
    };
    check("parent_index", node.parent_index, node_count)?;
    check("mesh_index", node.mesh_index, mesh_count)
}

fn validate_scene(scene: &Scene) -> Result<()> {
    for (i, mesh) in scene.meshes.iter().enumerate() {
        validate_mesh(i, mesh)?;
    }
    let node_count = scene.nodes.len() as u32;
    let mesh_count = scene.meshes.len() as u32;
    for (i, node) in scene.nodes.iter().enumerate() {
        validate_node(i, node, node_count, mesh_count)?;
    }
    check_hierarchy(&scene.nodes)
}

// ============================================================================
// Size computation
// ============================================================================

fn cstr_size(s: &str) -> usize {
    s.len() + 1
}

fn payload_size(scene: &Scene) -> usize {
    let meshes: usize = scene
        .meshes
        .iter()
        .map(|m| {
            cstr_size(&m.name) + m.vertices.len() * VERTEX_SIZE + m.polygons.len() * POLYGON_SIZE
        })
        .sum();
    let nodes: usize = scene
        .nodes
        .iter()
        .map(|n| cstr_size(&n.name) + MATRIX_SIZE)
        .sum();
    let textures: usize = scene
        .textures
        .iter()
        .map(|t| cstr_size(&t.name) + cstr_size(&t.filename))
        .sum();
    meshes + nodes + textures
}

fn table_size(scene: &Scene) -> usize {
    HEADER_SIZE
        + scene.meshes.len() * MESH_RECORD_SIZE
        + scene.nodes.len() * NODE_RECORD_SIZE
        + scene.textures.len() * TEXTURE_RECORD_SIZE
}

// ============================================================================
// Byte writing helpers
// ============================================================================

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_cstr(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

// ============================================================================
// Encoder
// ============================================================================

/// Payload section under construction: bytes plus the base offset the
/// section will land at, so record fields can be filled in as payload is
/// appended.
struct Payload {
    base: usize,
    bytes: Vec<u8>,
}

impl Payload {
    fn cursor(&self) -> u32 {
        (self.base + self.bytes.len()) as u32
    }

    /// Append a string and return the offset it was placed at.
    fn push_cstr(&mut self, s: &str) -> u32 {
        let offset = self.cursor();
        write_cstr(&mut self.bytes, s);
        offset
    }
}

/// Encode a [`Scene`] to a map buffer.
///
/// Fails with the decoder's error kinds if the scene violates the format's
/// referential invariants, and with `OutOfBounds` if the encoded buffer
/// would grow past what u32 offsets can address.
pub fn encode(scene: &Scene) -> Result<Vec<u8>> {
    validate_scene(scene)?;

    let base = table_size(scene);
    let total = base + payload_size(scene);
    if u32::try_from(total).is_err() {
        return Err(MapError::OutOfBounds {
            context: "encoded buffer",
            offset: u32::MAX,
            count: 0,
            buffer_len: total,
        });
    }

    let mut out = Vec::with_capacity(base);
    let mut payload = Payload {
        base,
        bytes: Vec::with_capacity(total - base),
    };

    // Header
    write_u32(&mut out, MAP_SIGNATURE);
    write_u32(&mut out, scene.meshes.len() as u32);
    write_u32(&mut out, if scene.meshes.is_empty() { 0 } else { HEADER_SIZE as u32 });
    let node_table = HEADER_SIZE + scene.meshes.len() * MESH_RECORD_SIZE;
    write_u32(&mut out, scene.nodes.len() as u32);
    write_u32(&mut out, if scene.nodes.is_empty() { 0 } else { node_table as u32 });
    let texture_table = node_table + scene.nodes.len() * NODE_RECORD_SIZE;
    write_u32(&mut out, scene.textures.len() as u32);
    write_u32(&mut out, if scene.textures.is_empty() { 0 } else { texture_table as u32 });

    // Mesh records + payload
    for mesh in &scene.meshes {
        let name_offset = payload.push_cstr(&mesh.name);

        let vertex_offset = if mesh.vertices.is_empty() { 0 } else { payload.cursor() };
        for vertex in &mesh.vertices {
            for &v in vertex.position.iter().chain(&vertex.normal).chain(&vertex.uv) {
                write_f32(&mut payload.bytes, v);
            }
        }

        let polygon_offset = if mesh.polygons.is_empty() { 0 } else { payload.cursor() };
        for polygon in &mesh.polygons {
            payload.bytes.push(polygon.index_count);
            for &index in &polygon.indices {
                write_u32(&mut payload.bytes, index);
            }
        }

        write_u32(&mut out, name_offset);
        write_u32(&mut out, mesh.vertices.len() as u32);
        write_u32(&mut out, vertex_offset);
        write_u32(&mut out, mesh.polygons.len() as u32);
        write_u32(&mut out, polygon_offset);
    }

    // Node records + payload
    for node in &scene.nodes {
        let name_offset = payload.push_cstr(&node.name);
        let matrix_offset = payload.cursor();
        for row in &node.matrix {
            for &v in row {
                write_f32(&mut payload.bytes, v);
            }
        }

        write_u32(&mut out, name_offset);
        write_u32(&mut out, matrix_offset);
        write_u32(&mut out, node.parent_index.unwrap_or(MAP_INVALID_INDEX));
        write_u32(&mut out, node.mesh_index.unwrap_or(MAP_INVALID_INDEX));
    }

    // Texture records + payload
    for texture in &scene.textures {
        let name_offset = payload.push_cstr(&texture.name);
        let filename_offset = payload.push_cstr(&texture.filename);
        write_u32(&mut out, name_offset);
        write_u32(&mut out, filename_offset);
    }

    debug_assert_eq!(out.len(), base);
    out.extend_from_slice(&payload.bytes);
    debug_assert_eq!(out.len(), total);
    Ok(out)
}
