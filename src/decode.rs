//! Map binary reader — decode a flat byte buffer into a validated [`Scene`].
//!
//! Decoding runs strictly in header → mesh → node → texture order and
//! aborts on the first violation, so the error a malformed buffer produces
//! is deterministic. All cross-references (array descriptors, string
//! offsets, the node matrix block) are range-checked before any byte is
//! read through them; nothing in this module does unchecked arithmetic on
//! untrusted offsets.

use std::borrow::Cow;
use std::ops::Range;

use crate::error::{MapError, Result};
use crate::scene::{Mesh, Node, Polygon, Scene, Texture, Vertex, MAP_INVALID_INDEX, MAP_SIGNATURE};

pub(crate) const HEADER_SIZE: usize = 28;
pub(crate) const MESH_RECORD_SIZE: usize = 20;
pub(crate) const NODE_RECORD_SIZE: usize = 16;
pub(crate) const TEXTURE_RECORD_SIZE: usize = 8;
pub(crate) const VERTEX_SIZE: usize = 32;
// Polygon records are packed: index_count(1) + index[4](16), no padding.
pub(crate) const POLYGON_SIZE: usize = 17;
pub(crate) const MATRIX_SIZE: usize = 64;

// ============================================================================
// Byte reading helpers
// ============================================================================

// Callers guarantee `pos + 4 <= buf.len()` by resolving ranges first.

fn read_u32_at(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

fn read_f32_at(buf: &[u8], pos: usize) -> f32 {
    f32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

/// Resolve an (offset, count, element size) triple to a byte range fully
/// inside the buffer. Overflow of the candidate end is itself a failure.
/// A count of zero is always valid, whatever the offset holds.
fn resolve_range(
    context: &'static str,
    buf_len: usize,
    offset: u32,
    count: u32,
    elem_size: usize,
) -> Result<Range<usize>> {
    if count == 0 {
        return Ok(0..0);
    }
    let out_of_bounds = || MapError::OutOfBounds {
        context,
        offset,
        count,
        buffer_len: buf_len,
    };
    let byte_len = (count as usize)
        .checked_mul(elem_size)
        .ok_or_else(out_of_bounds)?;
    let start = offset as usize;
    let end = start.checked_add(byte_len).ok_or_else(out_of_bounds)?;
    if end > buf_len {
        return Err(out_of_bounds());
    }
    Ok(start..end)
}

/// Read the NUL-terminated string at `offset`. Borrows from the buffer;
/// invalid UTF-8 is replaced rather than rejected.
fn read_cstr(buf: &[u8], offset: u32) -> Result<Cow<'_, str>> {
    let tail = buf
        .get(offset as usize..)
        .ok_or(MapError::UnterminatedString { offset })?;
    let nul = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(MapError::UnterminatedString { offset })?;
    Ok(String::from_utf8_lossy(&tail[..nul]))
}

// ============================================================================
// Header
// ============================================================================

/// A (count, offset) pair from the header.
#[derive(Debug, Clone, Copy)]
struct ArrayDescriptor {
    count: u32,
    offset: u32,
}

struct Header {
    meshes: ArrayDescriptor,
    nodes: ArrayDescriptor,
    textures: ArrayDescriptor,
}

fn read_header(buf: &[u8]) -> Result<Header> {
    if buf.len() < HEADER_SIZE {
        return Err(MapError::Truncated { len: buf.len() });
    }
    let signature = read_u32_at(buf, 0);
    if signature != MAP_SIGNATURE {
        return Err(MapError::BadSignature { found: signature });
    }
    let descriptor = |pos| ArrayDescriptor {
        count: read_u32_at(buf, pos),
        offset: read_u32_at(buf, pos + 4),
    };
    Ok(Header {
        meshes: descriptor(4),
        nodes: descriptor(12),
        textures: descriptor(20),
    })
}

// ============================================================================
// Record decoders
// ============================================================================

fn decode_meshes(buf: &[u8], desc: ArrayDescriptor) -> Result<Vec<Mesh>> {
    let table = resolve_range("mesh table", buf.len(), desc.offset, desc.count, MESH_RECORD_SIZE)?;
    let mut meshes = Vec::with_capacity(desc.count as usize);
    for i in 0..desc.count as usize {
        let rec = table.start + i * MESH_RECORD_SIZE;
        let name_offset = read_u32_at(buf, rec);
        let vertex_count = read_u32_at(buf, rec + 4);
        let vertex_offset = read_u32_at(buf, rec + 8);
        let polygon_count = read_u32_at(buf, rec + 12);
        let polygon_offset = read_u32_at(buf, rec + 16);

        let name = read_cstr(buf, name_offset)?.into_owned();
        let vertices = decode_vertices(buf, vertex_offset, vertex_count)?;
        let polygons = decode_polygons(buf, polygon_offset, polygon_count, i, vertex_count)?;
        meshes.push(Mesh {
            name,
            vertices,
            polygons,
        });
    }
    Ok(meshes)
}

fn decode_vertices(buf: &[u8], offset: u32, count: u32) -> Result<Vec<Vertex>> {
    let range = resolve_range("vertex array", buf.len(), offset, count, VERTEX_SIZE)?;
    let mut vertices = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let base = range.start + i * VERTEX_SIZE;
        let f = |slot: usize| read_f32_at(buf, base + slot * 4);
        vertices.push(Vertex {
            position: [f(0), f(1), f(2)],
            normal: [f(3), f(4), f(5)],
            uv: [f(6), f(7)],
        });
    }
    Ok(vertices)
}

fn decode_polygons(
    buf: &[u8],
    offset: u32,
    count: u32,
    mesh: usize,
    vertex_count: u32,
) -> Result<Vec<Polygon>> {
    let range = resolve_range("polygon array", buf.len(), offset, count, POLYGON_SIZE)?;
    let mut polygons = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let base = range.start + i * POLYGON_SIZE;
        let index_count = buf[base];
        let indices = [
            read_u32_at(buf, base + 1),
            read_u32_at(buf, base + 5),
            read_u32_at(buf, base + 9),
            read_u32_at(buf, base + 13),
        ];

        if index_count != 3 && index_count != 4 {
            return Err(MapError::InvalidPolygon {
                polygon: i,
                detail: format!("mesh {}: index_count {} not 3 or 4", mesh, index_count),
            });
        }
        // Only the used slots are validated; a triangle's 4th slot is
        // carried verbatim for byte-exact round-tripping.
        for &index in &indices[..index_count as usize] {
            if index >= vertex_count {
                return Err(MapError::InvalidPolygon {
                    polygon: i,
                    detail: format!(
                        "mesh {}: index {} out of range for {} vertices",
                        mesh, index, vertex_count
                    ),
                });
            }
        }
        polygons.push(Polygon {
            index_count,
            indices,
        });
    }
    Ok(polygons)
}

fn decode_nodes(buf: &[u8], desc: ArrayDescriptor, mesh_count: u32) -> Result<Vec<Node>> {
    let table = resolve_range("node table", buf.len(), desc.offset, desc.count, NODE_RECORD_SIZE)?;
    let mut nodes = Vec::with_capacity(desc.count as usize);
    for i in 0..desc.count as usize {
        let rec = table.start + i * NODE_RECORD_SIZE;
        let name_offset = read_u32_at(buf, rec);
        let matrix_offset = read_u32_at(buf, rec + 4);
        let parent_index = read_u32_at(buf, rec + 8);
        let mesh_index = read_u32_at(buf, rec + 12);

        let name = read_cstr(buf, name_offset)?.into_owned();
        let matrix = decode_matrix(buf, matrix_offset)?;
        let parent_index = decode_reference(i, "parent_index", parent_index, desc.count)?;
        let mesh_index = decode_reference(i, "mesh_index", mesh_index, mesh_count)?;
        nodes.push(Node {
            name,
            matrix,
            parent_index,
            mesh_index,
        });
    }
    Ok(nodes)
}

fn decode_matrix(buf: &[u8], offset: u32) -> Result<[[f32; 4]; 4]> {
    let range = resolve_range("node matrix", buf.len(), offset, 16, MATRIX_SIZE / 16)?;
    let mut matrix = [[0.0f32; 4]; 4];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            *value = read_f32_at(buf, range.start + (i * 4 + j) * 4);
        }
    }
    Ok(matrix)
}

/// A raw reference field is either the absent sentinel, a valid positional
/// index, or an error.
fn decode_reference(
    node: usize,
    field: &'static str,
    index: u32,
    limit: u32,
) -> Result<Option<u32>> {
    if index == MAP_INVALID_INDEX {
        Ok(None)
    } else if index < limit {
        Ok(Some(index))
    } else {
        Err(MapError::InvalidIndex {
            node,
            field,
            index,
            limit,
        })
    }
}

fn decode_textures(buf: &[u8], desc: ArrayDescriptor) -> Result<Vec<Texture>> {
    let table = resolve_range(
        "texture table",
        buf.len(),
        desc.offset,
        desc.count,
        TEXTURE_RECORD_SIZE,
    )?;
    let mut textures = Vec::with_capacity(desc.count as usize);
    for i in 0..desc.count as usize {
        let rec = table.start + i * TEXTURE_RECORD_SIZE;
        let name_offset = read_u32_at(buf, rec);
        let filename_offset = read_u32_at(buf, rec + 4);
        // Zero-length names and filenames are legal.
        textures.push(Texture {
            name: read_cstr(buf, name_offset)?.into_owned(),
            filename: read_cstr(buf, filename_offset)?.into_owned(),
        });
    }
    Ok(textures)
}

// ============================================================================
// Scene assembly
// ============================================================================

/// Decode a map buffer into an owned, validated [`Scene`].
///
/// The buffer must be fully addressable; there is no streaming mode.
/// Positional order of meshes, nodes and textures is preserved verbatim
/// because node records reference them by position.
pub fn decode(buf: &[u8]) -> Result<Scene> {
    let header = read_header(buf)?;
    let meshes = decode_meshes(buf, header.meshes)?;
    let nodes = decode_nodes(buf, header.nodes, header.meshes.count)?;
    crate::scene::check_hierarchy(&nodes)?;
    let textures = decode_textures(buf, header.textures)?;
    Ok(Scene {
        meshes,
        nodes,
        textures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_map() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAP_SIGNATURE.to_le_bytes());
        for _ in 0..6 {
            buf.extend_from_slice(&0u32.to_le_bytes());
        }
        buf
    }

    #[test]
    fn resolve_zero_count_ignores_offset() {
        let range = resolve_range("test", 4, 0xFFFF_FFFF, 0, 32).unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn resolve_in_bounds() {
        assert_eq!(resolve_range("test", 100, 10, 2, 20).unwrap(), 10..50);
    }

    #[test]
    fn resolve_past_end() {
        let err = resolve_range("test", 100, 90, 1, 20).unwrap_err();
        assert!(matches!(err, MapError::OutOfBounds { offset: 90, .. }));
    }

    #[test]
    fn resolve_end_overflow() {
        let err = resolve_range("test", 100, 0xFFFF_FFFF, 0xFFFF_FFFF, 32).unwrap_err();
        assert!(matches!(err, MapError::OutOfBounds { .. }));
    }

    #[test]
    fn cstr_reads_until_nul() {
        let buf = b"abc\0def";
        assert_eq!(read_cstr(buf, 0).unwrap(), "abc");
        assert_eq!(read_cstr(buf, 1).unwrap(), "bc");
        assert_eq!(read_cstr(buf, 3).unwrap(), "");
    }

    #[test]
    fn cstr_missing_terminator() {
        let buf = b"abc\0def";
        assert_eq!(
            read_cstr(buf, 4),
            Err(MapError::UnterminatedString { offset: 4 })
        );
    }

    #[test]
    fn cstr_offset_past_end() {
        assert_eq!(
            read_cstr(b"a\0", 99),
            Err(MapError::UnterminatedString { offset: 99 })
        );
    }

    #[test]
    fn header_truncated() {
        let buf = empty_map();
        for len in 0..HEADER_SIZE {
            assert_eq!(
                decode(&buf[..len]),
                Err(MapError::Truncated { len }),
                "length {}",
                len
            );
        }
    }

    #[test]
    fn header_bad_signature() {
        let mut buf = empty_map();
        buf[0] ^= 0x01;
        let found = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        assert_eq!(decode(&buf), Err(MapError::BadSignature { found }));
    }

    #[test]
    fn empty_map_decodes() {
        let scene = decode(&empty_map()).unwrap();
        assert!(scene.meshes.is_empty());
        assert!(scene.nodes.is_empty());
        assert!(scene.textures.is_empty());
    }

    #[test]
    fn reference_sentinel_is_absent() {
        assert_eq!(decode_reference(0, "parent_index", MAP_INVALID_INDEX, 0), Ok(None));
        assert_eq!(decode_reference(0, "mesh_index", 2, 3), Ok(Some(2)));
        assert_eq!(
            decode_reference(1, "mesh_index", 3, 3),
            Err(MapError::InvalidIndex {
                node: 1,
                field: "mesh_index",
                index: 3,
                limit: 3,
            })
        );
    }
}
