//! Owned in-memory model for a decoded map scene.
//!
//! Every type here is plain owned data: a [`Scene`] produced by
//! [`decode`](crate::decode::decode) copies names and arrays out of the
//! input buffer and lives independently of it. Entities are read-only by
//! convention — producing a changed scene means building a new value and
//! re-encoding it.

use cgmath::Matrix4;

use crate::error::{MapError, Result};

/// File magic: `"MAP\0"` read as a little-endian u32.
pub const MAP_SIGNATURE: u32 = 0x0050_414D;

/// Reserved index meaning "reference absent" (exporters write -1).
pub const MAP_INVALID_INDEX: u32 = 0xFFFF_FFFF;

/// A single mesh vertex: position, normal and one uv channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// A triangle or quad referencing vertices of its owning mesh.
///
/// `indices` always has four slots; only the first `index_count` are
/// meaningful. The unused slot of a triangle is carried verbatim through
/// decode and encode, never validated or zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polygon {
    pub index_count: u8,
    pub indices: [u32; 4],
}

impl Polygon {
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Polygon {
            index_count: 3,
            indices: [a, b, c, 0],
        }
    }

    pub fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        Polygon {
            index_count: 4,
            indices: [a, b, c, d],
        }
    }

    /// The indices actually referenced by this polygon.
    pub fn used_indices(&self) -> &[u32] {
        &self.indices[..usize::min(self.index_count as usize, 4)]
    }
}

/// A named vertex/polygon buffer pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub polygons: Vec<Polygon>,
}

/// A scene-graph entry referencing an optional mesh and an optional parent.
///
/// `matrix` is the node's local transform relative to its parent, stored
/// exactly as laid out in the file: row-vector convention, so each stored
/// row is a column of the equivalent column-vector matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub matrix: [[f32; 4]; 4],
    /// Position of the parent node in [`Scene::nodes`], if any.
    pub parent_index: Option<u32>,
    /// Position of the referenced mesh in [`Scene::meshes`], if any.
    pub mesh_index: Option<u32>,
}

impl Node {
    /// The local transform as a column-vector [`Matrix4`], undoing the
    /// file's row-vector storage.
    pub fn local_matrix(&self) -> Matrix4<f32> {
        let m = &self.matrix;
        Matrix4::new(
            m[0][0], m[0][1], m[0][2], m[0][3], //
            m[1][0], m[1][1], m[1][2], m[1][3], //
            m[2][0], m[2][1], m[2][2], m[2][3], //
            m[3][0], m[3][1], m[3][2], m[3][3],
        )
    }
}

/// A named reference to an external texture file. Only the filename is
/// modeled; pixel data is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Texture {
    pub name: String,
    pub filename: String,
}

/// A fully decoded, validated map: meshes, node hierarchy and texture
/// references, each in the positional order of the source buffer.
///
/// Order matters: `parent_index` and `mesh_index` are positional, so the
/// sequences must never be reordered without rewriting the references.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub nodes: Vec<Node>,
    pub textures: Vec<Texture>,
}

impl Scene {
    /// World transform of a node: the product of its local matrix with
    /// every ancestor's, root first.
    ///
    /// Returns `None` for an out-of-range index. The walk assumes the
    /// hierarchy is a forest, which decode and encode both enforce; a
    /// hand-built cyclic scene stops after one pass over the node set.
    pub fn world_matrix(&self, node_index: usize) -> Option<Matrix4<f32>> {
        let node = self.nodes.get(node_index)?;
        let mut world = node.local_matrix();
        let mut parent = node.parent_index;
        let mut hops = 0;
        while let Some(p) = parent {
            let ancestor = self.nodes.get(p as usize)?;
            world = ancestor.local_matrix() * world;
            parent = ancestor.parent_index;
            hops += 1;
            if hops > self.nodes.len() {
                break;
            }
        }
        Some(world)
    }
}

/// Verify the forest property: following parent links from every node must
/// reach "absent" without revisiting a node.
///
/// Callers must have validated `parent_index` bounds first. Nodes are
/// walked in positional order so the first offending start node is the one
/// reported.
pub(crate) fn check_hierarchy(nodes: &[Node]) -> Result<()> {
    let mut seen = vec![false; nodes.len()];
    for start in 0..nodes.len() {
        seen.fill(false);
        let mut current = start;
        loop {
            if seen[current] {
                return Err(MapError::CyclicHierarchy { node: start });
            }
            seen[current] = true;
            match nodes[current].parent_index {
                Some(parent) => current = parent as usize,
                None => break,
            }
        }
    }
    Ok(())
}
