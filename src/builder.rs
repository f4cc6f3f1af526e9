//! Mesh assembly with vertex interning.
//!
//! Exporters hand polygons over corner by corner; identical corners
//! (same position, normal and uv) should share one vertex record.
//! [`MeshBuilder`] interns vertices by bit pattern while collecting
//! polygons, so the resulting [`Mesh`] is already deduplicated and its
//! polygon indices are valid by construction.

use std::collections::HashMap;

use crate::error::{MapError, Result};
use crate::scene::{Mesh, Polygon, Vertex};

/// Vertex identity for interning: the raw bit patterns of all eight
/// floats. Distinct NaN payloads and -0.0/+0.0 therefore intern as
/// distinct vertices, which keeps the builder deterministic.
#[derive(PartialEq, Eq, Hash)]
struct VertexKey([u32; 8]);

fn vertex_key(v: &Vertex) -> VertexKey {
    VertexKey([
        v.position[0].to_bits(),
        v.position[1].to_bits(),
        v.position[2].to_bits(),
        v.normal[0].to_bits(),
        v.normal[1].to_bits(),
        v.normal[2].to_bits(),
        v.uv[0].to_bits(),
        v.uv[1].to_bits(),
    ])
}

/// Incrementally builds a [`Mesh`] from triangles and quads.
pub struct MeshBuilder {
    name: String,
    vertices: Vec<Vertex>,
    polygons: Vec<Polygon>,
    lookup: HashMap<VertexKey, u32>,
}

impl MeshBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        MeshBuilder {
            name: name.into(),
            vertices: Vec::new(),
            polygons: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Append one polygon given its corner vertices, in winding order.
    /// Corners equal to an already seen vertex reuse its index. Fails
    /// `InvalidPolygon` for corner counts other than 3 or 4.
    pub fn add_polygon(&mut self, corners: &[Vertex]) -> Result<()> {
        if corners.len() != 3 && corners.len() != 4 {
            return Err(MapError::InvalidPolygon {
                polygon: self.polygons.len(),
                detail: format!("unsupported corner count {}", corners.len()),
            });
        }
        let mut polygon = Polygon {
            index_count: corners.len() as u8,
            indices: [0; 4],
        };
        for (slot, corner) in corners.iter().enumerate() {
            polygon.indices[slot] = self.intern(corner);
        }
        self.polygons.push(polygon);
        Ok(())
    }

    fn intern(&mut self, vertex: &Vertex) -> u32 {
        let next = self.vertices.len() as u32;
        match self.lookup.entry(vertex_key(vertex)) {
            std::collections::hash_map::Entry::Occupied(e) => *e.get(),
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(next);
                self.vertices.push(*vertex);
                next
            }
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn build(self) -> Mesh {
        Mesh {
            name: self.name,
            vertices: self.vertices,
            polygons: self.polygons,
        }
    }
}
