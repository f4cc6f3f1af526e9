//! Codec for the binary `.map` 3D scene asset format.
//!
//! A map file is a flat buffer holding named meshes, a hierarchy of named
//! nodes and named texture references, all addressed through byte offsets
//! relative to the start of the buffer.
//!
//! Binary layout (little-endian):
//! ```text
//! Header  (28 bytes):
//!     signature(4)      — 0x0050414D ("MAP\0")
//!     mesh_count(4)     + mesh_offset(4)
//!     node_count(4)     + node_offset(4)
//!     texture_count(4)  + texture_offset(4)
//!
//! Mesh record (20 bytes):
//!     name_offset(4) + vertex_count(4) + vertex_offset(4) +
//!     polygon_count(4) + polygon_offset(4)
//!
//! Vertex  (32 bytes):  position[3](f32) + normal[3](f32) + uv[2](f32)
//! Polygon (17 bytes, packed):  index_count(1) + index[4](4 each)
//! Node    (16 bytes):  name_offset(4) + matrix_offset(4) +
//!                      parent_index(4) + mesh_index(4)
//! Texture (8 bytes):   name_offset(4) + filename_offset(4)
//! ```
//!
//! Strings are NUL-terminated byte sequences at arbitrary offsets. The
//! node matrix payload is a 64-byte 4×4 f32 block. `parent_index` and
//! `mesh_index` use [`MAP_INVALID_INDEX`] to mean "absent".
//!
//! [`decode`] validates everything up front — offset ranges, string
//! termination, polygon arity and index bounds, node reference bounds and
//! the forest property of the hierarchy — and builds a fully owned
//! [`Scene`] whose lifetime is independent of the input buffer. The first
//! violation aborts the decode; no partial scene is ever returned.
//! [`encode`] is the inverse transform and re-validates the same
//! invariants before emitting bytes.

pub mod builder;
pub mod decode;
pub mod encode;
pub mod error;
pub mod scene;

pub use builder::MeshBuilder;
pub use decode::decode;
pub use encode::encode;
pub use error::{MapError, Result};
pub use scene::{
    Mesh, Node, Polygon, Scene, Texture, Vertex, MAP_INVALID_INDEX, MAP_SIGNATURE,
};
