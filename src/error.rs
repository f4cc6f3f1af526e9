use std::fmt;

/// Map codec error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Buffer is shorter than the fixed header
    Truncated { len: usize },

    /// Header signature does not match the map magic
    BadSignature { found: u32 },

    /// An (offset, count) array descriptor escapes the buffer
    OutOfBounds {
        context: &'static str,
        offset: u32,
        count: u32,
        buffer_len: usize,
    },

    /// No NUL terminator between the string offset and the end of the buffer
    UnterminatedString { offset: u32 },

    /// Polygon with unsupported arity or a used index past the vertex count
    InvalidPolygon { polygon: usize, detail: String },

    /// Node parent/mesh reference that is neither the absent sentinel nor in range
    InvalidIndex {
        node: usize,
        field: &'static str,
        index: u32,
        limit: u32,
    },

    /// Following parent links from a node revisits a node
    CyclicHierarchy { node: usize },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Truncated { len } => {
                write!(f, "buffer too short for map header: {} bytes", len)
            }
            MapError::BadSignature { found } => {
                write!(f, "bad map signature 0x{:08X}", found)
            }
            MapError::OutOfBounds {
                context,
                offset,
                count,
                buffer_len,
            } => write!(
                f,
                "{}: {} elements at offset {} escape buffer of {} bytes",
                context, count, offset, buffer_len
            ),
            MapError::UnterminatedString { offset } => {
                write!(f, "unterminated string at offset {}", offset)
            }
            MapError::InvalidPolygon { polygon, detail } => {
                write!(f, "invalid polygon {}: {}", polygon, detail)
            }
            MapError::InvalidIndex {
                node,
                field,
                index,
                limit,
            } => write!(
                f,
                "node {}: {} {} out of range (limit {})",
                node, field, index, limit
            ),
            MapError::CyclicHierarchy { node } => {
                write!(f, "node {}: parent chain contains a cycle", node)
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Result type for map codec operations
pub type Result<T> = std::result::Result<T, MapError>;
