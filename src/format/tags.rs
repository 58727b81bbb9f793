//! FDMD format constants and tag tables.
//!
//! ## File Structure
//!
//! ```text
//! +------------------+
//! | Mesh count       |  u8
//! +------------------+
//! | Animation count  |  u8
//! +------------------+
//! | Record tag       |  u8 (1 mesh, 2 skeleton, 3 animation)
//! | Record payload   |
//! +------------------+
//! | ...              |
//! +------------------+
//! | End tag (0)      |  u8
//! +------------------+
//! ```
//!
//! All multi-byte integers and floats are big-endian. The tag values are part
//! of the file format and must never change.

/// Size of the reader's refill buffer.
pub const READ_BUFFER_SIZE: usize = 8192;

/// Bone influences per vertex written by every known exporter.
pub const MAX_WEIGHTS_PER_VERTEX: u8 = 4;

/// Top-level record tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordTag {
    EndFile = 0,
    Mesh = 1,
    Skeleton = 2,
    Animation = 3,
}

impl RecordTag {
    /// Convert a raw tag byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::EndFile),
            1 => Some(Self::Mesh),
            2 => Some(Self::Skeleton),
            3 => Some(Self::Animation),
            _ => None,
        }
    }
}

/// Vertex attribute tags inside a mesh record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VertexAttributeTag {
    EndMesh = 0,
    Position = 1,
    Normal = 2,
    TexCoord2 = 3,
    TexCoord3 = 4,
    Color = 5,
    BoneId = 6,
    BoneWeight = 7,
}

impl VertexAttributeTag {
    /// Convert a raw tag byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::EndMesh),
            1 => Some(Self::Position),
            2 => Some(Self::Normal),
            3 => Some(Self::TexCoord2),
            4 => Some(Self::TexCoord3),
            5 => Some(Self::Color),
            6 => Some(Self::BoneId),
            7 => Some(Self::BoneWeight),
            _ => None,
        }
    }
}

/// Skeleton node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeKind {
    /// Plain pivot, participates in the hierarchy only.
    Empty = 1,
    /// Skinning bone, carries an offset matrix.
    Bone = 2,
}

impl NodeKind {
    /// Convert a raw kind byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Empty),
            2 => Some(Self::Bone),
            _ => None,
        }
    }
}

/// Animation kind byte. Only skeletal animation exists.
pub const ANIMATION_KIND_SKELETAL: u8 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tags() {
        for tag in [
            RecordTag::EndFile,
            RecordTag::Mesh,
            RecordTag::Skeleton,
            RecordTag::Animation,
        ] {
            assert_eq!(RecordTag::from_u8(tag as u8), Some(tag));
        }
        assert_eq!(RecordTag::from_u8(4), None);
    }

    #[test]
    fn test_vertex_tags() {
        assert_eq!(VertexAttributeTag::from_u8(0), Some(VertexAttributeTag::EndMesh));
        assert_eq!(VertexAttributeTag::from_u8(7), Some(VertexAttributeTag::BoneWeight));
        assert_eq!(VertexAttributeTag::from_u8(8), None);
    }

    #[test]
    fn test_node_kinds() {
        assert_eq!(NodeKind::from_u8(0), None);
        assert_eq!(NodeKind::from_u8(1), Some(NodeKind::Empty));
        assert_eq!(NodeKind::from_u8(2), Some(NodeKind::Bone));
    }
}
