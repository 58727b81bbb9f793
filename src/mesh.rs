//! Mesh records.
//!
//! Vertex streams are decoded into typed arrays and handed to a [`MeshSink`],
//! the seam where GPU upload lives. Nothing here interprets the geometry.

use std::io::Read;

use tracing::{trace, warn};

use crate::format::{ByteReader, VertexAttributeTag, MAX_WEIGHTS_PER_VERTEX};
use crate::util::{Error, Result, Vec2, Vec3, Vec4};

/// Upper bound on speculative preallocation for untrusted counts.
const MAX_PREALLOC: usize = 1 << 16;

/// One decoded vertex attribute stream.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexAttribute {
    Position(Vec<Vec3>),
    Normal(Vec<Vec3>),
    /// Two-component texture coordinates for texture set `set`.
    TexCoord2 { set: u8, coords: Vec<Vec2> },
    /// Three-component texture coordinates for texture set `set`.
    TexCoord3 { set: u8, coords: Vec<Vec3> },
    /// RGBA vertex colors.
    Color(Vec<Vec4>),
    /// Skinning bone indices, `per_vertex` entries per vertex.
    BoneIds { per_vertex: u8, ids: Vec<u32> },
    /// Skinning weights, `per_vertex` entries per vertex.
    BoneWeights { per_vertex: u8, weights: Vec<f32> },
}

impl VertexAttribute {
    /// The tag this attribute is stored under.
    pub fn tag(&self) -> VertexAttributeTag {
        match self {
            Self::Position(_) => VertexAttributeTag::Position,
            Self::Normal(_) => VertexAttributeTag::Normal,
            Self::TexCoord2 { .. } => VertexAttributeTag::TexCoord2,
            Self::TexCoord3 { .. } => VertexAttributeTag::TexCoord3,
            Self::Color(_) => VertexAttributeTag::Color,
            Self::BoneIds { .. } => VertexAttributeTag::BoneId,
            Self::BoneWeights { .. } => VertexAttributeTag::BoneWeight,
        }
    }

    /// Decode the payload of an attribute whose tag was already consumed.
    fn decode<R: Read>(
        tag: VertexAttributeTag,
        vertex_count: u32,
        r: &mut ByteReader<R>,
    ) -> Result<Self> {
        let n = vertex_count as usize;
        let attr = match tag {
            VertexAttributeTag::Position => Self::Position(read_array(r, n, |r| r.read_vec3())?),
            VertexAttributeTag::Normal => Self::Normal(read_array(r, n, |r| r.read_vec3())?),
            VertexAttributeTag::TexCoord2 => {
                let set = r.read_u8()?;
                Self::TexCoord2 { set, coords: read_array(r, n, |r| r.read_vec2())? }
            }
            VertexAttributeTag::TexCoord3 => {
                let set = r.read_u8()?;
                Self::TexCoord3 { set, coords: read_array(r, n, |r| r.read_vec3())? }
            }
            VertexAttributeTag::Color => Self::Color(read_array(r, n, |r| r.read_vec4())?),
            VertexAttributeTag::BoneId => {
                let per_vertex = read_influence_count(r)?;
                let total = n.saturating_mul(per_vertex as usize);
                Self::BoneIds { per_vertex, ids: read_array(r, total, |r| r.read_u32())? }
            }
            VertexAttributeTag::BoneWeight => {
                let per_vertex = read_influence_count(r)?;
                let total = n.saturating_mul(per_vertex as usize);
                Self::BoneWeights { per_vertex, weights: read_array(r, total, |r| r.read_f32())? }
            }
            VertexAttributeTag::EndMesh => {
                return Err(Error::invalid("end-of-mesh tag has no payload"));
            }
        };
        Ok(attr)
    }
}

/// Per-vertex influence count of a skinning stream.
fn read_influence_count<R: Read>(r: &mut ByteReader<R>) -> Result<u8> {
    let per_vertex = r.read_u8()?;
    if per_vertex > MAX_WEIGHTS_PER_VERTEX {
        warn!(per_vertex, "more bone influences per vertex than usual");
    }
    Ok(per_vertex)
}

/// Read `count` items, never preallocating more than the stream can back.
fn read_array<R: Read, T>(
    r: &mut ByteReader<R>,
    count: usize,
    mut item: impl FnMut(&mut ByteReader<R>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        out.push(item(r)?);
    }
    Ok(out)
}

/// A decoded mesh record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub mesh_id: u8,
    pub vertex_count: u32,
    /// Attribute streams in file order.
    pub attributes: Vec<VertexAttribute>,
}

impl MeshData {
    /// Decode a mesh record payload (the record tag is already consumed).
    pub fn decode<R: Read>(r: &mut ByteReader<R>) -> Result<Self> {
        let mesh_id = r.read_u8()?;
        let vertex_count = r.read_u32()?;
        let mut attributes = Vec::new();

        loop {
            let offset = r.position();
            let raw = r.read_u8()?;
            let tag = VertexAttributeTag::from_u8(raw)
                .ok_or(Error::UnknownVertexAttribute { tag: raw, offset })?;
            if tag == VertexAttributeTag::EndMesh {
                break;
            }
            trace!(mesh_id, ?tag, vertex_count, "vertex attribute");
            attributes.push(VertexAttribute::decode(tag, vertex_count, r)?);
        }

        Ok(Self { mesh_id, vertex_count, attributes })
    }

    /// First attribute carrying the given tag.
    pub fn attribute(&self, tag: VertexAttributeTag) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.tag() == tag)
    }

    pub fn positions(&self) -> Option<&[Vec3]> {
        match self.attribute(VertexAttributeTag::Position)? {
            VertexAttribute::Position(p) => Some(p),
            _ => None,
        }
    }

    pub fn normals(&self) -> Option<&[Vec3]> {
        match self.attribute(VertexAttributeTag::Normal)? {
            VertexAttribute::Normal(n) => Some(n),
            _ => None,
        }
    }

    /// Whether the mesh carries skinning data.
    pub fn is_skinned(&self) -> bool {
        self.attribute(VertexAttributeTag::BoneId).is_some()
            && self.attribute(VertexAttributeTag::BoneWeight).is_some()
    }
}

/// Receiver for decoded meshes, typically a GPU upload path.
pub trait MeshSink {
    fn upload(&mut self, mesh: MeshData);
}

impl MeshSink for Vec<MeshData> {
    fn upload(&mut self, mesh: MeshData) {
        self.push(mesh);
    }
}

/// Sink that drops every mesh.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardMeshes;

impl MeshSink for DiscardMeshes {
    fn upload(&mut self, _mesh: MeshData) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn test_decode_triangle() {
        let mut bytes = vec![7u8];
        bytes.extend_from_slice(&3u32.to_be_bytes());
        bytes.push(VertexAttributeTag::Position as u8);
        bytes.extend(be(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]));
        bytes.push(VertexAttributeTag::TexCoord2 as u8);
        bytes.push(0); // texture set
        bytes.extend(be(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]));
        bytes.push(VertexAttributeTag::EndMesh as u8);

        let mut r = ByteReader::from_bytes(&bytes);
        let mesh = MeshData::decode(&mut r).unwrap();
        assert_eq!(mesh.mesh_id, 7);
        assert_eq!(mesh.vertex_count, 3);
        assert_eq!(mesh.positions().unwrap()[1], Vec3::X);
        assert!(matches!(
            &mesh.attributes[1],
            VertexAttribute::TexCoord2 { set: 0, coords } if coords[2] == Vec2::Y
        ));
        assert!(!mesh.is_skinned());
        assert!(r.eof());
    }

    #[test]
    fn test_zero_vertices_reads_no_payload() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(VertexAttributeTag::Position as u8);
        bytes.push(VertexAttributeTag::Normal as u8);
        bytes.push(VertexAttributeTag::EndMesh as u8);
        bytes.push(0xAA); // next record must stay untouched

        let mut r = ByteReader::from_bytes(&bytes);
        let mesh = MeshData::decode(&mut r).unwrap();
        assert_eq!(mesh.attributes, vec![
            VertexAttribute::Position(Vec::new()),
            VertexAttribute::Normal(Vec::new()),
        ]);
        assert_eq!(r.read_u8().unwrap(), 0xAA);
    }

    #[test]
    fn test_skinning_streams() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.push(VertexAttributeTag::BoneId as u8);
        bytes.push(4);
        for id in [0u32, 1, 2, 3] {
            bytes.extend_from_slice(&id.to_be_bytes());
        }
        bytes.push(VertexAttributeTag::BoneWeight as u8);
        bytes.push(4);
        bytes.extend(be(&[0.4, 0.3, 0.2, 0.1]));
        bytes.push(VertexAttributeTag::EndMesh as u8);

        let mesh = MeshData::decode(&mut ByteReader::from_bytes(&bytes)).unwrap();
        assert!(mesh.is_skinned());
        assert_eq!(mesh.attributes[0], VertexAttribute::BoneIds {
            per_vertex: 4,
            ids: vec![0, 1, 2, 3],
        });
    }

    #[test]
    fn test_color_and_texcoord3_keep_alignment() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.push(VertexAttributeTag::TexCoord3 as u8);
        bytes.push(2); // texture set
        bytes.extend(be(&[0.0, 0.5, 1.0, 1.0, 0.5, 0.0]));
        bytes.push(VertexAttributeTag::Color as u8);
        bytes.extend(be(&[1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.5]));
        bytes.push(VertexAttributeTag::EndMesh as u8);
        bytes.push(0xAA);

        let mut r = ByteReader::from_bytes(&bytes);
        let mesh = MeshData::decode(&mut r).unwrap();
        assert_eq!(mesh.attributes, vec![
            VertexAttribute::TexCoord3 {
                set: 2,
                coords: vec![Vec3::new(0.0, 0.5, 1.0), Vec3::new(1.0, 0.5, 0.0)],
            },
            VertexAttribute::Color(vec![
                Vec4::new(1.0, 0.0, 0.0, 1.0),
                Vec4::new(0.0, 1.0, 0.0, 0.5),
            ]),
        ]);
        assert_eq!(r.read_u8().unwrap(), 0xAA);
    }

    #[test]
    fn test_unknown_attribute() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(9);
        let err = MeshData::decode(&mut ByteReader::from_bytes(&bytes)).unwrap_err();
        assert!(matches!(err, Error::UnknownVertexAttribute { tag: 9, offset: 5 }));
    }

    #[test]
    fn test_truncated_positions() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.push(VertexAttributeTag::Position as u8);
        bytes.extend(be(&[1.0, 2.0, 3.0]));
        let err = MeshData::decode(&mut ByteReader::from_bytes(&bytes)).unwrap_err();
        assert!(err.is_truncation());
    }
}
