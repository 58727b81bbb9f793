//! Big-endian FDMD writer.
//!
//! Mirrors [`ByteReader`](super::ByteReader): primitive writes plus one
//! encoder per record kind, byte-for-byte what the decoders consume.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use super::tags::{NodeKind, RecordTag, VertexAttributeTag, ANIMATION_KIND_SKELETAL};
use crate::anim::{Animation, QuatKey, VectorKey};
use crate::mesh::{MeshData, VertexAttribute};
use crate::skeleton::Skeleton;
use crate::util::{Error, Mat4, Quat, Result, Vec2, Vec3, Vec4};

/// Output stream for FDMD data.
pub struct ByteWriter<W> {
    writer: W,
    pos: u64,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, pos: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.writer.write_u16::<BigEndian>(value)?;
        self.pos += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<BigEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<BigEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    fn write_f32s(&mut self, values: &[f32]) -> Result<()> {
        values.iter().try_for_each(|&v| self.write_f32(v))
    }

    pub fn write_vec2(&mut self, v: Vec2) -> Result<()> {
        self.write_f32s(&v.to_array())
    }

    pub fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32s(&v.to_array())
    }

    pub fn write_vec4(&mut self, v: Vec4) -> Result<()> {
        self.write_f32s(&v.to_array())
    }

    /// Write a quaternion as `w, x, y, z`.
    pub fn write_quat(&mut self, q: Quat) -> Result<()> {
        self.write_f32s(&[q.w, q.x, q.y, q.z])
    }

    /// Write sixteen floats in column-major order.
    pub fn write_mat4(&mut self, m: &Mat4) -> Result<()> {
        self.write_f32s(&m.to_cols_array())
    }

    /// File header: mesh count and animation count.
    pub fn write_header(&mut self, mesh_count: u8, anim_count: u8) -> Result<()> {
        self.write_u8(mesh_count)?;
        self.write_u8(anim_count)
    }

    /// End-of-file record.
    pub fn write_end(&mut self) -> Result<()> {
        self.write_u8(RecordTag::EndFile as u8)
    }

    /// Mesh record, tag included.
    pub fn write_mesh(&mut self, mesh: &MeshData) -> Result<()> {
        self.write_u8(RecordTag::Mesh as u8)?;
        self.write_u8(mesh.mesh_id)?;
        self.write_u32(mesh.vertex_count)?;

        for attr in &mesh.attributes {
            self.write_u8(attr.tag() as u8)?;
            match attr {
                VertexAttribute::Position(v) | VertexAttribute::Normal(v) => {
                    v.iter().try_for_each(|&p| self.write_vec3(p))?;
                }
                VertexAttribute::TexCoord2 { set, coords } => {
                    self.write_u8(*set)?;
                    coords.iter().try_for_each(|&c| self.write_vec2(c))?;
                }
                VertexAttribute::TexCoord3 { set, coords } => {
                    self.write_u8(*set)?;
                    coords.iter().try_for_each(|&c| self.write_vec3(c))?;
                }
                VertexAttribute::Color(c) => {
                    c.iter().try_for_each(|&c| self.write_vec4(c))?;
                }
                VertexAttribute::BoneIds { per_vertex, ids } => {
                    self.write_u8(*per_vertex)?;
                    ids.iter().try_for_each(|&id| self.write_u32(id))?;
                }
                VertexAttribute::BoneWeights { per_vertex, weights } => {
                    self.write_u8(*per_vertex)?;
                    self.write_f32s(weights)?;
                }
            }
        }
        self.write_u8(VertexAttributeTag::EndMesh as u8)
    }

    /// Skeleton record, tag included. Nodes are written depth-first, pre-order,
    /// each with its current bind pose.
    pub fn write_skeleton(&mut self, skeleton: &Skeleton) -> Result<()> {
        self.write_u8(RecordTag::Skeleton as u8)?;
        self.write_u32(skeleton.bone_count())?;
        self.write_u32(skeleton.node_count())?;
        self.write_mat4(skeleton.final_transform())?;

        for (_, bone) in skeleton.depth_first() {
            self.write_u8(bone.kind() as u8)?;
            self.write_u32(bone.id())?;
            self.write_mat4(bone.bind_pose())?;
            if let Some(offset) = bone.offset_matrix() {
                debug_assert_eq!(bone.kind(), NodeKind::Bone);
                self.write_mat4(offset)?;
            }
            self.write_u32(bone.children().len() as u32)?;
        }
        Ok(())
    }

    /// Animation record, tag included.
    pub fn write_animation(&mut self, anim: &Animation) -> Result<()> {
        self.write_u8(RecordTag::Animation as u8)?;
        self.write_u8(anim.id())?;
        self.write_f32(anim.duration())?;
        self.write_u32(anim.channels().len() as u32)?;
        self.write_u8(ANIMATION_KIND_SKELETAL)?;

        for channel in anim.channels() {
            let bone_id = u8::try_from(channel.bone_id())
                .map_err(|_| Error::invalid("channel bone id does not fit in a byte"))?;
            self.write_u8(bone_id)?;
            self.write_u8(channel.pre_state as u8)?;
            self.write_u8(channel.post_state as u8)?;
            self.write_vector_keys(channel.position_keys())?;
            self.write_u8(key_count(channel.rotation_keys().len())?)?;
            for &QuatKey { time, value } in channel.rotation_keys() {
                self.write_f32(time)?;
                self.write_quat(value)?;
            }
            self.write_vector_keys(channel.scale_keys())?;
        }
        Ok(())
    }

    fn write_vector_keys(&mut self, keys: &[VectorKey]) -> Result<()> {
        self.write_u8(key_count(keys.len())?)?;
        for &VectorKey { time, value } in keys {
            self.write_f32(time)?;
            self.write_vec3(value)?;
        }
        Ok(())
    }
}

fn key_count(len: usize) -> Result<u8> {
    u8::try_from(len).map_err(|_| Error::invalid(format!("{len} keys exceed the 255 key limit")))
}
