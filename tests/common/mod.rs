//! FDMD fixture builders shared by the integration tests.

#![allow(dead_code)]

use fdmd::format::{ByteWriter, NodeKind, RecordTag, VertexAttributeTag, ANIMATION_KIND_SKELETAL};
use fdmd::util::{Mat4, Quat, Vec3, Vec4};

/// Skeleton node to encode.
pub struct TestNode {
    pub id: u32,
    pub local: Mat4,
    pub offset: Option<Mat4>,
    pub children: Vec<TestNode>,
}

impl TestNode {
    pub fn bone(id: u32, local: Mat4, children: Vec<TestNode>) -> Self {
        let offset = Mat4::from_translation(Vec3::new(0.0, -(id as f32), 0.0));
        Self { id, local, offset: Some(offset), children }
    }

    pub fn pivot(id: u32, local: Mat4, children: Vec<TestNode>) -> Self {
        Self { id, local, offset: None, children }
    }
}

/// Animation channel to encode.
#[derive(Default)]
pub struct TestChannel {
    pub bone: u8,
    pub positions: Vec<(f32, Vec3)>,
    pub rotations: Vec<(f32, Quat)>,
    pub scales: Vec<(f32, Vec3)>,
}

pub fn writer() -> ByteWriter<Vec<u8>> {
    ByteWriter::new(Vec::new())
}

pub fn write_node(w: &mut ByteWriter<Vec<u8>>, node: &TestNode) {
    let kind = if node.offset.is_some() { NodeKind::Bone } else { NodeKind::Empty };
    w.write_u8(kind as u8).unwrap();
    w.write_u32(node.id).unwrap();
    w.write_mat4(&node.local).unwrap();
    if let Some(offset) = &node.offset {
        w.write_mat4(offset).unwrap();
    }
    w.write_u32(node.children.len() as u32).unwrap();
    for child in &node.children {
        write_node(w, child);
    }
}

pub fn write_skeleton(
    w: &mut ByteWriter<Vec<u8>>,
    bone_count: u32,
    node_count: u32,
    final_transform: Mat4,
    root: &TestNode,
) {
    w.write_u8(RecordTag::Skeleton as u8).unwrap();
    w.write_u32(bone_count).unwrap();
    w.write_u32(node_count).unwrap();
    w.write_mat4(&final_transform).unwrap();
    write_node(w, root);
}

pub fn write_animation(w: &mut ByteWriter<Vec<u8>>, id: u8, duration: f32, channels: &[TestChannel]) {
    w.write_u8(RecordTag::Animation as u8).unwrap();
    w.write_u8(id).unwrap();
    w.write_f32(duration).unwrap();
    w.write_u32(channels.len() as u32).unwrap();
    w.write_u8(ANIMATION_KIND_SKELETAL).unwrap();
    for ch in channels {
        w.write_u8(ch.bone).unwrap();
        w.write_u8(1).unwrap(); // pre: constant
        w.write_u8(3).unwrap(); // post: repeat
        w.write_u8(ch.positions.len() as u8).unwrap();
        for &(t, v) in &ch.positions {
            w.write_f32(t).unwrap();
            w.write_vec3(v).unwrap();
        }
        w.write_u8(ch.rotations.len() as u8).unwrap();
        for &(t, q) in &ch.rotations {
            w.write_f32(t).unwrap();
            w.write_quat(q).unwrap();
        }
        w.write_u8(ch.scales.len() as u8).unwrap();
        for &(t, v) in &ch.scales {
            w.write_f32(t).unwrap();
            w.write_vec3(v).unwrap();
        }
    }
}

/// Triangle mesh with positions only.
pub fn write_triangle(w: &mut ByteWriter<Vec<u8>>, mesh_id: u8) {
    w.write_u8(RecordTag::Mesh as u8).unwrap();
    w.write_u8(mesh_id).unwrap();
    w.write_u32(3).unwrap();
    w.write_u8(VertexAttributeTag::Position as u8).unwrap();
    for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
        w.write_vec3(p).unwrap();
    }
    w.write_u8(VertexAttributeTag::EndMesh as u8).unwrap();
}

/// Two skinned vertices carrying every attribute kind after the normals.
pub fn write_skinned_mesh(w: &mut ByteWriter<Vec<u8>>, mesh_id: u8) {
    w.write_u8(RecordTag::Mesh as u8).unwrap();
    w.write_u8(mesh_id).unwrap();
    w.write_u32(2).unwrap();
    w.write_u8(VertexAttributeTag::Position as u8).unwrap();
    w.write_vec3(Vec3::ZERO).unwrap();
    w.write_vec3(Vec3::Y).unwrap();
    w.write_u8(VertexAttributeTag::Color as u8).unwrap();
    w.write_vec4(Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();
    w.write_vec4(Vec4::new(0.0, 0.5, 1.0, 0.25)).unwrap();
    w.write_u8(VertexAttributeTag::TexCoord3 as u8).unwrap();
    w.write_u8(1).unwrap(); // texture set
    w.write_vec3(Vec3::new(0.0, 0.0, 0.5)).unwrap();
    w.write_vec3(Vec3::new(1.0, 1.0, 0.5)).unwrap();
    w.write_u8(VertexAttributeTag::BoneId as u8).unwrap();
    w.write_u8(4).unwrap();
    for id in [0u32, 1, 0, 0, 1, 2, 0, 0] {
        w.write_u32(id).unwrap();
    }
    w.write_u8(VertexAttributeTag::BoneWeight as u8).unwrap();
    w.write_u8(4).unwrap();
    for weight in [0.75f32, 0.25, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0] {
        w.write_f32(weight).unwrap();
    }
    w.write_u8(VertexAttributeTag::EndMesh as u8).unwrap();
}

/// Root bone 0 with children A (bone 1) and B (bone 2).
pub fn three_bones() -> TestNode {
    TestNode::bone(
        0,
        Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
        vec![
            TestNode::bone(1, Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)), vec![]),
            TestNode::bone(2, Mat4::from_rotation_z(0.3), vec![]),
        ],
    )
}

/// Position-only bounce on bone A: x goes 0, 1, 0 at t = 0, 1, 2.
pub fn bounce_channel() -> TestChannel {
    TestChannel {
        bone: 1,
        positions: vec![(0.0, Vec3::ZERO), (1.0, Vec3::X), (2.0, Vec3::ZERO)],
        ..Default::default()
    }
}

/// One triangle, the three-bone skeleton and the bounce animation (id 0,
/// duration 2s).
pub fn scenario_file() -> Vec<u8> {
    let mut w = writer();
    w.write_header(1, 1).unwrap();
    write_triangle(&mut w, 0);
    write_skeleton(&mut w, 3, 3, Mat4::IDENTITY, &three_bones());
    write_animation(&mut w, 0, 2.0, &[bounce_channel()]);
    w.write_end().unwrap();
    w.into_inner()
}
