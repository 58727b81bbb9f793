//! Bone hierarchy.
//!
//! A [`Skeleton`] owns every node in one dense array indexed by bone id.
//! Parent and child links are plain ids into that array, so the tree is a
//! navigational overlay and never owns anything.

use std::io::Read;

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::format::{ByteReader, NodeKind};
use crate::util::{Error, Mat4, Result};

/// Child id list. Most nodes have a handful of children.
pub type Children = SmallVec<[u32; 4]>;

/// A node of the skeleton tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    id: u32,
    kind: NodeKind,
    bind_pose: Mat4,
    transform: Mat4,
    offset_matrix: Option<Mat4>,
    parent: Option<u32>,
    children: Children,
}

impl Bone {
    /// Create a node whose current transform starts at the bind pose.
    pub fn new(id: u32, bind_pose: Mat4, offset_matrix: Option<Mat4>) -> Self {
        let kind = if offset_matrix.is_some() { NodeKind::Bone } else { NodeKind::Empty };
        Self {
            id,
            kind,
            bind_pose,
            transform: bind_pose,
            offset_matrix,
            parent: None,
            children: Children::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Whether this node is a skinning bone rather than a pivot.
    #[inline]
    pub fn is_bone(&self) -> bool {
        self.kind == NodeKind::Bone
    }

    /// Transform as decoded from the file.
    #[inline]
    pub fn bind_pose(&self) -> &Mat4 {
        &self.bind_pose
    }

    /// Current local transform.
    #[inline]
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Mesh-to-bone matrix, present on skinning bones only.
    #[inline]
    pub fn offset_matrix(&self) -> Option<&Mat4> {
        self.offset_matrix.as_ref()
    }

    #[inline]
    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    /// Child ids in file order.
    #[inline]
    pub fn children(&self) -> &[u32] {
        &self.children
    }

    /// Replace the current transform outright.
    #[inline]
    pub fn set_local(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Set the current transform relative to the bind pose.
    #[inline]
    pub fn set_transform(&mut self, relative: Mat4) {
        self.transform = self.bind_pose * relative;
    }

    /// Restore the bind pose.
    #[inline]
    pub fn reset(&mut self) {
        self.transform = self.bind_pose;
    }
}

/// A decoded skeleton.
#[derive(Clone, Debug)]
pub struct Skeleton {
    bone_count: u32,
    bones: Vec<Bone>,
    root: u32,
    final_transform: Mat4,
    /// World matrix per node, refreshed by [`Skeleton::update_joints`].
    world: Vec<Mat4>,
    /// Skinning matrix per bone, refreshed by [`Skeleton::update_joints`].
    joints: Vec<Mat4>,
}

impl Skeleton {
    /// Decode a skeleton record payload (the record tag is already consumed).
    ///
    /// The node tree is stored depth-first, pre-order. It is decoded with an
    /// explicit stack so hostile nesting cannot exhaust the call stack.
    pub fn decode<R: Read>(r: &mut ByteReader<R>) -> Result<Self> {
        let bone_count = r.read_u32()?;
        let node_count = r.read_u32()?;
        let final_transform = r.read_mat4()?;

        let mut nodes: Vec<Bone> = Vec::new();
        // (index into `nodes`, children still to read)
        let mut stack: Vec<(usize, u32)> = Vec::new();

        let (root, child_count) = read_node(r, bone_count, node_count, nodes.len())?;
        let root_id = root.id;
        nodes.push(root);
        stack.push((0, child_count));

        while let Some(top) = stack.last_mut() {
            if top.1 == 0 {
                stack.pop();
                continue;
            }
            top.1 -= 1;
            let parent_index = top.0;

            let (mut bone, child_count) = read_node(r, bone_count, node_count, nodes.len())?;
            let parent_id = nodes[parent_index].id;
            bone.parent = Some(parent_id);
            nodes[parent_index].children.push(bone.id);
            trace!(id = bone.id, parent = parent_id, child_count, "skeleton node");

            nodes.push(bone);
            stack.push((nodes.len() - 1, child_count));
        }

        let found = nodes.len() as u32;
        if found != node_count {
            return Err(Error::MissingBones { expected: node_count, found });
        }

        nodes.sort_unstable_by_key(Bone::id);
        if let Some(dup) = nodes.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(Error::DuplicateBone(dup[0].id));
        }

        let true_bones = nodes.iter().filter(|b| b.is_bone()).count();
        if true_bones != bone_count as usize {
            warn!(declared = bone_count, found = true_bones, "bone count mismatch");
        }

        let mut skeleton = Self {
            bone_count,
            world: vec![Mat4::IDENTITY; nodes.len()],
            joints: vec![Mat4::IDENTITY; bone_count as usize],
            bones: nodes,
            root: root_id,
            final_transform,
        };
        skeleton.reset_all_joints();
        skeleton.update_joints();
        Ok(skeleton)
    }

    /// Number of skinning bones (length of [`joints`](Self::joints)).
    #[inline]
    pub fn bone_count(&self) -> u32 {
        self.bone_count
    }

    /// Number of tree nodes, bones and pivots.
    #[inline]
    pub fn node_count(&self) -> u32 {
        self.bones.len() as u32
    }

    #[inline]
    pub fn root_id(&self) -> u32 {
        self.root
    }

    #[inline]
    pub fn root(&self) -> &Bone {
        &self.bones[self.root as usize]
    }

    /// Global correction applied to every joint matrix.
    #[inline]
    pub fn final_transform(&self) -> &Mat4 {
        &self.final_transform
    }

    /// All nodes, indexed by id.
    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    pub fn bone(&self, id: u32) -> Option<&Bone> {
        self.bones.get(id as usize)
    }

    #[inline]
    pub fn bone_mut(&mut self, id: u32) -> Option<&mut Bone> {
        self.bones.get_mut(id as usize)
    }

    /// Restore one bone to its bind pose.
    pub fn reset_joint(&mut self, id: u32) {
        if let Some(bone) = self.bone_mut(id) {
            bone.reset();
        }
    }

    /// Restore every bone to its bind pose.
    pub fn reset_all_joints(&mut self) {
        for bone in &mut self.bones {
            bone.reset();
        }
    }

    /// Propagate current transforms down the tree.
    ///
    /// Walks pre-order from the root, computing `parent_world * transform` for
    /// every node, then `final_transform * world * offset_matrix` for every
    /// skinning bone.
    pub fn update_joints(&mut self) {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let bone = &self.bones[id as usize];
            let world = parent_world * bone.transform;
            self.world[id as usize] = world;

            if let Some(offset) = bone.offset_matrix {
                if let Some(joint) = self.joints.get_mut(id as usize) {
                    *joint = self.final_transform * world * offset;
                }
            }

            stack.extend(bone.children.iter().rev().map(|&c| (c, world)));
        }
    }

    /// World matrix of a node as of the last [`update_joints`](Self::update_joints).
    #[inline]
    pub fn world_transform(&self, id: u32) -> Option<&Mat4> {
        self.world.get(id as usize)
    }

    /// Skinning matrices, indexed by bone id.
    #[inline]
    pub fn joints(&self) -> &[Mat4] {
        &self.joints
    }

    /// Skinning matrices as raw bytes for buffer upload.
    #[inline]
    pub fn joints_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.joints)
    }

    /// Pre-order traversal yielding `(depth, bone)`.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst { skeleton: self, stack: vec![(0, self.root)] }
    }
}

/// Iterator returned by [`Skeleton::depth_first`].
pub struct DepthFirst<'a> {
    skeleton: &'a Skeleton,
    stack: Vec<(usize, u32)>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (usize, &'a Bone);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        let bone = &self.skeleton.bones[id as usize];
        self.stack.extend(bone.children.iter().rev().map(|&c| (depth + 1, c)));
        Some((depth, bone))
    }
}

/// Read one node header: kind, id, bind pose, optional offset, child count.
fn read_node<R: Read>(
    r: &mut ByteReader<R>,
    bone_count: u32,
    node_count: u32,
    decoded: usize,
) -> Result<(Bone, u32)> {
    let raw_kind = r.read_u8()?;
    let kind = NodeKind::from_u8(raw_kind).ok_or(Error::UnknownNodeKind(raw_kind))?;
    let id = r.read_u32()?;
    if id >= node_count {
        return Err(Error::BoneIdOutOfRange { id, count: node_count });
    }
    if kind == NodeKind::Bone && id >= bone_count {
        return Err(Error::BoneIdOutOfRange { id, count: bone_count });
    }
    // With every id below node_count, one node too many must be a repeat.
    if decoded as u64 >= u64::from(node_count) {
        return Err(Error::DuplicateBone(id));
    }

    let bind_pose = r.read_mat4()?;
    let offset_matrix = match kind {
        NodeKind::Bone => Some(r.read_mat4()?),
        NodeKind::Empty => None,
    };
    let child_count = r.read_u32()?;

    Ok((Bone::new(id, bind_pose, offset_matrix), child_count))
}
