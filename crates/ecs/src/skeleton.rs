//! Arena-allocated joint trees for skinned meshes.
//!
//! # Invariants
//! - `Joint::index` equals the joint's arena slot: dense, zero-based, unique.
//! - Every joint except the root has exactly one parent; the tree is acyclic
//!   because joints can only be attached to already existing joints.
//! - `revision` changes whenever the topology changes and never repeats
//!   across skeletons, so caches can key on it.

use glam::Mat4;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a joint inside its owning [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub u32);

/// A bone. `local` is relative to the parent joint.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub local: Mat4,
    parent: Option<JointId>,
    children: Vec<JointId>,
    index: u32,
}

impl Joint {
    pub fn parent(&self) -> Option<JointId> {
        self.parent
    }

    pub fn children(&self) -> &[JointId] {
        &self.children
    }

    /// Position of this joint in the flattened chain.
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// The joint tree of one skinned mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    joints: Vec<Joint>,
    revision: u64,
}

impl Skeleton {
    /// Create a skeleton holding a single root joint.
    pub fn new(root_name: impl Into<String>, root_local: Mat4) -> Self {
        Self {
            joints: vec![Joint {
                name: root_name.into(),
                local: root_local,
                parent: None,
                children: Vec::new(),
                index: 0,
            }],
            revision: next_revision(),
        }
    }

    pub fn root(&self) -> JointId {
        JointId(0)
    }

    /// Attach a new joint under `parent`. Returns `None` if `parent` does not exist.
    pub fn add_joint(
        &mut self,
        parent: JointId,
        name: impl Into<String>,
        local: Mat4,
    ) -> Option<JointId> {
        if parent.0 as usize >= self.joints.len() {
            return None;
        }
        let id = JointId(self.joints.len() as u32);
        self.joints.push(Joint {
            name: name.into(),
            local,
            parent: Some(parent),
            children: Vec::new(),
            index: id.0,
        });
        self.joints[parent.0 as usize].children.push(id);
        self.revision = next_revision();
        Some(id)
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.0 as usize)
    }

    /// Replace a joint's local matrix. Posing does not change the revision.
    pub fn set_local(&mut self, id: JointId, local: Mat4) -> bool {
        match self.joints.get_mut(id.0 as usize) {
            Some(joint) => {
                joint.local = local;
                true
            }
            None => false,
        }
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Depth-first pre-order walk from the root, children in insertion order.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            skeleton: self,
            stack: vec![self.root()],
        }
    }

    pub fn find(&self, name: &str) -> Option<JointId> {
        self.joints
            .iter()
            .position(|j| j.name == name)
            .map(|i| JointId(i as u32))
    }
}

/// Iterator returned by [`Skeleton::depth_first`].
pub struct DepthFirst<'a> {
    skeleton: &'a Skeleton,
    stack: Vec<JointId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (JointId, &'a Joint);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let joint = self.skeleton.joint(id)?;
        self.stack.extend(joint.children.iter().rev().copied());
        Some((id, joint))
    }
}

/// Skinned mesh component. A mesh without a skeleton has nothing to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinnedMesh {
    pub skeleton: Option<Skeleton>,
}

impl SkinnedMesh {
    pub fn new(skeleton: Skeleton) -> Self {
        Self {
            skeleton: Some(skeleton),
        }
    }

    pub fn root(&self) -> Option<JointId> {
        self.skeleton.as_ref().map(Skeleton::root)
    }

    pub fn joint_count(&self) -> usize {
        self.skeleton.as_ref().map_or(0, Skeleton::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn branching() -> Skeleton {
        // root -> a -> c
        //      -> b
        let mut s = Skeleton::new("root", Mat4::IDENTITY);
        let a = s.add_joint(s.root(), "a", Mat4::IDENTITY).unwrap();
        s.add_joint(s.root(), "b", Mat4::IDENTITY).unwrap();
        s.add_joint(a, "c", Mat4::IDENTITY).unwrap();
        s
    }

    #[test]
    fn indices_are_dense() {
        let s = branching();
        let indices: Vec<u32> = s.joints().iter().map(Joint::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn depth_first_is_pre_order() {
        let s = branching();
        let names: Vec<&str> = s.depth_first().map(|(_, j)| j.name.as_str()).collect();
        assert_eq!(names, vec!["root", "a", "c", "b"]);
    }

    #[test]
    fn add_joint_rejects_unknown_parent() {
        let mut s = Skeleton::new("root", Mat4::IDENTITY);
        assert!(s.add_joint(JointId(7), "x", Mat4::IDENTITY).is_none());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn topology_changes_bump_revision_but_posing_does_not() {
        let mut s = Skeleton::new("root", Mat4::IDENTITY);
        let r0 = s.revision();
        let a = s.add_joint(s.root(), "a", Mat4::IDENTITY).unwrap();
        let r1 = s.revision();
        assert_ne!(r0, r1);

        assert!(s.set_local(a, Mat4::from_translation(Vec3::X)));
        assert_eq!(s.revision(), r1);
    }

    #[test]
    fn revisions_differ_between_skeletons() {
        let a = Skeleton::new("root", Mat4::IDENTITY);
        let b = Skeleton::new("root", Mat4::IDENTITY);
        assert_ne!(a.revision(), b.revision());
    }

    #[test]
    fn mesh_without_skeleton() {
        let mesh = SkinnedMesh::default();
        assert!(mesh.root().is_none());
        assert_eq!(mesh.joint_count(), 0);

        let mesh = SkinnedMesh::new(branching());
        assert_eq!(mesh.root(), Some(JointId(0)));
        assert_eq!(mesh.joint_count(), 4);
    }

    #[test]
    fn find_by_name() {
        let s = branching();
        assert_eq!(s.find("c"), Some(JointId(3)));
        assert!(s.find("missing").is_none());
    }
}
