//! Joint line geometry and per-frame joint world matrices.
//!
//! # Invariants
//! - Cache entries are keyed by the skinned mesh's entity id, never by
//!   enumeration position.
//! - An entry exists exactly for the meshes that had a skeleton at the last
//!   `sync`, and was built from that skeleton's current revision.

use crate::backend::DebugBackend;
use debugview_common::EntityId;
use debugview_ecs::{JointId, Skeleton, SkinnedMesh};
use glam::Mat4;
use std::collections::BTreeMap;

/// Line-list indices `(parent.index, joint.index)` for every non-root joint,
/// in depth-first pre-order.
pub fn joint_line_indices(skeleton: &Skeleton) -> Vec<u32> {
    let mut indices = Vec::with_capacity(skeleton.len().saturating_sub(1) * 2);
    for (_, joint) in skeleton.depth_first() {
        let Some(parent) = joint.parent().and_then(|p| skeleton.joint(p)) else {
            continue;
        };
        indices.push(parent.index());
        indices.push(joint.index());
    }
    indices
}

/// Write every joint's world matrix (`parent_world * local`, root parent is
/// identity) into `out` at offset `16 * joint.index`, column-major.
pub fn joint_world_matrices(skeleton: &Skeleton, out: &mut Vec<f32>) {
    out.clear();
    out.resize(skeleton.len() * 16, 0.0);

    let mut stack: Vec<(JointId, Mat4)> = vec![(skeleton.root(), Mat4::IDENTITY)];
    while let Some((id, parent_world)) = stack.pop() {
        let Some(joint) = skeleton.joint(id) else {
            continue;
        };
        let world = parent_world * joint.local;
        let offset = joint.index() as usize * 16;
        out[offset..offset + 16].copy_from_slice(&world.to_cols_array());
        stack.extend(joint.children().iter().rev().map(|&child| (child, world)));
    }
}

/// GPU line geometry for one skeleton.
#[derive(Debug)]
pub struct SkeletonEntry<M> {
    pub mesh: M,
    pub revision: u64,
    pub joint_count: u32,
    pub index_count: u32,
}

/// What a [`SkeletonCache::sync`] call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub built: usize,
    pub rebuilt: usize,
    pub evicted: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.built == 0 && self.rebuilt == 0 && self.evicted == 0
    }
}

/// Joint line meshes keyed by skinned-mesh entity.
#[derive(Debug)]
pub struct SkeletonCache<M> {
    entries: BTreeMap<EntityId, SkeletonEntry<M>>,
}

impl<M> Default for SkeletonCache<M> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<M> SkeletonCache<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: EntityId) -> Option<&SkeletonEntry<M>> {
        self.entries.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reconcile the cache with the current set of skinned meshes: build
    /// missing entries, rebuild entries whose topology changed, and release
    /// entries whose mesh is gone or lost its skeleton.
    pub fn sync<B>(&mut self, backend: &mut B, meshes: &BTreeMap<EntityId, SkinnedMesh>) -> SyncReport
    where
        B: DebugBackend<Mesh = M>,
    {
        let mut report = SyncReport::default();

        let stale: Vec<EntityId> = self
            .entries
            .keys()
            .filter(|id| meshes.get(id).is_none_or(|m| m.skeleton.is_none()))
            .copied()
            .collect();
        for id in stale {
            if let Some(entry) = self.entries.remove(&id) {
                backend.release_mesh(entry.mesh);
                report.evicted += 1;
                tracing::debug!(entity = %id, "evicted skeleton overlay");
            }
        }

        for (id, mesh) in meshes {
            let Some(skeleton) = mesh.skeleton.as_ref() else {
                continue;
            };
            let cached = self.entries.get(id).map(|entry| entry.revision);
            if cached == Some(skeleton.revision()) {
                continue;
            }
            let previous = self.entries.remove(id);

            let indices = joint_line_indices(skeleton);
            let joint_count = skeleton.len() as u32;
            let mesh = backend.create_joint_mesh(&format!("joints_{id}"), joint_count, &indices);
            self.entries.insert(
                *id,
                SkeletonEntry {
                    mesh,
                    revision: skeleton.revision(),
                    joint_count,
                    index_count: indices.len() as u32,
                },
            );

            match previous {
                Some(old) => {
                    backend.release_mesh(old.mesh);
                    report.rebuilt += 1;
                    tracing::debug!(entity = %id, joints = joint_count, "rebuilt skeleton overlay");
                }
                None => {
                    report.built += 1;
                    tracing::debug!(entity = %id, joints = joint_count, "built skeleton overlay");
                }
            }
        }

        report
    }

    /// Release every cached mesh.
    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: DebugBackend<Mesh = M>,
    {
        for (_, entry) in std::mem::take(&mut self.entries) {
            backend.release_mesh(entry.mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::FrameRecorder;
    use debugview_ecs::ComponentStore;
    use glam::{Quat, Vec3};

    fn chain(len: usize) -> Skeleton {
        let mut s = Skeleton::new("root", Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let mut tip = s.root();
        for i in 1..len {
            tip = s
                .add_joint(tip, format!("j{i}"), Mat4::from_translation(Vec3::Y))
                .unwrap();
        }
        s
    }

    #[test]
    fn line_indices_pair_parent_with_child() {
        // root(0) -> a(1) -> c(3), root(0) -> b(2)
        let mut s = Skeleton::new("root", Mat4::IDENTITY);
        let a = s.add_joint(s.root(), "a", Mat4::IDENTITY).unwrap();
        s.add_joint(s.root(), "b", Mat4::IDENTITY).unwrap();
        s.add_joint(a, "c", Mat4::IDENTITY).unwrap();

        let indices = joint_line_indices(&s);
        assert_eq!(indices, vec![0, 1, 1, 3, 0, 2]);
    }

    #[test]
    fn line_indices_have_one_segment_per_non_root_joint() {
        for len in [1, 2, 7] {
            let indices = joint_line_indices(&chain(len));
            assert_eq!(indices.len(), (len - 1) * 2);
        }
    }

    #[test]
    fn world_matrix_of_child_is_parent_times_local() {
        let mut s = Skeleton::new(
            "root",
            Mat4::from_rotation_translation(Quat::from_rotation_z(0.5), Vec3::X),
        );
        let child_local = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let child = s.add_joint(s.root(), "child", child_local).unwrap();
        let root_local = s.joint(s.root()).unwrap().local;

        let mut out = Vec::new();
        joint_world_matrices(&s, &mut out);
        assert_eq!(out.len(), 32);

        assert_eq!(&out[0..16], &root_local.to_cols_array());
        let expected = (root_local * child_local).to_cols_array();
        let offset = s.joint(child).unwrap().index() as usize * 16;
        assert_eq!(&out[offset..offset + 16], &expected);
    }

    #[test]
    fn world_matrices_accumulate_down_the_chain() {
        let s = chain(4);
        let mut out = vec![9.0; 3];
        joint_world_matrices(&s, &mut out);
        let tip = Mat4::from_cols_array(out[48..64].try_into().unwrap());
        assert!((tip.w_axis.truncate() - Vec3::new(1.0, 3.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn sync_builds_keyed_entries_and_skips_unrigged_meshes() {
        let mut store = ComponentStore::new();
        let rigged = store.spawn(Default::default());
        store.set_skinned_mesh(rigged, SkinnedMesh::new(chain(3)));
        let unrigged = store.spawn(Default::default());
        store.set_skinned_mesh(unrigged, SkinnedMesh::default());

        let mut backend = FrameRecorder::new();
        let mut cache = SkeletonCache::new();
        let report = cache.sync(&mut backend, store.skinned_meshes());

        assert_eq!(report.built, 1);
        assert_eq!(cache.len(), 1);
        let entry = cache.get(rigged).unwrap();
        assert_eq!(entry.joint_count, 3);
        assert_eq!(entry.index_count, 4);
        assert!(cache.get(unrigged).is_none());

        assert!(cache.sync(&mut backend, store.skinned_meshes()).is_empty());
    }

    #[test]
    fn sync_follows_additions_topology_changes_and_removals() {
        let mut store = ComponentStore::new();
        let first = store.spawn(Default::default());
        store.set_skinned_mesh(first, SkinnedMesh::new(chain(2)));

        let mut backend = FrameRecorder::new();
        let mut cache = SkeletonCache::new();
        cache.sync(&mut backend, store.skinned_meshes());

        // Mesh created after the initial build.
        let second = store.spawn(Default::default());
        store.set_skinned_mesh(second, SkinnedMesh::new(chain(5)));
        // Topology change on the first mesh.
        let skeleton = store
            .skinned_mesh_mut(first)
            .unwrap()
            .skeleton
            .as_mut()
            .unwrap();
        skeleton.add_joint(skeleton.root(), "extra", Mat4::IDENTITY);

        let report = cache.sync(&mut backend, store.skinned_meshes());
        assert_eq!((report.built, report.rebuilt, report.evicted), (1, 1, 0));
        assert_eq!(cache.get(first).unwrap().joint_count, 3);
        assert_eq!(cache.get(second).unwrap().joint_count, 5);

        store.remove_entity(first);
        let report = cache.sync(&mut backend, store.skinned_meshes());
        assert_eq!(report.evicted, 1);
        assert!(cache.get(first).is_none());
        assert_eq!(backend.live_mesh_count(), 1);

        cache.clear(&mut backend);
        assert!(cache.is_empty());
        assert_eq!(backend.live_mesh_count(), 0);
    }

    #[test]
    fn losing_a_skeleton_evicts_the_entry() {
        let mut store = ComponentStore::new();
        let id = store.spawn(Default::default());
        store.set_skinned_mesh(id, SkinnedMesh::new(chain(2)));

        let mut backend = FrameRecorder::new();
        let mut cache = SkeletonCache::new();
        cache.sync(&mut backend, store.skinned_meshes());

        store.skinned_mesh_mut(id).unwrap().skeleton = None;
        let report = cache.sync(&mut backend, store.skinned_meshes());
        assert_eq!(report.evicted, 1);
        assert!(cache.is_empty());
    }
}
