//! Component store for the scene the debug overlay inspects.
//!
//! Components are stored in BTreeMap for deterministic iteration order.
//! Each component type has its own storage keyed by EntityId; a component
//! is owned by the entity it is stored under.
//!
//! # Invariants
//! - Iteration order is deterministic (BTreeMap).
//! - Transform parent links are weak: a dangling parent id ends the chain.
//! - Parent chains are acyclic. A cycle is a caller error; resolution stops
//!   after visiting every transform once.

mod components;
pub mod sample;
mod skeleton;

pub use components::{Camera, Collider, Light};
pub use skeleton::{DepthFirst, Joint, JointId, Skeleton, SkinnedMesh};

use debugview_common::{EntityId, Transform};
use glam::Mat4;
use std::collections::BTreeMap;

/// Storage for every component kind the debug overlay reads.
#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    transforms: BTreeMap<EntityId, Transform>,
    cameras: BTreeMap<EntityId, Camera>,
    lights: BTreeMap<EntityId, Light>,
    colliders: BTreeMap<EntityId, Collider>,
    skinned_meshes: BTreeMap<EntityId, SkinnedMesh>,
    main_camera: Option<EntityId>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with the given transform. Returns its id.
    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.transforms.insert(id, transform);
        id
    }

    pub fn entity_count(&self) -> usize {
        self.transforms.len()
    }

    // --- Transform ---
    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.transforms.insert(entity, transform);
    }

    pub fn transform(&self, entity: EntityId) -> Option<&Transform> {
        self.transforms.get(&entity)
    }

    pub fn transforms(&self) -> &BTreeMap<EntityId, Transform> {
        &self.transforms
    }

    /// World matrix of `entity`: the parent chain's global matrix times the local matrix.
    pub fn global_matrix(&self, entity: EntityId) -> Option<Mat4> {
        let transform = self.transforms.get(&entity)?;
        let mut global = transform.local_matrix();
        let mut parent = transform.parent;
        let mut hops = 0;
        while let Some(parent_id) = parent {
            let Some(parent_transform) = self.transforms.get(&parent_id) else {
                break;
            };
            hops += 1;
            if hops > self.transforms.len() {
                tracing::warn!(entity = %entity, "transform parent chain contains a cycle");
                break;
            }
            global = parent_transform.local_matrix() * global;
            parent = parent_transform.parent;
        }
        Some(global)
    }

    // --- Camera ---
    pub fn set_camera(&mut self, entity: EntityId, camera: Camera) {
        self.cameras.insert(entity, camera);
    }

    pub fn camera(&self, entity: EntityId) -> Option<&Camera> {
        self.cameras.get(&entity)
    }

    pub fn camera_mut(&mut self, entity: EntityId) -> Option<&mut Camera> {
        self.cameras.get_mut(&entity)
    }

    pub fn cameras(&self) -> &BTreeMap<EntityId, Camera> {
        &self.cameras
    }

    /// Designate the camera the overlay is rendered from.
    pub fn set_main_camera(&mut self, entity: EntityId) -> bool {
        if self.cameras.contains_key(&entity) {
            self.main_camera = Some(entity);
            true
        } else {
            false
        }
    }

    pub fn main_camera_id(&self) -> Option<EntityId> {
        self.main_camera
    }

    pub fn main_camera(&self) -> Option<&Camera> {
        self.main_camera.and_then(|id| self.cameras.get(&id))
    }

    /// Re-derive every camera's view from its owner's global matrix.
    pub fn sync_camera_views(&mut self) {
        let poses: Vec<(EntityId, Mat4)> = self
            .cameras
            .keys()
            .filter_map(|id| self.global_matrix(*id).map(|m| (*id, m)))
            .collect();
        for (id, pose) in poses {
            if let Some(camera) = self.cameras.get_mut(&id) {
                camera.set_pose(pose);
            }
        }
    }

    // --- Light ---
    pub fn set_light(&mut self, entity: EntityId, light: Light) {
        self.lights.insert(entity, light);
    }

    pub fn lights(&self) -> &BTreeMap<EntityId, Light> {
        &self.lights
    }

    // --- Collider ---
    pub fn set_collider(&mut self, entity: EntityId, collider: Collider) {
        self.colliders.insert(entity, collider);
    }

    pub fn collider(&self, entity: EntityId) -> Option<&Collider> {
        self.colliders.get(&entity)
    }

    pub fn colliders(&self) -> &BTreeMap<EntityId, Collider> {
        &self.colliders
    }

    // --- SkinnedMesh ---
    pub fn set_skinned_mesh(&mut self, entity: EntityId, mesh: SkinnedMesh) {
        self.skinned_meshes.insert(entity, mesh);
    }

    pub fn skinned_mesh(&self, entity: EntityId) -> Option<&SkinnedMesh> {
        self.skinned_meshes.get(&entity)
    }

    pub fn skinned_mesh_mut(&mut self, entity: EntityId) -> Option<&mut SkinnedMesh> {
        self.skinned_meshes.get_mut(&entity)
    }

    pub fn skinned_meshes(&self) -> &BTreeMap<EntityId, SkinnedMesh> {
        &self.skinned_meshes
    }

    /// Remove an entity and all of its components.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.transforms.remove(&entity);
        self.cameras.remove(&entity);
        self.lights.remove(&entity);
        self.colliders.remove(&entity);
        self.skinned_meshes.remove(&entity);
        if self.main_camera == Some(entity) {
            self.main_camera = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn approx(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn global_matrix_of_root_is_local() {
        let mut store = ComponentStore::new();
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_y(0.7))
            .with_scale(Vec3::new(2.0, 1.0, 0.5));
        let id = store.spawn(t);
        assert!(approx(store.global_matrix(id).unwrap(), t.local_matrix()));
    }

    #[test]
    fn global_matrix_composes_parent_then_child() {
        let mut store = ComponentStore::new();
        let root_t = Transform::from_position(Vec3::new(0.0, 1.0, 0.0))
            .with_rotation(Quat::from_rotation_z(0.3));
        let root = store.spawn(root_t);
        let a_t = Transform::from_position(Vec3::X)
            .with_scale(Vec3::splat(2.0))
            .with_parent(root);
        let a = store.spawn(a_t);
        let b_t = Transform::from_position(Vec3::Z)
            .with_rotation(Quat::from_rotation_x(1.1))
            .with_parent(a);
        let b = store.spawn(b_t);

        let expected = root_t.local_matrix() * a_t.local_matrix() * b_t.local_matrix();
        assert!(approx(store.global_matrix(b).unwrap(), expected));
    }

    #[test]
    fn dangling_parent_ends_chain() {
        let mut store = ComponentStore::new();
        let t = Transform::from_position(Vec3::Y).with_parent(EntityId::new());
        let id = store.spawn(t);
        assert!(approx(store.global_matrix(id).unwrap(), t.local_matrix()));
    }

    #[test]
    fn cyclic_parents_terminate() {
        let mut store = ComponentStore::new();
        let a = store.spawn(Transform::default());
        let b = store.spawn(Transform::default().with_parent(a));
        store.set_transform(a, Transform::default().with_parent(b));
        assert!(store.global_matrix(a).is_some());
    }

    #[test]
    fn global_matrix_missing_entity() {
        let store = ComponentStore::new();
        assert!(store.global_matrix(EntityId::new()).is_none());
    }

    #[test]
    fn main_camera_requires_camera_component() {
        let mut store = ComponentStore::new();
        let id = store.spawn(Transform::default());
        assert!(!store.set_main_camera(id));
        store.set_camera(id, Camera::default());
        assert!(store.set_main_camera(id));
        assert_eq!(store.main_camera_id(), Some(id));
        assert!(store.main_camera().is_some());
    }

    #[test]
    fn remove_entity_clears_all() {
        let mut store = ComponentStore::new();
        let id = store.spawn(Transform::default());
        store.set_camera(id, Camera::default());
        store.set_main_camera(id);
        store.set_light(id, Light::default());
        store.set_collider(id, Collider::default());
        store.set_skinned_mesh(id, SkinnedMesh::default());

        store.remove_entity(id);
        assert!(store.transform(id).is_none());
        assert!(store.cameras().is_empty());
        assert!(store.lights().is_empty());
        assert!(store.colliders().is_empty());
        assert!(store.skinned_meshes().is_empty());
        assert!(store.main_camera_id().is_none());
    }

    #[test]
    fn sync_camera_views_follows_transforms() {
        let mut store = ComponentStore::new();
        let id = store.spawn(Transform::from_position(Vec3::new(0.0, 0.0, 5.0)));
        store.set_camera(id, Camera::default());
        store.sync_camera_views();
        let cam = store.camera(id).unwrap();
        assert!((cam.position - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);
    }
}
