//! A small scene that exercises every overlay category. Shared by the CLI
//! and the desktop viewer.

use crate::{Camera, Collider, ComponentStore, JointId, Light, Skeleton, SkinnedMesh};
use debugview_common::{EntityId, Transform};
use glam::{Mat4, Quat, Vec3};

const SEGMENT_LENGTH: f32 = 1.0;

/// The sample store plus the ids callers usually need to drive it.
pub struct SampleScene {
    pub store: ComponentStore,
    pub main_camera: EntityId,
    pub observed_camera: EntityId,
    pub arms: Vec<EntityId>,
}

/// Transform placed at `eye` and oriented towards `target`.
pub fn looking_at(eye: Vec3, target: Vec3) -> Transform {
    let pose = Mat4::look_at_rh(eye, target, Vec3::Y).inverse();
    let (_, rotation, position) = pose.to_scale_rotation_translation();
    Transform::from_position(position).with_rotation(rotation)
}

/// Build the sample scene with camera views already synced to their transforms.
pub fn sample_scene(aspect: f32) -> SampleScene {
    let mut store = ComponentStore::new();

    let main_camera = store.spawn(looking_at(Vec3::new(0.0, 8.0, 18.0), Vec3::ZERO));
    store.set_camera(
        main_camera,
        Camera::perspective(60.0_f32.to_radians(), aspect, 0.1, 1000.0),
    );
    store.set_main_camera(main_camera);

    let observed_camera = store.spawn(looking_at(Vec3::new(8.0, 3.0, 0.0), Vec3::ZERO));
    store.set_camera(
        observed_camera,
        Camera::perspective(45.0_f32.to_radians(), 1.5, 0.5, 6.0),
    );

    let sun = store.spawn(Transform::from_position(Vec3::new(-4.0, 6.0, -2.0)));
    store.set_light(sun, Light::default());
    let lamp = store.spawn(Transform::from_position(Vec3::new(3.0, 2.0, 4.0)));
    store.set_light(
        lamp,
        Light {
            color: Vec3::new(1.0, 0.8, 0.6),
            ..Light::default()
        },
    );

    let crate_box = store.spawn(Transform::from_position(Vec3::new(-3.0, 0.5, 2.0)));
    store.set_collider(crate_box, Collider::cuboid(Vec3::ZERO, Vec3::splat(0.5)));

    let pivot = store.spawn(
        Transform::from_position(Vec3::new(2.0, 0.0, -3.0))
            .with_rotation(Quat::from_rotation_y(0.6)),
    );
    let carried = store.spawn(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)).with_parent(pivot));
    store.set_collider(
        carried,
        Collider::cuboid(Vec3::new(0.0, 0.5, 0.0), Vec3::new(1.0, 0.5, 0.25)),
    );

    for (position, direction) in [
        (Vec3::new(-6.0, 1.0, 0.0), Vec3::X),
        (Vec3::new(-6.0, 1.5, 0.0), Vec3::NEG_Z),
        (Vec3::new(-6.0, 2.0, 0.0), Vec3::Z),
        (Vec3::new(-6.0, 2.5, 0.0), Vec3::new(1.0, 1.0, 0.0)),
    ] {
        let ray = store.spawn(Transform::from_position(position));
        store.set_collider(ray, Collider::ray(direction, 3.0));
    }

    let arms = vec![
        spawn_arm(&mut store, Vec3::new(0.0, 0.0, 0.0), 4),
        spawn_arm(&mut store, Vec3::new(5.0, 0.0, 2.0), 3),
    ];

    // A skinned mesh without a skeleton produces no joint overlay.
    let unrigged = store.spawn(Transform::default());
    store.set_skinned_mesh(unrigged, SkinnedMesh::default());

    store.sync_camera_views();

    SampleScene {
        store,
        main_camera,
        observed_camera,
        arms,
    }
}

/// Spawn a skinned mesh whose skeleton is a vertical chain of `segments`
/// joints with a two-joint branch off the first joint.
pub fn spawn_arm(store: &mut ComponentStore, position: Vec3, segments: usize) -> EntityId {
    let mut skeleton = Skeleton::new("hip", Mat4::from_translation(position));
    let mut tip = skeleton.root();
    let mut first = None;
    for i in 0..segments {
        let Some(next) = skeleton.add_joint(
            tip,
            format!("segment_{i}"),
            Mat4::from_translation(Vec3::Y * SEGMENT_LENGTH),
        ) else {
            break;
        };
        first.get_or_insert(next);
        tip = next;
    }
    if let Some(branch_root) = first {
        if let Some(branch) = skeleton.add_joint(
            branch_root,
            "branch_0",
            Mat4::from_translation(Vec3::X * SEGMENT_LENGTH),
        ) {
            skeleton.add_joint(
                branch,
                "branch_1",
                Mat4::from_translation(Vec3::X * SEGMENT_LENGTH),
            );
        }
    }

    let id = store.spawn(Transform::default());
    store.set_skinned_mesh(id, SkinnedMesh::new(skeleton));
    id
}

/// Swing every non-root joint of `entity` around Z, keeping its rest offset.
pub fn pose_arm(store: &mut ComponentStore, entity: EntityId, time: f32) {
    let Some(skeleton) = store
        .skinned_mesh_mut(entity)
        .and_then(|mesh| mesh.skeleton.as_mut())
    else {
        return;
    };
    let poses: Vec<_> = skeleton
        .joints()
        .iter()
        .filter(|joint| joint.parent().is_some())
        .map(|joint| {
            let offset = joint.local.w_axis.truncate();
            let swing = (time + joint.index() as f32 * 0.7).sin() * 0.35;
            (
                JointId(joint.index()),
                Mat4::from_translation(offset) * Mat4::from_rotation_z(swing),
            )
        })
        .collect();
    for (id, local) in poses {
        skeleton.set_local(id, local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_scene_has_every_category() {
        let scene = sample_scene(16.0 / 9.0);
        let store = &scene.store;
        assert_eq!(store.main_camera_id(), Some(scene.main_camera));
        assert_eq!(store.cameras().len(), 2);
        assert_eq!(store.lights().len(), 2);
        assert_eq!(store.colliders().len(), 6);
        assert_eq!(store.skinned_meshes().len(), 3);
        assert_eq!(scene.arms.len(), 2);
    }

    #[test]
    fn arm_has_chain_and_branch() {
        let mut store = ComponentStore::new();
        let id = spawn_arm(&mut store, Vec3::ZERO, 4);
        let mesh = store.skinned_mesh(id).unwrap();
        // hip + 4 segments + 2 branch joints
        assert_eq!(mesh.joint_count(), 7);
    }

    #[test]
    fn posing_keeps_topology_and_offsets() {
        let mut store = ComponentStore::new();
        let id = spawn_arm(&mut store, Vec3::ZERO, 2);
        let before = store.skinned_mesh(id).unwrap().skeleton.clone().unwrap();
        pose_arm(&mut store, id, 1.3);
        let after = store.skinned_mesh(id).unwrap().skeleton.as_ref().unwrap();
        assert_eq!(before.revision(), after.revision());
        for (a, b) in before.joints().iter().zip(after.joints()) {
            assert!((a.local.w_axis - b.local.w_axis).length() < 1e-6);
        }
    }

    #[test]
    fn looking_at_faces_target() {
        let t = looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let forward = t.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }
}
