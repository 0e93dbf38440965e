use debugview_common::{EntityId, Transform};
use debugview_ecs::ComponentStore;
use glam::{Mat4, Quat, Vec3};

/// Viewer-controlled camera. Writes its pose and projection into the main
/// camera entity; the overlay only ever reads them back from the store.
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 8.0, 18.0),
            yaw: -90.0_f32.to_radians(),
            pitch: -24.0_f32.to_radians(),
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            speed: 10.0,
            sensitivity: 0.003,
        }
    }
}

impl FlyCamera {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Move along the camera axes. `direction` is (right, up, forward) in
    /// units of `speed * dt`; up is world up.
    pub fn translate(&mut self, direction: Vec3, dt: f32) {
        let step = self.speed * dt;
        self.position += self.right() * direction.x * step
            + Vec3::Y * direction.y * step
            + self.forward() * direction.z * step;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Entity transform equivalent to this camera's view.
    pub fn pose(&self) -> Transform {
        let (_, rotation, position) = self.view_matrix().inverse().to_scale_rotation_translation();
        Transform::from_position(position).with_rotation(rotation.normalize())
    }

    /// Write pose and projection into `entity`'s transform and camera.
    /// Returns false when `entity` has no camera component.
    pub fn apply(&self, store: &mut ComponentStore, entity: EntityId) -> bool {
        let Some(camera) = store.camera_mut(entity) else {
            return false;
        };
        camera.set_projection(self.projection_matrix());
        camera.set_view(self.view_matrix());
        store.set_transform(entity, self.pose());
        true
    }

    /// Start from an existing pose, e.g. the main camera's transform.
    pub fn from_pose(position: Vec3, rotation: Quat) -> Self {
        let forward = rotation * Vec3::NEG_Z;
        Self {
            position,
            yaw: forward.z.atan2(forward.x),
            pitch: forward.y.clamp(-1.0, 1.0).asin(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debugview_ecs::Camera;

    #[test]
    fn default_camera() {
        let cam = FlyCamera::default();
        assert!(cam.position.y > 0.0);
        let vp = cam.projection_matrix() * cam.view_matrix();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn translate_moves_along_forward() {
        let mut cam = FlyCamera::default();
        let start = cam.position;
        cam.translate(Vec3::Z, 1.0);
        assert!((cam.position - (start + cam.forward() * cam.speed)).length() < 1e-4);
    }

    #[test]
    fn pose_round_trips_through_from_pose() {
        let mut cam = FlyCamera::default();
        cam.rotate(120.0, -40.0);
        let pose = cam.pose();
        let again = FlyCamera::from_pose(pose.position, pose.rotation);
        assert!((again.forward() - cam.forward()).length() < 1e-4);
    }

    #[test]
    fn apply_updates_main_camera() {
        let mut store = ComponentStore::new();
        let id = store.spawn(Transform::default());
        store.set_camera(id, Camera::default());

        let mut cam = FlyCamera::default();
        cam.aspect = 2.0;
        assert!(cam.apply(&mut store, id));

        let camera = store.camera(id).unwrap();
        let expected = cam.projection_matrix() * cam.view_matrix();
        assert!(camera.view_projection.abs_diff_eq(expected, 1e-5));
        assert!((camera.position - cam.position).length() < 1e-4);
        let global = store.global_matrix(id).unwrap();
        assert!(global.abs_diff_eq(cam.view_matrix().inverse(), 1e-4));

        let bare = store.spawn(Transform::default());
        assert!(!cam.apply(&mut store, bare));
    }
}
