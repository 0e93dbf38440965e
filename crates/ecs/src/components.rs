use glam::{Mat4, Vec3};

/// A viewpoint. `view_projection` is always `projection * view`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0_f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Right-handed perspective camera at the origin looking down -Z.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let projection = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self {
            view: Mat4::IDENTITY,
            projection,
            view_projection: projection,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
        }
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.view_projection = self.projection * self.view;
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
        self.view_projection = self.projection * self.view;
        let pose = view.inverse();
        self.position = pose.w_axis.truncate();
        self.forward = (-pose.z_axis.truncate()).normalize_or_zero();
    }

    /// Place the camera at a world pose, e.g. its owner's global matrix.
    pub fn set_pose(&mut self, global: Mat4) {
        self.set_view(global.inverse());
    }

    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.set_view(Mat4::look_at_rh(eye, target, up));
    }
}

/// Light source, drawn as an icon at its owner's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub direction: Vec3,
    pub forward: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            direction: Vec3::NEG_Y,
            forward: Vec3::NEG_Z,
        }
    }
}

/// Collision volume attached to an entity. Offsets are in the owner's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Box {
        center: Vec3,
        half_extents: Vec3,
    },
    Ray {
        center: Vec3,
        direction: Vec3,
        max_distance: f32,
    },
}

impl Default for Collider {
    fn default() -> Self {
        Self::Box {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(0.5),
        }
    }
}

impl Collider {
    pub fn cuboid(center: Vec3, half_extents: Vec3) -> Self {
        Self::Box {
            center,
            half_extents,
        }
    }

    pub fn ray(direction: Vec3, max_distance: f32) -> Self {
        Self::Ray {
            center: Vec3::ZERO,
            direction,
            max_distance,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Ray { .. } => "ray",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_projection_tracks_view() {
        let mut cam = Camera::default();
        cam.look_at(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO, Vec3::Y);
        assert!(
            cam.view_projection
                .abs_diff_eq(cam.projection * cam.view, 1e-6)
        );
        assert!((cam.position - Vec3::new(0.0, 5.0, 10.0)).length() < 1e-4);
        let expected = (Vec3::ZERO - cam.position).normalize();
        assert!((cam.forward - expected).length() < 1e-4);
    }

    #[test]
    fn set_pose_inverts_global() {
        let mut cam = Camera::default();
        let global = Mat4::from_translation(Vec3::new(3.0, 1.0, -2.0));
        cam.set_pose(global);
        assert!((cam.position - Vec3::new(3.0, 1.0, -2.0)).length() < 1e-5);
        assert!((cam.forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn collider_kinds() {
        assert_eq!(Collider::default().kind(), "box");
        assert_eq!(Collider::ray(Vec3::X, 2.0).kind(), "ray");
    }
}
