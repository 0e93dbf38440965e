//! Per-category placement matrices for the static overlay geometry.
//!
//! All functions are pure. Inputs are assumed finite; degenerate ray
//! directions are guarded explicitly, anything else simply produces an
//! odd-looking overlay.

use debugview_ecs::{Camera, Collider};
use glam::{Mat4, Quat, Vec3, Vec4};
use std::f32::consts::PI;

/// Rotations below this angle are skipped, and angles within it of PI use
/// the fallback axis.
pub const RAY_ANGLE_EPSILON: f32 = 1e-5;

/// Direction of the unit ray geometry.
pub const CANONICAL_RAY: Vec3 = Vec3::Z;

/// Axis used when the ray direction is antiparallel to [`CANONICAL_RAY`].
pub const FALLBACK_RAY_AXIS: Vec3 = Vec3::Y;

/// Maps the unit cube's z range [-1, 1] onto clip depth [0, 1].
pub const CUBE_TO_CLIP_DEPTH: Mat4 = Mat4::from_cols(
    Vec4::X,
    Vec4::Y,
    Vec4::new(0.0, 0.0, 0.5, 0.0),
    Vec4::new(0.0, 0.0, 0.5, 1.0),
);

/// Inverted matrices describing a camera's view volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumVolume {
    pub inverse_view: Mat4,
    pub inverse_projection: Mat4,
    pub inverse_view_projection: Mat4,
}

impl FrustumVolume {
    pub fn of(camera: &Camera) -> Self {
        Self {
            inverse_view: camera.view.inverse(),
            inverse_projection: camera.projection.inverse(),
            inverse_view_projection: camera.view_projection.inverse(),
        }
    }

    /// World-space position of the camera.
    pub fn eye(&self) -> Vec3 {
        self.inverse_view.w_axis.truncate()
    }

    /// Maps the unit cube onto this volume in world space.
    pub fn cube_to_world(&self) -> Mat4 {
        self.inverse_view_projection * CUBE_TO_CLIP_DEPTH
    }
}

/// Unit cube to `camera`'s frustum, expressed in the main camera's clip space.
pub fn frustum_matrix(main_view_projection: Mat4, camera: &Camera) -> Mat4 {
    main_view_projection * FrustumVolume::of(camera).cube_to_world()
}

/// Unit cube to a box collider: translate by `center`, then scale by
/// `half_extents`, both in the owner's local space.
pub fn box_matrix(global: Mat4, center: Vec3, half_extents: Vec3) -> Mat4 {
    global * Mat4::from_translation(center) * Mat4::from_scale(half_extents)
}

/// Rotation taking [`CANONICAL_RAY`] onto a ray direction.
///
/// `axis` is `normalize(direction x CANONICAL_RAY)`; rotating about it by
/// `-angle` (equivalently about `-axis` by `angle`) maps the canonical
/// direction onto `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayRotation {
    pub axis: Vec3,
    pub angle: f32,
}

impl RayRotation {
    pub fn to_quat(self) -> Quat {
        Quat::from_axis_angle(self.axis, -self.angle)
    }

    pub fn to_mat4(self) -> Mat4 {
        Mat4::from_quat(self.to_quat())
    }
}

/// `None` when no rotation is needed: the direction is (numerically) the
/// canonical one, or it has zero length.
pub fn ray_rotation(direction: Vec3) -> Option<RayRotation> {
    let dir = direction.try_normalize()?;
    let angle = dir.dot(CANONICAL_RAY).clamp(-1.0, 1.0).acos();
    if angle < RAY_ANGLE_EPSILON {
        return None;
    }
    let axis = if PI - angle < RAY_ANGLE_EPSILON {
        FALLBACK_RAY_AXIS
    } else {
        dir.cross(CANONICAL_RAY)
            .try_normalize()
            .unwrap_or(FALLBACK_RAY_AXIS)
    };
    Some(RayRotation { axis, angle })
}

/// Unit ray to a ray collider: rotate onto `direction`, scale by
/// `max_distance`, then translate by `center`, all in local space.
pub fn ray_matrix(global: Mat4, center: Vec3, direction: Vec3, max_distance: f32) -> Mat4 {
    let mut model = global;
    if let Some(rotation) = ray_rotation(direction) {
        model *= rotation.to_mat4();
    }
    model * Mat4::from_scale(Vec3::splat(max_distance)) * Mat4::from_translation(center)
}

/// Model matrix for whichever static geometry the collider is drawn with.
pub fn collider_matrix(global: Mat4, collider: &Collider) -> Mat4 {
    match *collider {
        Collider::Box {
            center,
            half_extents,
        } => box_matrix(global, center, half_extents),
        Collider::Ray {
            center,
            direction,
            max_distance,
        } => ray_matrix(global, center, direction, max_distance),
    }
}

/// Keep only the translation column of `mvp`; the rest becomes identity so
/// the quad always faces the viewer.
pub fn billboard(mvp: Mat4) -> Mat4 {
    Mat4::from_cols(Vec4::X, Vec4::Y, Vec4::Z, mvp.w_axis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn canonical_direction_needs_no_rotation() {
        assert!(ray_rotation(Vec3::Z).is_none());
        assert!(ray_rotation(Vec3::new(0.0, 0.0, 5.0)).is_none());
    }

    #[test]
    fn zero_direction_needs_no_rotation() {
        assert!(ray_rotation(Vec3::ZERO).is_none());
    }

    #[test]
    fn antiparallel_uses_fallback_axis() {
        let r = ray_rotation(Vec3::NEG_Z).unwrap();
        assert_eq!(r.axis, FALLBACK_RAY_AXIS);
        assert!((r.angle - PI).abs() < 1e-6);
        assert!(close(r.to_quat() * CANONICAL_RAY, Vec3::NEG_Z));
    }

    #[test]
    fn perpendicular_rotates_quarter_turn() {
        let r = ray_rotation(Vec3::X).unwrap();
        assert!((r.angle - PI / 2.0).abs() < 1e-6);
        let expected_axis = Vec3::X.cross(Vec3::Z).normalize();
        assert!(close(r.axis, expected_axis));
        assert!(close(r.axis.abs(), Vec3::Y));
        assert!(close(r.to_quat() * CANONICAL_RAY, Vec3::X));
    }

    #[test]
    fn rotation_maps_canonical_onto_arbitrary_direction() {
        for dir in [
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-0.3, 0.2, 0.9),
            Vec3::new(0.0, -1.0, -1.0),
            Vec3::Y,
        ] {
            let r = ray_rotation(dir).unwrap();
            assert!(close(r.to_quat() * CANONICAL_RAY, dir.normalize()), "{dir}");
        }
    }

    #[test]
    fn ray_matrix_reaches_max_distance_along_direction() {
        let global = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let m = ray_matrix(global, Vec3::ZERO, Vec3::X, 4.0);
        assert!(close(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0)));
        assert!(close(m.transform_point3(Vec3::Z), Vec3::new(5.0, 2.0, 3.0)));
    }

    #[test]
    fn ray_center_is_applied_after_scale() {
        let m = ray_matrix(Mat4::IDENTITY, Vec3::new(0.0, 0.0, 1.0), Vec3::Z, 2.0);
        // Offset is scaled by max distance because it is the innermost transform.
        assert!(close(m.transform_point3(Vec3::ZERO), Vec3::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn box_matrix_translates_then_scales() {
        let global = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let m = box_matrix(global, Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 3.0, 4.0));
        assert!(close(m.transform_point3(Vec3::ZERO), Vec3::new(10.0, 1.0, 0.0)));
        assert!(close(m.transform_point3(Vec3::ONE), Vec3::new(12.0, 4.0, 4.0)));
    }

    #[test]
    fn collider_matrix_dispatches_on_shape() {
        let boxed = Collider::cuboid(Vec3::ZERO, Vec3::splat(2.0));
        let m = collider_matrix(Mat4::IDENTITY, &boxed);
        assert!(close(m.transform_point3(Vec3::ONE), Vec3::splat(2.0)));

        let ray = Collider::ray(Vec3::NEG_Z, 3.0);
        let m = collider_matrix(Mat4::IDENTITY, &ray);
        assert!(close(m.transform_point3(Vec3::Z), Vec3::new(0.0, 0.0, -3.0)));
    }

    #[test]
    fn billboard_keeps_translation_only() {
        let a = Mat4::from_scale_rotation_translation(
            Vec3::splat(3.0),
            Quat::from_rotation_y(1.0),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let b = Mat4::from_rotation_translation(Quat::from_rotation_x(-0.4), Vec3::new(1.0, 2.0, 3.0));
        let (ba, bb) = (billboard(a), billboard(b));
        assert_eq!(ba.w_axis, a.w_axis);
        assert_eq!(ba.x_axis, bb.x_axis);
        assert_eq!(ba.y_axis, bb.y_axis);
        assert_eq!(ba.z_axis, bb.z_axis);
        assert_eq!(ba.x_axis, Vec4::X);
    }

    #[test]
    fn frustum_cube_lands_on_near_and_far_planes() {
        let camera = Camera::perspective(45.0_f32.to_radians(), 1.5, 0.5, 6.0);
        let m = frustum_matrix(Mat4::IDENTITY, &camera);
        let near = m.project_point3(Vec3::new(0.0, 0.0, -1.0));
        let far = m.project_point3(Vec3::new(0.0, 0.0, 1.0));
        assert!(close(near, Vec3::new(0.0, 0.0, -0.5)));
        assert!((far.z + 6.0).abs() < 1e-3);
    }

    #[test]
    fn frustum_volume_eye_follows_camera() {
        let mut camera = Camera::default();
        camera.look_at(Vec3::new(4.0, 2.0, 1.0), Vec3::ZERO, Vec3::Y);
        let volume = FrustumVolume::of(&camera);
        assert!(close(volume.eye(), Vec3::new(4.0, 2.0, 1.0)));
        assert!(
            volume
                .inverse_view_projection
                .abs_diff_eq(volume.inverse_view * volume.inverse_projection, 1e-3)
        );
    }
}
