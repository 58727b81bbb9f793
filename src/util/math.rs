//! Math type re-exports and the transform helpers used by sampling.
//!
//! Matrices are column-major throughout, matching both `glam` and the
//! on-disk layout.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Chrono type - time value (seconds).
pub type Chrono = f64;

/// Rotation matrix of a quaternion.
///
/// The quaternion is used as given; callers supply normalized rotations.
#[inline]
pub fn rotation_matrix(q: Quat) -> Mat3 {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    Mat3::from_cols(
        Vec3::new(
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y + z * w),
            2.0 * (x * z - y * w),
        ),
        Vec3::new(
            2.0 * (x * y - z * w),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z + x * w),
        ),
        Vec3::new(
            2.0 * (x * z + y * w),
            2.0 * (y * z - x * w),
            1.0 - 2.0 * (x * x + y * y),
        ),
    )
}

/// Compose scale, then rotation, then translation into one local transform.
///
/// Each rotation column is scaled by the matching scale component and the
/// fourth column carries the translation.
#[inline]
pub fn compose_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    let r = rotation_matrix(rotation);
    Mat4::from_cols(
        (r.x_axis * scale.x).extend(0.0),
        (r.y_axis * scale.y).extend(0.0),
        (r.z_axis * scale.z).extend(0.0),
        translation.extend(1.0),
    )
}

/// Floating-point modulo that keeps the result in `[0, period)`.
///
/// A non-positive period collapses every time onto zero.
#[inline]
pub fn wrap_time(t: Chrono, period: Chrono) -> Chrono {
    if period.is_nan() || period <= 0.0 {
        return 0.0;
    }
    let wrapped = t % period;
    if wrapped < 0.0 { (wrapped + period) % period } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_matches_glam() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 0.7);
        let ours = rotation_matrix(q);
        let theirs = Mat3::from_quat(q);
        assert!(ours.abs_diff_eq(theirs, 1e-6));
    }

    #[test]
    fn test_compose_trs() {
        let m = compose_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::IDENTITY,
            Vec3::new(2.0, 3.0, 4.0),
        );
        assert_eq!(m.x_axis, Vec4::new(2.0, 0.0, 0.0, 0.0));
        assert_eq!(m.y_axis, Vec4::new(0.0, 3.0, 0.0, 0.0));
        assert_eq!(m.z_axis, Vec4::new(0.0, 0.0, 4.0, 0.0));
        assert_eq!(m.w_axis, Vec4::new(1.0, 2.0, 3.0, 1.0));

        let expected = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 3.0, 4.0),
            Quat::from_rotation_z(0.5),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let m = compose_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_z(0.5),
            Vec3::new(2.0, 3.0, 4.0),
        );
        assert!(m.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_wrap_time() {
        assert_eq!(wrap_time(2.5, 2.0), 0.5);
        assert_eq!(wrap_time(2.0, 2.0), 0.0);
        assert_eq!(wrap_time(0.25, 2.0), 0.25);
        assert_eq!(wrap_time(-0.5, 2.0), 1.5);
        assert_eq!(wrap_time(3.0, 0.0), 0.0);
    }
}
