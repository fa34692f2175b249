use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A 4x4 affine or projective transform.
///
/// Stored column-major, the layout the GPU expects. Every in-place operation
/// right-multiplies: `m.translate(..)` leaves `m * T` in `m`, so the last
/// operation applied is the first one a vertex sees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn from_mat4(matrix: Mat4) -> Self {
        Self { matrix }
    }

    pub fn to_mat4(&self) -> Mat4 {
        self.matrix
    }

    /// Column-major array, ready for a uniform buffer.
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        self.matrix.to_cols_array_2d()
    }

    /// Element at `[column][row]`.
    pub fn get(&self, column: usize, row: usize) -> f32 {
        self.matrix.col(column)[row]
    }

    /// Returns `self * rhs`.
    pub fn multiply(&self, rhs: &Transform) -> Transform {
        Self::from_mat4(self.matrix * rhs.matrix)
    }

    /// Non-uniform scale along the local axes.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.matrix.x_axis *= x;
        self.matrix.y_axis *= y;
        self.matrix.z_axis *= z;
        self
    }

    /// Translation along the local axes.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        let m = &mut self.matrix;
        m.w_axis += m.x_axis * x + m.y_axis * y + m.z_axis * z;
        self
    }

    /// Rotation by `angle` radians about `axis`.
    ///
    /// The axis is normalized here. A zero-length axis has no direction and
    /// fills the matrix with NaN; callers must pass a non-zero axis.
    pub fn rotate(&mut self, angle: f32, axis: Vec3) -> &mut Self {
        let Vec3 { x, y, z } = axis / axis.length();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;

        let rotation = Mat4::from_cols(
            Vec4::new(t * x * x + c, t * x * y + z * s, t * x * z - y * s, 0.0),
            Vec4::new(t * x * y - z * s, t * y * y + c, t * y * z + x * s, 0.0),
            Vec4::new(t * x * z + y * s, t * y * z - x * s, t * z * z + c, 0.0),
            Vec4::W,
        );

        self.matrix *= rotation;
        self
    }

    /// Orbit-style rotation: `yaw` about the vertical axis, then `pitch`
    /// about the horizontal axis facing the yaw direction.
    pub fn rotate_yaw_pitch(&mut self, yaw: f32, pitch: f32) -> &mut Self {
        self.rotate(yaw, Vec3::Y);
        self.rotate(-pitch, Vec3::new(yaw.cos(), 0.0, yaw.sin()))
    }

    /// Replace the matrix with a perspective frustum projection.
    pub fn frustum(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> &mut Self {
        let dx = right - left;
        let dy = top - bottom;
        let dz = far - near;

        self.matrix = Mat4::from_cols(
            Vec4::new(2.0 * near / dx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * near / dy, 0.0, 0.0),
            Vec4::new((right + left) / dx, (top + bottom) / dy, -(near + far) / dz, -1.0),
            Vec4::new(0.0, 0.0, -2.0 * near * far / dz, 0.0),
        );
        self
    }

    /// Replace the matrix with a symmetric perspective projection.
    ///
    /// `fovy` is the full vertical field of view in radians and `aspect` is
    /// width over height.
    pub fn perspective(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) -> &mut Self {
        let y = (fovy / 2.0).tan() * near;
        let x = y * aspect;
        self.frustum(-x, x, -y, y, near, far)
    }

    /// Apply the transform to a point (w = 1), with perspective divide.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix.project_point3(point)
    }

    /// Element-wise comparison within `epsilon`.
    pub fn approx_eq(&self, other: &Transform, epsilon: f32) -> bool {
        self.matrix.abs_diff_eq(other.matrix, epsilon)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.multiply(&rhs)
    }
}

impl From<Mat4> for Transform {
    fn from(matrix: Mat4) -> Self {
        Self::from_mat4(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-5;

    fn sample() -> Transform {
        let mut t = Transform::identity();
        t.translate(1.0, -2.0, 3.5)
            .rotate(0.7, Vec3::new(1.0, 2.0, -0.5))
            .scale(2.0, 0.5, 1.5);
        t
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform::default().to_mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn multiply_is_standard_product() {
        let a = sample();
        let mut b = Transform::identity();
        b.rotate(1.2, Vec3::Z).translate(0.0, 4.0, 0.0);
        assert!((a * b).to_mat4().abs_diff_eq(a.to_mat4() * b.to_mat4(), EPS));
    }

    #[test]
    fn scale_and_translate_match_glam() {
        let mut t = Transform::identity();
        t.translate(1.0, 2.0, 3.0).scale(2.0, 3.0, 4.0);
        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
        assert!(t.to_mat4().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn translate_moves_origin() {
        let mut t = Transform::identity();
        t.translate(1.0, 2.0, 3.0);
        assert_eq!(t.transform_point(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rotation_matches_glam_axis_angle() {
        let axis = Vec3::new(0.3, -1.0, 2.0);
        for angle in [0.0, 0.4, FRAC_PI_2, PI, -2.5] {
            let mut t = Transform::identity();
            t.rotate(angle, axis);
            let expected = Mat4::from_axis_angle(axis.normalize(), angle);
            assert!(t.to_mat4().abs_diff_eq(expected, EPS), "angle {angle}");
        }
    }

    #[test]
    fn rotation_normalizes_axis() {
        let mut a = Transform::identity();
        let mut b = Transform::identity();
        a.rotate(0.9, Vec3::new(0.0, 10.0, 0.0));
        b.rotate(0.9, Vec3::Y);
        assert!(a.approx_eq(&b, EPS));
    }

    #[test]
    fn zero_angle_rotation_is_noop() {
        let axes = [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(1.0, 1.0, 1.0), Vec3::new(-3.0, 0.2, 7.0)];
        for axis in axes {
            let original = sample();
            let mut t = original;
            t.rotate(0.0, axis);
            assert!(t.approx_eq(&original, EPS), "axis {axis}");
        }
    }

    #[test]
    fn inverse_rotation_restores_transform() {
        let axes = [Vec3::Y, Vec3::new(1.0, -2.0, 0.5), Vec3::new(0.0, 0.0, -4.0)];
        for axis in axes {
            for angle in [0.1, 1.0, 2.9, -1.7] {
                let original = sample();
                let mut t = original;
                t.rotate(angle, axis).rotate(-angle, axis);
                assert!(t.approx_eq(&original, 1e-4), "axis {axis} angle {angle}");
            }
        }
    }

    #[test]
    fn zero_axis_propagates_nan() {
        let mut t = Transform::identity();
        t.rotate(1.0, Vec3::ZERO);
        assert!(t.to_mat4().is_nan());
    }

    #[test]
    fn quarter_turn_about_y_maps_x_to_minus_z() {
        let mut t = Transform::identity();
        t.rotate(FRAC_PI_2, Vec3::Y);
        let p = t.transform_point(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));
    }

    #[test]
    fn yaw_pitch_with_zero_pitch_is_yaw() {
        let mut a = Transform::identity();
        let mut b = Transform::identity();
        a.rotate_yaw_pitch(0.8, 0.0);
        b.rotate(0.8, Vec3::Y);
        assert!(a.approx_eq(&b, EPS));
    }

    #[test]
    fn yaw_pitch_tilts_about_yawed_horizontal_axis() {
        let (yaw, pitch) = (0.8, -0.5);
        let mut t = Transform::identity();
        t.rotate_yaw_pitch(yaw, pitch);

        let axis = Vec3::new(yaw.cos(), 0.0, yaw.sin());
        let expected = Mat4::from_axis_angle(Vec3::Y, yaw) * Mat4::from_axis_angle(axis, -pitch);
        assert!(t.to_mat4().abs_diff_eq(expected, EPS));
        assert!(!t.approx_eq(Transform::identity().rotate(yaw, Vec3::Y), EPS));
    }

    #[test]
    fn perspective_symmetric_coefficients() {
        // fovy = 90 degrees, aspect = 1, near = 2, far = 20
        let mut t = Transform::identity();
        t.perspective(FRAC_PI_2, 1.0, 2.0, 20.0);

        assert!((t.get(0, 0) - 1.0).abs() < EPS);
        assert!((t.get(1, 1) - 1.0).abs() < EPS);
        assert!((t.get(2, 2) - (-22.0 / 18.0)).abs() < EPS);
        assert!((t.get(3, 2) - (-80.0 / 18.0)).abs() < EPS);
        assert_eq!(t.get(2, 3), -1.0);
        assert_eq!(t.get(2, 0), 0.0);
        assert_eq!(t.get(2, 1), 0.0);
        assert_eq!(t.get(3, 3), 0.0);
        assert_eq!(t.get(0, 1), 0.0);
    }

    #[test]
    fn perspective_matches_glam() {
        let mut t = Transform::identity();
        t.perspective(1.1, 16.0 / 9.0, 0.5, 100.0);
        let expected = Mat4::perspective_rh_gl(1.1, 16.0 / 9.0, 0.5, 100.0);
        assert!(t.to_mat4().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn asymmetric_frustum_overwrites_matrix() {
        let mut t = sample();
        t.frustum(-1.0, 3.0, -0.5, 1.5, 1.0, 5.0);
        let expected = Mat4::from_cols(
            Vec4::new(0.5, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.5, 0.5, -1.5, -1.0),
            Vec4::new(0.0, 0.0, -2.5, 0.0),
        );
        assert!(t.to_mat4().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn frustum_maps_near_plane_to_minus_one() {
        let mut t = Transform::identity();
        t.perspective(1.0, 1.0, 2.0, 20.0);
        let near = t.transform_point(Vec3::new(0.0, 0.0, -2.0));
        let far = t.transform_point(Vec3::new(0.0, 0.0, -20.0));
        assert!((near.z + 1.0).abs() < EPS);
        assert!((far.z - 1.0).abs() < EPS);
    }
}
