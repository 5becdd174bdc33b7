//! Vector and matrix helpers on top of `glam`.
//!
//! Matrices are column-major and use the column-vector convention, so the
//! composition helpers below apply their transform *after* the matrix they
//! are given: `translate(m, t) == Mat4::from_translation(t) * m`.

pub use glam::{Mat4, Vec2, Vec3, Vec4};

/// Orthographic projection mapping the given box onto clip space.
///
/// A degenerate box (zero width, height or depth) yields the identity.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    if right - left == 0.0 || top - bottom == 0.0 || far - near == 0.0 {
        return Mat4::IDENTITY;
    }
    Mat4::orthographic_rh_gl(left, right, bottom, top, near, far)
}

/// Perspective projection with a vertical field of view in degrees.
#[must_use]
pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect, near, far)
}

/// Apply a translation after `matrix`.
#[must_use]
pub fn translate(matrix: Mat4, translation: Vec3) -> Mat4 {
    Mat4::from_translation(translation) * matrix
}

/// Apply a non-uniform scale after `matrix`.
#[must_use]
pub fn scale(matrix: Mat4, scale: Vec3) -> Mat4 {
    Mat4::from_scale(scale) * matrix
}

/// Apply a rotation of `radians` around `axis` after `matrix`.
///
/// `axis` must be unit length.
#[must_use]
pub fn rotate(matrix: Mat4, axis: Vec3, radians: f32) -> Mat4 {
    Mat4::from_axis_angle(axis, radians) * matrix
}

/// Right-handed view matrix looking from `eye` towards `target`.
#[must_use]
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, target, up)
}

/// View matrix for a camera at `pos` with Euler angles `rot_degrees`.
///
/// The world is moved by `-pos`, then rotated around Z, Y and X in that
/// order.
#[must_use]
pub fn camera(pos: Vec3, rot_degrees: Vec3) -> Mat4 {
    let m = translate(Mat4::IDENTITY, -pos);
    let m = rotate(m, Vec3::Z, rot_degrees.z.to_radians());
    let m = rotate(m, Vec3::Y, rot_degrees.y.to_radians());
    rotate(m, Vec3::X, rot_degrees.x.to_radians())
}

/// Position, Euler rotation (radians) and scale of an object.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    /// Translation.
    pub pos: Vec3,
    /// Euler angles in radians, composed X then Y then Z.
    pub rot: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            rot: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Model matrix: rotate around X, Y, Z, then translate, then scale.
    ///
    /// Scale is applied last, so it also scales the translation.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        let m = rotate(Mat4::IDENTITY, Vec3::X, self.rot.x);
        let m = rotate(m, Vec3::Y, self.rot.y);
        let m = rotate(m, Vec3::Z, self.rot.z);
        let m = translate(m, self.pos);
        scale(m, self.scale)
    }
}

/// Interpolate from `a` to `b`, with `f` clamped to `[0, 1]`.
#[must_use]
pub fn mix2(a: Vec2, b: Vec2, f: f32) -> Vec2 {
    a.lerp(b, f.clamp(0.0, 1.0))
}

/// Interpolate from `a` to `b`, with `f` clamped to `[0, 1]`.
#[must_use]
pub fn mix3(a: Vec3, b: Vec3, f: f32) -> Vec3 {
    a.lerp(b, f.clamp(0.0, 1.0))
}

/// Interpolate from `a` to `b`, with `f` clamped to `[0, 1]`.
#[must_use]
pub fn mix4(a: Vec4, b: Vec4, f: f32) -> Vec4 {
    a.lerp(b, f.clamp(0.0, 1.0))
}

/// A 2D circle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Circle {
    /// Center.
    pub pos: Vec2,
    /// Radius.
    pub radius: f32,
}

/// Axis-aligned 2D box.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Range2 {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

/// Whether two circles overlap. Touching circles do not.
#[must_use]
pub fn circle_vs_circle(a: Circle, b: Circle) -> bool {
    a.pos.distance(b.pos) < a.radius + b.radius
}

/// Whether `point` lies strictly inside `range`.
#[must_use]
pub fn point_in_aabb(point: Vec2, range: Range2) -> bool {
    point.x > range.min.x && point.x < range.max.x && point.y > range.min.y && point.y < range.max.y
}

/// Deterministic linear congruential generator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Lcg {
    state: i32,
}

impl Lcg {
    /// A generator starting from `seed`.
    #[must_use]
    pub fn new(seed: i32) -> Self {
        Self { state: seed }
    }

    /// Restart the sequence from `seed`.
    pub fn seed(&mut self, seed: i32) {
        self.state = seed;
    }

    /// Advance and return the next value.
    pub fn next_i32(&mut self) -> i32 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        self.state
    }

    /// A value in `[low, high]`. The bounds may be given in either order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn range(&mut self, low: i32, high: i32) -> i32 {
        let (low, high) = (low.min(high), low.max(high));
        let span = i64::from(high) - i64::from(low) + 1;
        let offset = i64::from(self.next_i32()).rem_euclid(span);
        // low + offset <= high, so it fits.
        (i64::from(low) + offset) as i32
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn approx(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn ortho_maps_box_corners_to_clip_corners() {
        let m = ortho(-640.0, 640.0, -360.0, 360.0, -1.0, 1.0);
        assert!(approx(
            m * Vec4::new(640.0, 360.0, 0.0, 1.0),
            Vec4::new(1.0, 1.0, 0.0, 1.0)
        ));
        assert!(approx(
            m * Vec4::new(-640.0, -360.0, 0.0, 1.0),
            Vec4::new(-1.0, -1.0, 0.0, 1.0)
        ));
    }

    #[test]
    fn degenerate_ortho_is_identity() {
        assert_eq!(ortho(1.0, 1.0, -1.0, 1.0, -1.0, 1.0), Mat4::IDENTITY);
        assert_eq!(ortho(-1.0, 1.0, -1.0, 1.0, 2.0, 2.0), Mat4::IDENTITY);
    }

    #[test]
    fn perspective_projects_near_plane_to_minus_one() {
        let m = perspective(90.0, 1.0, 0.1, 100.0);
        let p = m * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((p.z / p.w + 1.0).abs() < 1e-4);
    }

    #[test]
    fn composition_applies_after_the_given_matrix() {
        let m = translate(scale(Mat4::IDENTITY, Vec3::splat(2.0)), Vec3::X);
        // scale first, then translate
        assert!(approx(
            m * Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(3.0, 0.0, 0.0, 1.0)
        ));
    }

    #[test]
    fn transform_scales_its_translation() {
        let t = Transform {
            pos: Vec3::new(1.0, 0.0, 0.0),
            rot: Vec3::ZERO,
            scale: Vec3::splat(2.0),
        };
        assert!(approx(
            t.matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec4::new(2.0, 0.0, 0.0, 1.0)
        ));
    }

    #[test]
    fn camera_moves_world_opposite_to_position() {
        let view = camera(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert!(approx(
            view * Vec4::new(0.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, -5.0, 1.0)
        ));
    }

    #[test]
    fn rotate_quarter_turn_about_z() {
        let m = rotate(Mat4::IDENTITY, Vec3::Z, std::f32::consts::FRAC_PI_2);
        assert!(approx(
            m * Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 1.0)
        ));
    }

    #[test]
    fn mix_clamps_factor() {
        assert_eq!(mix2(Vec2::ZERO, Vec2::ONE, 2.0), Vec2::ONE);
        assert_eq!(mix3(Vec3::ZERO, Vec3::ONE, -1.0), Vec3::ZERO);
        assert_eq!(mix4(Vec4::ZERO, Vec4::splat(4.0), 0.25), Vec4::ONE);
    }

    #[test]
    fn collision_uses_strict_bounds() {
        let a = Circle {
            pos: Vec2::ZERO,
            radius: 1.0,
        };
        let touching = Circle {
            pos: Vec2::new(2.0, 0.0),
            radius: 1.0,
        };
        assert!(!circle_vs_circle(a, touching));
        assert!(circle_vs_circle(
            a,
            Circle {
                pos: Vec2::new(1.5, 0.0),
                ..touching
            }
        ));

        let range = Range2 {
            min: Vec2::ZERO,
            max: Vec2::ONE,
        };
        assert!(point_in_aabb(Vec2::splat(0.5), range));
        assert!(!point_in_aabb(Vec2::new(0.0, 0.5), range));
    }

    #[test]
    fn lcg_is_deterministic() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::default();
        b.seed(42);
        for _ in 0..16 {
            assert_eq!(a.next_i32(), b.next_i32());
        }
        assert_eq!(Lcg::new(0).next_i32(), 1_013_904_223);
    }

    #[test]
    fn lcg_range_stays_in_bounds() {
        let mut rng = Lcg::new(7);
        for _ in 0..1000 {
            let v = rng.range(10, -5);
            assert!((-5..=10).contains(&v));
        }
        assert_eq!(rng.range(3, 3), 3);
    }
}
