//! Axis conventions. Both operations are reflections, so each is its own inverse.

use glam::{Mat4, Quat, Vec3, Vec4};

const FLIP_X: Mat4 = Mat4::from_cols(
    Vec4::new(-1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

const SWAP_YZ: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

pub fn flip_x(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

pub fn flip_x_quat(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, -q.y, -q.z, q.w)
}

pub fn flip_x_mat(m: Mat4) -> Mat4 {
    FLIP_X * m * FLIP_X
}

/// Tangents keep their handedness sign in `w`.
pub fn flip_x_tangent(t: Vec4) -> Vec4 {
    Vec4::new(-t.x, t.y, t.z, t.w)
}

pub fn swap_yz(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

pub fn swap_yz_quat(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, -q.z, -q.y, q.w)
}

pub fn swap_yz_mat(m: Mat4) -> Mat4 {
    SWAP_YZ * m * SWAP_YZ
}

pub fn swap_yz_tangent(t: Vec4) -> Vec4 {
    Vec4::new(t.x, t.z, t.y, t.w)
}

/// Axis conversion requested by a pair of scene settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisConversion {
    pub flip_x: bool,
    pub swap_yz: bool,
}

impl AxisConversion {
    pub fn is_identity(&self) -> bool {
        !self.flip_x && !self.swap_yz
    }

    /// Both reflections reverse triangle winding, applying both restores it.
    pub fn reverses_winding(&self) -> bool {
        self.flip_x ^ self.swap_yz
    }

    pub fn vec3(&self, mut v: Vec3) -> Vec3 {
        if self.flip_x {
            v = flip_x(v);
        }
        if self.swap_yz {
            v = swap_yz(v);
        }
        v
    }

    pub fn quat(&self, mut q: Quat) -> Quat {
        if self.flip_x {
            q = flip_x_quat(q);
        }
        if self.swap_yz {
            q = swap_yz_quat(q);
        }
        q
    }

    pub fn mat(&self, mut m: Mat4) -> Mat4 {
        if self.flip_x {
            m = flip_x_mat(m);
        }
        if self.swap_yz {
            m = swap_yz_mat(m);
        }
        m
    }

    pub fn tangent(&self, mut t: Vec4) -> Vec4 {
        if self.flip_x {
            t = flip_x_tangent(t);
        }
        if self.swap_yz {
            t = swap_yz_tangent(t);
        }
        t
    }

    /// Scale vectors live in axis space, so only the component order changes.
    pub fn scale(&self, s: Vec3) -> Vec3 {
        if self.swap_yz {
            swap_yz(s)
        } else {
            s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_x_matches_reflected_rotation() {
        let q = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.3);
        let v = Vec3::new(0.2, 0.5, -1.3);

        let expected = flip_x(q * v);
        let actual = flip_x_quat(q) * flip_x(v);
        assert!(expected.abs_diff_eq(actual, 1e-5));
    }

    #[test]
    fn swap_yz_matches_reflected_rotation() {
        let q = Quat::from_rotation_z(1.1) * Quat::from_rotation_x(-0.4);
        let v = Vec3::new(1.0, 2.0, 3.0);

        let expected = swap_yz(q * v);
        let actual = swap_yz_quat(q) * swap_yz(v);
        assert!(expected.abs_diff_eq(actual, 1e-5));
    }

    #[test]
    fn matrix_conjugation_matches_point_conversion() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.5),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let p = Vec3::new(-0.5, 0.25, 4.0);
        let conversion = AxisConversion {
            flip_x: true,
            swap_yz: true,
        };

        let expected = conversion.vec3(m.transform_point3(p));
        let converted = conversion.mat(m);
        let actual = converted.transform_point3(conversion.vec3(p));
        assert!(expected.abs_diff_eq(actual, 1e-4));
    }
}
