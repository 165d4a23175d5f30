use std::ops::{Add, AddAssign};

use cgmath::Rotation3;

use crate::data_structures::instance::Instance;

/// Rotation as three angles in radians, applied in X, Y, Z order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Euler {
    pub const ZERO: Euler = Euler::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_quaternion(self) -> cgmath::Quaternion<f32> {
        let qx = cgmath::Quaternion::from_angle_x(cgmath::Rad(self.x));
        let qy = cgmath::Quaternion::from_angle_y(cgmath::Rad(self.y));
        let qz = cgmath::Quaternion::from_angle_z(cgmath::Rad(self.z));
        qx * qy * qz
    }
}

impl Add for Euler {
    type Output = Euler;

    fn add(self, rhs: Euler) -> Self::Output {
        Euler::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Euler {
    fn add_assign(&mut self, rhs: Euler) {
        *self = *self + rhs;
    }
}

/// Local transform of a scene node relative to its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: Euler,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: Euler::ZERO,
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position: position.into(),
            ..Self::new()
        }
    }

    pub fn rotate_by(&mut self, delta: Euler) {
        self.rotation += delta;
    }

    pub fn to_instance(&self) -> Instance {
        Instance {
            position: self.position,
            rotation: self.rotation.to_quaternion(),
            scale: self.scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
