//! Perspective camera, projection and the orbit controls that move it.
//!
//! The camera looks from `position` at `target`. Only [`OrbitControls`]
//! mutates it: pointer input accumulates rotate/zoom/pan deltas between
//! frames and [`OrbitControls::update`] applies them, damped, once per frame.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Zero};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::config::{CameraSettings, OrbitSettings};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::from_cols(
    cgmath::Vector4::new(1.0, 0.0, 0.0, 0.0),
    cgmath::Vector4::new(0.0, 1.0, 0.0, 0.0),
    cgmath::Vector4::new(0.0, 0.0, 0.5, 0.0),
    cgmath::Vector4::new(0.0, 0.0, 0.5, 1.0),
);

const EPS: f32 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: cgmath::Point3<f32>,
    pub target: cgmath::Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<cgmath::Point3<f32>>, T: Into<cgmath::Point3<f32>>>(
        position: P,
        target: T,
    ) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self::new(settings.position, settings.target)
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::look_at_rh(self.position, self.target, cgmath::Vector3::unit_y())
    }

    pub fn forward(&self) -> cgmath::Vector3<f32> {
        let dir = self.target - self.position;
        if dir.magnitude2() > EPS {
            dir.normalize()
        } else {
            -cgmath::Vector3::unit_z()
        }
    }

    /// Screen-space right and up axes of the camera in world coordinates.
    pub fn basis(&self) -> (cgmath::Vector3<f32>, cgmath::Vector3<f32>) {
        let forward = self.forward();
        let right = forward.cross(cgmath::Vector3::unit_y());
        let right = if right.magnitude2() > EPS {
            right.normalize()
        } else {
            cgmath::Vector3::unit_x()
        };
        (right, right.cross(forward))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: cgmath::Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<cgmath::Rad<f32>>>(
        width: u32,
        height: u32,
        fovy: F,
        znear: f32,
        zfar: f32,
    ) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_settings(width: u32, height: u32, settings: &CameraSettings) -> Self {
        Self::new(
            width,
            height,
            cgmath::Deg(settings.fovy_degrees),
            settings.znear,
            settings.zfar,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> cgmath::Rad<f32> {
        self.fovy
    }

    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controls: OrbitControls,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

/// Spherical coordinates around the orbit target, Y up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_vector(v: cgmath::Vector3<f32>) -> Self {
        let radius = v.magnitude();
        if radius < EPS {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_vector(self) -> cgmath::Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        cgmath::Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    None,
    Rotate,
    Pan,
}

/// Damped orbit, zoom and pan around a focal point.
///
/// Left drag orbits, right drag pans, the wheel zooms. With damping enabled
/// each [`update`](Self::update) applies `damping_factor` of the pending
/// motion and keeps the rest for the following frames.
#[derive(Debug)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    viewport_height: f32,
    spherical_delta: Spherical,
    scale: f32,
    pan_pixels: cgmath::Vector2<f32>,
    pan_offset: cgmath::Vector3<f32>,
    drag: Drag,
    cursor: Option<PhysicalPosition<f64>>,
}

impl OrbitControls {
    pub fn new(settings: &OrbitSettings, viewport_height: u32) -> Self {
        Self {
            enable_damping: settings.enable_damping,
            damping_factor: settings.damping_factor.clamp(0.0, 1.0),
            enable_zoom: settings.enable_zoom,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            pan_speed: settings.pan_speed,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            viewport_height: viewport_height.max(1) as f32,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_pixels: cgmath::Vector2::zero(),
            pan_offset: cgmath::Vector3::zero(),
            drag: Drag::None,
            cursor: None,
        }
    }

    /// Feeds pointer input. Returns true if the event was used.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (button, state) {
                    (MouseButton::Left, ElementState::Pressed) => Drag::Rotate,
                    (MouseButton::Right, ElementState::Pressed) => Drag::Pan,
                    (_, ElementState::Released) => Drag::None,
                    _ => self.drag,
                };
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.cursor {
                    let dx = (position.x - last.x) as f32;
                    let dy = (position.y - last.y) as f32;
                    match self.drag {
                        Drag::Rotate => self.rotate(dx, dy),
                        Drag::Pan => self.pan(dx, dy),
                        Drag::None => (),
                    }
                }
                self.cursor = Some(*position);
                self.drag != Drag::None
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                self.zoom(scroll);
                self.enable_zoom
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = Drag::None;
                false
            }
            _ => false,
        }
    }

    /// Queues an orbit by a pointer movement of `dx`/`dy` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        let full_turn = 2.0 * PI / self.viewport_height * self.rotate_speed;
        self.spherical_delta.theta -= full_turn * dx;
        self.spherical_delta.phi -= full_turn * dy;
    }

    /// Queues a pan by a pointer movement of `dx`/`dy` pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_pixels += cgmath::Vector2::new(dx, dy) * self.pan_speed;
    }

    /// Queues a zoom step; positive `scroll` moves toward the target.
    pub fn zoom(&mut self, scroll: f32) {
        if !self.enable_zoom || scroll == 0.0 {
            return;
        }
        let step = 0.95f32.powf(self.zoom_speed);
        if scroll > 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    /// Applies the queued motion to `camera`. Returns true if it moved.
    pub fn update(&mut self, camera: &mut Camera, projection: &Projection) -> bool {
        let offset = camera.position - camera.target;

        if self.pan_pixels != cgmath::Vector2::zero() {
            let (right, up) = camera.basis();
            let target_distance = offset.magnitude() * (projection.fovy().0 / 2.0).tan();
            let per_pixel = 2.0 * target_distance / self.viewport_height;
            self.pan_offset += right * (-self.pan_pixels.x * per_pixel);
            self.pan_offset += up * (self.pan_pixels.y * per_pixel);
            self.pan_pixels = cgmath::Vector2::zero();
        }

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        let mut spherical = Spherical::from_vector(offset);
        spherical.theta += self.spherical_delta.theta * factor;
        spherical.phi += self.spherical_delta.phi * factor;
        spherical.phi = spherical.phi.clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        let target = camera.target + self.pan_offset * factor;
        let position = target + spherical.to_vector();

        if self.enable_damping {
            self.spherical_delta.theta *= 1.0 - factor;
            self.spherical_delta.phi *= 1.0 - factor;
            self.pan_offset *= 1.0 - factor;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = cgmath::Vector3::zero();
        }
        self.scale = 1.0;

        let moved = (position - camera.position).magnitude2() > EPS * EPS
            || (target - camera.target).magnitude2() > EPS * EPS;
        camera.position = position;
        camera.target = target;
        moved
    }
}
