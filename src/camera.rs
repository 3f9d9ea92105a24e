//! Perspective projection, damped orbit controls and the camera uniform.
//!
//! The controls keep the eye on a sphere around a target point. Pointer drags
//! accumulate a rotation delta that is applied a fraction at a time on every
//! [`OrbitControls::update`], which gives the eased motion of damped orbit
//! controls.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle away from the poles where `look_at` degenerates.
const PHI_EPSILON: f32 = 1e-4;

/// Pixels per wheel "line" for trackpads that report pixel deltas.
const PIXELS_PER_LINE: f64 = 100.0;

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_of(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_of(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Spherical coordinates around the orbit target, `phi` measured from +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Debug)]
pub struct OrbitControls {
    target: Point3<f32>,
    spherical: Spherical,
    // Rotation still to be applied, shrinks by `damping_factor` every update
    delta_theta: f32,
    delta_phi: f32,
    pending_scale: f32,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
}

impl OrbitControls {
    pub fn new(eye: Point3<f32>, target: Point3<f32>, damping_factor: f32) -> Self {
        Self {
            target,
            spherical: Spherical::from_offset(eye - target),
            delta_theta: 0.0,
            delta_phi: 0.0,
            pending_scale: 1.0,
            damping_factor,
            enable_zoom: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 1.0,
            max_distance: 50.0,
            dragging: false,
            last_cursor: None,
        }
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn eye(&self) -> Point3<f32> {
        self.target + self.spherical.to_offset()
    }

    /// Look at a new point without moving the eye.
    pub fn set_target(&mut self, target: Point3<f32>) {
        let eye = self.eye();
        self.target = target;
        self.spherical = Spherical::from_offset(eye - target);
    }

    /// Queue a rotation for a pointer drag of `dx`/`dy` pixels; a drag across the
    /// full viewport height is one full turn.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: u32) {
        let height = viewport_height.max(1) as f32;
        self.delta_theta -= 2.0 * PI * dx / height * self.rotate_speed;
        self.delta_phi -= 2.0 * PI * dy / height * self.rotate_speed;
    }

    /// Positive steps move towards the target.
    pub fn zoom_steps(&mut self, steps: f32) {
        if !self.enable_zoom {
            return;
        }
        self.pending_scale *= 0.95_f32.powf(self.zoom_speed * steps);
    }

    /// Apply damped rotation and pending zoom. Returns whether the eye moved.
    pub fn update(&mut self) -> bool {
        let before = self.spherical;

        self.spherical.theta += self.delta_theta * self.damping_factor;
        self.spherical.phi += self.delta_phi * self.damping_factor;
        self.spherical.phi = self.spherical.phi.clamp(PHI_EPSILON, PI - PHI_EPSILON);
        self.spherical.radius = (self.spherical.radius * self.pending_scale)
            .clamp(self.min_distance, self.max_distance);

        self.delta_theta *= 1.0 - self.damping_factor;
        self.delta_phi *= 1.0 - self.damping_factor;
        self.pending_scale = 1.0;

        before != self.spherical
    }

    /// Feed pointer input: left drag rotates, the wheel zooms.
    pub fn handle_window_event(&mut self, event: &WindowEvent, viewport_height: u32) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some((x, y))) = (self.dragging, self.last_cursor) {
                    self.rotate_by_pixels(
                        (position.x - x) as f32,
                        (position.y - y) as f32,
                        viewport_height,
                    );
                }
                self.last_cursor = Some((position.x, position.y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.dragging = false;
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                self.zoom_steps(steps);
            }
            _ => (),
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    // Camera basis in world space, used to orient billboards
    right: [f32; 4],
    up: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            right: [1.0, 0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj(&mut self, controls: &OrbitControls, projection: &Projection) {
        let view = controls.view_matrix();
        self.view_position = controls.eye().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * view).into();
        // The rows of the view rotation are the camera axes
        self.right = [view.x.x, view.y.x, view.z.x, 0.0];
        self.up = [view.x.y, view.y.y, view.z.y, 0.0];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::EuclideanSpace;

    fn close(a: Point3<f32>, b: Point3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    fn controls() -> OrbitControls {
        OrbitControls::new(Point3::new(0.0, 3.0, 10.0), Point3::origin(), 0.05)
    }

    #[test]
    fn eye_survives_the_spherical_round_trip() {
        assert!(close(controls().eye(), Point3::new(0.0, 3.0, 10.0)));
    }

    #[test]
    fn retargeting_keeps_the_eye() {
        let mut controls = controls();
        controls.set_target(Point3::new(0.0, 2.0, 0.0));
        assert!(close(controls.eye(), Point3::new(0.0, 3.0, 10.0)));
        assert_eq!(controls.target(), Point3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn damping_eases_out_a_drag() {
        let mut controls = controls();
        controls.rotate_by_pixels(100.0, 0.0, 600);
        let first = controls.eye();
        assert!(controls.update());
        let step1 = (controls.eye() - first).magnitude();
        let second = controls.eye();
        controls.update();
        let step2 = (controls.eye() - second).magnitude();
        assert!(step1 > 0.0);
        assert!(step2 < step1);

        for _ in 0..2000 {
            controls.update();
        }
        assert!(!controls.update());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut controls = controls();
        controls.zoom_steps(1000.0);
        controls.update();
        assert!(((controls.eye() - controls.target()).magnitude() - controls.min_distance).abs() < 1e-4);
    }

    #[test]
    fn disabled_zoom_ignores_the_wheel() {
        let mut controls = controls();
        controls.enable_zoom = false;
        controls.zoom_steps(3.0);
        controls.update();
        assert!(close(controls.eye(), Point3::new(0.0, 3.0, 10.0)));
    }

    #[test]
    fn projection_follows_the_viewport() {
        let mut projection = Projection::new(800, 600, cgmath::Deg(60.0), 0.1, 100.0);
        assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
        projection.resize(1920, 1080);
        assert!((projection.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
        projection.resize(1920, 0);
        assert!(projection.aspect().is_finite());
    }
}
