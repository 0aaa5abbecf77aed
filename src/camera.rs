use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::interaction::Ray;

/// Fraction of the orbit velocity applied (and removed) each frame.
const DAMPING_FACTOR: f32 = 0.05;
/// Keep the camera just above the horizon.
const MAX_POLAR: f32 = std::f32::consts::PI * 0.495;
const MIN_POLAR: f32 = 0.01;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 100.0;
/// Distance multiplier per wheel notch.
const ZOOM_STEP: f32 = 0.95;

/// Damped orbit camera around a fixed target.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Rotation around +Y, measured from +Z toward +X.
    yaw: f32,
    /// Angle from +Y.
    polar: f32,
    distance: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
    yaw_velocity: f32,
    polar_velocity: f32,
}

impl OrbitCamera {
    /// Looking at the cottage from the south-east.
    pub fn new(aspect: f32) -> Self {
        let mut cam = Self {
            target: Vec3::new(0.0, 1.0, 0.0),
            yaw: 0.0,
            polar: 0.0,
            distance: 1.0,
            fov_y: 75f32.to_radians(),
            near: 0.1,
            far: 100.0,
            aspect: aspect.max(f32::EPSILON),
            yaw_velocity: 0.0,
            polar_velocity: 0.0,
        };
        cam.look_from(Vec3::new(6.0, 3.0, 8.0));
        cam
    }

    /// Place the eye at `eye`, keeping the target.
    pub fn look_from(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        self.distance = offset.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.polar = (offset.y / offset.length().max(f32::EPSILON))
            .clamp(-1.0, 1.0)
            .acos()
            .clamp(MIN_POLAR, MAX_POLAR);
        self.yaw = offset.x.atan2(offset.z);
    }

    pub fn eye(&self) -> Vec3 {
        let (sp, cp) = self.polar.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        self.target + Vec3::new(sp * sy, cp, sp * cy) * self.distance
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Drag by `delta` pixels in a viewport `viewport_height` pixels tall.
    pub fn orbit(&mut self, delta: Vec2, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.yaw_velocity -= std::f32::consts::TAU * delta.x / h;
        self.polar_velocity -= std::f32::consts::TAU * delta.y / h;
    }

    /// Wheel zoom; positive notches move closer.
    pub fn zoom(&mut self, notches: f32) {
        self.distance = (self.distance * ZOOM_STEP.powf(notches)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Apply damped orbit velocity. Call once per frame.
    pub fn update(&mut self) {
        self.yaw += self.yaw_velocity * DAMPING_FACTOR;
        self.polar = (self.polar + self.polar_velocity * DAMPING_FACTOR).clamp(MIN_POLAR, MAX_POLAR);
        self.yaw_velocity *= 1.0 - DAMPING_FACTOR;
        self.polar_velocity *= 1.0 - DAMPING_FACTOR;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// World point to viewport pixels (origin top-left). `None` behind the camera.
    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Vec2> {
        let clip = self.view_proj() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x * 0.5 + 0.5) * viewport.x,
            (-ndc.y * 0.5 + 0.5) * viewport.y,
        ))
    }

    /// Ray from the eye through a normalized device coordinate.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray {
            origin: near,
            dir: (far - near).normalize_or_zero(),
        }
    }

    /// Camera basis vectors for billboards.
    pub fn right_up(&self) -> (Vec3, Vec3) {
        let view = self.view();
        (
            Vec3::new(view.x_axis.x, view.y_axis.x, view.z_axis.x),
            Vec3::new(view.x_axis.y, view.y_axis.y, view.z_axis.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_the_default_eye() {
        let cam = OrbitCamera::new(16.0 / 9.0);
        assert!((cam.eye() - Vec3::new(6.0, 3.0, 8.0)).length() < 1e-4);
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let cam = OrbitCamera::new(1.5);
        let p = cam.project(cam.target, Vec2::new(1200.0, 800.0)).unwrap();
        assert!((p - Vec2::new(600.0, 400.0)).length() < 0.01);
    }

    #[test]
    fn center_ray_passes_through_target() {
        let cam = OrbitCamera::new(1.0);
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        let to_target = cam.target - ray.origin;
        let along = to_target.dot(ray.dir);
        let miss = (to_target - ray.dir * along).length();
        assert!(miss < 1e-3);
    }

    #[test]
    fn points_behind_the_eye_do_not_project() {
        let cam = OrbitCamera::new(1.0);
        let behind = cam.eye() + (cam.eye() - cam.target);
        assert!(cam.project(behind, Vec2::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn orbit_is_damped_and_clamped_above_horizon() {
        let mut cam = OrbitCamera::new(1.0);
        cam.orbit(Vec2::new(0.0, -10_000.0), 800.0);
        for _ in 0..200 {
            cam.update();
        }
        assert!(cam.eye().y >= cam.target.y);
        let yaw_before = cam.yaw;
        cam.update();
        assert!((cam.yaw - yaw_before).abs() < 1e-6);
    }

    #[test]
    fn zoom_respects_limits() {
        let mut cam = OrbitCamera::new(1.0);
        cam.zoom(1000.0);
        assert_eq!(cam.distance(), MIN_DISTANCE);
        cam.zoom(-1000.0);
        assert_eq!(cam.distance(), MAX_DISTANCE);
    }
}
