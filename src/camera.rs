//! Orbit camera.

use glam::{Mat4, Vec3};

/// An orbiting perspective camera looking at a fixed target.
///
/// Drifts slowly on its own; mouse dragging and scrolling adjust the orbit
/// angles and distance.
pub struct Camera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Radians per second of idle drift around the target.
    pub auto_orbit: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 1.5, 0.0),
            yaw: 0.6,
            pitch: 0.35,
            distance: 18.0,
            fov_y: 45f32.to_radians(),
            znear: 0.1,
            zfar: 400.0,
            auto_orbit: 0.05,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the idle drift.
    pub fn update(&mut self, dt: f32) {
        self.yaw += self.auto_orbit * dt;
    }

    /// Applies a mouse drag in screen pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * 0.008;
        self.pitch = (self.pitch + dy * 0.008).clamp(-1.4, 1.4);
    }

    /// Applies scroll-wheel zoom.
    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance * (1.0 - amount * 0.1)).clamp(4.0, 80.0);
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        let dir = Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        );
        self.target + dir * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Projection with wgpu's 0..1 depth range.
    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.znear, self.zfar)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_keeps_orbit_distance() {
        let mut camera = Camera::new();
        camera.drag(35.0, -10.0);
        let d = (camera.position() - camera.target).length();
        assert!((d - camera.distance).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::new();
        camera.drag(0.0, 10_000.0);
        assert!(camera.pitch <= 1.4);
    }
}
