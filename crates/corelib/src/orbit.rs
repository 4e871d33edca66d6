//! Orbit controls: rotate and zoom a camera around a fixed target point.
//!
//! Input is accumulated between frames (`rotate`, `dolly`, `pan`) and applied
//! to a [`Camera`] by [`OrbitControls::update`], once per redraw.

use std::f32::consts::{PI, TAU};

use crate::{Camera, Vec3};

/// Keeps the polar angle away from the poles so `look_at` never degenerates.
const POLAR_EPS: f32 = 1e-6;

#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    // Pending input, consumed by `update`.
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_pan: true,
            enable_zoom: true,
            enable_rotate: true,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }

    #[inline]
    pub fn with_distance_range(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max.max(min);
        self
    }

    #[inline]
    pub fn with_pan(mut self, enabled: bool) -> Self {
        self.enable_pan = enabled;
        self
    }

    /// Pointer drag in pixels. A drag across the full viewport height turns a full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enable_rotate || viewport_height <= 0.0 {
            return;
        }
        self.delta_theta -= TAU * dx / viewport_height * self.rotate_speed;
        self.delta_phi -= TAU * dy / viewport_height * self.rotate_speed;
    }

    /// Wheel steps: positive moves the camera towards the target.
    pub fn dolly(&mut self, steps: f32) {
        if !self.enable_zoom || steps == 0.0 {
            return;
        }
        self.scale *= self.zoom_scale().powf(steps);
    }

    /// Screen-space pan in world units. Returns `false` when panning is disabled.
    pub fn pan(&mut self, right: Vec3, up: Vec3, dx: f32, dy: f32) -> bool {
        if !self.enable_pan {
            return false;
        }
        self.pan_offset += (right * -dx + up * dy) * self.pan_speed;
        true
    }

    #[inline]
    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Apply pending input to `camera`, keeping it within the polar and
    /// distance limits and looking at `target`. Returns `true` if the eye moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let before = camera.eye;
        let offset = camera.eye - self.target;

        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI * 0.5)
        };

        theta += self.delta_theta;
        phi += self.delta_phi;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLAR_EPS, PI - POLAR_EPS);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.eye = self.target + offset;
        camera.target = self.target;

        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;

        camera.eye.distance_squared(before) > 1e-10
    }
}
