use crate::{Mat4, Vec3};

/// Right-handed perspective camera, Y up, looking at `target`.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    /// Camera at the origin looking down -Z; place it with [`Self::looking_at`].
    pub fn perspective(fov_y_deg: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            eye: Vec3::ZERO,
            target: Vec3::NEG_Z,
            fov_y_rad: fov_y_deg.to_radians(),
            z_near,
            z_far,
            aspect,
        }
    }

    pub fn looking_at(mut self, eye: Vec3, target: Vec3) -> Self {
        self.eye = eye;
        self.target = target;
        self
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    /// Depth maps to [0, 1] as wgpu expects.
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect.max(1e-6), self.z_near, self.z_far)
    }

    #[inline]
    pub fn proj_view(&self) -> Mat4 {
        self.proj() * self.view()
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }

    /// Update the aspect ratio from a pixel size; zero sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn perspective_takes_degrees() {
        let cam = Camera::perspective(90.0, 1.0, 0.1, 100.0);
        assert!((cam.fov_y_rad - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(cam.target, Vec3::NEG_Z);
    }

    #[test]
    fn proj_view_is_finite_and_target_is_centred() {
        let cam = Camera::perspective(75.0, 16.0 / 9.0, 0.1, 1000.0)
            .looking_at(vec3(0.0, 0.0, 30.0), vec3(0.0, -5.0, 0.0));
        let pv = cam.proj_view();
        assert!(pv.to_cols_array().iter().all(|f| f.is_finite()));

        let clip = pv * cam.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn zero_viewport_keeps_aspect() {
        let mut cam = Camera::perspective(75.0, 2.0, 0.1, 10.0);
        cam.set_viewport(0, 480);
        assert_eq!(cam.aspect, 2.0);
        cam.set_viewport(300, 100);
        assert_eq!(cam.aspect, 3.0);
    }
}
