//! Scene description: background, lights and the viewing camera.
//! The renderer reads this once per frame; it owns no GPU state.

use crate::{Camera, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    /// Linear RGB.
    pub color: Vec3,
    pub intensity: f32,
}

impl AmbientLight {
    #[inline]
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}

/// Light shining from `position` towards the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the lit surface towards the light.
    #[inline]
    pub fn to_light(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }

    #[inline]
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}

#[derive(Clone, Debug)]
pub struct Scene {
    /// Linear RGB clear colour.
    pub background: Vec3,
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
    pub camera: Camera,
}

impl Scene {
    pub fn new(background: Vec3, camera: Camera) -> Self {
        Self {
            background,
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: 0.0,
            },
            sun: DirectionalLight {
                color: Vec3::ONE,
                intensity: 0.0,
                position: Vec3::Y,
            },
            camera,
        }
    }

    #[inline]
    pub fn with_ambient(mut self, color: Vec3, intensity: f32) -> Self {
        self.ambient = AmbientLight { color, intensity };
        self
    }

    #[inline]
    pub fn with_sun(mut self, color: Vec3, intensity: f32, position: Vec3) -> Self {
        self.sun = DirectionalLight {
            color,
            intensity,
            position,
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn sun_direction_is_normalized() {
        let light = DirectionalLight {
            color: Vec3::ONE,
            intensity: 1.0,
            position: vec3(5.0, 10.0, 7.5),
        };
        assert!((light.to_light().length() - 1.0).abs() < 1e-6);
        assert!(light.to_light().y > 0.0);
    }

    #[test]
    fn degenerate_sun_points_up() {
        let light = DirectionalLight {
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::ZERO,
        };
        assert_eq!(light.to_light(), Vec3::Y);
    }
}
