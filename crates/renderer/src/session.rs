//! One presentation of the model: scene, camera, orbit controls and a
//! private copy of the model instance.

use std::sync::Arc;

use asset::{Material, Model, ModelPart};
use corelib::{Camera, OrbitControls, Scene, Transform, Vec3, color::linear_from_hex, vec3};

use crate::gpu::SessionGpu;

/// Fixed look of the viewer.
#[derive(Clone, Debug)]
pub struct ViewerSettings {
    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub camera_position: Vec3,
    pub background: u32,
    pub ambient_intensity: f32,
    pub sun_intensity: f32,
    pub sun_position: Vec3,
    pub model_scale: f32,
    pub model_offset: Vec3,
    pub orbit_target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_pan: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            fov_y_deg: 75.0,
            z_near: 0.1,
            z_far: 1000.0,
            camera_position: vec3(0.0, 0.0, 30.0),
            background: 0x008ba3,
            ambient_intensity: 0.8,
            sun_intensity: 1.0,
            sun_position: vec3(5.0, 10.0, 7.5),
            model_scale: 0.1,
            model_offset: vec3(0.0, -10.0, 0.0),
            orbit_target: vec3(0.0, -5.0, 0.0),
            min_distance: 20.0,
            max_distance: 60.0,
            enable_pan: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// A session's own copy of the model: placement and material values are
/// per-session, geometry is shared read-only with the cache.
#[derive(Clone, Debug)]
pub struct ModelInstance {
    pub model: Arc<Model>,
    pub transform: Transform,
    pub materials: Vec<Material>,
    fallback: Material,
}

impl ModelInstance {
    pub fn new(model: &Arc<Model>, transform: Transform) -> Self {
        Self {
            model: Arc::clone(model),
            transform,
            materials: model.materials.clone(),
            fallback: Material::fallback(),
        }
    }

    pub fn material_for(&self, part: &ModelPart) -> &Material {
        part.material
            .and_then(|i| self.materials.get(i))
            .unwrap_or(&self.fallback)
    }
}

pub struct ViewerSession {
    id: SessionId,
    pub(crate) scene: Scene,
    controls: OrbitControls,
    pub(crate) instance: ModelInstance,
    pub(crate) size: [u32; 2],
    running: bool,
    frames: u64,
    pub(crate) gpu: Option<SessionGpu>,
}

impl ViewerSession {
    pub fn new(id: SessionId, model: &Arc<Model>, settings: &ViewerSettings, size: [u32; 2]) -> Self {
        let size = [size[0].max(1), size[1].max(1)];
        let camera = Camera::perspective(
            settings.fov_y_deg,
            size[0] as f32 / size[1] as f32,
            settings.z_near,
            settings.z_far,
        )
        .looking_at(settings.camera_position, Vec3::ZERO);
        let scene = Scene::new(linear_from_hex(settings.background), camera)
            .with_ambient(Vec3::ONE, settings.ambient_intensity)
            .with_sun(Vec3::ONE, settings.sun_intensity, settings.sun_position);

        let controls = OrbitControls::new(settings.orbit_target)
            .with_pan(settings.enable_pan)
            .with_distance_range(settings.min_distance, settings.max_distance);

        let transform = Transform::from_scale_offset(settings.model_scale, settings.model_offset);

        let mut session = Self {
            id,
            scene,
            controls,
            instance: ModelInstance::new(model, transform),
            size,
            running: true,
            frames: 0,
            gpu: None,
        };
        // Aim the camera before the first frame.
        session.controls.update(&mut session.scene.camera);
        log::info!("Viewer session {} started for '{}'", id.0, model.name);
        session
    }

    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn instance(&self) -> &ModelInstance {
        &self.instance
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = [width, height];
        self.scene.camera.set_viewport(width, height);
    }

    /// Advance one redraw: apply pending orbit input. Returns `false` once stopped.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.controls.update(&mut self.scene.camera);
        self.frames += 1;
        true
    }

    /// End the redraw cycle and release GPU resources.
    pub fn stop(&mut self) {
        if self.running {
            log::info!(
                "Viewer session {} stopped after {} frames",
                self.id.0,
                self.frames
            );
        }
        self.running = false;
        self.gpu = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use asset::obj::load_obj_from_str;

    pub(crate) fn model() -> Arc<Model> {
        let obj = load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl fur\nf 1 2 3\n")
            .expect("parse obj");
        let mtl = asset::mtl::load_mtl_from_str("newmtl fur\nKd 0.3 0.2 0.1\n").expect("mtl");
        let materials = mtl.iter().map(|m| Material::from_mtl(m, None)).collect();
        Arc::new(Model::assemble("cat", obj, materials))
    }

    #[test]
    fn session_uses_viewer_constants() {
        let s = ViewerSession::new(SessionId(1), &model(), &ViewerSettings::default(), [800, 600]);
        let cam = &s.scene().camera;
        assert!((cam.fov_y_rad - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(cam.target, vec3(0.0, -5.0, 0.0));
        assert!((cam.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(s.instance().transform.scale, 0.1);
        assert_eq!(s.instance().transform.translation, vec3(0.0, -10.0, 0.0));
        assert_eq!(s.scene().ambient.intensity, 0.8);
        assert_eq!(s.scene().sun.position, vec3(5.0, 10.0, 7.5));
    }

    #[test]
    fn instances_do_not_share_material_state() {
        let m = model();
        let settings = ViewerSettings::default();
        let mut a = ViewerSession::new(SessionId(1), &m, &settings, [10, 10]);
        let b = ViewerSession::new(SessionId(2), &m, &settings, [10, 10]);

        a.instance.materials[0].diffuse = [1.0, 0.0, 0.0];
        a.instance.transform.translation = Vec3::ZERO;
        assert_eq!(b.instance().materials[0].diffuse, [0.3, 0.2, 0.1]);
        assert_eq!(m.materials[0].diffuse, [0.3, 0.2, 0.1]);
        assert_eq!(b.instance().transform.translation, vec3(0.0, -10.0, 0.0));
    }

    #[test]
    fn stopped_session_no_longer_ticks() {
        let mut s = ViewerSession::new(SessionId(7), &model(), &ViewerSettings::default(), [10, 10]);
        assert!(s.tick());
        assert!(s.tick());
        s.stop();
        assert!(!s.tick());
        assert_eq!(s.frames(), 2);
        assert!(!s.is_running());
    }

    #[test]
    fn zoom_input_respects_distance_clamp() {
        let mut s = ViewerSession::new(SessionId(1), &model(), &ViewerSettings::default(), [10, 10]);
        s.controls_mut().dolly(500.0);
        s.tick();
        assert!((s.scene().camera.distance() - 20.0).abs() < 1e-3);
    }
}
