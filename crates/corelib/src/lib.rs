//! Core types: math re-exports, Transform, Camera, orbit controls and the
//! light/scene description shared by the presenter and the renderer.

pub use glam::{Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod color;
pub mod orbit;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use orbit::OrbitControls;
pub use scene::{AmbientLight, DirectionalLight, Scene};
pub use transform::Transform;
