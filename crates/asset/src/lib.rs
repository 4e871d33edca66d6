//! Asset loading for the viewer: OBJ geometry, MTL materials, diffuse
//! textures, and the store that fetches the model once and caches it.

pub mod error;
pub mod mesh;
pub mod model;
pub mod mtl;
pub mod obj;
pub mod source;
pub mod store;
mod text;
pub mod texture;

pub use error::LoadError;
pub use model::{Material, Model, ModelPart};
pub use source::{FsModelSource, ModelSource};
pub use store::{AssetStore, Ensure};
