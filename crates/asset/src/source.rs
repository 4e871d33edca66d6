//! Where the model comes from.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::{
    error::LoadError,
    model::{Material, Model},
    mtl::load_mtl_from_reader,
    obj::load_obj_from_reader,
    texture::TextureData,
};

/// Performs one complete fetch. Called on the loader thread.
pub trait ModelSource: Send + Sync + 'static {
    /// Short human-readable origin, for logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Model, LoadError>;
}

/// Material library + geometry file living side by side in one directory.
#[derive(Clone, Debug)]
pub struct FsModelSource {
    dir: PathBuf,
    material_lib: String,
    geometry: String,
}

impl FsModelSource {
    pub fn new(
        dir: impl Into<PathBuf>,
        material_lib: impl Into<String>,
        geometry: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            material_lib: material_lib.into(),
            geometry: geometry.into(),
        }
    }

    fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
        File::open(path)
            .map(BufReader::new)
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Materials first, with their diffuse maps decoded up front.
    fn load_materials(&self) -> Result<Vec<Material>, LoadError> {
        let path = self.dir.join(&self.material_lib);
        let parsed = load_mtl_from_reader(Self::open(&path)?)
            .map_err(|source| LoadError::Parse { path, source })?;

        Ok(parsed
            .iter()
            .map(|mtl| {
                let texture = mtl.diffuse_map.as_ref().and_then(|file| {
                    let tex_path = self.dir.join(file);
                    match TextureData::load(&tex_path) {
                        Ok(tex) => Some(tex),
                        Err(err) => {
                            log::warn!(
                                "Material '{}' drawn untextured: {:#}",
                                mtl.name,
                                err
                            );
                            None
                        }
                    }
                });
                Material::from_mtl(mtl, texture)
            })
            .collect())
    }
}

impl ModelSource for FsModelSource {
    fn describe(&self) -> String {
        format!(
            "{} (+ {})",
            self.dir.join(&self.geometry).display(),
            self.material_lib
        )
    }

    fn fetch(&self) -> Result<Model, LoadError> {
        let materials = self.load_materials()?;

        let path = self.dir.join(&self.geometry);
        let obj = load_obj_from_reader(Self::open(&path)?)
            .map_err(|source| LoadError::Parse { path, source })?;
        if !obj.material_libs.iter().any(|lib| *lib == self.material_lib) {
            log::debug!(
                "{} references {:?}; using {} instead",
                self.geometry,
                obj.material_libs,
                self.material_lib
            );
        }

        let name = Path::new(&self.geometry)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.geometry.clone());
        Ok(Model::assemble(name, obj, materials))
    }
}
