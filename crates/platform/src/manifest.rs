//! Gallery manifest (RON): which model to load and which items to list.
//!
//! ```ron
//! #![enable(implicit_some)]
//! (
//!     asset: (dir: "recursos", material_lib: "cat.mtl", geometry: "cat.obj"),
//!     items: [(title: "Cat Statue", description: "Bronze, Late Period.")],
//! )
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use asset::FsModelSource;
use serde::Deserialize;

use crate::gallery::GalleryItem;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AssetSpec {
    pub dir: PathBuf,
    pub material_lib: String,
    pub geometry: String,
}

impl Default for AssetSpec {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("recursos"),
            material_lib: "12221_Cat_v1_l3.mtl".into(),
            geometry: "12221_Cat_v1_l3.obj".into(),
        }
    }
}

impl AssetSpec {
    pub fn source(&self) -> FsModelSource {
        FsModelSource::new(&self.dir, &self.material_lib, &self.geometry)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GalleryManifest {
    #[serde(default)]
    pub asset: AssetSpec,
    pub items: Vec<GalleryItem>,
}

impl GalleryManifest {
    pub fn from_ron_str(contents: &str) -> Result<Self> {
        Ok(ron::from_str(contents)?)
    }

    /// Relative asset directories are resolved against the manifest's folder.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read gallery manifest {}", path.display()))?;
        let mut manifest = Self::from_ron_str(&contents)
            .with_context(|| format!("Failed to parse gallery manifest {}", path.display()))?;

        if manifest.asset.dir.is_relative() {
            if let Some(parent) = path.parent() {
                manifest.asset.dir = parent.join(&manifest.asset.dir);
            }
        }
        log::info!(
            "Gallery manifest {}: {} items, model {}",
            path.display(),
            manifest.items.len(),
            manifest.asset.dir.join(&manifest.asset.geometry).display()
        );
        Ok(manifest)
    }

    /// Used when no manifest is given on the command line.
    pub fn builtin() -> Self {
        Self {
            asset: AssetSpec::default(),
            items: vec![
                GalleryItem::new(
                    "Cat Statue",
                    "Seated cat cast in bronze, sacred to the goddess Bastet.",
                ),
                GalleryItem::new(
                    "Temple Guardian",
                    "Cat figure that once watched over a temple entrance.",
                ),
                GalleryItem::new(
                    "Votive Offering",
                    "Small cat left by pilgrims as a gift to the temple.",
                ),
                GalleryItem::new(
                    "Household Amulet",
                    "Protective cat carried for luck and good health.",
                ),
                GalleryItem::new(
                    "Sculptor's Model",
                    "Study piece used to teach apprentices proportions.",
                ),
            ],
        }
    }
}
