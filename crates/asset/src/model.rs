//! The loaded asset: geometry parts bound to materials.

use std::sync::Arc;

use crate::{
    mesh::{Aabb, MeshData},
    mtl::MtlMaterial,
    obj::ObjData,
    texture::TextureData,
};

/// Render-ready material. Cloning is cheap: the decoded texture is shared.
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
    pub diffuse_map: Option<Arc<TextureData>>,
}

impl Material {
    pub fn from_mtl(mtl: &MtlMaterial, diffuse_map: Option<TextureData>) -> Self {
        Self {
            name: mtl.name.clone(),
            ambient: mtl.ambient,
            diffuse: mtl.diffuse,
            specular: mtl.specular,
            shininess: mtl.shininess,
            opacity: mtl.opacity,
            diffuse_map: diffuse_map.map(Arc::new),
        }
    }

    /// Plain white material for faces without `usemtl` or with an unknown name.
    pub fn fallback() -> Self {
        Self::from_mtl(&MtlMaterial::new("default"), None)
    }
}

#[derive(Clone, Debug)]
pub struct ModelPart {
    pub mesh: MeshData,
    /// Index into [`Model::materials`].
    pub material: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct Model {
    pub name: String,
    pub parts: Vec<ModelPart>,
    pub materials: Vec<Material>,
}

impl Model {
    /// Bind each OBJ group to the material of the same name.
    pub fn assemble(name: impl Into<String>, obj: ObjData, materials: Vec<Material>) -> Self {
        let name = name.into();
        let parts = obj
            .groups
            .into_iter()
            .map(|group| {
                let material = group.material.as_deref().and_then(|wanted| {
                    let found = materials.iter().position(|m| m.name == wanted);
                    if found.is_none() {
                        log::warn!("{name}: material '{wanted}' not found in library");
                    }
                    found
                });
                ModelPart {
                    mesh: group.mesh,
                    material,
                }
            })
            .collect();

        Self {
            name,
            parts,
            materials,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.triangle_count()).sum()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.parts
            .iter()
            .filter_map(|p| p.mesh.bounds())
            .reduce(Aabb::union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mtl::load_mtl_from_str, obj::load_obj_from_str};

    fn two_group_obj() -> ObjData {
        load_obj_from_str(
            "v 0 0 0\nv 2 0 0\nv 0 3 0\nv 0 0 4\nusemtl fur\nf 1 2 3\nusemtl ghost\nf 1 3 4\n",
        )
        .expect("parse obj")
    }

    #[test]
    fn groups_bind_to_materials_by_name() {
        let mtl = load_mtl_from_str("newmtl fur\nKd 0.2 0.3 0.4\n").expect("parse mtl");
        let materials = mtl.iter().map(|m| Material::from_mtl(m, None)).collect();
        let model = Model::assemble("cat", two_group_obj(), materials);

        assert_eq!(model.parts.len(), 2);
        assert_eq!(model.parts[0].material, Some(0));
        // Unknown names fall back instead of failing the load.
        assert_eq!(model.parts[1].material, None);
        assert_eq!(model.materials[0].diffuse, [0.2, 0.3, 0.4]);
    }

    #[test]
    fn counts_and_bounds_span_all_parts() {
        let model = Model::assemble("cat", two_group_obj(), Vec::new());
        assert_eq!(model.triangle_count(), 2);
        assert_eq!(model.vertex_count(), 6);
        let aabb = model.bounds().expect("bounds");
        assert_eq!(aabb.min, glam::Vec3::ZERO);
        assert_eq!(aabb.max, glam::vec3(2.0, 3.0, 4.0));
    }
}
