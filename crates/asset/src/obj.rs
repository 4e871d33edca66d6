//! OBJ parser: positions, normals, texture coordinates, material groups.

use std::{
    collections::HashMap,
    io::{self, BufRead},
};

use anyhow::{Context, Result, anyhow};

use crate::{
    mesh::{MeshData, MeshVertex},
    text::lossy_lines,
};

/// Faces sharing one `usemtl` name.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjGroup {
    pub material: Option<String>,
    pub mesh: MeshData,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjData {
    /// Files named by `mtllib`, in order of appearance.
    pub material_libs: Vec<String>,
    /// Non-empty groups in order of first use.
    pub groups: Vec<ObjGroup>,
}

impl ObjData {
    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(|g| g.mesh.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.mesh.triangle_count()).sum()
    }
}

/// Load an OBJ file from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> Result<ObjData> {
    parse_obj(reader)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> Result<ObjData> {
    parse_obj(io::Cursor::new(contents))
}

/// Position, texcoord and normal indices of one face corner, 0-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct Corner {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

/// Attribute pools shared by every group.
#[derive(Default)]
struct Pools {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

impl Pools {
    /// Parse `v`, `v/vt`, `v//vn` or `v/vt/vn`.
    fn corner(&self, token: &str, line: usize) -> Result<Corner> {
        let mut fields = token.split('/');
        let position = match fields.next() {
            Some(field) if !field.is_empty() => resolve_index(field, self.positions.len(), line)?,
            _ => anyhow::bail!("line {line}: face corner '{token}' has no position"),
        };
        let mut optional = |len: usize| -> Result<Option<usize>> {
            match fields.next() {
                Some(field) if !field.is_empty() => resolve_index(field, len, line).map(Some),
                _ => Ok(None),
            }
        };
        let uv = optional(self.texcoords.len())?;
        let normal = optional(self.normals.len())?;
        Ok(Corner {
            position,
            uv,
            normal,
        })
    }

    fn vertex(&self, corner: Corner) -> MeshVertex {
        MeshVertex::new(
            self.positions[corner.position],
            corner.normal.map_or([0.0; 3], |i| self.normals[i]),
            corner.uv.map_or([0.0; 2], |i| self.texcoords[i]),
        )
    }
}

/// Per-material accumulation; vertices are deduplicated within a group only.
struct GroupBuilder {
    material: Option<String>,
    unique: HashMap<Corner, u32>,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    missing_normal: Vec<bool>,
}

impl GroupBuilder {
    fn new(material: Option<String>) -> Self {
        Self {
            material,
            unique: HashMap::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            missing_normal: Vec::new(),
        }
    }

    fn index_of(&mut self, pools: &Pools, corner: Corner) -> Result<u32> {
        if let Some(&index) = self.unique.get(&corner) {
            return Ok(index);
        }
        let index = u32::try_from(self.vertices.len())
            .map_err(|_| anyhow!("more than {} vertices in one material group", u32::MAX))?;
        self.vertices.push(pools.vertex(corner));
        self.missing_normal.push(corner.normal.is_none());
        self.unique.insert(corner, index);
        Ok(index)
    }

    /// Fan-triangulate a polygon; fewer than three corners adds nothing.
    fn push_polygon(&mut self, corners: &[u32]) {
        if let [first, rest @ ..] = corners {
            for pair in rest.windows(2) {
                self.indices.extend([*first, pair[0], pair[1]]);
            }
        }
    }

    fn finish(self) -> Option<ObjGroup> {
        if self.indices.is_empty() {
            return None;
        }
        let mut mesh = MeshData::new(self.vertices, self.indices);
        mesh.fill_missing_normals(&self.missing_normal);
        Some(ObjGroup {
            material: self.material,
            mesh,
        })
    }
}

/// Whitespace-separated fields of one statement, with its 1-based line number.
struct Fields<'a> {
    line: usize,
    rest: std::str::SplitWhitespace<'a>,
}

impl Fields<'_> {
    fn float(&mut self, what: &str) -> Result<f32> {
        let token = self
            .rest
            .next()
            .ok_or_else(|| anyhow!("line {}: missing {what}", self.line))?;
        token
            .parse::<f32>()
            .with_context(|| format!("line {}: bad {what} '{token}'", self.line))
    }

    fn vec3(&mut self, what: &str) -> Result<[f32; 3]> {
        Ok([self.float(what)?, self.float(what)?, self.float(what)?])
    }
}

fn parse_obj<R: BufRead>(reader: R) -> Result<ObjData> {
    let mut pools = Pools::default();
    let mut material_libs: Vec<String> = Vec::new();
    let mut builders: Vec<GroupBuilder> = vec![GroupBuilder::new(None)];
    let mut by_material: HashMap<Option<String>, usize> = HashMap::from([(None, 0)]);
    let mut current = 0usize;
    let mut polygon: Vec<u32> = Vec::new();

    for (index, text) in lossy_lines(reader).enumerate() {
        let line = index + 1;
        let text = text.with_context(|| format!("line {line}: read failed"))?;
        let statement = text.trim();
        if statement.is_empty() || statement.starts_with('#') {
            continue;
        }

        let mut words = statement.split_whitespace();
        let Some(tag) = words.next() else {
            continue;
        };
        let mut fields = Fields { line, rest: words };

        match tag {
            "v" => pools.positions.push(fields.vec3("vertex coordinate")?),
            "vn" => pools.normals.push(fields.vec3("normal component")?),
            "vt" => {
                let u = fields.float("texture u")?;
                // `vt u` is legal; v defaults to 0.
                let v = if fields.rest.clone().next().is_some() {
                    fields.float("texture v")?
                } else {
                    0.0
                };
                pools.texcoords.push([u, v]);
            }
            "mtllib" => material_libs.extend(fields.rest.map(str::to_owned)),
            "usemtl" => {
                let name = statement[tag.len()..].trim();
                let key = (!name.is_empty()).then(|| name.to_owned());
                current = *by_material.entry(key.clone()).or_insert_with(|| {
                    builders.push(GroupBuilder::new(key));
                    builders.len() - 1
                });
            }
            "f" => {
                let group = &mut builders[current];
                polygon.clear();
                for token in fields.rest {
                    let corner = pools.corner(token, line)?;
                    polygon.push(group.index_of(&pools, corner)?);
                }
                group.push_polygon(&polygon);
            }
            // o/g/s/l/p carry nothing the viewer uses.
            _ => {}
        }
    }

    let groups: Vec<ObjGroup> = builders.into_iter().filter_map(GroupBuilder::finish).collect();
    if groups.is_empty() {
        anyhow::bail!("OBJ contained no triangles");
    }

    Ok(ObjData {
        material_libs,
        groups,
    })
}

/// 1-based, or negative relative to the elements read so far.
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize> {
    let raw = token
        .parse::<i64>()
        .with_context(|| format!("line {line}: bad index '{token}'"))?;
    let resolved = match raw {
        0 => anyhow::bail!("line {line}: OBJ indices are 1-based, found 0"),
        r if r > 0 => r - 1,
        r => len as i64 + r,
    };
    if resolved < 0 || resolved as usize >= len {
        anyhow::bail!("line {line}: index {raw} out of range ({len} defined)");
    }
    Ok(resolved as usize)
}
