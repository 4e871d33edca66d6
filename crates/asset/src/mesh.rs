//! CPU-side mesh representation used by loaders.

use glam::Vec3;

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Axis-aligned bounding box in object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(self, other: Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.vertices.iter();
        let mut aabb = Aabb::from_point(Vec3::from_array(iter.next()?.position));
        for v in iter {
            aabb.grow(Vec3::from_array(v.position));
        }
        Some(aabb)
    }

    /// Area-weighted smooth normals for the vertices flagged in `missing`.
    /// Vertices with a normal from the source file are left untouched.
    pub fn fill_missing_normals(&mut self, missing: &[bool]) {
        if !missing.iter().any(|&m| m) {
            return;
        }
        let mut acc = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let position = |i: usize| Vec3::from_array(self.vertices[i].position);
            // Unnormalised cross product: its length weights by triangle area.
            let n = (position(b) - position(a)).cross(position(c) - position(a));
            for i in [a, b, c] {
                acc[i] += n;
            }
        }
        for (i, v) in self.vertices.iter_mut().enumerate() {
            if missing.get(i).copied().unwrap_or(false) {
                // Degenerate fans get +Z rather than NaN.
                v.normal = acc[i].normalize_or(Vec3::Z).to_array();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default()], vec![0]);
        assert!(data.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn generated_normal_faces_counter_clockwise_side() {
        let mut mesh = MeshData::new(
            vec![
                MeshVertex::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
                MeshVertex::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
                MeshVertex::new([0.0, 1.0, 0.0], [9.0, 9.0, 9.0], [0.0; 2]),
            ],
            vec![0, 1, 2],
        );
        mesh.fill_missing_normals(&[true, true, false]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[1].normal, [0.0, 0.0, 1.0]);
        // Normals read from the file are kept as-is.
        assert_eq!(mesh.vertices[2].normal, [9.0, 9.0, 9.0]);
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let mesh = MeshData::new(
            vec![
                MeshVertex::new([-1.0, 2.0, 0.0], [0.0; 3], [0.0; 2]),
                MeshVertex::new([3.0, -2.0, 5.0], [0.0; 3], [0.0; 2]),
            ],
            vec![0, 1, 0],
        );
        let aabb = mesh.bounds().expect("non-empty mesh");
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(3.0, 2.0, 5.0));
        assert_eq!(aabb.size(), Vec3::new(4.0, 4.0, 5.0));
    }

    #[test]
    fn degenerate_triangle_gets_fallback_normal() {
        let p = [1.0, 1.0, 1.0];
        let mut mesh = MeshData::new(
            vec![MeshVertex::new(p, [0.0; 3], [0.0; 2]); 3],
            vec![0, 1, 2],
        );
        mesh.fill_missing_normals(&[true; 3]);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn union_spans_both_boxes() {
        let a = Aabb::from_point(Vec3::new(-1.0, 0.0, 0.0));
        let b = Aabb::from_point(Vec3::new(0.0, 2.0, -3.0));
        let u = a.union(b);
        assert_eq!(u.min, Vec3::new(-1.0, 0.0, -3.0));
        assert_eq!(u.max, Vec3::new(0.0, 2.0, 0.0));
    }
}
