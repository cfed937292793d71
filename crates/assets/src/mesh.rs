use crate::AssetError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Indexed triangle mesh stored as flat arrays.
///
/// Positions and normals are 3 floats per vertex, UVs 2 floats per vertex.
/// Normals and UVs may be empty; everything else must agree on the vertex
/// count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<f32>,
    #[serde(default)]
    pub normals: Vec<f32>,
    #[serde(default)]
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[vertex * 3..vertex * 3 + 3])
    }

    /// Check array lengths and index ranges.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.positions.is_empty() || self.indices.is_empty() {
            return Err(AssetError::InvalidMesh("mesh has no geometry".into()));
        }
        if self.positions.len() % 3 != 0 {
            return Err(AssetError::InvalidMesh(format!(
                "position array length {} is not a multiple of 3",
                self.positions.len()
            )));
        }
        let vertices = self.vertex_count();
        if self.has_normals() && self.normals.len() != self.positions.len() {
            return Err(AssetError::InvalidMesh(format!(
                "{} normal floats for {vertices} vertices",
                self.normals.len()
            )));
        }
        if self.has_uvs() && self.uvs.len() != vertices * 2 {
            return Err(AssetError::InvalidMesh(format!(
                "{} uv floats for {vertices} vertices",
                self.uvs.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(AssetError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= vertices) {
            return Err(AssetError::InvalidMesh(format!(
                "index {bad} out of range for {vertices} vertices"
            )));
        }
        Ok(())
    }

    /// Parse a JSON mesh with `positions`, `normals`, `uvs`, `indices` keys.
    pub fn from_json_str(data: &str) -> Result<Self, AssetError> {
        let mesh: Self = serde_json::from_str(data)?;
        mesh.validate()?;
        Ok(mesh)
    }

    /// Load and validate a JSON mesh file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mesh = Self::from_json_str(&data)?;
        tracing::info!(
            "loaded mesh {} ({} vertices, {} triangles)",
            path.display(),
            mesh.vertex_count(),
            mesh.index_count() / 3
        );
        Ok(mesh)
    }

    /// Fill in smooth, area-weighted vertex normals if the mesh has none.
    pub fn with_computed_normals(mut self) -> Self {
        if self.has_normals() {
            return self;
        }
        let mut accum = vec![Vec3::ZERO; self.vertex_count()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = self.position(a);
            let face = (self.position(b) - pa).cross(self.position(c) - pa);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
        self.normals = accum
            .into_iter()
            .flat_map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
        self
    }

    /// UV sphere centred on the origin with outward CCW winding.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Self::default();

        for r in 0..=rings {
            let theta = std::f32::consts::PI * r as f32 / rings as f32;
            for s in 0..=segments {
                let phi = std::f32::consts::TAU * s as f32 / segments as f32;
                let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                mesh.positions.extend_from_slice(&(normal * radius).to_array());
                mesh.normals.extend_from_slice(&normal.to_array());
                mesh.uvs.push(s as f32 / segments as f32);
                mesh.uvs.push(r as f32 / rings as f32);
            }
        }

        let stride = segments + 1;
        for r in 0..rings {
            for s in 0..segments {
                let a = r * stride + s;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }

    /// Square in the local XZ plane facing +Y, used for the mirror.
    pub fn mirror_quad(half_extent: f32) -> Self {
        let h = half_extent;
        #[rustfmt::skip]
        let positions = vec![
            -h, 0.0,  h,
             h, 0.0,  h,
            -h, 0.0, -h,
             h, 0.0, -h,
        ];
        Self {
            positions,
            normals: [0.0f32, 1.0, 0.0].repeat(4),
            uvs: vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2, 2, 1, 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_normal(mesh: &MeshData, tri: usize) -> Vec3 {
        let i = &mesh.indices[tri * 3..tri * 3 + 3];
        let a = mesh.position(i[0] as usize);
        let b = mesh.position(i[1] as usize);
        let c = mesh.position(i[2] as usize);
        (b - a).cross(c - a)
    }

    #[test]
    fn mirror_quad_faces_up() {
        let quad = MeshData::mirror_quad(2.0);
        quad.validate().unwrap();
        assert_eq!(quad.vertex_count(), 4);
        for tri in 0..2 {
            let n = triangle_normal(&quad, tri);
            assert!(n.y > 0.0, "triangle {tri} faces {n}");
        }
    }

    #[test]
    fn sphere_is_valid_and_outward() {
        let sphere = MeshData::uv_sphere(3.0, 16, 8);
        sphere.validate().unwrap();
        // Skip the degenerate pole rows and check a band triangle.
        let tri = 16 * 2 * 3;
        let n = triangle_normal(&sphere, tri);
        let i = sphere.indices[tri * 3] as usize;
        assert!(n.dot(sphere.position(i)) > 0.0);
    }

    #[test]
    fn sphere_positions_on_radius() {
        let sphere = MeshData::uv_sphere(2.5, 12, 6);
        for v in 0..sphere.vertex_count() {
            assert!((sphere.position(v).length() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn json_mesh_parses() {
        let json = r#"{
            "positions": [0,0,0, 1,0,0, 0,0,-1],
            "uvs": [0,0, 1,0, 0,1],
            "indices": [0,1,2]
        }"#;
        let mesh = MeshData::from_json_str(json).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert!(!mesh.has_normals());
    }

    #[test]
    fn json_rejects_out_of_range_index() {
        let json = r#"{"positions": [0,0,0, 1,0,0, 0,1,0], "indices": [0,1,3]}"#;
        let err = MeshData::from_json_str(json).unwrap_err();
        assert!(matches!(err, AssetError::InvalidMesh(_)));
    }

    #[test]
    fn json_rejects_normal_length_mismatch() {
        let json = r#"{"positions": [0,0,0, 1,0,0, 0,1,0], "normals": [0,1,0], "indices": [0,1,2]}"#;
        assert!(MeshData::from_json_str(json).is_err());
    }

    #[test]
    fn json_rejects_garbage() {
        let err = MeshData::from_json_str("not json").unwrap_err();
        assert!(matches!(err, AssetError::Json(_)));
    }

    #[test]
    fn computed_normals_follow_winding() {
        let mesh = MeshData {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        }
        .with_computed_normals();
        assert_eq!(mesh.normals.len(), 9);
        assert!((mesh.normals[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn load_json_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.json");
        let quad = MeshData::mirror_quad(1.0);
        std::fs::write(&path, serde_json::to_string(&quad).unwrap()).unwrap();
        let loaded = MeshData::load_json(&path).unwrap();
        assert_eq!(loaded, quad);
    }

    #[test]
    fn load_json_missing_file_names_path() {
        let err = MeshData::load_json("/no/such/mesh.json").unwrap_err();
        assert!(err.to_string().contains("/no/such/mesh.json"));
    }
}
