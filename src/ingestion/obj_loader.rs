use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ModelError, Result};
use crate::types::{Face, ImportedScene, MaterialRecord, Mesh, SceneNode};

/// Load an OBJ file (+ associated MTL) into an [`ImportedScene`].
///
/// Faces are read untriangulated; points and lines are kept. All models end up
/// on the root node, in file order.
pub fn load_obj(path: &Path) -> Result<ImportedScene> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: false,
        ignore_points: false,
        ignore_lines: false,
        ..Default::default()
    };

    let (models, materials_result) = tobj::load_obj(path, &options)
        .map_err(|e| ModelError::Import(format!("Failed to load OBJ: {e}")))?;

    debug!(model_count = models.len(), "Loaded OBJ models");

    let tobj_materials = match materials_result {
        Ok(mats) => mats,
        Err(e) => {
            warn!("Failed to load MTL: {e}");
            Vec::new()
        }
    };

    let mut materials: Vec<MaterialRecord> =
        tobj_materials.iter().map(convert_material).collect();
    let mut default_material = None;

    let mut meshes = Vec::with_capacity(models.len());
    for model in models {
        let material_index = match model.mesh.material_id {
            Some(id) if id < materials.len() => id,
            _ => *default_material.get_or_insert_with(|| {
                materials.push(MaterialRecord {
                    name: "default".into(),
                    ..Default::default()
                });
                materials.len() - 1
            }),
        };
        let mut mesh = convert_mesh(model.mesh);
        mesh.name = model.name;
        mesh.material_index = material_index;
        meshes.push(mesh);
    }

    let root = SceneNode {
        name: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string(),
        meshes: (0..meshes.len()).collect(),
        ..Default::default()
    };

    Ok(ImportedScene {
        root,
        meshes,
        materials,
    })
}

/// Convert a `tobj::Mesh` into our `Mesh`. UVs are kept as stored in the file.
fn convert_mesh(mesh: tobj::Mesh) -> Mesh {
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| [n[0], n[1], n[2]])
        .collect();

    let texcoords = mesh
        .texcoords
        .chunks_exact(2)
        .map(|uv| [uv[0], uv[1]])
        .collect();

    // Vertex colors: expand RGB to RGBA (alpha = 1.0)
    let colors = mesh
        .vertex_color
        .chunks_exact(3)
        .map(|rgb| [rgb[0], rgb[1], rgb[2], 1.0])
        .collect();

    let faces = if mesh.face_arities.is_empty() {
        mesh.indices
            .chunks_exact(3)
            .map(|tri| Face::new(tri))
            .collect()
    } else {
        let mut faces = Vec::with_capacity(mesh.face_arities.len());
        let mut start = 0usize;
        for &arity in &mesh.face_arities {
            let end = (start + arity as usize).min(mesh.indices.len());
            faces.push(Face::new(&mesh.indices[start..end]));
            start = end;
        }
        faces
    };

    Mesh {
        name: String::new(),
        positions,
        normals,
        texcoords,
        colors,
        faces,
        material_index: 0,
    }
}

fn rgb_to_rgba(rgb: [f32; 3], alpha: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], alpha]
}

/// Parse a "r g b" triple from an unrecognised MTL statement such as `Ke`.
fn parse_rgb(value: &str) -> Option<[f32; 3]> {
    let mut it = value.split_whitespace().map(|v| v.parse::<f32>());
    match (it.next(), it.next(), it.next()) {
        (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => Some([r, g, b]),
        _ => None,
    }
}

/// Convert a tobj material into a `MaterialRecord`.
fn convert_material(mat: &tobj::Material) -> MaterialRecord {
    // illum 0 and 1 have no specular term
    let specular_model = mat.illumination_model.map(|i| i >= 2).unwrap_or(true);

    let (shininess, shininess_strength) = match mat.shininess {
        Some(ns) if specular_model => (Some(ns), Some(1.0)),
        _ => (None, None),
    };

    MaterialRecord {
        name: mat.name.clone(),
        diffuse: mat
            .diffuse
            .map(|kd| rgb_to_rgba(kd, mat.dissolve.unwrap_or(1.0))),
        specular: mat.specular.map(|ks| rgb_to_rgba(ks, 1.0)),
        ambient: mat.ambient.map(|ka| rgb_to_rgba(ka, 1.0)),
        emissive: mat
            .unknown_param
            .get("Ke")
            .and_then(|v| parse_rgb(v))
            .map(|ke| rgb_to_rgba(ke, 1.0)),
        shininess,
        shininess_strength,
        two_sided: None,
        wireframe: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Topology;

    fn tobj_mesh(indices: Vec<u32>, face_arities: Vec<u32>) -> tobj::Mesh {
        tobj::Mesh {
            positions: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            ],
            normals: vec![],
            texcoords: vec![],
            indices,
            vertex_color: vec![],
            face_arities,
            texcoord_indices: vec![],
            normal_indices: vec![],
            material_id: None,
        }
    }

    #[test]
    fn convert_mesh_basic() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            vertex_color: vec![],
            face_arities: vec![],
            texcoord_indices: vec![],
            normal_indices: vec![],
            material_id: Some(0),
        };

        let converted = convert_mesh(mesh);
        assert_eq!(converted.vertex_count(), 3);
        assert_eq!(converted.face_count(), 1);
        assert!(converted.has_normals());
        assert!(converted.has_texcoords());
        assert!(!converted.has_colors());
        assert_eq!(converted.faces[0].topology(), Topology::Triangle);
    }

    #[test]
    fn convert_mesh_keeps_uvs_unflipped() {
        let mut mesh = tobj_mesh(vec![0, 1, 2], vec![]);
        mesh.texcoords = vec![0.0, 0.0, 1.0, 0.3, 0.5, 1.0, 0.0, 0.0];

        let converted = convert_mesh(mesh);
        assert_eq!(converted.texcoords[1], [1.0, 0.3]);
        assert_eq!(converted.texcoords[2], [0.5, 1.0]);
    }

    #[test]
    fn convert_mesh_mixed_arities() {
        // a quad, a line and a point
        let mesh = tobj_mesh(vec![0, 1, 2, 3, 0, 2, 3], vec![4, 2, 1]);
        let converted = convert_mesh(mesh);

        assert_eq!(converted.face_count(), 3);
        assert_eq!(converted.faces[0].indices, vec![0, 1, 2, 3]);
        assert_eq!(converted.faces[0].topology(), Topology::Polygon);
        assert_eq!(converted.faces[1].topology(), Topology::Line);
        assert_eq!(converted.faces[2].topology(), Topology::Point);
        assert_eq!(converted.corner_count(), 7);
    }

    #[test]
    fn convert_mesh_vertex_color_rgb_to_rgba() {
        let mut mesh = tobj_mesh(vec![0, 1, 2], vec![]);
        mesh.vertex_color = vec![
            1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0,
        ];

        let converted = convert_mesh(mesh);
        assert!(converted.has_colors());
        assert_eq!(converted.colors.len(), 4);
        assert_eq!(converted.colors[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(converted.colors[2], [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn material_mapping() {
        let mut mat = tobj::Material {
            name: "red".into(),
            diffuse: Some([1.0, 0.0, 0.0]),
            dissolve: Some(0.5),
            specular: Some([0.5, 0.5, 0.5]),
            shininess: Some(32.0),
            ..Default::default()
        };
        mat.unknown_param
            .insert("Ke".to_string(), "0.1 0.2 0.3".to_string());

        let record = convert_material(&mat);
        assert_eq!(record.name, "red");
        assert_eq!(record.diffuse, Some([1.0, 0.0, 0.0, 0.5]));
        assert_eq!(record.specular, Some([0.5, 0.5, 0.5, 1.0]));
        assert_eq!(record.emissive, Some([0.1, 0.2, 0.3, 1.0]));
        assert_eq!(record.ambient, None);
        assert_eq!(record.shininess, Some(32.0));
        assert_eq!(record.shininess_strength, Some(1.0));
    }

    #[test]
    fn illum_without_specular_drops_shininess() {
        let mat = tobj::Material {
            shininess: Some(10.0),
            illumination_model: Some(1),
            ..Default::default()
        };
        let record = convert_material(&mat);
        assert_eq!(record.shininess, None);
        assert_eq!(record.shininess_strength, None);
    }

    #[test]
    fn parse_rgb_rejects_short_input() {
        assert_eq!(parse_rgb("1 2 3"), Some([1.0, 2.0, 3.0]));
        assert_eq!(parse_rgb("1 2"), None);
        assert_eq!(parse_rgb("a b c"), None);
    }
}
