use std::path::Path;

use glam::Mat4;
use gltf::mesh::Mode;
use tracing::{debug, warn};

use crate::error::{ModelError, Result};
use crate::types::{Face, ImportedScene, MaterialRecord, Mesh, SceneNode};

/// Load a glTF or GLB file into an [`ImportedScene`].
///
/// Every primitive becomes one mesh. The node hierarchy of the default scene
/// (or the first one) hangs under a synthetic root node.
pub fn load_gltf(path: &Path) -> Result<ImportedScene> {
    let (document, buffers, _images) = gltf::import(path)
        .map_err(|e| ModelError::Import(format!("Failed to load glTF: {e}")))?;

    debug!(
        meshes = document.meshes().len(),
        materials = document.materials().len(),
        nodes = document.nodes().len(),
        "Loaded glTF document"
    );

    let mut materials: Vec<MaterialRecord> =
        document.materials().map(|m| convert_material(&m)).collect();
    let mut default_material = None;

    let mut meshes = Vec::new();
    // gltf mesh index -> our mesh indices (one per primitive)
    let mut primitive_meshes: Vec<Vec<usize>> = Vec::with_capacity(document.meshes().len());

    for mesh in document.meshes() {
        let mut ids = Vec::new();
        for primitive in mesh.primitives() {
            match extract_primitive(&primitive, &buffers) {
                Ok(mut converted) => {
                    converted.name = mesh.name().unwrap_or_default().to_string();
                    converted.material_index = match primitive.material().index() {
                        Some(i) if i < materials.len() => i,
                        _ => *default_material.get_or_insert_with(|| {
                            materials.push(MaterialRecord {
                                name: "default".into(),
                                ..Default::default()
                            });
                            materials.len() - 1
                        }),
                    };
                    ids.push(meshes.len());
                    meshes.push(converted);
                }
                Err(e) => {
                    warn!(mesh = ?mesh.name(), "Skipping primitive: {e}");
                }
            }
        }
        primitive_meshes.push(ids);
    }

    let scene = document.default_scene().or_else(|| document.scenes().next());
    let root = match scene {
        Some(scene) => SceneNode {
            name: scene.name().unwrap_or_default().to_string(),
            children: scene
                .nodes()
                .map(|n| convert_node(&n, &primitive_meshes))
                .collect(),
            ..Default::default()
        },
        None => {
            warn!("glTF has no scene, attaching all meshes to the root");
            SceneNode {
                meshes: (0..meshes.len()).collect(),
                ..Default::default()
            }
        }
    };

    Ok(ImportedScene {
        root,
        meshes,
        materials,
    })
}

fn convert_node(node: &gltf::Node<'_>, primitive_meshes: &[Vec<usize>]) -> SceneNode {
    let meshes = node
        .mesh()
        .and_then(|m| primitive_meshes.get(m.index()))
        .cloned()
        .unwrap_or_default();

    SceneNode {
        name: node.name().unwrap_or_default().to_string(),
        transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
        meshes,
        children: node
            .children()
            .map(|c| convert_node(&c, primitive_meshes))
            .collect(),
    }
}

/// Extract geometry from a single glTF primitive.
fn extract_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Result<Mesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

    // Positions (required)
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| ModelError::Import("Primitive missing positions".into()))?
        .collect();

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_default();

    // glTF UVs have a top-left origin; store them bottom-left like OBJ
    let texcoords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().map(to_bottom_left).collect())
        .unwrap_or_default();

    let colors: Vec<[f32; 4]> = reader
        .read_colors(0)
        .map(|iter| iter.into_rgba_f32().collect())
        .unwrap_or_default();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(read) => read.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    Ok(Mesh {
        name: String::new(),
        faces: faces_for_mode(primitive.mode(), &indices),
        positions,
        normals,
        texcoords,
        colors,
        material_index: 0,
    })
}

fn to_bottom_left(uv: [f32; 2]) -> [f32; 2] {
    [uv[0], 1.0 - uv[1]]
}

/// Split a primitive's index list into faces according to its draw mode.
fn faces_for_mode(mode: Mode, indices: &[u32]) -> Vec<Face> {
    match mode {
        Mode::Points => indices.iter().map(|&i| Face::new([i])).collect(),
        Mode::Lines => indices.chunks_exact(2).map(Face::new).collect(),
        Mode::LineStrip => indices.windows(2).map(Face::new).collect(),
        Mode::LineLoop => {
            let mut faces: Vec<Face> = indices.windows(2).map(Face::new).collect();
            if let (Some(&first), Some(&last)) = (indices.first(), indices.last()) {
                if indices.len() > 2 {
                    faces.push(Face::new([last, first]));
                }
            }
            faces
        }
        Mode::Triangles => indices.chunks_exact(3).map(Face::new).collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                // keep winding consistent on odd triangles
                if i % 2 == 0 {
                    Face::new([w[0], w[1], w[2]])
                } else {
                    Face::new([w[1], w[0], w[2]])
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&hub, rest)) => rest
                .windows(2)
                .map(|w| Face::new([hub, w[0], w[1]]))
                .collect(),
            None => Vec::new(),
        },
    }
}

/// Convert a glTF material to a `MaterialRecord`.
fn convert_material(material: &gltf::Material<'_>) -> MaterialRecord {
    let pbr = material.pbr_metallic_roughness();
    let [er, eg, eb] = material.emissive_factor();

    MaterialRecord {
        name: material.name().unwrap_or_default().to_string(),
        diffuse: Some(pbr.base_color_factor()),
        emissive: Some([er, eg, eb, 1.0]),
        two_sided: Some(material.double_sided()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(faces: &[Face]) -> Vec<Vec<u32>> {
        faces.iter().map(|f| f.indices.clone()).collect()
    }

    #[test]
    fn triangles_and_points() {
        let idx = [0, 1, 2, 2, 1, 3];
        assert_eq!(
            indices(&faces_for_mode(Mode::Triangles, &idx)),
            vec![vec![0, 1, 2], vec![2, 1, 3]]
        );
        assert_eq!(faces_for_mode(Mode::Points, &idx).len(), 6);
    }

    #[test]
    fn strips_and_fans() {
        let idx = [0, 1, 2, 3];
        assert_eq!(
            indices(&faces_for_mode(Mode::TriangleStrip, &idx)),
            vec![vec![0, 1, 2], vec![2, 1, 3]]
        );
        assert_eq!(
            indices(&faces_for_mode(Mode::TriangleFan, &idx)),
            vec![vec![0, 1, 2], vec![0, 2, 3]]
        );
        assert!(faces_for_mode(Mode::TriangleFan, &[]).is_empty());
    }

    #[test]
    fn line_modes() {
        let idx = [0, 1, 2];
        assert_eq!(
            indices(&faces_for_mode(Mode::Lines, &idx)),
            vec![vec![0, 1]]
        );
        assert_eq!(
            indices(&faces_for_mode(Mode::LineStrip, &idx)),
            vec![vec![0, 1], vec![1, 2]]
        );
        assert_eq!(
            indices(&faces_for_mode(Mode::LineLoop, &idx)),
            vec![vec![0, 1], vec![1, 2], vec![2, 0]]
        );
    }

    #[test]
    fn uv_origin_conversion() {
        assert_eq!(to_bottom_left([0.25, 0.0]), [0.25, 1.0]);
        assert_eq!(to_bottom_left([0.5, 1.0]), [0.5, 0.0]);
    }
}
