use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::types::{Face, ImportedScene, Mesh, SceneNode};

/// Load a PLY file into a single-mesh [`ImportedScene`].
///
/// Polygons are kept as-is; triangulation is left to post-processing.
pub fn load_ply(path: &Path) -> Result<ImportedScene> {
    let file = File::open(path)
        .map_err(|e| ModelError::Import(format!("Failed to open PLY: {e}")))?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| ModelError::Import(format!("Failed to parse PLY: {e}")))?;

    let vertices = ply
        .payload
        .get("vertex")
        .ok_or_else(|| ModelError::Import("PLY file missing 'vertex' element".into()))?;

    debug!(vertex_count = vertices.len(), "Parsing PLY vertices");

    let mut mesh = Mesh {
        name: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string(),
        positions: Vec::with_capacity(vertices.len()),
        ..Default::default()
    };

    let has_normals = vertices
        .first()
        .map(|v| v.contains_key("nx"))
        .unwrap_or(false);
    let has_colors = vertices
        .first()
        .map(|v| v.contains_key("red") || v.contains_key("r"))
        .unwrap_or(false);
    let has_texcoords = vertices
        .first()
        .map(|v| v.contains_key("u") || v.contains_key("s"))
        .unwrap_or(false);

    for vertex in vertices {
        mesh.positions.push([
            get_float_property(vertex, "x")?,
            get_float_property(vertex, "y")?,
            get_float_property(vertex, "z")?,
        ]);

        if has_normals {
            mesh.normals.push([
                get_float_property(vertex, "nx")?,
                get_float_property(vertex, "ny")?,
                get_float_property(vertex, "nz")?,
            ]);
        }

        if has_texcoords {
            let (u_key, v_key) = if vertex.contains_key("u") {
                ("u", "v")
            } else {
                ("s", "t")
            };
            mesh.texcoords.push([
                get_float_property(vertex, u_key)?,
                get_float_property(vertex, v_key)?,
            ]);
        }

        if has_colors {
            mesh.colors.push(get_color_property(vertex)?);
        }
    }

    if let Some(faces) = ply.payload.get("face") {
        debug!(face_count = faces.len(), "Parsing PLY faces");
        mesh.faces.reserve(faces.len());
        for face in faces {
            let face_indices = get_index_list(face)?;
            if !face_indices.is_empty() {
                mesh.faces.push(Face::new(face_indices));
            }
        }
    } else {
        // point cloud
        mesh.faces = (0..mesh.positions.len() as u32)
            .map(|i| Face::new([i]))
            .collect();
    }

    Ok(ImportedScene {
        root: SceneNode {
            meshes: vec![0],
            ..Default::default()
        },
        meshes: vec![mesh],
        materials: Vec::new(),
    })
}

/// Extract a float property, handling Float/Double/Int/Short types.
fn get_float_property(element: &DefaultElement, key: &str) -> Result<f32> {
    let prop = element.get(key).ok_or_else(|| {
        ModelError::Import(format!("PLY vertex missing property '{key}'"))
    })?;

    match prop {
        Property::Float(v) => Ok(*v),
        Property::Double(v) => Ok(*v as f32),
        Property::Int(v) => Ok(*v as f32),
        Property::Short(v) => Ok(*v as f32),
        Property::UInt(v) => Ok(*v as f32),
        Property::UShort(v) => Ok(*v as f32),
        Property::Char(v) => Ok(*v as f32),
        Property::UChar(v) => Ok(*v as f32),
        _ => Err(ModelError::Import(format!(
            "PLY property '{key}' has unsupported type"
        ))),
    }
}

/// Extract an RGBA color from a vertex, normalizing integer channels to 0..1.
/// Alpha defaults to 1 when the file has none.
fn get_color_property(element: &DefaultElement) -> Result<[f32; 4]> {
    // Try "red"/"green"/"blue"/"alpha" first, then "r"/"g"/"b"/"a"
    let long = element.contains_key("red");
    let (r_key, g_key, b_key, a_key) = if long {
        ("red", "green", "blue", "alpha")
    } else {
        ("r", "g", "b", "a")
    };

    let r = normalize_color_value(element, r_key)?;
    let g = normalize_color_value(element, g_key)?;
    let b = normalize_color_value(element, b_key)?;
    let a = if element.contains_key(a_key) {
        normalize_color_value(element, a_key)?
    } else {
        1.0
    };

    Ok([r, g, b, a])
}

/// Normalize a single color channel: UChar 0-255 -> 0.0-1.0, Float stays as-is.
fn normalize_color_value(element: &DefaultElement, key: &str) -> Result<f32> {
    let prop = element.get(key).ok_or_else(|| {
        ModelError::Import(format!("PLY vertex missing color property '{key}'"))
    })?;

    match prop {
        Property::UChar(v) => Ok(*v as f32 / 255.0),
        Property::Float(v) => Ok(*v),
        Property::Double(v) => Ok(*v as f32),
        Property::Short(v) => Ok(*v as f32 / 255.0),
        Property::UShort(v) => Ok(*v as f32 / 255.0),
        Property::Int(v) => Ok(*v as f32 / 255.0),
        Property::UInt(v) => Ok(*v as f32 / 255.0),
        _ => Err(ModelError::Import(format!(
            "PLY color property '{key}' has unsupported type"
        ))),
    }
}

/// Extract the index list from a face element.
fn get_index_list(face: &DefaultElement) -> Result<Vec<u32>> {
    // Try "vertex_indices" first, then "vertex_index"
    let key = if face.contains_key("vertex_indices") {
        "vertex_indices"
    } else {
        "vertex_index"
    };

    let prop = face.get(key).ok_or_else(|| {
        ModelError::Import("PLY face missing vertex_indices property".into())
    })?;

    match prop {
        Property::ListInt(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListUInt(v) => Ok(v.clone()),
        Property::ListUChar(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListShort(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListUShort(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        _ => Err(ModelError::Import(
            "PLY face vertex_indices has unsupported type".into(),
        )),
    }
}
