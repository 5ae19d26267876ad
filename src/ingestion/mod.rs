pub mod gltf_loader;
pub mod obj_loader;
pub mod ply_loader;
pub mod postprocess;

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ModelError, Result};
use crate::types::{ImportedScene, MaterialRecord};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Obj,
    Gltf,
    Glb,
    Ply,
}

impl InputFormat {
    /// Detect format from file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "obj" => Ok(InputFormat::Obj),
            "gltf" => Ok(InputFormat::Gltf),
            "glb" => Ok(InputFormat::Glb),
            "ply" => Ok(InputFormat::Ply),
            _ => Err(ModelError::Import(format!(
                "Unsupported file format: .{ext}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Obj => "OBJ",
            InputFormat::Gltf => "glTF",
            InputFormat::Glb => "GLB",
            InputFormat::Ply => "PLY",
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post-processing applied after a loader has built the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOptions {
    /// Split polygons into triangle fans. Points and lines are kept.
    pub triangulate: bool,
    /// Generate smooth per-vertex normals for meshes that have none.
    pub gen_smooth_normals: bool,
    /// Flip the V texture coordinate (`v -> 1 - v`).
    pub flip_uvs: bool,
}

impl ImportOptions {
    /// The preset used by `Model::open`: real-time quality plus UV flip.
    pub fn realtime_quality() -> Self {
        Self {
            triangulate: true,
            gen_smooth_normals: true,
            flip_uvs: true,
        }
    }
}

/// Summary of an imported scene.
#[derive(Debug)]
pub struct SceneStats {
    pub total_nodes: usize,
    pub total_meshes: usize,
    pub total_vertices: usize,
    pub total_faces: usize,
    pub has_normals: bool,
    pub has_texcoords: bool,
    pub has_colors: bool,
    pub material_count: usize,
}

/// Import a model file into an [`ImportedScene`].
///
/// Loader failures are wrapped in [`ModelError::Import`] without further
/// interpretation.
pub fn import_scene(path: &Path, options: &ImportOptions) -> Result<ImportedScene> {
    if !path.exists() {
        return Err(ModelError::Import(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let format = InputFormat::from_path(path)?;
    info!(format = %format, path = %path.display(), "Importing model");

    let mut scene = match format {
        InputFormat::Obj => obj_loader::load_obj(path)?,
        InputFormat::Gltf | InputFormat::Glb => gltf_loader::load_gltf(path)?,
        InputFormat::Ply => ply_loader::load_ply(path)?,
    };

    // Meshes always resolve to some material.
    if scene.materials.is_empty() {
        scene.materials.push(MaterialRecord {
            name: "default".into(),
            ..Default::default()
        });
    }

    postprocess::apply(&mut scene, options);
    scene.validate()?;

    let stats = compute_stats(&scene);
    debug!(
        nodes = stats.total_nodes,
        meshes = stats.total_meshes,
        vertices = stats.total_vertices,
        faces = stats.total_faces,
        materials = stats.material_count,
        normals = stats.has_normals,
        texcoords = stats.has_texcoords,
        colors = stats.has_colors,
        "Import stats"
    );

    Ok(scene)
}

/// Compute summary statistics for a scene.
pub fn compute_stats(scene: &ImportedScene) -> SceneStats {
    SceneStats {
        total_nodes: scene.root.node_count(),
        total_meshes: scene.meshes.len(),
        total_vertices: scene.total_vertices(),
        total_faces: scene.total_faces(),
        has_normals: scene.meshes.iter().any(|m| m.has_normals()),
        has_texcoords: scene.meshes.iter().any(|m| m.has_texcoords()),
        has_colors: scene.meshes.iter().any(|m| m.has_colors()),
        material_count: scene.materials.len(),
    }
}
