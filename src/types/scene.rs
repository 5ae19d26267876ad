use glam::Mat4;

use crate::error::{ModelError, Result};

use super::material::MaterialRecord;

/// Primitive topology implied by the number of indices in a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Point,
    Line,
    Triangle,
    Polygon,
}

/// A single face: an ordered list of vertex indices into its mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn new(indices: impl Into<Vec<u32>>) -> Self {
        Self {
            indices: indices.into(),
        }
    }

    /// Topology by index count: 1 = point, 2 = line, 3 = triangle, more = polygon.
    ///
    /// An empty face is reported as a point; it emits nothing when flattened.
    pub fn topology(&self) -> Topology {
        match self.indices.len() {
            0 | 1 => Topology::Point,
            2 => Topology::Line,
            3 => Topology::Triangle,
            _ => Topology::Polygon,
        }
    }
}

/// Imported mesh. Attribute arrays are either empty (absent) or parallel to
/// `positions`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// First texture-coordinate channel.
    pub texcoords: Vec<[f32; 2]>,
    /// First vertex-color channel, RGBA.
    pub colors: Vec<[f32; 4]>,
    pub faces: Vec<Face>,
    /// Index into `ImportedScene::materials`.
    pub material_index: usize,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_texcoords(&self) -> bool {
        !self.texcoords.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Number of (face, vertex-slot) pairs, i.e. how many positions this mesh
    /// contributes when flattened.
    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(|f| f.indices.len()).sum()
    }
}

/// Node of the imported scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Local transform relative to the parent node.
    pub transform: Mat4,
    /// Indices into `ImportedScene::meshes`.
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl SceneNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// In-memory scene produced by the importer: a node tree plus the mesh and
/// material arrays its nodes refer to.
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    pub root: SceneNode,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<MaterialRecord>,
}

impl ImportedScene {
    /// Material for a mesh, if its index is in range.
    pub fn material_for(&self, mesh: &Mesh) -> Option<&MaterialRecord> {
        self.materials.get(mesh.material_index)
    }

    pub fn total_vertices(&self) -> usize {
        self.meshes.iter().map(|m| m.vertex_count()).sum()
    }

    pub fn total_faces(&self) -> usize {
        self.meshes.iter().map(|m| m.face_count()).sum()
    }

    /// Check the cross-references the flattener relies on.
    pub fn validate(&self) -> Result<()> {
        for (i, mesh) in self.meshes.iter().enumerate() {
            let n = mesh.positions.len();
            if mesh.has_normals() && mesh.normals.len() != n {
                return Err(ModelError::Import(format!(
                    "mesh {i}: {} normals for {n} vertices",
                    mesh.normals.len()
                )));
            }
            if mesh.has_texcoords() && mesh.texcoords.len() != n {
                return Err(ModelError::Import(format!(
                    "mesh {i}: {} texcoords for {n} vertices",
                    mesh.texcoords.len()
                )));
            }
            if mesh.has_colors() && mesh.colors.len() != n {
                return Err(ModelError::Import(format!(
                    "mesh {i}: {} colors for {n} vertices",
                    mesh.colors.len()
                )));
            }
            if let Some(bad) = mesh
                .faces
                .iter()
                .flat_map(|f| f.indices.iter())
                .find(|&&idx| idx as usize >= n)
            {
                return Err(ModelError::Import(format!(
                    "mesh {i}: face index {bad} out of range ({n} vertices)"
                )));
            }
        }

        validate_node(&self.root, self.meshes.len())
    }
}

fn validate_node(node: &SceneNode, mesh_count: usize) -> Result<()> {
    if let Some(bad) = node.meshes.iter().find(|&&m| m >= mesh_count) {
        return Err(ModelError::Import(format!(
            "node \"{}\" references mesh {bad} of {mesh_count}",
            node.name
        )));
    }
    node.children
        .iter()
        .try_for_each(|child| validate_node(child, mesh_count))
}
