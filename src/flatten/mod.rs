pub mod bounds;
pub mod rebuild;
pub mod texgen;

use glam::{Mat4, Vec3};
use tracing::{debug, warn};

use crate::config::TextureMode;
use crate::types::{
    AttributeStreams, ImportedScene, MaterialParams, MaterialSink, Mesh, SceneNode,
    resolve_material,
};

pub use bounds::scene_bounds;
pub use rebuild::{RebuildState, RebuildTracker};

/// Settings that influence the flattened output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlattenOptions {
    /// Resolve and apply per-mesh materials, and emit vertex colors.
    pub use_materials: bool,
    pub texture_mode: TextureMode,
}

/// Result of a flatten pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenOutput {
    pub streams: AttributeStreams,
    /// Whether any mesh supplied its own texture coordinates.
    pub have_texcoords: bool,
}

impl FlattenOutput {
    /// True when no stream received any data ("nothing to render").
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Flatten `scene` into fresh attribute streams.
///
/// See [`flatten_into`].
pub fn flatten(
    scene: &ImportedScene,
    options: &FlattenOptions,
    initial: Mat4,
    sink: &mut dyn MaterialSink,
) -> FlattenOutput {
    let mut streams = AttributeStreams::default();
    let have_texcoords = flatten_into(scene, options, initial, sink, &mut streams);
    FlattenOutput {
        streams,
        have_texcoords,
    }
}

/// Flatten `scene` into `streams`, reusing their allocations.
///
/// The node tree is walked pre-order starting from `initial` (normally the
/// normalisation matrix), so every emitted position is already normalised.
/// Each face re-emits its vertices; shared vertices are duplicated. Returns
/// whether any mesh supplied its own texture coordinates.
pub fn flatten_into(
    scene: &ImportedScene,
    options: &FlattenOptions,
    initial: Mat4,
    sink: &mut dyn MaterialSink,
    streams: &mut AttributeStreams,
) -> bool {
    streams.clear();

    Flattener {
        scene,
        options,
        sink,
        streams: &mut *streams,
    }
    .visit(&scene.root, initial);

    let have_texcoords = !streams.texcoords.is_empty();
    project_texcoords(options.texture_mode, have_texcoords, streams);

    debug!(
        vertices = streams.vertices.len(),
        normals = streams.normals.len(),
        texcoords = streams.texcoords.len(),
        colors = streams.colors.len(),
        "Flattened scene"
    );
    if !streams.is_aligned() {
        warn!(
            vertices = streams.vertices.len(),
            normals = streams.normals.len(),
            texcoords = streams.texcoords.len(),
            colors = streams.colors.len(),
            "Attribute streams differ in length; meshes carry different attributes"
        );
    }

    have_texcoords
}

/// Replace or keep texture coordinates according to the configured mode.
fn project_texcoords(mode: TextureMode, have_texcoords: bool, streams: &mut AttributeStreams) {
    match mode {
        TextureMode::None => {}
        TextureMode::Uv if have_texcoords => {}
        TextureMode::Uv | TextureMode::Linear => {
            streams.texcoords = texgen::linear(&streams.vertices);
        }
        TextureMode::Spheremap => {
            streams.texcoords = texgen::spheremap(&streams.normals);
        }
    }
}

struct Flattener<'a, 's> {
    scene: &'a ImportedScene,
    options: &'a FlattenOptions,
    sink: &'a mut (dyn MaterialSink + 's),
    streams: &'a mut AttributeStreams,
}

impl Flattener<'_, '_> {
    fn visit(&mut self, node: &SceneNode, parent: Mat4) {
        let world = parent * node.transform;
        let scene = self.scene;

        for &index in &node.meshes {
            match scene.meshes.get(index) {
                Some(mesh) => self.emit_mesh(mesh, &world),
                None => warn!(node = %node.name, mesh = index, "Skipping missing mesh"),
            }
        }

        for child in &node.children {
            self.visit(child, world);
        }
    }

    fn emit_mesh(&mut self, mesh: &Mesh, world: &Mat4) {
        if self.options.use_materials {
            let params = self
                .scene
                .material_for(mesh)
                .map(resolve_material)
                .unwrap_or_else(MaterialParams::default);
            self.sink.apply_material(&params);
        }

        let emit_colors = self.options.use_materials && mesh.has_colors();
        let streams = &mut *self.streams;

        for face in &mesh.faces {
            for &index in &face.indices {
                let i = index as usize;
                let Some(&position) = mesh.positions.get(i) else {
                    continue;
                };

                if emit_colors {
                    if let Some(&c) = mesh.colors.get(i) {
                        streams.colors.push(c);
                    }
                }
                if let Some(&n) = mesh.normals.get(i) {
                    streams.normals.push(n);
                }
                if let Some(&t) = mesh.texcoords.get(i) {
                    streams.texcoords.push(t);
                }

                let p = world.transform_point3(Vec3::from_array(position));
                streams.vertices.push(p.to_array());
            }
        }
    }
}
