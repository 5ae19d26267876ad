//! A loaded model: the imported scene plus the flattened attribute streams
//! derived from it, rebuilt lazily when the configuration changes.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::{ModelConfig, Properties, TextureMode};
use crate::error::{ModelError, Result};
use crate::flatten::{self, FlattenOptions, RebuildState, RebuildTracker, scene_bounds};
use crate::ingestion::{self, ImportOptions};
use crate::types::{
    AttributeStreams, BoundingBox, BufferDescriptor, ImportedScene, MaterialSink,
    NoMaterialSink, Normalization, StreamKind, StreamView,
};

pub struct Model {
    scene: Option<ImportedScene>,
    bounds: BoundingBox,
    normalization: Normalization,
    config: ModelConfig,
    tracker: RebuildTracker,
    have_texcoords: bool,
    streams: AttributeStreams,
    material_sink: Box<dyn MaterialSink>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("has_scene", &self.scene.is_some())
            .field("bounds", &self.bounds)
            .field("normalization", &self.normalization)
            .field("config", &self.config)
            .field("tracker", &self.tracker)
            .field("vertices", &self.streams.vertices.len())
            .finish()
    }
}

impl Model {
    /// An empty model that discards material changes.
    pub fn new() -> Self {
        Self::with_material_sink(Box::new(NoMaterialSink))
    }

    /// An empty model that forwards per-mesh materials to `sink` while
    /// flattening with materials enabled.
    pub fn with_material_sink(sink: Box<dyn MaterialSink>) -> Self {
        Self {
            scene: None,
            bounds: BoundingBox::default(),
            normalization: Normalization::identity(),
            config: ModelConfig::default(),
            tracker: RebuildTracker::default(),
            have_texcoords: false,
            streams: AttributeStreams::default(),
            material_sink: sink,
        }
    }

    /// The properties a host may write, with their initial values.
    pub fn writable_properties() -> Properties {
        Properties::new()
            .with("textype", "UV")
            .with("rescale", 0.0)
            .with("usematerials", 0.0)
    }

    /// Import `path`, apply `props` and produce the first set of streams.
    ///
    /// Any previously held scene is dropped first. When the import fails the
    /// model holds no scene, but the streams of the last successful flatten
    /// stay readable. An empty flatten result is logged, not returned.
    pub fn open(&mut self, path: &Path, props: &Properties) -> Result<()> {
        self.close();

        let scene = ingestion::import_scene(path, &ImportOptions::realtime_quality())?;
        info!(
            path = %path.display(),
            meshes = scene.meshes.len(),
            materials = scene.materials.len(),
            nodes = scene.root.node_count(),
            "Model loaded"
        );

        self.attach_scene(scene)?;
        self.set_properties(props);

        match self.render() {
            Ok(()) => {}
            Err(ModelError::EmptyResult) => {
                warn!(path = %path.display(), "Model has nothing to render")
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Take ownership of an already-imported scene.
    ///
    /// Computes the bounding box and normalization and marks the model dirty
    /// with new data pending. A fresh scene is always normalized: `rescale`
    /// is switched back on and only a later property change turns it off.
    /// Nothing is flattened until [`Self::render`].
    pub fn attach_scene(&mut self, scene: ImportedScene) -> Result<()> {
        scene.validate()?;

        self.bounds = scene_bounds(&scene);
        self.scene = Some(scene);
        self.config.rescale = true;
        self.update_normalization();
        self.tracker.opened();

        debug!(
            min = ?self.bounds.min,
            max = ?self.bounds.max,
            scale = self.normalization.scale,
            "Scene attached"
        );
        Ok(())
    }

    /// Drop the imported scene. Calling this without a scene is a no-op.
    pub fn close(&mut self) {
        if self.scene.take().is_some() {
            debug!("Scene released");
        }
    }

    /// Apply a property bag. Only values that actually change mark the model
    /// dirty; nothing is re-flattened until the next [`Self::render`].
    pub fn set_properties(&mut self, props: &Properties) {
        let before = self.config;
        self.config.apply_properties(props);
        self.config_changed(before);
    }

    pub fn set_use_materials(&mut self, enabled: bool) {
        let before = self.config;
        self.config.use_materials = enabled;
        self.config_changed(before);
    }

    pub fn set_texture_mode(&mut self, mode: TextureMode) {
        let before = self.config;
        self.config.texture_mode = mode;
        self.config_changed(before);
    }

    pub fn set_rescale(&mut self, enabled: bool) {
        let before = self.config;
        self.config.rescale = enabled;
        self.config_changed(before);
    }

    fn config_changed(&mut self, before: ModelConfig) {
        if before == self.config {
            return;
        }
        if before.rescale != self.config.rescale {
            self.update_normalization();
        }
        debug!(
            textype = %self.config.texture_mode,
            rescale = self.config.rescale,
            usematerials = self.config.use_materials,
            "Configuration changed"
        );
        self.tracker.invalidate();
    }

    fn update_normalization(&mut self) {
        self.normalization = if self.config.rescale {
            Normalization::from_bounds(&self.bounds)
        } else {
            Normalization::identity()
        };
    }

    /// Re-flatten the scene if it is dirty.
    ///
    /// Errors with [`ModelError::NoScene`] when nothing is loaded and with
    /// [`ModelError::EmptyResult`] when the scene produced no data; the model
    /// then stays dirty. A clean model returns immediately.
    pub fn render(&mut self) -> Result<()> {
        let scene = self.scene.as_ref().ok_or(ModelError::NoScene)?;
        if !self.tracker.is_dirty() {
            return Ok(());
        }

        let options = FlattenOptions {
            use_materials: self.config.use_materials,
            texture_mode: self.config.texture_mode,
        };
        self.have_texcoords = flatten::flatten_into(
            scene,
            &options,
            self.normalization.matrix(),
            self.material_sink.as_mut(),
            &mut self.streams,
        );

        let produced = !self.streams.is_empty();
        self.tracker.flattened(produced);
        if !produced {
            return Err(ModelError::EmptyResult);
        }

        info!(
            vertices = self.streams.vertices.len(),
            normals = self.streams.normals.len(),
            texcoords = self.streams.texcoords.len(),
            colors = self.streams.colors.len(),
            "Model flattened"
        );
        Ok(())
    }

    pub fn state(&self) -> RebuildState {
        self.tracker.state()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// New stream data is available since the consumer last called
    /// [`Self::unset_refresh`].
    pub fn needs_refresh(&self) -> bool {
        self.tracker.needs_refresh()
    }

    pub fn unset_refresh(&mut self) {
        self.tracker.unset_refresh();
    }

    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene(&self) -> Option<&ImportedScene> {
        self.scene.as_ref()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    /// Whether any mesh supplied its own UVs in the last flatten.
    pub fn have_texcoords(&self) -> bool {
        self.have_texcoords
    }

    pub fn streams(&self) -> &AttributeStreams {
        &self.streams
    }

    pub fn stream(&self, kind: StreamKind) -> StreamView<'_> {
        self.streams.view(kind)
    }

    /// Look a stream up by name ("vertices", "normals", "texcoords",
    /// "colors"). Unknown names yield an empty view.
    pub fn stream_by_name(&self, name: &str) -> StreamView<'_> {
        match name.parse::<StreamKind>() {
            Ok(kind) => self.stream(kind),
            Err(e) => {
                warn!("{e}");
                StreamView::empty(StreamKind::Vertices)
            }
        }
    }

    pub fn buffer_descriptors(&self) -> Vec<BufferDescriptor<'_>> {
        self.streams.buffer_descriptors()
    }

    /// Write the current streams to `path` as pretty-printed JSON.
    pub fn dump_streams(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.streams)
            .map_err(io::Error::from)?;
        debug!(path = %path.display(), "Streams written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::types::{Face, MaterialParams, MaterialRecord, Mesh, SceneNode};
    use approx::assert_relative_eq;

    fn triangle_scene() -> ImportedScene {
        ImportedScene {
            root: SceneNode {
                meshes: vec![0],
                ..Default::default()
            },
            meshes: vec![Mesh {
                positions: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
                normals: vec![[0.0, 0.0, 1.0]; 3],
                faces: vec![Face::new([0, 1, 2])],
                ..Default::default()
            }],
            materials: vec![MaterialRecord::default()],
        }
    }

    #[test]
    fn attach_leaves_model_dirty() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();

        assert!(model.has_scene());
        assert_eq!(model.state(), RebuildState::Dirty);
        assert!(model.needs_refresh());
        assert!(model.streams().is_empty());
    }

    #[test]
    fn render_cleans_and_normalizes() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();
        model.unset_refresh();
        model.render().unwrap();

        assert_eq!(model.state(), RebuildState::Clean);
        assert!(model.needs_refresh());
        assert_relative_eq!(model.normalization().scale, 1.0);

        let v = &model.streams().vertices;
        assert_eq!(v.len(), 3);
        assert_relative_eq!(v[0][0], -1.0);
        assert_relative_eq!(v[0][1], -1.0);
        assert_relative_eq!(v[1][0], 1.0);
        assert_relative_eq!(v[2][1], 1.0);
    }

    #[test]
    fn render_without_scene() {
        let mut model = Model::new();
        assert!(matches!(model.render(), Err(ModelError::NoScene)));
    }

    #[test]
    fn clean_render_is_a_no_op() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();
        model.render().unwrap();
        model.unset_refresh();

        model.render().unwrap();
        assert!(!model.needs_refresh());
    }

    #[test]
    fn empty_scene_stays_dirty() {
        let mut model = Model::new();
        model.attach_scene(ImportedScene::default()).unwrap();
        assert!(matches!(model.render(), Err(ModelError::EmptyResult)));
        assert!(model.is_dirty());
    }

    #[test]
    fn property_changes_mark_dirty_only_on_change() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();
        model.render().unwrap();

        // same value: stays clean
        model.set_use_materials(false);
        assert_eq!(model.state(), RebuildState::Clean);

        model.set_use_materials(true);
        assert!(model.is_dirty());
        model.render().unwrap();

        model.set_properties(&Properties::new().with("textype", "linear"));
        assert!(model.is_dirty());
        model.render().unwrap();
        assert_eq!(model.streams().texcoords.len(), 3);

        model.set_properties(&Properties::new().with("textype", "linear"));
        assert_eq!(model.state(), RebuildState::Clean);
    }

    #[test]
    fn rescale_toggle_switches_coordinates() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();
        model.set_rescale(false);
        assert_eq!(*model.normalization(), Normalization::identity());
        model.render().unwrap();
        assert_eq!(model.streams().vertices[1], [2.0, 0.0, 0.0]);

        model.set_rescale(true);
        assert!(model.is_dirty());
        model.render().unwrap();
        assert_relative_eq!(model.streams().vertices[1][0], 1.0);
    }

    #[test]
    fn attach_renormalizes_after_rescale_was_off() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();
        model.set_rescale(false);
        assert_eq!(*model.normalization(), Normalization::identity());

        model.attach_scene(triangle_scene()).unwrap();
        assert!(model.config().rescale);
        assert_relative_eq!(model.normalization().scale, 1.0);
        model.render().unwrap();
        assert_relative_eq!(model.streams().vertices[1][0], 1.0);
    }

    #[test]
    fn unknown_textype_keeps_mode() {
        let mut model = Model::new();
        model.set_texture_mode(TextureMode::Spheremap);
        model.set_properties(&Properties::new().with("textype", "cubic"));
        assert_eq!(model.config().texture_mode, TextureMode::Spheremap);
    }

    #[test]
    fn stream_lookup_by_name() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();
        model.render().unwrap();

        assert_eq!(model.stream_by_name("vertices").len(), 3);
        assert_eq!(model.stream_by_name("normals").len(), 3);
        assert!(model.stream_by_name("texcoords").is_empty());
        assert!(model.stream_by_name("tangents").is_empty());
        assert_eq!(model.buffer_descriptors().len(), 4);
    }

    #[test]
    fn close_is_idempotent_and_keeps_streams() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();
        model.render().unwrap();

        model.close();
        model.close();
        assert!(!model.has_scene());
        assert_eq!(model.streams().vertices.len(), 3);
        assert!(matches!(model.render(), Err(ModelError::NoScene)));
    }

    #[test]
    fn material_sink_receives_resolved_materials() {
        let seen: Rc<RefCell<Vec<MaterialParams>>> = Rc::default();
        let sink_seen = Rc::clone(&seen);
        let mut model = Model::with_material_sink(Box::new(move |p: &MaterialParams| {
            sink_seen.borrow_mut().push(*p)
        }));

        model.attach_scene(triangle_scene()).unwrap();
        model.render().unwrap();
        assert!(seen.borrow().is_empty());

        model.set_use_materials(true);
        model.render().unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0], MaterialParams::default());
    }

    #[test]
    fn attach_rejects_invalid_scene() {
        let mut scene = triangle_scene();
        scene.root.meshes.push(7);
        let mut model = Model::new();
        assert!(matches!(
            model.attach_scene(scene),
            Err(ModelError::Import(_))
        ));
        assert!(!model.has_scene());
    }

    #[test]
    fn dump_streams_writes_json() {
        let mut model = Model::new();
        model.attach_scene(triangle_scene()).unwrap();
        model.render().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streams.json");
        model.dump_streams(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["vertices"].as_array().unwrap().len(), 3);
        assert!(json["texcoords"].as_array().unwrap().is_empty());

        let err = model
            .dump_streams(&dir.path().join("missing/streams.json"))
            .unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn writable_property_defaults() {
        let props = Model::writable_properties();
        assert_eq!(
            props.get("textype").and_then(|v| v.as_symbol()),
            Some("UV")
        );
        assert_eq!(props.get("rescale").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(
            props.get("usematerials").and_then(|v| v.as_bool()),
            Some(false)
        );
    }
}
