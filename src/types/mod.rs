pub mod bounds;
pub mod material;
pub mod scene;
pub mod streams;

pub use bounds::{BoundingBox, Normalization};
pub use material::{MaterialParams, MaterialRecord, MaterialSink, NoMaterialSink, resolve_material};
pub use scene::{Face, ImportedScene, Mesh, SceneNode, Topology};
pub use streams::{AttributeStreams, BufferDescriptor, StreamKind, StreamView};
