pub mod config;
pub mod error;
pub mod flatten;
pub mod ingestion;
pub mod model;
pub mod types;

pub use config::{ModelConfig, Properties, PropertyValue, TextureMode};
pub use error::{ModelError, Result};
pub use model::Model;
pub use types::{AttributeStreams, StreamKind};
