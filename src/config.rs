use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use tracing::{debug, warn};

use crate::error::ModelError;

/// How texture coordinates are produced after flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureMode {
    /// Keep whatever UVs the meshes carry (possibly none).
    #[default]
    None,
    /// Keep mesh UVs; project linearly when the model has none. A host
    /// that asks for "UV" on a model without UVs therefore still gets
    /// coordinates, instead of the request being refused and the previous
    /// mode kept.
    Uv,
    /// Planar projection from positions.
    Linear,
    /// Sphere-map projection from normals.
    Spheremap,
}

impl TextureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureMode::None => "",
            TextureMode::Uv => "UV",
            TextureMode::Linear => "linear",
            TextureMode::Spheremap => "spheremap",
        }
    }
}

impl std::fmt::Display for TextureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextureMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(TextureMode::None),
            "UV" => Ok(TextureMode::Uv),
            "linear" => Ok(TextureMode::Linear),
            "spheremap" => Ok(TextureMode::Spheremap),
            _ => Err(ModelError::UnknownTextureType(s.to_string())),
        }
    }
}

/// Geometry-affecting model settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    pub texture_mode: TextureMode,
    /// Normalise the model into a cube of edge 2 around the origin.
    pub rescale: bool,
    /// Apply per-mesh materials and emit vertex colors.
    pub use_materials: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            texture_mode: TextureMode::None,
            rescale: true,
            use_materials: false,
        }
    }
}

/// Value stored in a [`Properties`] bag.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Float(f64),
    Symbol(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Symbol(s) => s.parse().ok(),
        }
    }

    /// Non-zero numbers are true.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_f64().map(|v| v != 0.0)
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            PropertyValue::Symbol(s) => Some(s.as_str()),
            PropertyValue::Float(_) => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Float(if v { 1.0 } else { 0.0 })
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Symbol(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Symbol(v)
    }
}

/// String-keyed property bag as handed over by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: BTreeMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`Self::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Properties understood by the model loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    TextureType,
    Rescale,
    UseMaterials,
}

impl PropertyKey {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "textype" | "texture-type" => Some(PropertyKey::TextureType),
            "rescale" => Some(PropertyKey::Rescale),
            "usematerials" | "use-materials" => Some(PropertyKey::UseMaterials),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PropertyKey::TextureType => "textype",
            PropertyKey::Rescale => "rescale",
            PropertyKey::UseMaterials => "usematerials",
        }
    }
}

impl ModelConfig {
    /// Merge a property bag into this configuration.
    ///
    /// Unknown keys and values of the wrong type are ignored; an unknown
    /// texture type keeps the current mode.
    pub fn apply_properties(&mut self, props: &Properties) {
        for (key, value) in props.iter() {
            let Some(pk) = PropertyKey::parse(key) else {
                debug!(key, "Ignoring unknown property");
                continue;
            };

            match pk {
                PropertyKey::TextureType => match value.as_symbol().map(str::parse::<TextureMode>) {
                    Some(Ok(mode)) => self.texture_mode = mode,
                    Some(Err(e)) => warn!("{e}; keeping \"{}\"", self.texture_mode),
                    None => warn!(key, "Texture type must be a symbol"),
                },
                PropertyKey::Rescale => match value.as_bool() {
                    Some(b) => self.rescale = b,
                    None => warn!(key, "Expected a number"),
                },
                PropertyKey::UseMaterials => match value.as_bool() {
                    Some(b) => self.use_materials = b,
                    None => warn!(key, "Expected a number"),
                },
            }
        }
    }

    /// The configuration as a property bag.
    pub fn to_properties(&self) -> Properties {
        Properties::new()
            .with(PropertyKey::TextureType.name(), self.texture_mode.as_str())
            .with(PropertyKey::Rescale.name(), self.rescale)
            .with(PropertyKey::UseMaterials.name(), self.use_materials)
    }
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "model-flattener",
    about = "Import a 3D model and flatten it into vertex attribute streams",
    version
)]
pub struct CliArgs {
    /// Input file (OBJ, glTF, GLB, PLY)
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Texture coordinate mode: UV, linear or spheremap
    #[arg(long)]
    pub textype: Option<String>,

    /// Keep the imported coordinates instead of normalising them
    #[arg(long)]
    pub no_rescale: bool,

    /// Apply materials and emit vertex colors
    #[arg(long)]
    pub use_materials: bool,

    /// Write the flattened streams as JSON to this path
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Properties to pass to `Model::open`.
    pub fn properties(&self) -> Properties {
        let mut props = Properties::new()
            .with(PropertyKey::Rescale.name(), !self.no_rescale)
            .with(PropertyKey::UseMaterials.name(), self.use_materials);
        if let Some(ref textype) = self.textype {
            props.set(PropertyKey::TextureType.name(), textype.as_str());
        }
        props
    }
}
