/// Material as read from the model file. Every property is optional; missing
/// ones are filled in by [`resolve_material`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialRecord {
    pub name: String,
    /// Diffuse color [r, g, b, a].
    pub diffuse: Option<[f32; 4]>,
    pub specular: Option<[f32; 4]>,
    pub ambient: Option<[f32; 4]>,
    pub emissive: Option<[f32; 4]>,
    pub shininess: Option<f32>,
    pub shininess_strength: Option<f32>,
    pub two_sided: Option<bool>,
    pub wireframe: Option<bool>,
}

/// Fully resolved material parameters, ready to hand to a renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub ambient: [f32; 4],
    pub emissive: [f32; 4],
    pub shininess: f32,
    pub two_sided: bool,
    pub wireframe: bool,
}

pub const DEFAULT_DIFFUSE: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
pub const DEFAULT_SPECULAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
pub const DEFAULT_AMBIENT: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
pub const DEFAULT_EMISSIVE: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

impl Default for MaterialParams {
    fn default() -> Self {
        resolve_material(&MaterialRecord::default())
    }
}

/// Resolve a material record into concrete parameters.
///
/// Defaults: diffuse (0.8, 0.8, 0.8, 1), specular (0, 0, 0, 1), ambient
/// (0.2, 0.2, 0.2, 1), emissive (0, 0, 0, 1), not two-sided, filled.
/// Shininess is `shininess * strength` when both are present. Otherwise it is
/// zero and the specular color is blacked out including alpha, so a material
/// without a usable exponent has no highlight at all.
pub fn resolve_material(record: &MaterialRecord) -> MaterialParams {
    let mut specular = record.specular.unwrap_or(DEFAULT_SPECULAR);

    let shininess = match (record.shininess, record.shininess_strength) {
        (Some(shininess), Some(strength)) => shininess * strength,
        _ => {
            specular = [0.0; 4];
            0.0
        }
    };

    MaterialParams {
        diffuse: record.diffuse.unwrap_or(DEFAULT_DIFFUSE),
        specular,
        ambient: record.ambient.unwrap_or(DEFAULT_AMBIENT),
        emissive: record.emissive.unwrap_or(DEFAULT_EMISSIVE),
        shininess,
        two_sided: record.two_sided.unwrap_or(false),
        wireframe: record.wireframe.unwrap_or(false),
    }
}

/// Receiver for per-mesh material changes during flattening.
///
/// The flattener never talks to a graphics API; whoever owns the render
/// context implements this to apply lighting state.
pub trait MaterialSink {
    fn apply_material(&mut self, params: &MaterialParams);
}

impl<F> MaterialSink for F
where
    F: FnMut(&MaterialParams),
{
    fn apply_material(&mut self, params: &MaterialParams) {
        self(params)
    }
}

/// Sink that ignores every material.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMaterialSink;

impl MaterialSink for NoMaterialSink {
    fn apply_material(&mut self, _params: &MaterialParams) {}
}
