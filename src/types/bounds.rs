use glam::{Mat4, Vec3};
use serde::Serialize;

/// Axis-aligned bounding box in 3-D.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

impl BoundingBox {
    /// Centre point of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Size along each axis.
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest of the three axis extents.
    pub fn max_extent(&self) -> f32 {
        self.extents().max_element()
    }
}

/// Uniform scale plus translation that maps a bounding box into a cube of edge
/// length 2 centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Normalization {
    pub scale: f32,
    pub offset: Vec3,
}

impl Default for Normalization {
    fn default() -> Self {
        Self::identity()
    }
}

impl Normalization {
    /// Raw coordinates: scale 1, no offset.
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset: Vec3::ZERO,
        }
    }

    /// `scale = 2 / max_extent`, `offset = -scale * center`.
    ///
    /// A box with zero extent on every axis cannot be normalised and yields
    /// the identity.
    pub fn from_bounds(bounds: &BoundingBox) -> Self {
        let extent = bounds.max_extent();
        if extent <= 0.0 || !extent.is_finite() {
            return Self::identity();
        }
        let scale = 2.0 / extent;
        Self {
            scale,
            offset: bounds.center() * -scale,
        }
    }

    /// Translation after scaling, as a single matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.offset) * Mat4::from_scale(Vec3::splat(self.scale))
    }
}
