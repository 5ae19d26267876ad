//! Texture-coordinate projections used when a model is configured to ignore
//! (or lacks) its own UVs.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;

/// Planar projection onto the XZ plane.
///
/// Positions are scaled by `2 / largest_dimension` of their bounding box, so a
/// normalised model (edge 2, centred) maps onto `[0, 1]`. One texcoord per
/// position.
pub fn linear(positions: &[[f32; 3]]) -> Vec<[f32; 2]> {
    if positions.is_empty() {
        return Vec::new();
    }

    let (min, max) = positions.iter().map(|&p| Vec3::from_array(p)).fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(p), hi.max(p)),
    );
    let largest = (max - min).abs().max_element();
    let scale = if largest > 0.0 { 2.0 / largest } else { 1.0 };

    positions
        .iter()
        .map(|p| {
            let s = p[0] * scale;
            let t = p[2] * scale;
            [(s + 1.0) / 2.0, (t + 1.0) / 2.0]
        })
        .collect()
}

/// Sphere-map projection from normals. One texcoord per normal.
pub fn spheremap(normals: &[[f32; 3]]) -> Vec<[f32; 2]> {
    normals.iter().map(|n| spheremap_coord(*n)).collect()
}

fn spheremap_coord(n: [f32; 3]) -> [f32; 2] {
    // axes are rotated so the pole sits on the x axis
    let z = n[0];
    let y = n[1];
    let x = n[2];

    let r = (x * x + y * y).sqrt();
    let rho = (r * r + z * z).sqrt();

    let (theta, phi) = if r == 0.0 {
        (0.0, 0.0)
    } else {
        let phi = if z == 0.0 {
            FRAC_PI_2
        } else {
            (z / rho).clamp(-1.0, 1.0).acos()
        };
        let theta = if y == 0.0 {
            FRAC_PI_2
        } else {
            (y / r).clamp(-1.0, 1.0).asin() + FRAC_PI_2
        };
        (theta, phi)
    };

    [theta / PI, phi / PI]
}
