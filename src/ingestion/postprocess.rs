use glam::Vec3;
use tracing::debug;

use crate::types::{Face, ImportedScene, Mesh};

use super::ImportOptions;

/// Run the post-processing steps selected in `options` on every mesh.
pub fn apply(scene: &mut ImportedScene, options: &ImportOptions) {
    for mesh in &mut scene.meshes {
        if options.triangulate {
            triangulate(mesh);
        }
        if options.gen_smooth_normals && !mesh.has_normals() {
            gen_smooth_normals(mesh);
        }
        if options.flip_uvs {
            flip_uvs(mesh);
        }
    }
}

/// Fan-triangulate faces with more than three indices.
pub fn triangulate(mesh: &mut Mesh) {
    if mesh.faces.iter().all(|f| f.indices.len() <= 3) {
        return;
    }

    let before = mesh.faces.len();
    let mut faces = Vec::with_capacity(before);
    for face in mesh.faces.drain(..) {
        let idx = &face.indices;
        if idx.len() <= 3 {
            faces.push(face);
            continue;
        }
        for i in 1..idx.len() - 1 {
            faces.push(Face::new([idx[0], idx[i], idx[i + 1]]));
        }
    }
    mesh.faces = faces;

    debug!(
        mesh = %mesh.name,
        before,
        after = mesh.faces.len(),
        "Triangulated polygons"
    );
}

/// Area-weighted per-vertex normals from the mesh's triangles and polygons.
///
/// Meshes made only of points and lines are left without normals. Vertices
/// not touched by any surface get a zero normal.
pub fn gen_smooth_normals(mesh: &mut Mesh) {
    let n = mesh.positions.len();
    let mut accum = vec![Vec3::ZERO; n];
    let mut any_surface = false;

    for face in &mesh.faces {
        let idx = &face.indices;
        if idx.len() < 3 || idx.iter().any(|&i| i as usize >= n) {
            continue;
        }
        any_surface = true;

        let p0 = Vec3::from_array(mesh.positions[idx[0] as usize]);
        for i in 1..idx.len() - 1 {
            let p1 = Vec3::from_array(mesh.positions[idx[i] as usize]);
            let p2 = Vec3::from_array(mesh.positions[idx[i + 1] as usize]);
            // unnormalised cross product: larger triangles weigh more
            let face_normal = (p1 - p0).cross(p2 - p0);
            for &v in [idx[0], idx[i], idx[i + 1]].iter() {
                accum[v as usize] += face_normal;
            }
        }
    }

    if !any_surface {
        return;
    }

    mesh.normals = accum
        .into_iter()
        .map(|v| v.normalize_or_zero().to_array())
        .collect();
}

/// `v -> 1 - v` on the first texture channel.
pub fn flip_uvs(mesh: &mut Mesh) {
    for uv in &mut mesh.texcoords {
        uv[1] = 1.0 - uv[1];
    }
}
