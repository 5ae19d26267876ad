use glam::{Mat4, Vec3};

use crate::types::{BoundingBox, ImportedScene, SceneNode};

/// Bounding box of every vertex reachable from the root, with node transforms
/// accumulated from identity.
///
/// Vertices of meshes that are not referenced by any node do not count. An
/// empty scene yields a zero-size box at the origin.
pub fn scene_bounds(scene: &ImportedScene) -> BoundingBox {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);

    node_bounds(scene, &scene.root, Mat4::IDENTITY, &mut min, &mut max);

    if min.x == f32::INFINITY {
        return BoundingBox::default();
    }

    BoundingBox { min, max }
}

fn node_bounds(
    scene: &ImportedScene,
    node: &SceneNode,
    parent: Mat4,
    min: &mut Vec3,
    max: &mut Vec3,
) {
    let world = parent * node.transform;

    for mesh in node.meshes.iter().filter_map(|&i| scene.meshes.get(i)) {
        for &p in &mesh.positions {
            let v = world.transform_point3(Vec3::from_array(p));
            *min = min.min(v);
            *max = max.max(v);
        }
    }

    for child in &node.children {
        node_bounds(scene, child, world, min, max);
    }
}
