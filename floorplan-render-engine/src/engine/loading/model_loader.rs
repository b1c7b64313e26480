use bevy::gltf::GltfAssetLabel;
use bevy::prelude::*;

use constants::coordinate_system::model_alignment_transform;
use constants::path::MODEL_ASSET_PATH;

use crate::engine::picking::pick_layers::PickLayers;
use crate::engine::render::schedule::RenderSchedule;
use crate::engine::spatial::FlattenedGeometry;
use crate::engine::loading::progress::LoadingProgress;

/// Root of the loaded architectural scene.
#[derive(Component)]
pub struct ArchitecturalModel;

/// One mesh node of the architectural scene, with its baked world bounds.
/// Attached during flattening; region visibility toggles test against these
/// bounds instead of re-walking the hierarchy.
#[derive(Component, Debug, Clone, Copy)]
pub struct ArchitecturePart {
    pub min: Vec3,
    pub max: Vec3,
}

/// Kicks off the asynchronous model load. The glTF scene streams in over
/// several frames; everything downstream tolerates the gap.
pub fn spawn_architectural_model(mut commands: Commands, asset_server: Res<AssetServer>) {
    println!("Loading architectural model from: {MODEL_ASSET_PATH}");
    commands.spawn((
        SceneRoot(asset_server.load(GltfAssetLabel::Scene(0).from_asset(MODEL_ASSET_PATH))),
        model_alignment_transform(),
        ArchitecturalModel,
    ));
}

/// Polls the spawned scene instance and, once every mesh asset is available,
/// bakes the whole model into [`FlattenedGeometry`] in one step. Each mesh
/// node also gets its world bounds and the architecture pick layer. Runs
/// until it succeeds, then never again.
pub fn flatten_model_when_ready(
    mut commands: Commands,
    mut progress: ResMut<LoadingProgress>,
    mut geometry: ResMut<FlattenedGeometry>,
    mut schedule: ResMut<RenderSchedule>,
    roots: Query<Entity, With<ArchitecturalModel>>,
    children: Query<&Children>,
    mesh_nodes: Query<(&Mesh3d, &GlobalTransform)>,
    meshes: Res<Assets<Mesh>>,
) {
    if progress.model_flattened {
        return;
    }
    let Ok(root) = roots.single() else {
        return;
    };

    let mut found = Vec::new();
    for descendant in children.iter_descendants(root) {
        if let Ok((mesh3d, transform)) = mesh_nodes.get(descendant) {
            let Some(mesh) = meshes.get(&mesh3d.0) else {
                // A mesh asset is still decoding; try again next frame.
                return;
            };
            found.push((descendant, mesh, transform));
        }
    }
    if found.is_empty() {
        // Scene instance not spawned yet.
        return;
    }

    geometry.clear();
    let node_count = found.len();
    for (entity, mesh, transform) in found {
        if let Some((min, max)) = geometry.push_mesh(mesh, transform) {
            commands
                .entity(entity)
                .insert((ArchitecturePart { min, max }, PickLayers::ARCHITECTURE));
        }
    }

    progress.model_flattened = true;
    println!(
        "✓ Architectural model flattened ({} vertices across {} nodes)",
        geometry.vertex_count(),
        node_count
    );
    schedule.request_render();
}
