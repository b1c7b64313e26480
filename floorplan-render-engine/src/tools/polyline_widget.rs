use bevy::prelude::*;

use constants::render_settings::{DRAW_VERTEX_RADIUS, OUTLINE_COLOR, OUTLINE_LINE_WIDTH};

use crate::engine::picking::pick_layers::PickLayers;
use crate::engine::picking::raycast::Pickable;
use crate::engine::render::schedule::RenderSchedule;

use super::room_outline::{DrawState, RoomOutlineTool};

/// A clickable vertex marker of the outline. The index rides on the entity
/// so a raycast hit identifies the vertex without any side table.
#[derive(Component, Debug, Clone, Copy)]
pub struct OutlineVertex {
    pub index: usize,
}

/// One edge segment of the outline visualization.
#[derive(Component)]
pub struct OutlineLine;

/// Consecutive edges of a polyline, with the synthetic closing edge when the
/// polygon is closed. Fewer than two points yields no edges: degenerate
/// outlines render their markers only.
pub fn outline_edges(points: &[Vec3], closed: bool) -> Vec<(Vec3, Vec3)> {
    if points.len() < 2 {
        return Vec::new();
    }

    let mut edges: Vec<(Vec3, Vec3)> = points.windows(2).map(|pair| (pair[0], pair[1])).collect();
    if closed {
        edges.push((points[points.len() - 1], points[0]));
    }
    edges
}

/// Rebuilds the widget entities whenever the outline tool changes: one
/// sphere per vertex (on the vertex pick layer) and one thin cuboid per
/// edge. Everything is despawned and respawned; outlines are a handful of
/// points and this keeps ordering trivial.
pub fn update_outline_widget(
    tool: Res<RoomOutlineTool>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing_vertices: Query<Entity, With<OutlineVertex>>,
    existing_lines: Query<Entity, With<OutlineLine>>,
    mut schedule: ResMut<RenderSchedule>,
) {
    if !tool.is_changed() {
        return;
    }

    for entity in existing_vertices.iter().chain(existing_lines.iter()) {
        commands.entity(entity).despawn();
    }

    if tool.state == DrawState::Idle {
        schedule.request_render();
        return;
    }

    let outline_material = || StandardMaterial {
        base_color: Color::srgb(OUTLINE_COLOR[0], OUTLINE_COLOR[1], OUTLINE_COLOR[2]),
        unlit: true,
        ..default()
    };

    for (index, point) in tool.polygon.iter().enumerate() {
        commands.spawn((
            Mesh3d(meshes.add(Sphere::new(DRAW_VERTEX_RADIUS))),
            MeshMaterial3d(materials.add(outline_material())),
            Transform::from_translation(*point),
            OutlineVertex { index },
            Pickable::sphere(DRAW_VERTEX_RADIUS, PickLayers::OUTLINE_VERTICES),
        ));
    }

    for (start, end) in outline_edges(&tool.polygon, tool.state == DrawState::Closed) {
        let direction = end - start;
        let length = direction.length();
        if length < 1e-4 {
            continue; // Coincident points make no edge.
        }

        let rotation = Quat::from_rotation_arc(Vec3::X, direction / length);
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(length, OUTLINE_LINE_WIDTH, OUTLINE_LINE_WIDTH))),
            MeshMaterial3d(materials.add(outline_material())),
            Transform::from_translation((start + end) * 0.5).with_rotation(rotation),
            OutlineLine,
        ));
    }

    schedule.request_render();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_outlines_have_no_edges() {
        assert!(outline_edges(&[], false).is_empty());
        assert!(outline_edges(&[Vec3::ZERO], true).is_empty());
    }

    #[test]
    fn an_open_outline_has_one_edge_per_consecutive_pair() {
        let points = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)];
        let edges = outline_edges(&points, false);

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0], (points[0], points[1]));
        assert_eq!(edges[1], (points[1], points[2]));
    }

    #[test]
    fn closing_appends_the_synthetic_last_edge_without_duplicating_storage() {
        let points = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)];
        let edges = outline_edges(&points, true);

        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2], (points[2], points[0]));
    }
}
