use bevy::prelude::*;

use constants::render_settings::SNAP_DISTANCE_THRESHOLD;

use crate::engine::picking::pick_layers::PickLayers;
use crate::engine::picking::pointer::{PointerState, StillClickEvent};
use crate::engine::picking::raycast::{pointer_ray, raycast_pickables, Pickable};
use crate::engine::scene::cursor::{SnapState, SurfaceCursor};
use crate::engine::spatial::{FlattenedGeometry, SnapResult};

use super::polyline_widget::OutlineVertex;

/// Drawing lifecycle of the outline tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawState {
    /// No outline activity; clicks fall through to room selection.
    #[default]
    Idle,
    /// Open polyline accepting new vertices.
    Drawing,
    /// Finished polygon, displayed with its closing edge.
    Closed,
}

/// The outline tool: drawing state plus the working polygon. Point order is
/// edge connectivity; the closing edge of a closed polygon is synthesized at
/// render time, never stored.
#[derive(Resource, Default)]
pub struct RoomOutlineTool {
    pub state: DrawState,
    pub polygon: Vec<Vec3>,
}

impl RoomOutlineTool {
    pub fn start_editing(&mut self) {
        self.state = DrawState::Drawing;
        self.polygon.clear();
    }

    pub fn cancel_editing(&mut self) {
        self.state = DrawState::Idle;
        self.polygon.clear();
    }

    /// Resume editing an existing room's saved footprint.
    pub fn start_editing_with(&mut self, points: Vec<Vec3>) {
        self.state = DrawState::Closed;
        self.polygon = points;
    }
}

/// The outline was just closed; carries the finished footprint. The
/// authoring frontend persists it via the backend — the engine does not.
#[derive(Event, Debug, Clone)]
pub struct PolygonClosedEvent {
    pub polygon: Vec<Vec3>,
}

/// Editor operations arriving from the embedding frontend.
#[derive(Event, Debug, Clone)]
pub enum EditorActionEvent {
    Start,
    Cancel,
    StartWith(Vec<Vec3>),
}

/// Everything a single click needs to drive the state machine.
#[derive(Debug, Clone)]
pub struct ClickContext {
    /// Latest nearest-vertex result, unfiltered; the transition applies the
    /// snap threshold itself.
    pub snap: Option<SnapResult>,
    /// Where the surface cursor sits right now.
    pub cursor_position: Vec3,
    /// Index of the clicked outline vertex marker, if one was hit.
    pub clicked_vertex: Option<usize>,
    /// Nearest intersection of the click ray with the architectural model.
    pub model_intersection: Option<Vec3>,
}

/// Result of one state machine step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub state: DrawState,
    pub polygon: Vec<Vec3>,
    /// True exactly when this step closed the polygon.
    pub closed: bool,
}

/// One click of the outline state machine, as a pure function.
///
/// While drawing: clicking vertex 0 closes the outline, clicking any other
/// vertex is a no-op, a near-vertex click appends the snapped point (or
/// closes, if the snap is the first point), and a plain surface click
/// appends the raw cursor position. From a closed outline, a click on the
/// model starts a fresh outline seeded with the clicked point (snapped when
/// in range) and a click into the void starts an empty one.
pub fn click_transition(state: DrawState, polygon: &[Vec3], ctx: &ClickContext) -> TransitionOutcome {
    let unchanged = |state| TransitionOutcome {
        state,
        polygon: polygon.to_vec(),
        closed: false,
    };

    match state {
        DrawState::Idle => unchanged(DrawState::Idle),
        DrawState::Drawing => {
            if let Some(index) = ctx.clicked_vertex {
                if index == 0 {
                    TransitionOutcome {
                        state: DrawState::Closed,
                        polygon: polygon.to_vec(),
                        closed: true,
                    }
                } else {
                    unchanged(DrawState::Drawing)
                }
            } else if let Some(snap) = ctx
                .snap
                .filter(|snap| snap.distance < SNAP_DISTANCE_THRESHOLD)
            {
                if polygon.first() == Some(&snap.point) {
                    TransitionOutcome {
                        state: DrawState::Closed,
                        polygon: polygon.to_vec(),
                        closed: true,
                    }
                } else {
                    let mut polygon = polygon.to_vec();
                    polygon.push(snap.point);
                    TransitionOutcome {
                        state: DrawState::Drawing,
                        polygon,
                        closed: false,
                    }
                }
            } else if ctx.model_intersection.is_some() {
                let mut polygon = polygon.to_vec();
                polygon.push(ctx.cursor_position);
                TransitionOutcome {
                    state: DrawState::Drawing,
                    polygon,
                    closed: false,
                }
            } else {
                unchanged(DrawState::Drawing)
            }
        }
        DrawState::Closed => {
            let polygon = match ctx.model_intersection {
                Some(intersection) => {
                    let seed = ctx
                        .snap
                        .filter(|snap| snap.distance < SNAP_DISTANCE_THRESHOLD)
                        .map(|snap| snap.point)
                        .unwrap_or(intersection);
                    vec![seed]
                }
                None => Vec::new(),
            };
            TransitionOutcome {
                state: DrawState::Drawing,
                polygon,
                closed: false,
            }
        }
    }
}

/// Applies frontend editor operations to the tool.
pub fn handle_editor_actions(
    mut events: EventReader<EditorActionEvent>,
    mut tool: ResMut<RoomOutlineTool>,
) {
    for event in events.read() {
        match event {
            EditorActionEvent::Start => {
                tool.start_editing();
                info!("outline editing started");
            }
            EditorActionEvent::Cancel => {
                tool.cancel_editing();
                info!("outline editing cancelled");
            }
            EditorActionEvent::StartWith(points) => {
                tool.start_editing_with(points.clone());
                info!("outline editing resumed with {} points", tool.polygon.len());
            }
        }
    }
}

/// Feeds still clicks into the state machine. Builds the click context from
/// the current snap, the surface cursor, a vertex-marker raycast and a model
/// raycast, then applies the transition.
pub fn handle_outline_clicks(
    mut clicks: EventReader<StillClickEvent>,
    mut tool: ResMut<RoomOutlineTool>,
    snap: Res<SnapState>,
    pointer: Res<PointerState>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    cursor: Query<&Transform, With<SurfaceCursor>>,
    vertex_markers: Query<(Entity, &GlobalTransform, &Pickable), With<OutlineVertex>>,
    vertex_indices: Query<&OutlineVertex>,
    geometry: Res<FlattenedGeometry>,
    mut closed_events: EventWriter<PolygonClosedEvent>,
) {
    for click in clicks.read() {
        if click.button != MouseButton::Left {
            continue;
        }
        if tool.state == DrawState::Idle {
            continue;
        }
        let Ok((camera, camera_transform)) = cameras.single() else {
            continue;
        };
        let Ok(cursor_transform) = cursor.single() else {
            continue;
        };
        let Some(ray) = pointer_ray(camera, camera_transform, pointer.position) else {
            continue;
        };
        let direction = ray.direction.as_vec3();

        let clicked_vertex = raycast_pickables(
            ray.origin,
            direction,
            vertex_markers.iter(),
            PickLayers::OUTLINE_VERTICES,
        )
        .first()
        .and_then(|hit| vertex_indices.get(hit.entity).ok())
        .map(|vertex| vertex.index);

        let context = ClickContext {
            snap: snap.result,
            cursor_position: cursor_transform.translation,
            clicked_vertex,
            model_intersection: geometry.raycast(ray.origin, direction).map(|hit| hit.point),
        };

        let outcome = click_transition(tool.state, &tool.polygon, &context);
        if outcome.closed {
            info!("outline closed with {} points", outcome.polygon.len());
            closed_events.write(PolygonClosedEvent {
                polygon: outcome.polygon.clone(),
            });
        }
        if outcome.state != tool.state || outcome.polygon != tool.polygon {
            tool.state = outcome.state;
            tool.polygon = outcome.polygon;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap_at(point: Vec3, distance: f32) -> Option<SnapResult> {
        Some(SnapResult { point, distance })
    }

    fn ctx() -> ClickContext {
        ClickContext {
            snap: None,
            cursor_position: Vec3::ZERO,
            clicked_vertex: None,
            model_intersection: None,
        }
    }

    fn triangle() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn clicking_the_first_vertex_closes_without_touching_the_polygon() {
        let polygon = triangle();
        let outcome = click_transition(
            DrawState::Drawing,
            &polygon,
            &ClickContext {
                clicked_vertex: Some(0),
                ..ctx()
            },
        );

        assert_eq!(outcome.state, DrawState::Closed);
        assert_eq!(outcome.polygon, polygon);
        assert!(outcome.closed);
    }

    #[test]
    fn clicking_any_other_vertex_is_a_no_op() {
        let polygon = triangle();
        let outcome = click_transition(
            DrawState::Drawing,
            &polygon,
            &ClickContext {
                clicked_vertex: Some(2),
                ..ctx()
            },
        );

        assert_eq!(outcome.state, DrawState::Drawing);
        assert_eq!(outcome.polygon, polygon);
        assert!(!outcome.closed);
    }

    #[test]
    fn a_snap_within_threshold_beats_the_raw_surface_point() {
        let vertex = Vec3::new(2.0, 0.0, 2.0);
        let surface = Vec3::new(2.04, 0.0, 2.01);
        let outcome = click_transition(
            DrawState::Drawing,
            &triangle(),
            &ClickContext {
                snap: snap_at(vertex, 0.05),
                cursor_position: surface,
                model_intersection: Some(surface),
                ..ctx()
            },
        );

        assert_eq!(outcome.polygon.last(), Some(&vertex));
    }

    #[test]
    fn without_a_snap_the_cursor_point_is_appended() {
        let vertex = Vec3::new(5.0, 0.0, 5.0);
        let surface = Vec3::new(2.0, 0.0, 2.0);
        let outcome = click_transition(
            DrawState::Drawing,
            &triangle(),
            &ClickContext {
                snap: snap_at(vertex, 0.2),
                cursor_position: surface,
                model_intersection: Some(surface),
                ..ctx()
            },
        );

        assert_eq!(outcome.polygon.last(), Some(&surface));
        assert_eq!(outcome.state, DrawState::Drawing);
    }

    #[test]
    fn snapping_back_onto_the_first_point_closes() {
        let polygon = triangle();
        let outcome = click_transition(
            DrawState::Drawing,
            &polygon,
            &ClickContext {
                snap: snap_at(polygon[0], 0.02),
                model_intersection: Some(Vec3::new(0.01, 0.0, 0.01)),
                ..ctx()
            },
        );

        assert_eq!(outcome.state, DrawState::Closed);
        assert_eq!(outcome.polygon, polygon);
        assert!(outcome.closed);
    }

    #[test]
    fn a_click_into_the_void_while_drawing_changes_nothing() {
        let polygon = triangle();
        let outcome = click_transition(DrawState::Drawing, &polygon, &ctx());

        assert_eq!(outcome.state, DrawState::Drawing);
        assert_eq!(outcome.polygon, polygon);
    }

    #[test]
    fn clicking_the_model_from_closed_starts_over_with_the_clicked_point() {
        let intersection = Vec3::new(3.0, 0.0, 3.0);
        let outcome = click_transition(
            DrawState::Closed,
            &triangle(),
            &ClickContext {
                model_intersection: Some(intersection),
                snap: snap_at(Vec3::new(7.0, 0.0, 7.0), 0.5),
                ..ctx()
            },
        );

        assert_eq!(outcome.state, DrawState::Drawing);
        assert_eq!(outcome.polygon, vec![intersection]);
        assert!(!outcome.closed);
    }

    #[test]
    fn restarting_from_closed_prefers_the_snapped_vertex() {
        let vertex = Vec3::new(3.0, 0.0, 3.0);
        let outcome = click_transition(
            DrawState::Closed,
            &triangle(),
            &ClickContext {
                model_intersection: Some(Vec3::new(3.05, 0.0, 3.0)),
                snap: snap_at(vertex, 0.05),
                ..ctx()
            },
        );

        assert_eq!(outcome.polygon, vec![vertex]);
    }

    #[test]
    fn clicking_the_void_from_closed_resets_to_an_empty_outline() {
        let outcome = click_transition(DrawState::Closed, &triangle(), &ctx());
        assert_eq!(outcome.state, DrawState::Drawing);
        assert!(outcome.polygon.is_empty());
    }

    #[test]
    fn idle_ignores_every_click() {
        let outcome = click_transition(
            DrawState::Idle,
            &[],
            &ClickContext {
                clicked_vertex: Some(0),
                model_intersection: Some(Vec3::ONE),
                snap: snap_at(Vec3::ONE, 0.01),
                ..ctx()
            },
        );

        assert_eq!(outcome.state, DrawState::Idle);
        assert!(outcome.polygon.is_empty());
        assert!(!outcome.closed);
    }

    #[test]
    fn editor_operations_reset_the_tool() {
        let mut tool = RoomOutlineTool::default();

        tool.start_editing();
        assert_eq!(tool.state, DrawState::Drawing);
        assert!(tool.polygon.is_empty());

        tool.start_editing_with(triangle());
        assert_eq!(tool.state, DrawState::Closed);
        assert_eq!(tool.polygon.len(), 3);

        tool.cancel_editing();
        assert_eq!(tool.state, DrawState::Idle);
        assert!(tool.polygon.is_empty());
    }

    #[test]
    fn drawing_a_triangle_end_to_end() {
        let mut tool = RoomOutlineTool::default();
        tool.start_editing();

        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
        ];

        // Three surface clicks away from any snappable vertex.
        for point in points {
            let outcome = click_transition(
                tool.state,
                &tool.polygon,
                &ClickContext {
                    snap: snap_at(Vec3::new(50.0, 0.0, 50.0), 10.0),
                    cursor_position: point,
                    clicked_vertex: None,
                    model_intersection: Some(point),
                },
            );
            assert!(!outcome.closed);
            tool.state = outcome.state;
            tool.polygon = outcome.polygon;
        }
        assert_eq!(tool.state, DrawState::Drawing);
        assert_eq!(tool.polygon, points.to_vec());

        // Click the first vertex marker.
        let outcome = click_transition(
            tool.state,
            &tool.polygon,
            &ClickContext {
                clicked_vertex: Some(0),
                ..ctx()
            },
        );
        assert!(outcome.closed);
        assert_eq!(outcome.state, DrawState::Closed);
        assert_eq!(outcome.polygon, points.to_vec());
    }
}
