use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use constants::render_settings::{
    FRAMING_ELEVATION_TAN, HOVER_RECOMPUTE_INTERVAL_SECS, MIN_FRAMING_DISTANCE,
    SELECTION_TWEEN_SECS,
};

use crate::engine::camera::camera_tween::CameraTween;
use crate::engine::camera::orbit_camera::OrbitCamera;
use crate::engine::picking::pick_layers::PickLayers;
use crate::engine::picking::pointer::{PointerState, StillClickEvent};
use crate::engine::picking::raycast::{pointer_ray, raycast_pickables, Pickable};
use crate::engine::render::schedule::RenderSchedule;
use crate::tools::room_outline::{DrawState, RoomOutlineTool};

use super::room::{spawn_room_volume, Room, RoomMaterials, RoomStyle, RoomVolume};

/// Replace every room volume in the scene. No incremental diffing: the room
/// set changes rarely and wholesale replacement keeps the lifecycle trivial.
#[derive(Event, Debug, Clone)]
pub struct SetRoomsEvent {
    pub rooms: Vec<Room>,
}

/// Mirror of the frontend's selection into the engine.
#[derive(Event, Debug, Clone)]
pub struct SetSelectionEvent {
    pub ids: Vec<String>,
}

/// A still click landed on a room volume. The frontend decides whether this
/// toggles or replaces the selection; the engine takes no policy position.
#[derive(Event, Debug, Clone)]
pub struct RoomClickEvent {
    pub id: String,
}

/// The engine-side selection mirror changed (after `set_selection` or a
/// region toggle dropped hidden rooms).
#[derive(Event, Debug, Clone)]
pub struct SelectionChangedEvent {
    pub ids: Vec<String>,
}

/// Owner of the room volumes in the scene and of the selection/hover state
/// derived onto them.
#[derive(Resource, Default)]
pub struct RoomRegistry {
    volumes: HashMap<String, Entity>,
    selection: HashSet<String>,
    hovered: Option<Entity>,
}

impl RoomRegistry {
    pub fn selection(&self) -> &HashSet<String> {
        &self.selection
    }

    pub fn selected_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.selection.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn remove_from_selection(&mut self, id: &str) -> bool {
        self.selection.remove(id)
    }

    pub fn room_count(&self) -> usize {
        self.volumes.len()
    }
}

/// Visual state of one volume, derived from the selection mirror and the
/// hover entity. Selection ids without a loaded volume simply never match —
/// stale ids are a normal consequence of `set_rooms` and `set_selection`
/// arriving independently.
pub fn compute_style(
    id: &str,
    entity: Entity,
    selection: &HashSet<String>,
    hovered: Option<Entity>,
) -> RoomStyle {
    if selection.contains(id) {
        RoomStyle::Active
    } else if hovered == Some(entity) {
        RoomStyle::Hover
    } else {
        RoomStyle::Hidden
    }
}

/// Camera pose framing a set of room barycenters: look at their average
/// from the current horizontal direction, re-elevated to the fixed 45 deg
/// tilt, backed off by the widest barycenter spread (floored so a single
/// small room is not framed from a few centimeters away).
pub fn frame_selection(centers: &[Vec3], camera_position: Vec3) -> Option<(Vec3, Vec3)> {
    if centers.is_empty() {
        return None;
    }

    let mut barycenter = Vec3::ZERO;
    for center in centers {
        barycenter += *center;
    }
    barycenter /= centers.len() as f32;

    let max_distance = centers
        .iter()
        .map(|center| center.distance(barycenter))
        .fold(MIN_FRAMING_DISTANCE, f32::max);

    let mut direction = camera_position - barycenter;
    direction.y = 0.0;
    let direction = if direction.length_squared() < 1e-6 {
        // Camera directly overhead: no horizontal component to keep.
        Vec3::Z
    } else {
        direction.normalize()
    };
    let direction = Vec3::new(direction.x, FRAMING_ELEVATION_TAN, direction.z).normalize();

    Some((barycenter + direction * max_distance, barycenter))
}

fn restyle_rooms(
    registry: &RoomRegistry,
    materials: &RoomMaterials,
    volumes: &mut Query<(
        Entity,
        &mut RoomVolume,
        &mut Visibility,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
) -> bool {
    let mut changed = false;
    for (entity, mut volume, mut visibility, mut material) in volumes.iter_mut() {
        let style = compute_style(&volume.id, entity, &registry.selection, registry.hovered);
        if style == volume.style {
            continue;
        }
        volume.style = style;
        changed = true;
        match style {
            RoomStyle::Hidden => *visibility = Visibility::Hidden,
            RoomStyle::Hover => {
                *visibility = Visibility::Visible;
                material.0 = materials.hover.clone();
            }
            RoomStyle::Active => {
                *visibility = Visibility::Visible;
                material.0 = materials.active.clone();
            }
        }
    }
    changed
}

/// Applies `set_rooms`: despawn every volume, spawn the new set. Idempotent
/// and independent of the architectural model's loading state.
pub fn apply_room_updates(
    mut events: EventReader<SetRoomsEvent>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    materials: Res<RoomMaterials>,
    mut registry: ResMut<RoomRegistry>,
    existing: Query<Entity, With<RoomVolume>>,
    mut schedule: ResMut<RenderSchedule>,
) {
    let Some(event) = events.read().last() else {
        return;
    };

    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }
    registry.volumes.clear();
    registry.hovered = None;

    for room in &event.rooms {
        if let Some(entity) = spawn_room_volume(&mut commands, &mut meshes, &materials, room) {
            registry.volumes.insert(room.id.clone(), entity);
        }
    }

    info!("room registry now holds {} volumes", registry.volumes.len());
    schedule.request_render();
}

/// Applies `set_selection`, restyles the volumes and starts the
/// zoom-to-selection camera animation when the new selection is non-empty.
pub fn apply_selection(
    mut events: EventReader<SetSelectionEvent>,
    mut registry: ResMut<RoomRegistry>,
    materials: Res<RoomMaterials>,
    mut volumes: Query<(
        Entity,
        &mut RoomVolume,
        &mut Visibility,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
    mut orbit: ResMut<OrbitCamera>,
    mut tween: ResMut<CameraTween>,
    mut schedule: ResMut<RenderSchedule>,
    mut selection_changed: EventWriter<SelectionChangedEvent>,
) {
    let Some(event) = events.read().last() else {
        return;
    };

    registry.selection = event.ids.iter().cloned().collect();
    restyle_rooms(&registry, &materials, &mut volumes);
    schedule.request_render();
    selection_changed.write(SelectionChangedEvent {
        ids: registry.selected_ids(),
    });

    let centers: Vec<Vec3> = volumes
        .iter()
        .filter(|(_, volume, _, _)| registry.selection.contains(&volume.id))
        .map(|(_, volume, _, _)| volume.center)
        .collect();

    if let Some((position, target)) = frame_selection(&centers, orbit.eye()) {
        tween.animate_to(&mut orbit, position, target, SELECTION_TWEEN_SECS);
    }
}

/// Tracks the hovered volume from the pointer at ~25 Hz. Exactly one volume
/// may be hovered: the nearest hit wins. A move arriving mid-interval stays
/// pending so the hover catches up when the interval expires.
#[derive(Resource)]
pub struct HoverThrottle {
    since_last: f32,
    pending: bool,
}

impl Default for HoverThrottle {
    fn default() -> Self {
        // Infinity so the very first pointer move recomputes immediately.
        Self {
            since_last: f32::INFINITY,
            pending: false,
        }
    }
}

pub fn update_hover(
    time: Res<Time>,
    mut throttle: ResMut<HoverThrottle>,
    mut cursor_moved: EventReader<CursorMoved>,
    pointer: Res<PointerState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    pickables: Query<(Entity, &GlobalTransform, &Pickable), With<RoomVolume>>,
    mut registry: ResMut<RoomRegistry>,
    materials: Res<RoomMaterials>,
    mut volumes: Query<(
        Entity,
        &mut RoomVolume,
        &mut Visibility,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
    mut schedule: ResMut<RenderSchedule>,
) {
    throttle.since_last += time.delta_secs();
    if cursor_moved.read().last().is_some() {
        throttle.pending = true;
    }
    if throttle.since_last < HOVER_RECOMPUTE_INTERVAL_SECS || !throttle.pending {
        return;
    }
    throttle.pending = false;
    throttle.since_last = 0.0;

    if windows.single().is_err() {
        return;
    }
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Some(ray) = pointer_ray(camera, camera_transform, pointer.position) else {
        return;
    };

    let hits = raycast_pickables(
        ray.origin,
        ray.direction.as_vec3(),
        pickables.iter(),
        PickLayers::ROOM_VOLUMES,
    );
    let hovered = hits.first().map(|hit| hit.entity);

    if registry.hovered != hovered {
        registry.hovered = hovered;
        if restyle_rooms(&registry, &materials, &mut volumes) {
            schedule.request_render();
        }
    }
}

/// Fires `room_click` when a still click lands on a volume. Suppressed while
/// the outline tool is drawing, so digitizing clicks never double as
/// selection clicks.
pub fn emit_room_clicks(
    mut clicks: EventReader<StillClickEvent>,
    outline_tool: Res<RoomOutlineTool>,
    pointer: Res<PointerState>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    pickables: Query<(Entity, &GlobalTransform, &Pickable), With<RoomVolume>>,
    volumes: Query<&RoomVolume>,
    mut room_clicks: EventWriter<RoomClickEvent>,
) {
    for click in clicks.read() {
        if click.button != MouseButton::Left {
            continue;
        }
        if outline_tool.state != DrawState::Idle {
            continue;
        }
        let Ok((camera, camera_transform)) = cameras.single() else {
            continue;
        };
        let Some(ray) = pointer_ray(camera, camera_transform, pointer.position) else {
            continue;
        };

        let hits = raycast_pickables(
            ray.origin,
            ray.direction.as_vec3(),
            pickables.iter(),
            PickLayers::ROOM_VOLUMES,
        );
        if let Some(hit) = hits.first() {
            if let Ok(volume) = volumes.get(hit.entity) {
                room_clicks.write(RoomClickEvent {
                    id: volume.id.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn style_is_active_for_selected_hover_for_pointed_hidden_otherwise() {
        let selection: HashSet<String> = ["room-1".to_string()].into();
        let room_1 = Entity::from_raw(1);
        let room_2 = Entity::from_raw(2);

        assert_eq!(
            compute_style("room-1", room_1, &selection, Some(room_2)),
            RoomStyle::Active
        );
        assert_eq!(
            compute_style("room-2", room_2, &selection, Some(room_2)),
            RoomStyle::Hover
        );
        assert_eq!(
            compute_style("room-2", room_2, &selection, None),
            RoomStyle::Hidden
        );
    }

    #[test]
    fn stale_selection_ids_match_nothing() {
        let selection: HashSet<String> = ["gone".to_string()].into();
        assert_eq!(
            compute_style("room-1", Entity::from_raw(1), &selection, None),
            RoomStyle::Hidden
        );
    }

    #[test]
    fn framing_is_deterministic_for_fixed_inputs() {
        let centers = vec![Vec3::new(1.0, 0.0, 1.0), Vec3::new(5.0, 0.0, 1.0)];
        let camera = Vec3::new(-4.0, 7.0, -9.0);

        let first = frame_selection(&centers, camera).unwrap();
        let second = frame_selection(&centers, camera).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn framing_floors_the_distance_for_a_single_small_room() {
        let centers = vec![Vec3::new(2.0, 0.5, 2.0)];
        let (position, target) = frame_selection(&centers, Vec3::new(10.0, 3.0, 2.0)).unwrap();

        assert_eq!(target, centers[0]);
        assert_relative_eq!(position.distance(target), MIN_FRAMING_DISTANCE, epsilon = 1e-5);
    }

    #[test]
    fn framing_approaches_at_the_fixed_elevation() {
        let centers = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(8.0, 0.0, 0.0)];
        // Camera low to the ground; the approach must still be 45 degrees.
        let (position, target) = frame_selection(&centers, Vec3::new(0.0, 0.1, -20.0)).unwrap();

        let offset = position - target;
        let horizontal = Vec2::new(offset.x, offset.z).length();
        assert_relative_eq!(offset.y, horizontal, epsilon = 1e-4);
    }

    #[test]
    fn framing_from_directly_overhead_falls_back_to_a_fixed_direction() {
        let centers = vec![Vec3::new(1.0, 0.0, 1.0)];
        let (position, target) = frame_selection(&centers, Vec3::new(1.0, 9.0, 1.0)).unwrap();

        let offset = position - target;
        assert!(offset.is_finite());
        assert!(offset.z > 0.0);
    }

    #[test]
    fn empty_selection_frames_nothing() {
        assert!(frame_selection(&[], Vec3::ONE).is_none());
    }

    #[test]
    fn selecting_one_of_two_loaded_rooms_activates_it_and_frames_its_center() {
        use crate::viewer::room::footprint_center;

        let rectangular = |id: &str, x0: f32| Room {
            id: id.into(),
            code: id.to_uppercase(),
            building: "A".into(),
            floor: "0".into(),
            polygon: vec![
                Vec3::new(x0, 0.15, -3.4),
                Vec3::new(x0 + 1.0, 0.15, -3.4),
                Vec3::new(x0 + 1.0, 0.15, -2.6),
                Vec3::new(x0, 0.15, -2.6),
            ],
        };
        let rooms = [rectangular("room-1", -1.2), rectangular("room-2", 0.5)];
        let entities = [Entity::from_raw(1), Entity::from_raw(2)];
        let selection: HashSet<String> = ["room-1".to_string()].into();

        assert_eq!(
            compute_style(&rooms[0].id, entities[0], &selection, None),
            RoomStyle::Active
        );
        assert_eq!(
            compute_style(&rooms[1].id, entities[1], &selection, None),
            RoomStyle::Hidden
        );

        // The selection starts a camera flight toward the selected room's
        // footprint box center, with user control suspended for the ride.
        let center = footprint_center(&rooms[0].polygon);
        let mut orbit = OrbitCamera::default();
        orbit.set_pose(Vec3::new(-0.3, 5.5, -7.0), Vec3::new(0.0, 0.0, -2.0));
        let mut tween = CameraTween::default();

        let (position, target) = frame_selection(&[center], orbit.eye()).unwrap();
        tween.animate_to(&mut orbit, position, target, SELECTION_TWEEN_SECS);

        assert_eq!(target, center);
        assert!(tween.is_animating());
        assert!(!orbit.enabled);
    }
}
