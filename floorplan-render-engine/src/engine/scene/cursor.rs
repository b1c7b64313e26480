use bevy::prelude::*;

use constants::render_settings::{
    CURSOR_COLOR, CURSOR_SPHERE_RADIUS, SNAP_DISTANCE_THRESHOLD, SNAP_INDICATOR_COLOR,
    SNAP_INDICATOR_RADIUS, SNAP_RECOMPUTE_INTERVAL_SECS,
};

use crate::engine::picking::pointer::PointerState;
use crate::engine::picking::raycast::pointer_ray;
use crate::engine::render::schedule::RenderSchedule;
use crate::engine::spatial::{FlattenedGeometry, SnapResult};

/// Marker sphere that rides the architectural model under the mouse. Its
/// position is the nearest model intersection of the pointer ray; room
/// volumes and widgets are never part of that query.
#[derive(Component)]
pub struct SurfaceCursor;

/// Small sphere shown over the nearest snappable mesh vertex while the
/// cursor is within snapping range.
#[derive(Component)]
pub struct SnapIndicator;

/// The cursor was repositioned. Drawing and hover logic re-render off this.
#[derive(Event, Debug, Clone, Copy)]
pub struct CursorMovedEvent {
    pub position: Vec3,
}

/// Latest nearest-vertex result, recomputed on a throttle. `None` until the
/// model geometry is baked.
#[derive(Resource, Default)]
pub struct SnapState {
    pub result: Option<SnapResult>,
}

impl SnapState {
    /// The snap, but only when it is close enough to actually snap to.
    pub fn within_threshold(&self) -> Option<SnapResult> {
        self.result.filter(|snap| snap.distance < SNAP_DISTANCE_THRESHOLD)
    }
}

/// Full-geometry vertex scans are too heavy for every pointer move; ~10 Hz
/// is indistinguishable in use. A move arriving mid-interval is held as
/// pending so the scan still happens once the interval expires, even if the
/// mouse has stopped by then.
#[derive(Resource)]
pub struct SnapThrottle {
    since_last: f32,
    pending: Option<Vec3>,
}

impl Default for SnapThrottle {
    fn default() -> Self {
        // Infinity so the very first cursor move computes a snap at once.
        Self {
            since_last: f32::INFINITY,
            pending: None,
        }
    }
}

pub fn spawn_cursor_widgets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let marker = |color: [f32; 3]| StandardMaterial {
        base_color: Color::srgb(color[0], color[1], color[2]),
        unlit: true,
        ..default()
    };

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(CURSOR_SPHERE_RADIUS))),
        MeshMaterial3d(materials.add(marker(CURSOR_COLOR))),
        Transform::default(),
        SurfaceCursor,
    ));
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(SNAP_INDICATOR_RADIUS))),
        MeshMaterial3d(materials.add(marker(SNAP_INDICATOR_COLOR))),
        Transform::default(),
        Visibility::Hidden,
        SnapIndicator,
    ));
}

/// Repositions the cursor on every raw pointer move and emits the move
/// notification. The reposition itself is not throttled — it is a direct
/// visual — but the expensive snap recomputation it triggers is.
pub fn update_cursor(
    mut cursor_moved: EventReader<CursorMoved>,
    pointer: Res<PointerState>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    geometry: Res<FlattenedGeometry>,
    mut cursor: Query<&mut Transform, With<SurfaceCursor>>,
    mut moves: EventWriter<CursorMovedEvent>,
    mut schedule: ResMut<RenderSchedule>,
) {
    if cursor_moved.read().last().is_none() {
        return;
    }
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Ok(mut transform) = cursor.single_mut() else {
        return;
    };

    if let Some(ray) = pointer_ray(camera, camera_transform, pointer.position) {
        if let Some(hit) = geometry.raycast(ray.origin, ray.direction.as_vec3()) {
            transform.translation = hit.point;
        }
    }

    moves.write(CursorMovedEvent {
        position: transform.translation,
    });
    schedule.request_render();
}

/// Recomputes the nearest snappable vertex for the cursor position, at most
/// once per throttle interval, and keeps the indicator in sync.
pub fn update_snapping(
    time: Res<Time>,
    mut throttle: ResMut<SnapThrottle>,
    mut moves: EventReader<CursorMovedEvent>,
    geometry: Res<FlattenedGeometry>,
    mut snap: ResMut<SnapState>,
    mut indicator: Query<(&mut Transform, &mut Visibility), With<SnapIndicator>>,
    mut schedule: ResMut<RenderSchedule>,
) {
    throttle.since_last += time.delta_secs();
    if let Some(last_move) = moves.read().last() {
        throttle.pending = Some(last_move.position);
    }
    if throttle.since_last < SNAP_RECOMPUTE_INTERVAL_SECS {
        return;
    }
    let Some(position) = throttle.pending.take() else {
        return;
    };
    throttle.since_last = 0.0;

    snap.result = geometry.nearest_vertex(position);

    if let Ok((mut transform, mut visibility)) = indicator.single_mut() {
        match snap.within_threshold() {
            Some(result) => {
                transform.translation = result.point;
                *visibility = Visibility::Visible;
            }
            None => {
                *visibility = Visibility::Hidden;
            }
        }
        schedule.request_render();
    }
}
