use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use crate::engine::render::schedule::RenderSchedule;

const YAW_SENSITIVITY: f32 = 0.0035;
const PITCH_SENSITIVITY: f32 = 0.0030;
const PAN_SENSITIVITY: f32 = 0.0015;
const ZOOM_STEP: f32 = 0.1;
const MIN_DISTANCE: f32 = 0.05;
const MAX_DISTANCE: f32 = 100.0;

/// Orbit camera pose: a target point plus yaw/pitch/distance of the eye
/// around it. The camera entity's transform is derived from this resource,
/// never written directly by input handling.
#[derive(Resource, Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    /// Cleared while a camera tween is in flight so drags cannot fight the
    /// animation.
    pub enabled: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: -0.6,
            distance: 10.0,
            enabled: true,
        }
    }
}

impl OrbitCamera {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// World-space eye position derived from the orbit pose.
    pub fn eye(&self) -> Vec3 {
        self.target + self.rotation() * Vec3::Z * self.distance
    }

    /// Immediate pose set from an explicit eye position and look target.
    /// Shared by tween steps and reset-view.
    pub fn set_pose(&mut self, position: Vec3, target: Vec3) {
        let offset = position - target;
        let distance = offset.length().max(1e-4);
        let normalized = offset / distance;

        self.target = target;
        self.distance = distance;
        self.yaw = normalized.x.atan2(normalized.z);
        self.pitch = -normalized.y.clamp(-1.0, 1.0).asin();
    }
}

/// Applies drag and wheel input to the orbit pose. Left-drag pans the target
/// in the view's ground plane, right-drag orbits, wheel zooms.
pub fn camera_controller(
    mut orbit: ResMut<OrbitCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y * 1.0,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }

    if !orbit.enabled {
        return;
    }

    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        orbit.yaw += -mouse_delta.x * YAW_SENSITIVITY;
        orbit.pitch = (orbit.pitch - mouse_delta.y * PITCH_SENSITIVITY).clamp(-1.55, -0.05);
    }

    if mouse_button.pressed(MouseButton::Left) && mouse_delta != Vec2::ZERO {
        // Pan in the ground plane, scaled with distance so screen-space
        // speed stays roughly constant.
        let rotation = orbit.rotation();
        let right = (rotation * Vec3::X) * Vec3::new(1.0, 0.0, 1.0);
        let forward = (rotation * Vec3::Z) * Vec3::new(1.0, 0.0, 1.0);
        let scale = orbit.distance * PAN_SENSITIVITY;
        orbit.target += (right * -mouse_delta.x + forward * -mouse_delta.y) * scale;
    }

    if scroll_accum.abs() > f32::EPSILON {
        orbit.distance =
            (orbit.distance * (1.0 - scroll_accum * ZOOM_STEP)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

/// Mirrors the orbit pose onto the camera entity and requests a render.
/// Change detection keeps this quiet on frames without camera movement.
pub fn sync_camera_transform(
    orbit: Res<OrbitCamera>,
    mut cameras: Query<&mut Transform, With<Camera3d>>,
    mut schedule: ResMut<RenderSchedule>,
) {
    if !orbit.is_changed() {
        return;
    }
    let Ok(mut transform) = cameras.single_mut() else {
        return;
    };

    *transform = Transform::from_translation(orbit.eye()).looking_at(orbit.target, Vec3::Y);
    schedule.request_render();
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn set_pose_round_trips_through_eye() {
        let mut orbit = OrbitCamera::default();
        let position = Vec3::new(4.0, 3.0, -2.0);
        let target = Vec3::new(1.0, 0.5, 1.0);

        orbit.set_pose(position, target);

        let eye = orbit.eye();
        assert_relative_eq!(eye.x, position.x, epsilon = 1e-4);
        assert_relative_eq!(eye.y, position.y, epsilon = 1e-4);
        assert_relative_eq!(eye.z, position.z, epsilon = 1e-4);
        assert_eq!(orbit.target, target);
    }

    #[test]
    fn set_pose_looks_down_when_the_eye_is_above_the_target() {
        let mut orbit = OrbitCamera::default();
        orbit.set_pose(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO);
        assert!(orbit.pitch < 0.0);
        assert_relative_eq!(orbit.distance, 50.0f32.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn degenerate_pose_keeps_a_positive_distance() {
        let mut orbit = OrbitCamera::default();
        orbit.set_pose(Vec3::ONE, Vec3::ONE);
        assert!(orbit.distance > 0.0);
        assert!(orbit.eye().is_finite());
    }
}
