use bevy::prelude::*;

use constants::render_settings::CAMERA_POSE_EPSILON;

use super::orbit_camera::OrbitCamera;

/// Smoothstep, the monotonic easing building block.
fn ease_smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// The tween curve: the same easing applied twice in succession, giving the
/// slow-fast-slow feel of the camera transitions.
pub fn ease_in_out(t: f32) -> f32 {
    ease_smooth(ease_smooth(t))
}

#[derive(Debug, Clone)]
struct TweenState {
    from_position: Vec3,
    from_target: Vec3,
    to_position: Vec3,
    to_target: Vec3,
    elapsed: f32,
    duration: f32,
}

impl TweenState {
    fn sample(&self, s: f32) -> (Vec3, Vec3) {
        (
            self.from_position.lerp(self.to_position, s),
            self.from_target.lerp(self.to_target, s),
        )
    }
}

/// The single in-flight camera animation. Starting a new one supersedes any
/// animation already running: last write wins, nothing queues.
#[derive(Resource, Default)]
pub struct CameraTween {
    active: Option<TweenState>,
}

impl CameraTween {
    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Begin animating from the current orbit pose to the given one. User
    /// camera control is disabled for the flight and restored on arrival.
    /// Destinations within epsilon of the current pose are applied
    /// immediately and re-enable control at once.
    pub fn animate_to(
        &mut self,
        orbit: &mut OrbitCamera,
        position: Vec3,
        target: Vec3,
        duration_secs: f32,
    ) {
        let from_position = orbit.eye();
        let from_target = orbit.target;

        if duration_secs <= 0.0
            || (from_position.distance(position) < CAMERA_POSE_EPSILON
                && from_target.distance(target) < CAMERA_POSE_EPSILON)
        {
            orbit.set_pose(position, target);
            orbit.enabled = true;
            self.active = None;
            return;
        }

        orbit.enabled = false;
        self.active = Some(TweenState {
            from_position,
            from_target,
            to_position: position,
            to_target: target,
            elapsed: 0.0,
            duration: duration_secs,
        });
    }

    /// Advance the animation by `dt` seconds, writing the interpolated pose
    /// into the orbit camera. Returns true while an animation is running.
    pub fn advance(&mut self, dt: f32, orbit: &mut OrbitCamera) -> bool {
        let Some(state) = self.active.as_mut() else {
            return false;
        };

        state.elapsed += dt;
        let t = (state.elapsed / state.duration).clamp(0.0, 1.0);
        let (position, target) = state.sample(ease_in_out(t));
        orbit.set_pose(position, target);

        if t >= 1.0 {
            self.active = None;
            orbit.enabled = true;
        }
        true
    }
}

/// Steps the in-flight tween once per frame. The pose change propagates to
/// the camera transform (and a render request) through the orbit sync
/// system, so each step draws exactly one frame.
pub fn advance_camera_tween(
    time: Res<Time>,
    mut tween: ResMut<CameraTween>,
    mut orbit: ResMut<OrbitCamera>,
) {
    if tween.is_animating() {
        tween.advance(time.delta_secs(), &mut orbit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn easing_is_monotonic_and_hits_the_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);

        let mut last = 0.0;
        for i in 1..=100 {
            let s = ease_in_out(i as f32 / 100.0);
            assert!(s >= last);
            last = s;
        }
    }

    #[test]
    fn near_destination_applies_immediately_without_animating() {
        let mut orbit = OrbitCamera::default();
        orbit.set_pose(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO);
        let mut tween = CameraTween::default();

        let position = orbit.eye() + Vec3::splat(1e-4);
        let target = orbit.target;
        tween.animate_to(&mut orbit, position, target, 0.75);

        assert!(!tween.is_animating());
        assert!(orbit.enabled);
    }

    #[test]
    fn animation_disables_control_and_restores_it_on_arrival() {
        let mut orbit = OrbitCamera::default();
        orbit.set_pose(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO);
        let mut tween = CameraTween::default();

        let destination = Vec3::new(8.0, 4.0, -3.0);
        let look_at = Vec3::new(1.0, 0.0, 1.0);
        tween.animate_to(&mut orbit, destination, look_at, 0.75);
        assert!(!orbit.enabled);

        // Step well past the duration.
        for _ in 0..100 {
            tween.advance(0.016, &mut orbit);
        }

        assert!(!tween.is_animating());
        assert!(orbit.enabled);
        let eye = orbit.eye();
        assert_relative_eq!(eye.x, destination.x, epsilon = 1e-3);
        assert_relative_eq!(eye.y, destination.y, epsilon = 1e-3);
        assert_relative_eq!(eye.z, destination.z, epsilon = 1e-3);
        assert_relative_eq!(orbit.target.x, look_at.x, epsilon = 1e-3);
    }

    #[test]
    fn a_new_animation_supersedes_the_one_in_flight() {
        let mut orbit = OrbitCamera::default();
        orbit.set_pose(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO);
        let mut tween = CameraTween::default();

        tween.animate_to(&mut orbit, Vec3::new(10.0, 2.0, 0.0), Vec3::ZERO, 0.75);
        tween.advance(0.1, &mut orbit);

        let second = Vec3::new(-6.0, 3.0, 6.0);
        tween.animate_to(&mut orbit, second, Vec3::ONE, 0.75);

        for _ in 0..100 {
            tween.advance(0.016, &mut orbit);
        }

        let eye = orbit.eye();
        assert_relative_eq!(eye.x, second.x, epsilon = 1e-3);
        assert_relative_eq!(eye.z, second.z, epsilon = 1e-3);
    }
}
