/// Map-style orbit camera: left-drag pan, right-drag orbit, wheel zoom.
pub mod orbit_camera;

/// Animated camera transitions with ease-in-ease-out interpolation.
pub mod camera_tween;
