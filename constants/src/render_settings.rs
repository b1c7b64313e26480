//! Interaction and overlay design constants.
//!
//! Sizes are in model-space meters; the building model is roughly 10 m on a
//! side after unit conversion, so widget geometry stays in the millimeter to
//! centimeter range.

/// Radius of the sphere tracking the mouse on the model surface.
pub const CURSOR_SPHERE_RADIUS: f32 = 0.005;

/// Radius of the indicator shown over the nearest snappable mesh vertex.
pub const SNAP_INDICATOR_RADIUS: f32 = 0.005;

/// Radius of the clickable vertex markers of the outline widget.
pub const DRAW_VERTEX_RADIUS: f32 = 0.01;

/// Thickness of the cuboid segments visualizing outline edges.
pub const OUTLINE_LINE_WIDTH: f32 = 0.004;

/// Clicks closer than this to a mesh vertex snap onto it. Architectural
/// models have exactly coincident vertices at room corners, so snapped
/// outlines align with the true building geometry.
pub const SNAP_DISTANCE_THRESHOLD: f32 = 0.1;

/// Extrusion height of room volumes. Guessed floor-to-ceiling height after
/// unit conversion; rooms are overlays, not measured geometry.
pub const ROOM_HEIGHT: f32 = 0.1;

/// Camera never frames a selection from closer than this, so a single small
/// room does not fill the whole viewport.
pub const MIN_FRAMING_DISTANCE: f32 = 1.0;

/// Vertical component of the (normalized-horizontal) framing direction:
/// tan(45 deg), so selection reframing always approaches at the same tilt.
pub const FRAMING_ELEVATION_TAN: f32 = 1.0;

/// Duration of the zoom-to-selection camera animation.
pub const SELECTION_TWEEN_SECS: f32 = 0.75;

/// Duration of viewpoint transitions (reset view, floor buttons).
pub const VIEWPOINT_TWEEN_SECS: f32 = 1.0;

/// Camera animations whose destination is this close to the current pose
/// are applied immediately instead of tweened.
pub const CAMERA_POSE_EPSILON: f32 = 1e-3;

/// Nearest-vertex snapping is recomputed at most this often (full vertex
/// scan, too heavy for per-frame).
pub const SNAP_RECOMPUTE_INTERVAL_SECS: f32 = 0.1;

/// Room hover raycasts run at most this often.
pub const HOVER_RECOMPUTE_INTERVAL_SECS: f32 = 1.0 / 25.0;

/// Overlay colours as linear RGBA components.
pub const CURSOR_COLOR: [f32; 3] = [0.2, 0.2, 0.2];
pub const SNAP_INDICATOR_COLOR: [f32; 3] = [1.0, 0.0, 0.0];
pub const OUTLINE_COLOR: [f32; 3] = [1.0, 1.0, 0.0];
pub const ROOM_HOVER_RGBA: [f32; 4] = [1.0, 1.0, 1.0, 0.25];
pub const ROOM_ACTIVE_RGBA: [f32; 4] = [1.0, 0.89, 0.196, 0.35];
