/// Pick-layer bitmasks for category-restricted raycasts.
pub mod pick_layers;

/// Pointer tracking and still-click detection.
pub mod pointer;

/// Ray intersection primitives and pickable-entity queries.
pub mod raycast;
