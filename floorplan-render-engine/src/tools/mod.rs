//! Room digitizing tools.
//!
//! The outline tool turns still clicks on the architectural model into a
//! room footprint polygon: clicks snap onto nearby mesh vertices so drawn
//! corners align with the building's true geometry, and clicking the first
//! vertex again closes the outline. The polyline widget renders the
//! in-progress outline and provides the clickable vertex markers.
//!
//! ## Editing flow
//!
//! ```text
//! RPC (start_editing / cancel_editing / start_editing_with)
//!   └─> EditorActionEvent
//!       └─> handle_editor_actions() — resets the tool state
//! StillClickEvent (left, not a drag)
//!   └─> handle_outline_clicks()
//!       ├─> vertex hit?  snap?  model hit?  (click context)
//!       ├─> click_transition() — pure state machine step
//!       └─> PolygonClosedEvent on Drawing -> Closed
//! ```

/// The outline drawing state machine.
pub mod room_outline;

/// Vertex markers and edge visualization for the outline.
pub mod polyline_widget;
