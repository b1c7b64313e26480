//! Shared design constants for the floorplan engine workspace.
//!
//! Everything in here is a fixed design decision rather than runtime
//! configuration: unit conversion for the source CAD export, widget sizes,
//! overlay colours and interaction thresholds. Values that depend on a
//! particular building (region boxes, viewpoints) live in the JSON config
//! assets instead.

pub mod coordinate_system;
pub mod path;
pub mod render_settings;
