//! Room browsing: volumes, selection, hover and per-region visibility.
//!
//! Rooms arrive from the provider backend as flat records whose footprint
//! polygon is a JSON-encoded string; records without a digitized polygon are
//! dropped on parse. Each surviving room becomes an extruded overlay volume
//! that is invisible until hovered or selected.

/// Room records, footprint extrusion and visual styles.
pub mod room;

/// The room registry: wholesale room replacement, selection mirroring,
/// hover tracking and zoom-to-selection framing.
pub mod room_registry;

/// Region boxes (floors/buildings) and named viewpoints from config.
pub mod regions;
