use bevy::prelude::*;
use bevy::render::view::RenderLayers;
use serde::{Deserialize, Serialize};

use constants::render_settings::VIEWPOINT_TWEEN_SECS;

use crate::engine::camera::camera_tween::CameraTween;
use crate::engine::camera::orbit_camera::OrbitCamera;
use crate::engine::loading::model_loader::ArchitecturePart;
use crate::engine::picking::pick_layers::PickLayers;
use crate::engine::picking::raycast::Pickable;
use crate::engine::render::schedule::RenderSchedule;

use super::room::RoomVolume;
use super::room_registry::{RoomRegistry, SelectionChangedEvent};

/// How a region decides whether an architecture node belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionTest {
    /// Node bounds fully inside the region box. Used for ground floors,
    /// where the box can enclose everything that belongs to the floor.
    Contains,
    /// Node bounds overlapping the region box. Upper floors are thin
    /// horizontal slabs; multi-floor elements such as stairwells straddle
    /// them and must stay visible on every floor they pass through.
    Intersects,
}

/// A named axis-aligned region of the model, e.g. one floor of a building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionBox {
    pub name: String,
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub test: RegionTest,
}

impl RegionBox {
    fn min_v(&self) -> Vec3 {
        Vec3::from_array(self.min)
    }

    fn max_v(&self) -> Vec3 {
        Vec3::from_array(self.max)
    }

    pub fn contains_box(&self, min: Vec3, max: Vec3) -> bool {
        self.min_v().cmple(min).all() && self.max_v().cmpge(max).all()
    }

    pub fn intersects_box(&self, min: Vec3, max: Vec3) -> bool {
        self.min_v().cmple(max).all() && self.max_v().cmpge(min).all()
    }

    /// Whether an architecture node with the given bounds belongs to this
    /// region, under the region's own test kind.
    pub fn admits(&self, min: Vec3, max: Vec3) -> bool {
        match self.test {
            RegionTest::Contains => self.contains_box(min, max),
            RegionTest::Intersects => self.intersects_box(min, max),
        }
    }
}

/// A named camera pose, e.g. `home` or a per-floor overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewpointConfig {
    pub name: String,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

/// Building-specific configuration loaded as a JSON asset. Region boxes are
/// hand-surveyed against one building's coordinate system, which is exactly
/// why they are data and not code.
#[derive(Asset, TypePath, Resource, Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub regions: Vec<RegionBox>,
    pub viewpoints: Vec<ViewpointConfig>,
}

impl RegionConfig {
    pub fn region(&self, name: &str) -> Option<&RegionBox> {
        self.regions.iter().find(|region| region.name == name)
    }

    pub fn viewpoint(&self, name: &str) -> Option<&ViewpointConfig> {
        self.viewpoints.iter().find(|viewpoint| viewpoint.name == name)
    }
}

/// Show or hide one region of the building.
#[derive(Event, Debug, Clone)]
pub struct ToggleRegionEvent {
    pub name: String,
    pub visible: bool,
}

/// Animate the camera to a named viewpoint.
#[derive(Event, Debug, Clone)]
pub struct CameraToViewpointEvent {
    pub name: String,
}

/// A selected room was hidden by a region toggle. Hiding a room's floor must
/// not leave it invisibly selected, so the engine drops it from the mirror
/// and tells the frontend.
#[derive(Event, Debug, Clone)]
pub struct RoomUnselectEvent {
    pub id: String,
}

/// Applies `toggle_region`: visibility on matching architecture nodes, render
/// and pick layers on fully-contained room volumes, and unselect
/// notifications for selected rooms that just vanished.
pub fn apply_region_toggles(
    mut events: EventReader<ToggleRegionEvent>,
    config: Option<Res<RegionConfig>>,
    mut parts: Query<(&ArchitecturePart, &mut Visibility)>,
    mut rooms: Query<(&RoomVolume, &mut Pickable, &mut RenderLayers)>,
    mut registry: ResMut<RoomRegistry>,
    mut unselects: EventWriter<RoomUnselectEvent>,
    mut selection_changed: EventWriter<SelectionChangedEvent>,
    mut schedule: ResMut<RenderSchedule>,
) {
    for event in events.read() {
        let Some(config) = config.as_deref() else {
            warn!("region toggle before the region config loaded: {}", event.name);
            continue;
        };
        let Some(region) = config.region(&event.name) else {
            warn!("unknown region: {}", event.name);
            continue;
        };

        for (part, mut visibility) in parts.iter_mut() {
            if region.admits(part.min, part.max) {
                *visibility = if event.visible {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }

        // Room volumes are auto-toggled only when fully contained: a volume
        // is a single thin overlay, never a multi-floor structure.
        let mut dropped = Vec::new();
        for (volume, mut pickable, mut layers) in rooms.iter_mut() {
            if !region.contains_box(volume.min, volume.max) {
                continue;
            }
            if event.visible {
                *layers = RenderLayers::default();
                pickable.layers = PickLayers::ROOM_VOLUMES;
            } else {
                *layers = RenderLayers::none();
                pickable.layers = PickLayers::NONE;
                if registry.selection().contains(&volume.id) {
                    dropped.push(volume.id.clone());
                }
            }
        }

        if !dropped.is_empty() {
            for id in dropped {
                registry.remove_from_selection(&id);
                unselects.write(RoomUnselectEvent { id });
            }
            selection_changed.write(SelectionChangedEvent {
                ids: registry.selected_ids(),
            });
        }

        schedule.request_render();
    }
}

/// Applies `camera_to_viewpoint` (and thereby `reset_view`, which targets
/// the `home` viewpoint).
pub fn apply_viewpoint_moves(
    mut events: EventReader<CameraToViewpointEvent>,
    config: Option<Res<RegionConfig>>,
    mut orbit: ResMut<OrbitCamera>,
    mut tween: ResMut<CameraTween>,
) {
    for event in events.read() {
        let Some(config) = config.as_deref() else {
            warn!("viewpoint request before the region config loaded: {}", event.name);
            continue;
        };
        let Some(viewpoint) = config.viewpoint(&event.name) else {
            warn!("unknown viewpoint: {}", event.name);
            continue;
        };

        tween.animate_to(
            &mut orbit,
            Vec3::from_array(viewpoint.position),
            Vec3::from_array(viewpoint.target),
            VIEWPOINT_TWEEN_SECS,
        );
    }
}
