use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::view::RenderLayers;
use serde::{Deserialize, Serialize};

use constants::render_settings::{ROOM_ACTIVE_RGBA, ROOM_HEIGHT, ROOM_HOVER_RGBA};

use crate::engine::picking::pick_layers::PickLayers;
use crate::engine::picking::raycast::Pickable;

/// One room as delivered by the provider backend. The `polygon` field is a
/// JSON-encoded array of `{x, y, z}` triples; rooms that were never
/// digitized carry null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub floor: String,
    #[serde(default)]
    pub polygon: Option<String>,
}

/// Demo rooms file standing in for the room provider, loadable as a JSON
/// asset.
#[derive(Asset, TypePath, Debug, Clone, Serialize, Deserialize)]
pub struct RoomsFile {
    pub rooms: Vec<RoomRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A room with its footprint decoded. Only rooms that pass
/// [`Room::from_record`] exist engine-side.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub code: String,
    pub building: String,
    pub floor: String,
    pub polygon: Vec<Vec3>,
}

impl Room {
    /// Decode a provider record. Returns `None` for rooms without a usable
    /// footprint: null polygon, malformed JSON, or fewer than three points
    /// (a closed footprint needs at least a triangle).
    pub fn from_record(record: &RoomRecord) -> Option<Room> {
        let encoded = record.polygon.as_deref()?;
        let points: Vec<PolygonPoint> = match serde_json::from_str(encoded) {
            Ok(points) => points,
            Err(error) => {
                warn!("room {}: undecodable polygon ({error})", record.id);
                return None;
            }
        };
        if points.len() < 3 {
            return None;
        }

        Some(Room {
            id: record.id.clone(),
            code: record.code.clone(),
            building: record.building.clone(),
            floor: record.floor.clone(),
            polygon: points.iter().map(|p| Vec3::new(p.x, p.y, p.z)).collect(),
        })
    }
}

/// Decode and filter a batch of provider records.
pub fn parse_rooms(records: &[RoomRecord]) -> Vec<Room> {
    records.iter().filter_map(Room::from_record).collect()
}

/// Visual state of a room volume. Independent of the framing-level
/// "selected" concept: this is what the volume looks like right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomStyle {
    /// Invisible. Room volumes are on-demand overlays, not scenery.
    #[default]
    Hidden,
    Hover,
    Active,
}

/// An extruded room footprint placed in the scene.
#[derive(Component, Debug, Clone)]
pub struct RoomVolume {
    pub id: String,
    pub style: RoomStyle,
    /// World-space bounds, for region containment tests.
    pub min: Vec3,
    pub max: Vec3,
    /// World-space footprint bounding-box center, the room's barycenter for
    /// camera framing.
    pub center: Vec3,
}

/// Shared overlay materials, created once at startup and swapped per style.
#[derive(Resource)]
pub struct RoomMaterials {
    pub hover: Handle<StandardMaterial>,
    pub active: Handle<StandardMaterial>,
}

pub fn create_room_materials(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let overlay = |rgba: [f32; 4]| StandardMaterial {
        base_color: Color::srgba(rgba[0], rgba[1], rgba[2], rgba[3]),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    };

    commands.insert_resource(RoomMaterials {
        hover: materials.add(overlay(ROOM_HOVER_RGBA)),
        active: materials.add(overlay(ROOM_ACTIVE_RGBA)),
    });
}

/// Extruded footprint geometry in volume-local space. The first polygon
/// point is the local origin; the footprint is the XZ projection of the
/// polygon (floors are digitized flat) extruded upward by [`ROOM_HEIGHT`].
#[derive(Debug, Clone)]
pub struct RoomVolumeGeometry {
    pub origin: Vec3,
    pub triangles: Vec<[Vec3; 3]>,
    pub min: Vec3,
    pub max: Vec3,
}

/// Triangulate and extrude a room footprint. Returns `None` for degenerate
/// polygons (fewer than three points, or an outline earcut cannot close).
pub fn extrude_footprint(polygon: &[Vec3]) -> Option<RoomVolumeGeometry> {
    if polygon.len() < 3 {
        return None;
    }

    let origin = polygon[0];
    let footprint: Vec<Vec2> = polygon
        .iter()
        .map(|p| Vec2::new(p.x - origin.x, p.z - origin.z))
        .collect();

    let mut coords = Vec::with_capacity(footprint.len() * 2);
    for p in &footprint {
        coords.push(p.x as f64);
        coords.push(p.y as f64);
    }
    let cap_indices = earcutr::earcut(&coords, &[], 2).ok()?;
    if cap_indices.is_empty() {
        return None;
    }

    let bottom = |p: Vec2| Vec3::new(p.x, 0.0, p.y);
    let top = |p: Vec2| Vec3::new(p.x, ROOM_HEIGHT, p.y);

    let mut triangles = Vec::new();
    for cap in cap_indices.chunks_exact(3) {
        let (a, b, c) = (footprint[cap[0]], footprint[cap[1]], footprint[cap[2]]);
        triangles.push([bottom(a), bottom(c), bottom(b)]);
        triangles.push([top(a), top(b), top(c)]);
    }
    for i in 0..footprint.len() {
        let a = footprint[i];
        let b = footprint[(i + 1) % footprint.len()];
        triangles.push([bottom(a), bottom(b), top(b)]);
        triangles.push([bottom(a), top(b), top(a)]);
    }

    let mut min = Vec3::INFINITY;
    let mut max = Vec3::NEG_INFINITY;
    for triangle in &triangles {
        for vertex in triangle {
            min = min.min(*vertex + origin);
            max = max.max(*vertex + origin);
        }
    }

    Some(RoomVolumeGeometry {
        origin,
        triangles,
        min,
        max,
    })
}

/// World-space bounding-box center of a footprint polygon. Deliberately the
/// box center rather than the vertex centroid, so dense vertex runs on one
/// wall do not bias the framing.
pub fn footprint_center(polygon: &[Vec3]) -> Vec3 {
    let mut min = Vec3::INFINITY;
    let mut max = Vec3::NEG_INFINITY;
    for point in polygon {
        min = min.min(*point);
        max = max.max(*point);
    }
    (min + max) * 0.5
}

/// Build the renderable mesh for a volume: a triangle soup with flat face
/// normals, matching the hit-test triangles exactly.
pub fn build_room_mesh(triangles: &[[Vec3; 3]]) -> Mesh {
    let mut positions = Vec::with_capacity(triangles.len() * 3);
    let mut normals = Vec::with_capacity(triangles.len() * 3);

    for [a, b, c] in triangles {
        let normal = (*b - *a).cross(*c - *a).normalize_or_zero().to_array();
        for vertex in [a, b, c] {
            positions.push(vertex.to_array());
            normals.push(normal);
        }
    }

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh
}

/// Spawn the volume entity for a room. Hidden until hovered or selected.
pub fn spawn_room_volume(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &RoomMaterials,
    room: &Room,
) -> Option<Entity> {
    let geometry = extrude_footprint(&room.polygon)?;
    let mesh = build_room_mesh(&geometry.triangles);

    let entity = commands
        .spawn((
            Mesh3d(meshes.add(mesh)),
            MeshMaterial3d(materials.hover.clone()),
            Transform::from_translation(geometry.origin),
            Visibility::Hidden,
            RenderLayers::default(),
            Pickable::triangles(geometry.triangles, PickLayers::ROOM_VOLUMES),
            RoomVolume {
                id: room.id.clone(),
                style: RoomStyle::Hidden,
                min: geometry.min,
                max: geometry.max,
                center: footprint_center(&room.polygon),
            },
        ))
        .id();
    Some(entity)
}
