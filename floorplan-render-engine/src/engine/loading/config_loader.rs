use bevy::prelude::*;

use constants::path::{REGIONS_ASSET_PATH, ROOMS_ASSET_PATH};

use crate::engine::loading::progress::LoadingProgress;
use crate::viewer::regions::RegionConfig;
use crate::viewer::room::{parse_rooms, RoomsFile};
use crate::viewer::room_registry::SetRoomsEvent;

#[derive(Resource, Default)]
pub struct ConfigLoader {
    regions: Option<Handle<RegionConfig>>,
    rooms: Option<Handle<RoomsFile>>,
}

/// Kick off loading of the building configuration and the demo rooms file.
/// The demo rooms stand in for the provider backend; a frontend `set_rooms`
/// replaces them wholesale whenever it arrives.
pub fn start_loading(mut loader: ResMut<ConfigLoader>, asset_server: Res<AssetServer>) {
    loader.regions = Some(asset_server.load(REGIONS_ASSET_PATH));
    loader.rooms = Some(asset_server.load(ROOMS_ASSET_PATH));
}

/// Promote the region config to a resource once its asset is in.
pub fn poll_region_config(
    mut commands: Commands,
    mut loading_progress: ResMut<LoadingProgress>,
    loader: Res<ConfigLoader>,
    configs: Res<Assets<RegionConfig>>,
) {
    if loading_progress.regions_loaded {
        return;
    }
    if let Some(ref handle) = loader.regions {
        if let Some(config) = configs.get(handle) {
            println!(
                "✓ Region config loaded ({} regions, {} viewpoints)",
                config.regions.len(),
                config.viewpoints.len()
            );
            commands.insert_resource(config.clone());
            loading_progress.regions_loaded = true;
        }
    }
}

/// Feed the demo rooms into the registry once their asset is in.
pub fn poll_demo_rooms(
    mut loading_progress: ResMut<LoadingProgress>,
    loader: Res<ConfigLoader>,
    rooms_files: Res<Assets<RoomsFile>>,
    mut set_rooms: EventWriter<SetRoomsEvent>,
) {
    if loading_progress.rooms_loaded {
        return;
    }
    if let Some(ref handle) = loader.rooms {
        if let Some(file) = rooms_files.get(handle) {
            let rooms = parse_rooms(&file.rooms);
            println!(
                "✓ Demo rooms loaded ({} of {} records carry a footprint)",
                rooms.len(),
                file.rooms.len()
            );
            set_rooms.write(SetRoomsEvent { rooms });
            loading_progress.rooms_loaded = true;
        }
    }
}
