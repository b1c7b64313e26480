/// Architectural model scene, relative to the asset root.
pub const MODEL_ASSET_PATH: &str = "models/department.glb";

/// Region boxes and named viewpoints for the loaded building.
pub const REGIONS_ASSET_PATH: &str = "config/campus.regions.json";

/// Demo room records standing in for the room provider backend.
pub const ROOMS_ASSET_PATH: &str = "config/campus.rooms.json";
