use bevy::prelude::*;

#[derive(Resource, Default)]
pub struct LoadingProgress {
    pub model_flattened: bool,
    pub regions_loaded: bool,
    pub rooms_loaded: bool,
}
