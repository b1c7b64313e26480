use bevy::prelude::*;

use crate::engine::loading::progress::LoadingProgress;

/// Application lifecycle. Interaction systems run in every state — room
/// volumes and selection do not depend on the architectural mesh — but
/// spatial queries only become meaningful once the model is flattened.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    ModelReady,
    Running,
}

/// Leaves `Loading` once the architectural geometry is baked and both config
/// assets are in. The loading-state polls stop running after this, so every
/// flag must be set before the transition.
pub fn transition_to_model_ready(
    loading_progress: Res<LoadingProgress>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if loading_progress.model_flattened
        && loading_progress.regions_loaded
        && loading_progress.rooms_loaded
    {
        println!("→ Transitioning to ModelReady state");
        next_state.set(AppState::ModelReady);
    }
}

pub fn transition_to_running(mut next_state: ResMut<NextState<AppState>>) {
    println!("→ All systems ready, transitioning to Running state");
    next_state.set(AppState::Running);
}
