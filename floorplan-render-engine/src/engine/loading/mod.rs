/// Loading progress flags gating the state transitions.
pub mod progress;

/// Asynchronous architectural model loading and geometry flattening.
pub mod model_loader;

/// Region and demo-room JSON config asset loading.
pub mod config_loader;
