/// Application lifecycle states and their transition systems.
pub mod app_state;
