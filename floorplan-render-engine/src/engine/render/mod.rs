/// Render-on-demand scheduling: explicit render requests coalesced to one
/// redraw per display frame.
pub mod schedule;
