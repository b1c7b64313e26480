/// The 3D cursor following the mouse on the model surface, plus the
/// vertex-snap indicator it drives.
pub mod cursor;
