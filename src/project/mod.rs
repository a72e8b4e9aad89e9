/// Persisted atlas project document.
pub mod file;
/// Masks, textures, fragments, and atlas settings.
pub mod model;
