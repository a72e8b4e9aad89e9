/// Canvas that fragments are placed onto.
pub mod atlas;
/// Per-fragment crop, resample, and polygon clip.
pub mod fragment;
