/// Bounded LRU cache of resampled crops.
pub mod resample;
