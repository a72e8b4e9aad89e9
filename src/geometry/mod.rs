/// Source-space polygon to fragment-space crop mapping.
pub mod transform;
