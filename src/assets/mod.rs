/// Source image stores (filesystem and in-memory).
pub mod source;
