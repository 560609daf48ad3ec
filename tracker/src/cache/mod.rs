//! In-memory caches

pub mod hierarchy;

pub use hierarchy::{CacheKey, HierarchyCache};
