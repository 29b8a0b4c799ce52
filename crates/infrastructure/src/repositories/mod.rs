pub mod replacement_cache;

pub use replacement_cache::JsonReplacementCache;
