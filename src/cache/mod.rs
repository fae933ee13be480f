//! Home timeline page cache.
//!
//! Rendered responses of the home timeline are kept for a fixed TTL and
//! served as-is until they expire. Writes never invalidate entries, so a
//! new or deleted post shows up on the home page at most one TTL late.
//!
//! ```toml
//! [cache]
//! enabled = true
//! home_ttl_seconds = 20
//! max_entries = 64
//! ```

mod config;
mod lock;
mod middleware;
mod store;

pub use config::CacheConfig;
pub use middleware::{HomeCacheState, home_cache_layer};
pub use store::{CacheError, CachedPage, MemoryPageStore, PageStore};
