// ============================================================================
// CACHE MODULE - read-through caching with role-scoped invalidation
// ============================================================================

pub mod filters;
pub mod invalidation;
pub mod key;
pub mod read_through;
pub mod store;
pub mod ttl;

pub use invalidation::{InvalidationFanout, StaffDirectory};
pub use key::{CacheKeyPolicy, Resource};
pub use read_through::{get_or_load, get_or_load_list};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
