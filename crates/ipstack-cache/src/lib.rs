pub mod decorator;
pub mod store;

pub use decorator::CachingGeoClient;
pub use store::{CacheStore, MemoryCacheStore};
