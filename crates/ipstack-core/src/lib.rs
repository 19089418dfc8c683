pub mod cache_key;
pub mod config;
pub mod error;
pub mod ip;
pub mod level;
pub mod lookup;
pub mod provider;

pub use error::LookupError;
pub use lookup::{LookupResult, QueryParams};
pub use provider::GeoProvider;

#[doc(hidden)]
pub use tracing;
