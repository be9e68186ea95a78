//! Resolution cache: request path -> resolved resource.

mod spec;
mod store;

pub use spec::{Bound, CacheSpec, DEFAULT_CACHE_SPEC};
pub use store::{CacheStats, Loader, ResolutionCache};
