//! Request-path asset resolution.
//!
//! Request paths are mapped onto packaged resources through a table of
//! resource-root -> URI-prefix mappings. Overrides point individual paths or
//! whole subtrees at the local filesystem, which is re-read whenever a file's
//! modification time changes. Every resolution goes through a cache that
//! loads each path at most once at a time.
//!
//! ```ignore
//! let source = Arc::new(DirSource::new("public"));
//! let servlet = AssetServlet::initialize(&config.assets, source)?;
//! if let Some(resource) = servlet.get_resource("/static/app.js") {
//!     let bytes = resource.bytes();
//! }
//! ```

pub mod asset;
pub mod cache;
pub mod cli;
pub mod config;
pub mod freshness;
pub mod logger;
pub mod utils;

pub use asset::{AssetServlet, Resolver, Resource};
pub use cache::{CacheSpec, ResolutionCache};
pub use config::{AppConfig, AssetsConfig, ConfigError};
