//! Asset resolution core.
//!
//! # Module Structure
//!
//! - `mapping` - resource root -> URI prefix table, override table
//! - `source` - packaged resource sources (directory, in-memory)
//! - `resource` - resolved resource (packaged or filesystem-backed)
//! - `resolver` - request path -> resource
//! - `servlet` - adapter wiring configuration into an HTTP host

mod mapping;
mod resolver;
mod resource;
mod servlet;
mod source;

pub use mapping::{Mapping, MappingTable, Override, OverrideTable};
pub use resolver::Resolver;
pub use resource::{FileResource, PackagedResource, Resource, Snapshot};
pub use servlet::AssetServlet;
pub use source::{DirSource, MemorySource, Packaged, PackagedSource, SourceError};
