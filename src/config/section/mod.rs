//! Configuration sections.

mod assets;
mod serve;

pub use assets::AssetsConfig;
pub use serve::ServeConfig;
