//! Adapter between configuration, the resolution core and an HTTP host.
//!
//! The host owns the protocol layer. At startup it builds an [`AssetServlet`],
//! registers the returned URL patterns, lets the servlet add its MIME types to
//! the host table once, and then calls [`AssetServlet::get_resource`] per
//! request. Conditional GET, ranges, ETags and compression stay with the host;
//! the servlet only hands over the options that drive them.

use super::resolver::Resolver;
use super::resource::Resource;
use super::source::PackagedSource;
use crate::cache::{CacheSpec, CacheStats, ResolutionCache};
use crate::config::{AssetsConfig, ConfigError};
use crate::log;
use crate::utils::mime::MimeTable;
use std::sync::Arc;

pub struct AssetServlet {
    config: AssetsConfig,
    cache: ResolutionCache<Resolver>,
}

impl AssetServlet {
    /// Build tables, resolver and cache from `config`.
    ///
    /// Duplicate mappings and malformed cache specs abort initialization.
    pub fn initialize(
        config: &AssetsConfig,
        source: Arc<dyn PackagedSource>,
    ) -> Result<Self, ConfigError> {
        let spec = CacheSpec::parse(&config.cache_spec)?;
        let resolver = Resolver::from_config(config, source)?;

        let servlet = Self {
            config: config.clone(),
            cache: ResolutionCache::new(resolver, spec),
        };
        for pattern in servlet.url_patterns() {
            log!("assets"; "registering {} for {}", servlet.name(), pattern);
        }
        Ok(servlet)
    }

    pub fn name(&self) -> &str {
        &self.config.servlet_name
    }

    pub fn config(&self) -> &AssetsConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResolutionCache<Resolver> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// One wildcard pattern per mapping, in declaration order.
    pub fn url_patterns(&self) -> Vec<String> {
        self.cache.loader().mappings().url_patterns()
    }

    /// Whether a request path falls under one of the registered patterns.
    pub fn handles(&self, path: &str) -> bool {
        self.cache.loader().mappings().matching(path).next().is_some()
    }

    /// Add the configured extension -> content type pairs to the host table.
    pub fn register_mime_types(&self, table: &mut MimeTable) {
        for (extension, mime) in &self.config.mime_types {
            table.add(extension, mime);
        }
    }

    /// Resolved resource for `path`, or `None` when nothing serves it.
    pub fn get_resource(&self, path: &str) -> Option<Arc<Resource>> {
        self.cache.get(path)
    }

    /// Options for the host's protocol layer as name/value pairs.
    ///
    /// `cacheControl` and `otherGzipFileExtensions` are only present when
    /// configured.
    pub fn init_parameters(&self) -> Vec<(String, String)> {
        let flag = |b: bool| if b { "t" } else { "f" }.to_string();

        let mut params = Vec::with_capacity(5);
        if let Some(header) = &self.config.cache_control_header {
            params.push(("cacheControl".to_string(), header.clone()));
        }
        params.push(("acceptRanges".to_string(), flag(self.config.accept_ranges)));
        params.push(("etags".to_string(), flag(self.config.etags)));
        params.push(("gzip".to_string(), flag(self.config.gzip)));
        if !self.config.other_gzip_file_extensions.is_empty() {
            params.push((
                "otherGzipFileExtensions".to_string(),
                self.config.other_gzip_file_extensions.join(","),
            ));
        }
        params
    }
}

impl std::fmt::Debug for AssetServlet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetServlet")
            .field("name", &self.config.servlet_name)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemorySource;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn memory() -> Arc<dyn PackagedSource> {
        Arc::new(
            MemorySource::new()
                .with_file(
                    "assets/app.js",
                    "console.log(1)",
                    Some(UNIX_EPOCH + Duration::from_secs(1_000_000)),
                )
                .with_file("docs/index.html", "<h1>help</h1>", None),
        )
    }

    fn config(mappings: &[(&str, &str)]) -> AssetsConfig {
        let mut config = AssetsConfig::default();
        for (root, prefix) in mappings {
            config.mappings.insert(root.to_string(), prefix.to_string());
        }
        config
    }

    #[test]
    fn test_initialize_and_serve() {
        let servlet =
            AssetServlet::initialize(&config(&[("assets/", "/static/")]), memory()).unwrap();

        let resource = servlet.get_resource("/static/app.js").unwrap();
        assert_eq!(&*resource.bytes(), b"console.log(1)");
        assert_eq!(
            resource.last_modified(),
            UNIX_EPOCH + Duration::from_secs(1_000_000)
        );
        assert!(resource.exists());
        assert!(servlet.get_resource("/static/missing.js").is_none());
    }

    #[test]
    fn test_repeated_requests_hit_cache() {
        let servlet =
            AssetServlet::initialize(&config(&[("assets/", "/static/")]), memory()).unwrap();

        let first = servlet.get_resource("/static/app.js").unwrap();
        let second = servlet.get_resource("/static/app.js").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = servlet.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_index_file_for_directory() {
        let servlet = AssetServlet::initialize(&config(&[("docs/", "/help/")]), memory()).unwrap();
        let resource = servlet.get_resource("/help/").unwrap();
        assert_eq!(&*resource.bytes(), b"<h1>help</h1>");
    }

    #[test]
    fn test_override_wins() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("app.js");
        fs::write(&target, "console.log(2)").unwrap();

        let mut config = config(&[("assets/", "/static/")]);
        config.overrides.insert("/static/app.js".to_string(), target);

        let servlet = AssetServlet::initialize(&config, memory()).unwrap();
        let resource = servlet.get_resource("/static/app.js").unwrap();
        assert_eq!(&*resource.bytes(), b"console.log(2)");
        assert!(resource.is_file_backed());
    }

    #[test]
    fn test_url_patterns() {
        let servlet = AssetServlet::initialize(
            &config(&[("assets/", "/static/"), ("docs", "help"), ("root", "")]),
            memory(),
        )
        .unwrap();

        assert_eq!(servlet.url_patterns(), ["/static/*", "/help/*", "/*"]);
        assert!(servlet.handles("/static/app.js"));
        assert!(servlet.handles("/anything"));
    }

    #[test]
    fn test_handles_only_mapped_prefixes() {
        let servlet =
            AssetServlet::initialize(&config(&[("assets/", "/static/")]), memory()).unwrap();
        assert!(servlet.handles("/static/app.js"));
        assert!(!servlet.handles("/other/app.js"));
        assert!(!servlet.handles("/staticfile"));
    }

    #[test]
    fn test_duplicate_mapping_aborts() {
        let err = AssetServlet::initialize(&config(&[("assets", "/a"), ("/assets/", "/b")]), memory())
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateMapping { .. }));
    }

    #[test]
    fn test_bad_cache_spec_aborts() {
        let mut config = config(&[("assets/", "/static/")]);
        config.cache_spec = "maximumSize=-1".to_string();
        assert!(matches!(
            AssetServlet::initialize(&config, memory()),
            Err(ConfigError::CacheSpec { .. })
        ));
    }

    #[test]
    fn test_register_mime_types() {
        let mut config = config(&[]);
        config
            .mime_types
            .insert("webmanifest".to_string(), "application/manifest+json".to_string());
        let servlet = AssetServlet::initialize(&config, memory()).unwrap();

        let mut table = MimeTable::new();
        servlet.register_mime_types(&mut table);
        assert_eq!(table.lookup("/site.webmanifest"), "application/manifest+json");
    }

    #[test]
    fn test_init_parameters() {
        let mut config = config(&[]);
        let servlet = AssetServlet::initialize(&config, memory()).unwrap();
        assert_eq!(
            servlet.init_parameters(),
            [
                ("acceptRanges".to_string(), "t".to_string()),
                ("etags".to_string(), "t".to_string()),
                ("gzip".to_string(), "f".to_string()),
            ]
        );
        assert!(
            !servlet
                .init_parameters()
                .iter()
                .any(|(name, _)| name == "otherGzipFileExtensions")
        );

        config.cache_control_header = Some("max-age=60".to_string());
        config.gzip = true;
        config.other_gzip_file_extensions = vec!["svg".to_string(), "json".to_string()];
        let servlet = AssetServlet::initialize(&config, memory()).unwrap();
        let params = servlet.init_parameters();
        assert_eq!(params[0], ("cacheControl".to_string(), "max-age=60".to_string()));
        assert!(params.contains(&("gzip".to_string(), "t".to_string())));
        assert!(params.contains(&("otherGzipFileExtensions".to_string(), "svg,json".to_string())));
    }
}
