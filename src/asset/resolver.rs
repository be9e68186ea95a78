//! Request path resolution.
//!
//! Resolution order for a request path:
//!
//! 1. Overrides, in declaration order. The first override whose candidate
//!    location holds a regular file wins and mapping lookup is skipped.
//!    An override that matches the path but finds no file is passed over.
//! 2. Mappings, in declaration order. The first mapping whose packaged
//!    source yields a resource wins.
//! 3. Otherwise the path is not found.
//!
//! Matching is first-match, not best-match: overlapping prefixes are resolved
//! by configuration order alone.

use super::mapping::{Mapping, MappingTable, OverrideTable};
use super::resource::{FileResource, PackagedResource, Resource};
use super::source::{Packaged, PackagedSource, SourceError};
use crate::config::{AssetsConfig, ConfigError};
use crate::debug;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Resolver {
    mappings: MappingTable,
    overrides: OverrideTable,
    index_file: Option<String>,
    source: Arc<dyn PackagedSource>,
}

impl Resolver {
    pub fn new(
        mappings: MappingTable,
        overrides: OverrideTable,
        index_file: Option<String>,
        source: Arc<dyn PackagedSource>,
    ) -> Self {
        Self {
            mappings,
            overrides,
            index_file: index_file.filter(|name| !name.is_empty()),
            source,
        }
    }

    /// Build tables from configuration. Fails only on duplicate mappings.
    pub fn from_config(
        config: &AssetsConfig,
        source: Arc<dyn PackagedSource>,
    ) -> Result<Self, ConfigError> {
        let mappings = MappingTable::build(&config.mappings)?;
        let overrides = OverrideTable::new(
            config
                .overrides
                .iter()
                .map(|(path, target)| (path.clone(), target.clone())),
        );
        Ok(Self::new(
            mappings,
            overrides,
            config.index_file.clone(),
            source,
        ))
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn index_file(&self) -> Option<&str> {
        self.index_file.as_deref()
    }

    /// Resolve a request path. `None` means not found.
    pub fn resolve(&self, path: &str) -> Option<Resource> {
        if let Some(resource) = self.resolve_override(path) {
            return Some(resource);
        }

        self.mappings
            .matching(path)
            .find_map(|(mapping, sub_path)| self.resolve_mapping(mapping, sub_path))
    }

    fn resolve_override(&self, path: &str) -> Option<Resource> {
        self.overrides.iter().find_map(|o| {
            let candidate = self.with_index(o.locate(path)?)?;
            if !candidate.is_file() {
                return None;
            }
            match FileResource::open(&candidate) {
                Ok(file) => {
                    debug!("assets"; "{} -> override {}", path, candidate.display());
                    Some(Resource::File(file))
                }
                Err(e) => {
                    debug!("assets"; "override {} unreadable: {}", candidate.display(), e);
                    None
                }
            }
        })
    }

    /// Re-target a directory to its index file; `None` without an index.
    fn with_index(&self, candidate: PathBuf) -> Option<PathBuf> {
        if candidate.is_dir() {
            self.index_file.as_ref().map(|index| candidate.join(index))
        } else {
            Some(candidate)
        }
    }

    fn resolve_mapping(&self, mapping: &Mapping, sub_path: &str) -> Option<Resource> {
        let mut lookup = mapping.lookup_path(sub_path);

        let loaded = match self.load(&lookup)? {
            Packaged::Directory => {
                let index = self.index_file.as_ref()?;
                lookup = if lookup.is_empty() {
                    index.clone()
                } else {
                    format!("{lookup}/{index}")
                };
                match self.load(&lookup)? {
                    Packaged::Directory => return None,
                    file => file,
                }
            }
            file => file,
        };

        let Packaged::File { bytes, modified } = loaded else {
            return None;
        };
        Some(Resource::Packaged(PackagedResource::new(
            self.source.describe(&lookup),
            bytes,
            modified,
        )))
    }

    /// Load from the packaged source; both absence and read failures end
    /// this mapping attempt.
    fn load(&self, lookup: &str) -> Option<Packaged> {
        match self.source.load(lookup) {
            Ok(packaged) => Some(packaged),
            Err(SourceError::NotFound(_)) => None,
            Err(e) => {
                debug!("assets"; "{}: {}", e, error_source(&e));
                None
            }
        }
    }
}

fn error_source(e: &SourceError) -> String {
    use std::error::Error;
    e.source().map(ToString::to_string).unwrap_or_default()
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("mappings", &self.mappings)
            .field("overrides", &self.overrides)
            .field("index_file", &self.index_file)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::source::{DirSource, MemorySource};
    use crate::freshness::mtime::unix_secs;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn at(secs: u64) -> Option<std::time::SystemTime> {
        Some(UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn resolver(
        mappings: &[(&str, &str)],
        overrides: &[(&str, PathBuf)],
        index: Option<&str>,
        source: impl PackagedSource + 'static,
    ) -> Resolver {
        Resolver::new(
            MappingTable::build(mappings.iter().copied()).unwrap(),
            OverrideTable::new(overrides.iter().cloned()),
            index.map(str::to_string),
            Arc::new(source),
        )
    }

    fn content(resource: &Resource) -> String {
        String::from_utf8(resource.bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_mapping_scenario() {
        let source = MemorySource::new().with_file("assets/app.js", "console.log(1)", at(1_000_000));
        let r = resolver(&[("assets/", "/static/")], &[], None, source);

        let resource = r.resolve("/static/app.js").unwrap();
        assert_eq!(content(&resource), "console.log(1)");
        assert_eq!(unix_secs(resource.last_modified()), 1_000_000);
        assert!(!resource.is_file_backed());

        assert!(r.resolve("/static/missing.js").is_none());
        assert!(r.resolve("/elsewhere/app.js").is_none());
    }

    #[test]
    fn test_exact_override_wins_over_mapping() {
        let dir = TempDir::new().unwrap();
        let dev = dir.path().join("app.js");
        fs::write(&dev, "console.log(2)").unwrap();

        let source = MemorySource::new().with_file("assets/app.js", "console.log(1)", at(1_000_000));
        let r = resolver(
            &[("assets/", "/static/")],
            &[("/static/app.js", dev)],
            None,
            source,
        );

        let resource = r.resolve("/static/app.js").unwrap();
        assert_eq!(content(&resource), "console.log(2)");
        assert!(resource.is_file_backed());
    }

    #[test]
    fn test_subtree_override() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("js")).unwrap();
        fs::write(dir.path().join("js/app.js"), "dev").unwrap();

        let source = MemorySource::new()
            .with_file("assets/js/app.js", "packaged", None)
            .with_file("assets/js/other.js", "packaged other", None);
        let r = resolver(
            &[("assets/", "/static/")],
            &[("/static/", dir.path().to_path_buf())],
            None,
            source,
        );

        assert_eq!(content(&r.resolve("/static/js/app.js").unwrap()), "dev");
        // Missing override file falls through to the mapping.
        assert_eq!(
            content(&r.resolve("/static/js/other.js").unwrap()),
            "packaged other"
        );
    }

    #[test]
    fn test_missing_exact_override_falls_through() {
        let dir = TempDir::new().unwrap();
        let source = MemorySource::new().with_file("assets/app.js", "packaged", None);
        let r = resolver(
            &[("assets/", "/static/")],
            &[("/static/app.js", dir.path().join("gone.js"))],
            None,
            source,
        );

        assert_eq!(content(&r.resolve("/static/app.js").unwrap()), "packaged");
    }

    #[test]
    fn test_override_without_mapping() {
        let dir = TempDir::new().unwrap();
        let dev = dir.path().join("robots.txt");
        fs::write(&dev, "User-agent: *").unwrap();

        let r = resolver(&[], &[("/robots.txt", dev)], None, MemorySource::new());
        assert_eq!(content(&r.resolve("/robots.txt").unwrap()), "User-agent: *");
    }

    #[test]
    fn test_override_directory_index() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "dev index").unwrap();

        let overrides = [("/help/", dir.path().join("docs"))];

        let with_index = resolver(&[], &overrides, Some("index.html"), MemorySource::new());
        assert_eq!(content(&with_index.resolve("/help/").unwrap()), "dev index");

        let without_index = resolver(&[], &overrides, None, MemorySource::new());
        assert!(without_index.resolve("/help/").is_none());
    }

    #[test]
    fn test_override_order_first_match_wins() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.js");
        let second = dir.path().join("second.js");
        fs::write(&first, "first").unwrap();
        fs::write(&second, "second").unwrap();

        let r = resolver(
            &[],
            &[("/static/app.js", first), ("/static/app.js", second)],
            None,
            MemorySource::new(),
        );
        assert_eq!(content(&r.resolve("/static/app.js").unwrap()), "first");
    }

    #[test]
    fn test_directory_index_scenario() {
        let source = MemorySource::new().with_file("docs/index.html", "<h1>help</h1>", at(5));
        let r = resolver(&[("docs/", "/help/")], &[], Some("index.html"), source);

        assert_eq!(content(&r.resolve("/help/").unwrap()), "<h1>help</h1>");
        assert_eq!(content(&r.resolve("/help").unwrap()), "<h1>help</h1>");
    }

    #[test]
    fn test_directory_without_index_is_unresolved() {
        let source = MemorySource::new().with_file("docs/index.html", "<h1>help</h1>", None);
        let r = resolver(&[("docs/", "/help/")], &[], None, source);
        assert!(r.resolve("/help/").is_none());
    }

    #[test]
    fn test_directory_without_index_tries_next_mapping() {
        let source = MemorySource::new()
            .with_file("a/sub/x.css", "nested", None)
            .with_file("b/sub", "plain file", None);
        let r = resolver(&[("a/", "/s/"), ("b/", "/s/")], &[], None, source);
        assert_eq!(content(&r.resolve("/s/sub").unwrap()), "plain file");
    }

    #[test]
    fn test_mapping_order_first_success_wins() {
        let source = MemorySource::new()
            .with_file("first/app.css", "first", None)
            .with_file("second/app.css", "second", None)
            .with_file("second/only.css", "only second", None);
        let r = resolver(&[("first", "/s"), ("second", "/s")], &[], None, source);

        assert_eq!(content(&r.resolve("/s/app.css").unwrap()), "first");
        assert_eq!(content(&r.resolve("/s/only.css").unwrap()), "only second");
    }

    /// Source whose entries under `broken/` exist but cannot be read.
    struct UnreadableUnder(MemorySource);

    impl PackagedSource for UnreadableUnder {
        fn load(&self, path: &str) -> Result<Packaged, SourceError> {
            if path.starts_with("broken/") {
                return Err(SourceError::Io {
                    path: path.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            self.0.load(path)
        }
    }

    #[test]
    fn test_load_failure_tries_next_mapping() {
        let source = UnreadableUnder(
            MemorySource::new()
                .with_file("broken/app.js", "unreadable", None)
                .with_file("good/app.js", "ok", None),
        );
        let r = resolver(&[("broken", "/s"), ("good", "/s")], &[], None, source);

        assert_eq!(content(&r.resolve("/s/app.js").unwrap()), "ok");
    }

    #[test]
    fn test_load_failure_without_fallback_is_unresolved() {
        let source = UnreadableUnder(MemorySource::new().with_file("broken/app.js", "x", None));
        let r = resolver(&[("broken", "/s")], &[], None, source);

        assert!(r.resolve("/s/app.js").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_override_falls_through() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let dev = dir.path().join("app.js");
        fs::write(&dev, "dev").unwrap();
        fs::set_permissions(&dev, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop a privileged user.
        if fs::read(&dev).is_ok() {
            return;
        }

        let source = MemorySource::new().with_file("assets/app.js", "packaged", None);
        let r = resolver(
            &[("assets/", "/static/")],
            &[("/static/app.js", dev)],
            None,
            source,
        );

        let resource = r.resolve("/static/app.js").unwrap();
        assert_eq!(content(&resource), "packaged");
        assert!(!resource.is_file_backed());
    }

    /// `/proc/self/mem` is a regular file whose first page is never mapped,
    /// so reading it fails even for root.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_override_open_failure_falls_through() {
        let mem = PathBuf::from("/proc/self/mem");
        assert!(mem.is_file());
        assert!(FileResource::open(&mem).is_err());

        let source = MemorySource::new().with_file("assets/app.js", "packaged", None);
        let r = resolver(&[("assets/", "/static/")], &[("/static/app.js", mem)], None, source);

        let resource = r.resolve("/static/app.js").unwrap();
        assert_eq!(content(&resource), "packaged");
        assert!(!resource.is_file_backed());
    }

    #[test]
    fn test_dir_source_end_to_end() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public/assets")).unwrap();
        fs::write(dir.path().join("public/assets/site.css"), "body{}").unwrap();

        let r = resolver(
            &[("assets", "/static")],
            &[],
            None,
            DirSource::new(dir.path().join("public")),
        );

        let resource = r.resolve("/static/site.css").unwrap();
        assert_eq!(content(&resource), "body{}");
        assert!(resource.origin().ends_with("site.css"));
        assert!(r.resolve("/static/../assets/site.css").is_none());
    }

    #[test]
    fn test_idempotent_resolution() {
        let source = MemorySource::new().with_file("assets/app.js", "same", None);
        let r = resolver(&[("assets/", "/static/")], &[], None, source);

        let a = r.resolve("/static/app.js").unwrap().bytes();
        let b = r.resolve("/static/app.js").unwrap().bytes();
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_config_duplicate_mapping() {
        let mut config = AssetsConfig::default();
        config.mappings.insert("assets".into(), "/a/".into());
        config.mappings.insert("/assets/".into(), "/b/".into());

        let err = Resolver::from_config(&config, Arc::new(MemorySource::new())).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateMapping { .. }));
    }

    #[test]
    fn test_empty_index_file_disables_index() {
        let source = MemorySource::new().with_file("docs/index.html", "x", None);
        let r = resolver(&[("docs/", "/help/")], &[], Some(""), source);
        assert_eq!(r.index_file(), None);
        assert!(r.resolve("/help/").is_none());
    }
}
