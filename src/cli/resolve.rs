//! `resolve` command: report what each request path resolves to.

use std::io::{self, Write};

use anyhow::Result;

use super::common::build_servlet;
use crate::asset::AssetServlet;
use crate::config::AppConfig;
use crate::freshness::truncate_to_secs;
use crate::log;
use crate::utils::{date::http_date, path::normalize_url};

/// Resolve every path and print one line per path to stdout.
pub fn resolve_paths(config: &AppConfig, paths: &[String]) -> Result<()> {
    let servlet = build_servlet(config)?;

    let mut out = io::stdout().lock();
    let mut missing = 0usize;
    for path in paths {
        let line = describe(&servlet, path);
        if line.ends_with("not found") {
            missing += 1;
        }
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    if missing > 0 {
        log!("assets"; "{} of {} paths not found", missing, paths.len());
    }
    Ok(())
}

fn describe(servlet: &AssetServlet, raw: &str) -> String {
    let Some(path) = normalize_url(raw) else {
        return format!("{raw}: not found");
    };

    match servlet.get_resource(&path) {
        Some(resource) => {
            let snapshot = resource.snapshot();
            format!(
                "{path}: {} ({} bytes, {})",
                resource.origin(),
                snapshot.bytes.len(),
                http_date(truncate_to_secs(snapshot.last_modified))
            )
        }
        None => format!("{path}: not found"),
    }
}
