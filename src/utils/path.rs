//! URL and path string helpers.

/// Trim every leading and trailing `/`.
#[inline]
pub fn trim_slashes(s: &str) -> &str {
    s.trim_matches('/')
}

/// Whether a relative `/`-separated path contains a `..` component.
pub fn has_parent_component(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Normalize a request URL into a request path: percent-decode and strip the
/// query string and fragment. Leading and trailing slashes are kept since they
/// carry meaning for prefix matching.
///
/// Returns `None` for URLs that do not decode to valid UTF-8.
pub fn normalize_url(url: &str) -> Option<String> {
    use percent_encoding::percent_decode_str;

    let raw = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;

    if decoded.is_empty() {
        Some("/".to_string())
    } else {
        Some(decoded.into_owned())
    }
}
