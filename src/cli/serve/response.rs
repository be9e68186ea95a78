//! HTTP response handlers.

use anyhow::{Result, anyhow};
use std::io::Cursor;
use std::time::SystemTime;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::asset::Resource;
use crate::freshness::truncate_to_secs;
use crate::utils::date::{http_date, parse_http_date};
use crate::utils::mime::{MimeTable, types};

/// Respond with a resolved resource.
///
/// Honors `If-Modified-Since` with a 304. tiny_http drops the body of HEAD
/// responses itself, so HEAD takes the same path as GET.
pub fn respond_resource(
    request: Request,
    path: &str,
    resource: &Resource,
    mime: &MimeTable,
    cache_control: Option<&str>,
) -> Result<()> {
    let snapshot = resource.snapshot();
    let last_modified = truncate_to_secs(snapshot.last_modified);
    let content_type = content_type_for(mime, path, &resource.origin());

    let mut headers = vec![
        make_header("Content-Type", content_type)?,
        make_header("Last-Modified", &http_date(last_modified))?,
    ];
    if let Some(value) = cache_control {
        headers.push(make_header("Cache-Control", value)?);
    }

    let since = header_value(&request, "If-Modified-Since");
    if is_not_modified(since.as_deref(), last_modified) {
        return send_empty(request, 304, headers);
    }

    let len = snapshot.bytes.len();
    let response = Response::new(
        StatusCode(200),
        headers,
        Cursor::new(snapshot.bytes),
        Some(len),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Respond with a plain-text 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_text(request, 404, "404 Not Found")
}

/// Respond with 405 for anything other than GET and HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_string("405 Method Not Allowed")
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", types::PLAIN)?)
        .with_header(make_header("Allow", "GET, HEAD")?);
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_text(request, 503, "503 Service Unavailable")
}

pub fn is_get_or_head(request: &Request) -> bool {
    matches!(request.method(), Method::Get | Method::Head)
}

/// Content type from the request path, falling back to the resource origin.
///
/// Directory requests (`/help/`) carry no extension; the index file that
/// answered them does.
fn content_type_for<'a>(mime: &'a MimeTable, path: &str, origin: &str) -> &'a str {
    match mime.lookup(path) {
        types::OCTET_STREAM => mime.lookup(origin),
        found => found,
    }
}

/// Whether a conditional GET can be answered with 304.
fn is_not_modified(if_modified_since: Option<&str>, last_modified: SystemTime) -> bool {
    if_modified_since
        .and_then(parse_http_date)
        .is_some_and(|since| last_modified <= since)
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.to_string())
}

fn send_empty(request: Request, status: u16, headers: Vec<Header>) -> Result<()> {
    let mut response = Response::empty(StatusCode(status));
    for header in headers {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

fn send_text(request: Request, status: u16, body: &str) -> Result<()> {
    let response = Response::from_string(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", types::PLAIN)?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("invalid header {key}: {value}"))
}
