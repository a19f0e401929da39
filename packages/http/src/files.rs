//! GET and HEAD: files with entity tags, listings, editor pages.

use std::fs::{self, File};
use std::io::{self, Read};
use std::time::SystemTime;

use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use http::header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH, LAST_MODIFIED};
use http::{HeaderMap, HeaderValue, StatusCode};

use dirstore_mutation::{EntityTag, ResourcePath, Root};

use crate::listing::{self, Entry};

/// Pages served in place of the addressed resource when the query asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Page {
    Editor,
    Form,
}

impl Page {
    /// `?editor=<x>` or `?form=<x>` with a non-empty value. Editor wins when
    /// both are present.
    pub(crate) fn requested(query: Option<&str>) -> Option<Page> {
        let query = query?;
        let flagged = |name: &str| {
            url::form_urlencoded::parse(query.as_bytes()).any(|(k, v)| k == name && !v.is_empty())
        };

        if flagged("editor") {
            Some(Page::Editor)
        } else if flagged("form") {
            Some(Page::Form)
        } else {
            None
        }
    }

    pub(crate) fn file_name(self) -> &'static str {
        match self {
            Page::Editor => "editor.html",
            Page::Form => "form.html",
        }
    }
}

/// What a GET found at a path.
#[derive(Debug)]
pub(crate) enum Found {
    File {
        content: Vec<u8>,
        tag: EntityTag,
        modified: Option<SystemTime>,
    },
    /// A directory; entries are only read when a listing was asked for.
    Directory(Option<Vec<Entry>>),
    Missing,
}

/// Load whatever `path` names. Blocking.
///
/// Unlike mutations, reads follow symlinks, but only to targets under the
/// root. Dotfiles are never served.
pub(crate) fn load(root: &Root, path: &ResourcePath, list: bool) -> io::Result<Found> {
    if path.is_hidden() {
        return Ok(Found::Missing);
    }

    let metadata = match fs::metadata(path.as_path()) {
        Ok(metadata) => metadata,
        Err(e) if is_missing(&e) => return Ok(Found::Missing),
        Err(e) => return Err(e),
    };

    match path.as_path().canonicalize() {
        Ok(real) if real.starts_with(root.as_path()) => {}
        Ok(_) => return Ok(Found::Missing),
        Err(e) if is_missing(&e) => return Ok(Found::Missing),
        Err(e) => return Err(e),
    }

    if metadata.is_dir() {
        let entries = if list {
            Some(listing::read_entries(path.as_path())?)
        } else {
            None
        };
        return Ok(Found::Directory(entries));
    }

    if !metadata.is_file() || path.names_directory() {
        return Ok(Found::Missing);
    }

    let mut file = File::open(path.as_path())?;
    // Tag the snapshot we actually read from.
    let metadata = file.metadata()?;
    let mut content = Vec::with_capacity(metadata.len() as usize);
    file.read_to_end(&mut content)?;

    Ok(Found::File {
        content,
        tag: EntityTag::from_metadata(&metadata),
        modified: metadata.modified().ok(),
    })
}

fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Build the response for a file, honouring `If-None-Match`.
pub(crate) fn file_response(
    path: &ResourcePath,
    request_headers: &HeaderMap,
    content: Vec<u8>,
    tag: &EntityTag,
    modified: Option<SystemTime>,
) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(tag.as_str()) {
        headers.insert(ETAG, value);
    }
    if let Some(value) = modified.and_then(|t| HeaderValue::from_str(&http_date(t)).ok()) {
        headers.insert(LAST_MODIFIED, value);
    }

    let not_modified = request_headers
        .get(IF_NONE_MATCH)
        .is_some_and(|v| v.as_bytes() == tag.as_str().as_bytes());
    if not_modified {
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type(path.file_name().unwrap_or(""))),
    );
    (StatusCode::OK, headers, content).into_response()
}

/// Percent-encoded URL path of a directory, with one leading and one
/// trailing slash.
pub(crate) fn directory_href(path: &ResourcePath) -> String {
    let mut href = String::from("/");
    for component in path.components() {
        href.push_str(&urlencoding::encode(component));
        href.push('/');
    }
    href
}

pub(crate) fn listing_response(path: &ResourcePath, entries: &[Entry]) -> Response {
    let mut display = path.to_string();
    if !display.ends_with('/') {
        display.push('/');
    }
    let html = listing::render(&display, &directory_href(path), entries);
    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
        html,
    )
        .into_response()
}

fn http_date(t: SystemTime) -> String {
    DateTime::<Utc>::from(t)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "md" | "markdown" => "text/markdown; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}
