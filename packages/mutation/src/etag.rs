//! Entity tags and the preconditions that are compared against them.

use std::fmt;
use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Version token of a regular file, derived from its size and mtime.
///
/// The wire form is a weak validator, `W/"<size>-<mtime>"`, both in hex with
/// the mtime in nanoseconds since the Unix epoch. An unchanged file always
/// yields the same tag; a write that changes the size or the mtime yields a
/// new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag(String);

impl EntityTag {
    /// Compute the tag of a regular file from a metadata snapshot.
    pub fn from_metadata(metadata: &Metadata) -> EntityTag {
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        EntityTag(format!("W/\"{:x}-{:x}\"", metadata.len(), mtime))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte-for-byte comparison. `*` and weak/strong forms get no special
    /// treatment.
    pub fn satisfies(&self, precondition: &Precondition) -> bool {
        self.0 == precondition.0
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A client-held entity tag presented with a write or delete.
///
/// An empty token is not a precondition, so construction yields `None` for
/// it and the engine skips the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition(String);

impl Precondition {
    pub fn new(token: impl Into<String>) -> Option<Precondition> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Precondition(token))
        }
    }

    /// Build from an optional `If-Match` header value, taken verbatim.
    pub fn from_header(value: Option<&str>) -> Option<Precondition> {
        value.and_then(|v| Precondition::new(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
