//! Request paths resolved against a confined root directory.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Errors related to resolving a request path under the root.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A `..` segment would climb above the root.
    #[error("path escapes the root directory: {path}")]
    Traversal { path: String },

    /// A path component cannot name a file under the root.
    #[error("invalid path component '{component}' at position {position}: {message}")]
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },

    /// The percent-encoded path does not decode to UTF-8.
    #[error("invalid path encoding: {message}")]
    InvalidEncoding { message: String },
}

/// The directory every resource path is confined to.
///
/// The directory is canonicalised once on construction so that confinement
/// checks compare real paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    dir: PathBuf,
}

impl Root {
    /// Open a root directory. It must exist and be a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Root, Error> {
        let dir = dir.into();
        let attr = fs::metadata(&dir).map_err(|source| Error::RootInvalid {
            path: dir.clone(),
            source,
        })?;

        if !attr.is_dir() {
            return Err(Error::RootInvalid {
                path: dir,
                source: io::Error::other("root path must be a directory"),
            });
        }

        match dir.canonicalize() {
            Ok(dir) => Ok(Root { dir }),
            Err(source) => Err(Error::RootInvalid { path: dir, source }),
        }
    }

    /// The canonical root directory.
    pub fn as_path(&self) -> &Path {
        &self.dir
    }

    /// Resolve a raw (percent-encoded) URL path.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dirstore_mutation::Root;
    ///
    /// let root = Root::new("/srv/www").unwrap();
    /// let path = root.resolve("/docs/read%20me.txt").unwrap();
    /// assert_eq!(path.to_string(), "/docs/read me.txt");
    ///
    /// assert!(root.resolve("/../etc/passwd").is_err());
    /// ```
    pub fn resolve(&self, url_path: &str) -> Result<ResourcePath, PathError> {
        let decoded = urlencoding::decode(url_path).map_err(|e| PathError::InvalidEncoding {
            message: e.to_string(),
        })?;
        self.resolve_decoded(&decoded)
    }

    /// Resolve an already decoded path.
    ///
    /// Empty and `.` segments are dropped and `..` is applied lexically. A
    /// `..` that would leave the root is an error rather than being clamped.
    /// A path ending in `/`, `.` or `..` names a directory, never a file.
    pub fn resolve_decoded(&self, decoded: &str) -> Result<ResourcePath, PathError> {
        let mut components: Vec<String> = Vec::new();
        let directory = matches!(decoded.rsplit('/').next(), Some("" | "." | ".."));

        for (position, segment) in decoded.split('/').enumerate() {
            match segment {
                "" | "." => continue,
                ".." => {
                    if components.pop().is_none() {
                        return Err(PathError::Traversal {
                            path: decoded.to_string(),
                        });
                    }
                }
                _ => {
                    validate_component(segment, position)?;
                    components.push(segment.to_string());
                }
            }
        }

        let full = components
            .iter()
            .fold(self.dir.clone(), |full, component| full.join(component));

        Ok(ResourcePath {
            directory: directory && !components.is_empty(),
            components,
            full,
        })
    }

    /// Check that the real location of `resource` stays under the root.
    ///
    /// Lexical resolution cannot see symlinked directories, so this
    /// canonicalises the nearest existing ancestor of the target.
    pub fn confines(&self, resource: &ResourcePath) -> bool {
        if resource.is_root() {
            return true;
        }

        let mut candidate = match resource.full.parent() {
            Some(parent) => parent,
            None => return false,
        };

        loop {
            match candidate.canonicalize() {
                Ok(real) => return real.starts_with(&self.dir),
                Err(e) if e.kind() == io::ErrorKind::NotFound => match candidate.parent() {
                    Some(parent) => candidate = parent,
                    None => return false,
                },
                Err(_) => return false,
            }
        }
    }
}

fn validate_component(component: &str, position: usize) -> Result<(), PathError> {
    let invalid = |message: &str| PathError::InvalidComponent {
        component: component.to_string(),
        position,
        message: message.to_string(),
    };

    if component.contains('\0') {
        return Err(invalid("contains a NUL byte"));
    }
    if component.contains('\\') {
        return Err(invalid("backslash is not a path separator"));
    }
    if cfg!(windows) && component.contains(':') {
        return Err(invalid("drive and stream prefixes are not allowed"));
    }

    Ok(())
}

/// A request path resolved to a location under the root.
///
/// Only [`Root::resolve`] and [`Root::resolve_decoded`] create these, so a
/// `ResourcePath` is always lexically confined to its root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    components: Vec<String>,
    full: PathBuf,
    directory: bool,
}

impl ResourcePath {
    /// Decoded path components relative to the root.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Absolute filesystem location.
    pub fn as_path(&self) -> &Path {
        &self.full
    }

    /// Whether the request path ended in a directory form such as
    /// `/docs/`. The filesystem location drops the trailing slash, so
    /// callers must check this before treating the target as a file.
    pub fn names_directory(&self) -> bool {
        self.directory
    }

    /// Whether this is the root directory itself.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Last component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// Whether any component is a dotfile.
    pub fn is_hidden(&self) -> bool {
        self.components.iter().any(|c| c.starts_with('.'))
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.components.join("/"))?;
        if self.directory {
            f.write_str("/")?;
        }
        Ok(())
    }
}

impl AsRef<Path> for ResourcePath {
    fn as_ref(&self) -> &Path {
        &self.full
    }
}
