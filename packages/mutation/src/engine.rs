//! The write and delete decisions.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Error;
use crate::etag::{EntityTag, Precondition};
use crate::lock::{PathGuard, PathLocks};
use crate::path::{ResourcePath, Root};
use crate::probe::{probe, FileState, ProcessAccess, WriteAccess};
use crate::status::MutationStatus;

/// Engine construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Serialise requests on the same path so that no other request can
    /// mutate a file between its probe and its mutation.
    pub path_locks: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { path_locks: true }
    }
}

/// What the probe found, folded with the root confinement check.
enum Target {
    Absent,
    Regular(Metadata),
    NonRegular,
    Denied,
}

/// Conditional create/replace/delete of files under a root.
///
/// Every call probes the filesystem once, decides in the order
/// existence → type → permission → precondition, and only then mutates.
pub struct MutationEngine {
    root: Root,
    access: Box<dyn WriteAccess>,
    locks: Option<PathLocks>,
}

impl MutationEngine {
    pub fn new(root: Root) -> Self {
        Self::with_options(root, EngineOptions::default())
    }

    pub fn with_options(root: Root, options: EngineOptions) -> Self {
        Self {
            root,
            access: Box::new(ProcessAccess),
            locks: options.path_locks.then(PathLocks::new),
        }
    }

    /// Replace the write-access check.
    pub fn with_access(mut self, access: impl WriteAccess + 'static) -> Self {
        self.access = Box::new(access);
        self
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Current entity tag of a regular file, or `None` for anything else.
    pub fn entity_tag(&self, path: &ResourcePath) -> Result<Option<EntityTag>, Error> {
        match probe(path.as_path()) {
            Ok(FileState::Regular(metadata)) if !path.names_directory() => {
                Ok(Some(EntityTag::from_metadata(&metadata)))
            }
            Ok(_) => Ok(None),
            Err(source) => Err(Error::io("stat", path.as_path(), source)),
        }
    }

    /// Create or replace the file at `path` with `content`.
    ///
    /// | Found at path                      | Result                         |
    /// |------------------------------------|--------------------------------|
    /// | nothing                            | parents created, `Created`     |
    /// | directory or other non-regular     | `Conflict`                     |
    /// | regular file, not writable         | `Forbidden`                    |
    /// | regular file, precondition stale   | `PreconditionFailed`           |
    /// | regular file otherwise             | replaced, `NoContent`          |
    ///
    /// The precondition is not consulted when nothing exists. A directory
    /// form path such as `/docs/` never names a file, so writing to one is
    /// `Conflict` whatever is on disk.
    pub fn write(
        &self,
        path: &ResourcePath,
        precondition: Option<&Precondition>,
        content: &[u8],
    ) -> Result<MutationStatus, Error> {
        let _guard = self.lock(path);

        let status = match self.inspect(path) {
            Target::Denied => MutationStatus::Forbidden,
            _ if path.names_directory() => MutationStatus::Conflict,
            Target::Absent => {
                self.create(path, content)?;
                MutationStatus::Created
            }
            Target::NonRegular => MutationStatus::Conflict,
            Target::Regular(metadata) => match self.refuse(path, &metadata, precondition) {
                Some(refused) => refused,
                None => {
                    fs::write(path.as_path(), content)
                        .map_err(|source| Error::io("write file", path.as_path(), source))?;
                    MutationStatus::NoContent
                }
            },
        };

        debug!(path = %path, status = status.code(), "write");
        Ok(status)
    }

    /// Delete the file at `path`.
    ///
    /// Same ordering as [`write`](Self::write), except that a missing path is
    /// `NotFound`.
    pub fn delete(
        &self,
        path: &ResourcePath,
        precondition: Option<&Precondition>,
    ) -> Result<MutationStatus, Error> {
        let _guard = self.lock(path);

        let status = match self.inspect(path) {
            Target::Absent => MutationStatus::NotFound,
            Target::NonRegular => MutationStatus::Conflict,
            Target::Denied => MutationStatus::Forbidden,
            Target::Regular(metadata) => match self.refuse(path, &metadata, precondition) {
                Some(refused) => refused,
                None => {
                    fs::remove_file(path.as_path())
                        .map_err(|source| Error::io("delete file", path.as_path(), source))?;
                    MutationStatus::NoContent
                }
            },
        };

        debug!(path = %path, status = status.code(), "delete");
        Ok(status)
    }

    fn lock(&self, path: &ResourcePath) -> Option<PathGuard<'_>> {
        self.locks.as_ref().map(|locks| locks.lock(&lock_key(path)))
    }

    fn inspect(&self, path: &ResourcePath) -> Target {
        if !self.root.confines(path) {
            warn!(path = %path, "target resolves outside the root");
            return Target::Denied;
        }

        match probe(path.as_path()) {
            Ok(FileState::Absent) => Target::Absent,
            Ok(FileState::NonRegular) => Target::NonRegular,
            // `a.txt/` does not exist even when `a.txt` does.
            Ok(FileState::Regular(_)) if path.names_directory() => Target::Absent,
            Ok(FileState::Regular(metadata)) => Target::Regular(metadata),
            Err(e) => {
                warn!(path = %path, error = %e, "probe failed, treating as forbidden");
                Target::Denied
            }
        }
    }

    /// Permission then precondition checks on an existing regular file.
    fn refuse(
        &self,
        path: &ResourcePath,
        metadata: &Metadata,
        precondition: Option<&Precondition>,
    ) -> Option<MutationStatus> {
        if let Err(e) = self.access.check(path.as_path(), metadata) {
            debug!(path = %path, error = %e, "not writable");
            return Some(MutationStatus::Forbidden);
        }

        match precondition {
            Some(token) if !EntityTag::from_metadata(metadata).satisfies(token) => {
                Some(MutationStatus::PreconditionFailed)
            }
            _ => None,
        }
    }

    fn create(&self, path: &ResourcePath, content: &[u8]) -> Result<(), Error> {
        if let Some(parent) = path.as_path().parent() {
            fs::create_dir_all(parent)
                .map_err(|source| Error::io("create directory", parent, source))?;
        }
        fs::write(path.as_path(), content)
            .map_err(|source| Error::io("create file", path.as_path(), source))
    }
}

/// The real parent directory joined with the file name, so that aliases
/// through symlinked directories share one lock. Falls back to the lexical
/// path while the parent does not exist yet.
fn lock_key(path: &ResourcePath) -> PathBuf {
    let full = path.as_path();
    match (full.parent().map(Path::canonicalize), full.file_name()) {
        (Some(Ok(parent)), Some(name)) => parent.join(name),
        _ => full.to_path_buf(),
    }
}

impl std::fmt::Debug for MutationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationEngine")
            .field("root", &self.root)
            .field("path_locks", &self.locks.is_some())
            .finish()
    }
}
