//! Filesystem probe shared by the write and delete decisions.

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::sync::Arc;

/// What currently occupies a path.
#[derive(Debug)]
pub enum FileState {
    /// Nothing at the path.
    Absent,
    /// A regular file, with the metadata the entity tag is computed from.
    Regular(Metadata),
    /// A directory, symlink, socket or other non-regular entry.
    NonRegular,
}

/// Probe a path without following a symlink at the final component.
///
/// A missing intermediate directory, or an intermediate component that is a
/// file, both count as `Absent`.
pub fn probe(path: &Path) -> io::Result<FileState> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_file() => Ok(FileState::Regular(metadata)),
        Ok(_) => Ok(FileState::NonRegular),
        Err(e) if matches!(
            e.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
        ) =>
        {
            Ok(FileState::Absent)
        }
        Err(e) => Err(e),
    }
}

/// Decides whether the current process may modify an existing file.
///
/// # Object Safety
///
/// This trait is object-safe: the engine stores a `Box<dyn WriteAccess>`.
pub trait WriteAccess: Send + Sync {
    /// `Ok(())` when the file is writable. Any error, including a failure of
    /// the check itself, is treated as "not writable".
    fn check(&self, path: &Path, metadata: &Metadata) -> io::Result<()>;
}

/// Write access as the operating system grants it to this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessAccess;

impl WriteAccess for ProcessAccess {
    #[cfg(unix)]
    fn check(&self, path: &Path, _metadata: &Metadata) -> io::Result<()> {
        rustix::fs::access(path, rustix::fs::Access::WRITE_OK).map_err(io::Error::from)
    }

    #[cfg(not(unix))]
    fn check(&self, _path: &Path, metadata: &Metadata) -> io::Result<()> {
        if metadata.permissions().readonly() {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        } else {
            Ok(())
        }
    }
}

// Blanket implementations for references and smart pointers

impl<T: WriteAccess + ?Sized> WriteAccess for &T {
    fn check(&self, path: &Path, metadata: &Metadata) -> io::Result<()> {
        (**self).check(path, metadata)
    }
}

impl<T: WriteAccess + ?Sized> WriteAccess for Box<T> {
    fn check(&self, path: &Path, metadata: &Metadata) -> io::Result<()> {
        self.as_ref().check(path, metadata)
    }
}

impl<T: WriteAccess + ?Sized> WriteAccess for Arc<T> {
    fn check(&self, path: &Path, metadata: &Metadata) -> io::Result<()> {
        self.as_ref().check(path, metadata)
    }
}
