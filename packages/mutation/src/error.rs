//! Error types for the mutation layer.

use std::io;
use std::path::PathBuf;

use crate::path::PathError;

/// Errors raised by the engine.
///
/// Protocol outcomes (conflicts, stale tags, missing files) are not errors;
/// they come back as a [`MutationStatus`](crate::MutationStatus). These are
/// the failures of the filesystem calls that carry out an accepted mutation,
/// plus setup problems.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The configured root cannot serve as a store root.
    #[error("root directory ({}) is unusable: {source}", path.display())]
    RootInvalid {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A filesystem call failed after the decision to mutate was taken.
    #[error("failed to {operation} ({}): {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The request path could not be resolved under the root.
    #[error("path error: {0}")]
    Path(#[from] PathError),
}

impl Error {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
