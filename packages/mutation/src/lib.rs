//! # dirstore-mutation
//!
//! Conditional file mutation for a directory exposed over HTTP.
//!
//! This crate decides, for a create-or-replace or a delete against a path
//! under a root directory, whether the operation goes ahead and which status
//! the caller should answer with:
//!
//! - `Root` / `ResourcePath`: request paths decoded and confined to the root
//! - `EntityTag` / `Precondition`: version tokens derived from file metadata
//! - `FileState` / `WriteAccess`: the filesystem probe shared by both decisions
//! - `MutationEngine`: the write and delete decisions themselves
//! - `PathLocks`: per-path serialisation of probe, decide and mutate
//!
//! The engine is synchronous and holds no state besides the optional lock
//! table, so one instance can be shared by every request handler.
//!
//! # Example
//!
//! ```rust,no_run
//! use dirstore_mutation::{MutationEngine, MutationStatus, Precondition, Root};
//!
//! # fn main() -> Result<(), dirstore_mutation::Error> {
//! let engine = MutationEngine::new(Root::new("/srv/www")?);
//! let path = engine.root().resolve("/docs/readme.txt")?;
//!
//! assert_eq!(engine.write(&path, None, b"hello")?, MutationStatus::Created);
//!
//! let tag = engine.entity_tag(&path)?.expect("regular file");
//! let token = Precondition::new(tag.as_str());
//! assert_eq!(
//!     engine.write(&path, token.as_ref(), b"hello again")?,
//!     MutationStatus::NoContent
//! );
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod etag;
mod lock;
mod path;
mod probe;
mod status;

pub use engine::{EngineOptions, MutationEngine};
pub use error::Error;
pub use etag::{EntityTag, Precondition};
pub use lock::{PathGuard, PathLocks};
pub use path::{PathError, ResourcePath, Root};
pub use probe::{probe, FileState, ProcessAccess, WriteAccess};
pub use status::MutationStatus;
