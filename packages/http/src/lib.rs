//! # dirstore-http
//!
//! HTTP surface for a directory edited through conditional writes.
//!
//! ## Server
//!
//! [`router`] builds the route table over a shared
//! [`MutationEngine`](dirstore_mutation::MutationEngine):
//!
//! | Method        | Effect                                                   |
//! |---------------|----------------------------------------------------------|
//! | `GET`, `HEAD` | file with `ETag`, directory listing, or editor/form page |
//! | `PUT`         | create or replace from the `newText` body field          |
//! | `DELETE`      | delete                                                   |
//! | `POST`        | form with `_method=PUT` or `_method=DELETE`              |
//!
//! ```ignore
//! use std::sync::Arc;
//! use dirstore_http::{router, serve, ServerConfig};
//! use dirstore_mutation::{MutationEngine, Root};
//!
//! let engine = Arc::new(MutationEngine::new(Root::new("/srv/www")?));
//! let listener = tokio::net::TcpListener::bind("localhost:3000").await?;
//! serve(listener, router(engine, ServerConfig::default()), std::future::pending()).await?;
//! ```
//!
//! ## Client
//!
//! [`HttpFileStore`] speaks the same protocol from the other side: reads
//! return the entity tag, writes and deletes send it back as `If-Match`.
//!
//! ```ignore
//! use dirstore_http::HttpFileStore;
//!
//! let store = HttpFileStore::new("http://localhost:3000")?;
//! let file = store.read("docs/readme.txt")?.expect("exists");
//! let status = store.write("docs/readme.txt", "edited", file.etag.as_deref())?;
//! ```

pub mod body;
pub mod error;
pub mod types;

mod files;
mod listing;
mod server;

#[cfg(feature = "blocking")]
mod client;

// Re-export main types
pub use error::Error;
pub use server::{router, serve, AppState, ServerConfig};
pub use types::{EditRequest, Method, RemoteFile};

#[cfg(feature = "blocking")]
pub use client::HttpFileStore;
