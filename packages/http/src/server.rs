//! Route table and handlers.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ALLOW, IF_MATCH, LOCATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use dirstore_mutation::{MutationEngine, MutationStatus, PathError, Precondition, ResourcePath};

use crate::body::{self, BodyError, BodyKind, FormFields};
use crate::files::{self, Found, Page};
use crate::types::Method;

const ALLOWED: &str = "GET, HEAD, PUT, DELETE";

/// Server options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Render HTML listings for directory URLs ending in `/`.
    pub listing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listing: true }
    }
}

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<MutationEngine>,
    pub config: Arc<ServerConfig>,
}

/// Build the route table.
///
/// The same method router serves the root and every path below it, so the
/// route order carries no meaning.
pub fn router(engine: Arc<MutationEngine>, config: ServerConfig) -> Router {
    let state = AppState {
        engine,
        config: Arc::new(config),
    };

    let resource: MethodRouter<AppState> = get(read).put(put).delete(delete).post(post);

    Router::new()
        .route("/", resource.clone())
        .route("/*path", resource)
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), crate::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(address = %listener.local_addr()?, "serving");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn read(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(page) = Page::requested(uri.query()) {
        let path = state.engine.root().resolve_decoded(page.file_name())?;
        return send(&state, path, true, &headers).await;
    }

    let path = state.engine.root().resolve(uri.path())?;
    send(&state, path, false, &headers).await
}

/// GET/HEAD of `path`. `page` is set for editor and form pages, which are
/// never redirected or listed.
async fn send(
    state: &AppState,
    path: ResourcePath,
    page: bool,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let trailing_slash = path.names_directory() || path.is_root();
    let list = trailing_slash && state.config.listing;

    let engine = Arc::clone(&state.engine);
    let target = path.clone();
    let found =
        tokio::task::spawn_blocking(move || files::load(engine.root(), &target, list)).await??;

    match found {
        Found::File {
            content,
            tag,
            modified,
        } => Ok(files::file_response(&path, headers, content, &tag, modified)),
        Found::Directory(_) if page => Err(AppError::NotFound(path.to_string())),
        Found::Directory(_) if !trailing_slash => {
            // Built from the resolved path so `//host` cannot become a
            // protocol-relative redirect.
            let location = HeaderValue::from_str(&files::directory_href(&path))
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            Ok((StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response())
        }
        Found::Directory(Some(entries)) => Ok(files::listing_response(&path, &entries)),
        Found::Directory(None) | Found::Missing => Err(AppError::NotFound(path.to_string())),
    }
}

async fn put(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let text = body::new_text(&headers, &body)?;
    write_file(&state, &uri, &headers, text).await
}

async fn delete(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    delete_file(&state, &uri, &headers).await
}

/// POST only exists for browsers that cannot send PUT or DELETE.
async fn post(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let mut fields = match BodyKind::of(&headers) {
        Ok(BodyKind::Form) => FormFields::parse(&body),
        _ => return Err(AppError::MethodNotAllowed("POST".to_string())),
    };

    match fields.take_override() {
        Some(Some(Method::PUT)) => {
            debug!(path = uri.path(), "POST overridden to PUT");
            let text = fields.new_text()?;
            write_file(&state, &uri, &headers, text).await
        }
        Some(Some(Method::DELETE)) => {
            debug!(path = uri.path(), "POST overridden to DELETE");
            delete_file(&state, &uri, &headers).await
        }
        Some(Some(method)) => Err(AppError::MethodNotAllowed(format!("{:?}", method))),
        Some(None) | None => Err(AppError::MethodNotAllowed("POST".to_string())),
    }
}

async fn write_file(
    state: &AppState,
    uri: &Uri,
    headers: &HeaderMap,
    text: String,
) -> Result<Response, AppError> {
    let path = state.engine.root().resolve(uri.path())?;
    let precondition = if_match(headers);

    let engine = Arc::clone(&state.engine);
    let status = tokio::task::spawn_blocking(move || {
        engine.write(&path, precondition.as_ref(), text.as_bytes())
    })
    .await??;

    Ok(mutation_response(status))
}

async fn delete_file(
    state: &AppState,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let path = state.engine.root().resolve(uri.path())?;
    let precondition = if_match(headers);

    let engine = Arc::clone(&state.engine);
    let status =
        tokio::task::spawn_blocking(move || engine.delete(&path, precondition.as_ref())).await??;

    Ok(mutation_response(status))
}

/// `If-Match`, verbatim. An empty header is no precondition.
fn if_match(headers: &HeaderMap) -> Option<Precondition> {
    headers
        .get(IF_MATCH)
        .and_then(|v| Precondition::new(String::from_utf8_lossy(v.as_bytes())))
}

fn mutation_response(status: MutationStatus) -> Response {
    let code = StatusCode::from(status);
    if status.is_success() {
        code.into_response()
    } else {
        (code, status.reason()).into_response()
    }
}

/// Failures that never reach the engine, or that it could not finish.
#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed(String),
    UnsupportedMediaType(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, format!("Not Found: {}", msg)),
            Self::MethodNotAllowed(method) => {
                let message = format!("Method Not Allowed: {}", method);
                return (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(ALLOW, HeaderValue::from_static(ALLOWED))],
                    message,
                )
                    .into_response();
            }
            Self::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}

impl From<PathError> for AppError {
    fn from(e: PathError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<BodyError> for AppError {
    fn from(e: BodyError) -> Self {
        match e {
            BodyError::UnsupportedMediaType { .. } => AppError::UnsupportedMediaType(e.to_string()),
            BodyError::ContentNotString | BodyError::MalformedJson(_) => {
                AppError::BadRequest(e.to_string())
            }
        }
    }
}

impl From<dirstore_mutation::Error> for AppError {
    fn from(e: dirstore_mutation::Error) -> Self {
        error!(error = %e, "mutation failed");
        AppError::Internal(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        error!(error = %e, "read failed");
        AppError::Internal(e.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!(error = %e, "blocking task failed");
        AppError::Internal(e.to_string())
    }
}
