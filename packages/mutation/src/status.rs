//! The fixed status vocabulary of the mutation protocol.

use std::fmt;

/// Outcome of a write or delete, as the HTTP status the caller answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationStatus {
    /// 201: a new file was written where nothing existed.
    Created,
    /// 204: an existing file was replaced or deleted.
    NoContent,
    /// 400: malformed input, rejected by the caller before the engine runs.
    BadRequest,
    /// 403: the target is not writable, or lies outside the root.
    Forbidden,
    /// 404: delete of a path where nothing exists.
    NotFound,
    /// 409: the target is a directory or another non-regular entry.
    Conflict,
    /// 412: the precondition token does not match the current entity tag.
    PreconditionFailed,
}

impl MutationStatus {
    pub fn code(self) -> u16 {
        match self {
            MutationStatus::Created => 201,
            MutationStatus::NoContent => 204,
            MutationStatus::BadRequest => 400,
            MutationStatus::Forbidden => 403,
            MutationStatus::NotFound => 404,
            MutationStatus::Conflict => 409,
            MutationStatus::PreconditionFailed => 412,
        }
    }

    /// Map a status code back into the vocabulary.
    pub fn from_code(code: u16) -> Option<MutationStatus> {
        match code {
            201 => Some(MutationStatus::Created),
            204 => Some(MutationStatus::NoContent),
            400 => Some(MutationStatus::BadRequest),
            403 => Some(MutationStatus::Forbidden),
            404 => Some(MutationStatus::NotFound),
            409 => Some(MutationStatus::Conflict),
            412 => Some(MutationStatus::PreconditionFailed),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, MutationStatus::Created | MutationStatus::NoContent)
    }

    pub fn reason(self) -> &'static str {
        match self {
            MutationStatus::Created => "Created",
            MutationStatus::NoContent => "No Content",
            MutationStatus::BadRequest => "Bad Request",
            MutationStatus::Forbidden => "Forbidden",
            MutationStatus::NotFound => "Not Found",
            MutationStatus::Conflict => "Conflict",
            MutationStatus::PreconditionFailed => "Precondition Failed",
        }
    }
}

impl fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

impl From<MutationStatus> for http::StatusCode {
    fn from(status: MutationStatus) -> Self {
        match status {
            MutationStatus::Created => http::StatusCode::CREATED,
            MutationStatus::NoContent => http::StatusCode::NO_CONTENT,
            MutationStatus::BadRequest => http::StatusCode::BAD_REQUEST,
            MutationStatus::Forbidden => http::StatusCode::FORBIDDEN,
            MutationStatus::NotFound => http::StatusCode::NOT_FOUND,
            MutationStatus::Conflict => http::StatusCode::CONFLICT,
            MutationStatus::PreconditionFailed => http::StatusCode::PRECONDITION_FAILED,
        }
    }
}
