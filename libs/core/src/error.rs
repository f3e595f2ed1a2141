use std::error::Error;
use std::fmt::{self, Display, Formatter};

use http::StatusCode;

/// Coarse classification used by the HTTP boundary to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected absence, e.g. an unlinked account.
    NotFound,
    /// The upstream webhook payload has an unexpected shape.
    BadRequest,
    /// Platform call failure, decode failure or misconfiguration.
    Internal,
}

/// Error emitted by the relay engine.
///
/// Carries a typed [`ErrorKind`], a message naming the step that failed and the
/// underlying cause, if any.
#[derive(Debug)]
pub struct RelayError {
    kind: ErrorKind,
    message: String,
    source: Option<anyhow::Error>,
}

pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Re-wraps this error under a new step description, keeping the kind.
    pub fn context(self, message: impl Into<String>) -> Self {
        let kind = self.kind;
        Self::new(kind, message).with_source(self)
    }

    /// Re-wraps this error as an internal failure of the named step.
    pub fn into_internal(self, message: impl Into<String>) -> Self {
        Self::internal(message).with_source(self)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status code reported to the webhook sender.
    ///
    /// An unlinked account surfacing here means the relay is misconfigured, so
    /// `NotFound` maps to 500 like any other server-side failure.
    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}. Cause: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for RelayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_kind_and_chains_cause() {
        let err = RelayError::not_found("linked account not found: 123")
            .context("error looking up linked account");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "error looking up linked account. Cause: linked account not found: 123"
        );
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "linked account not found: 123");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            RelayError::bad_request("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::not_found("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::internal("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn into_internal_reclassifies() {
        let err = RelayError::bad_request("bad purpose").into_internal("decode failed");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("bad purpose"));
    }
}
