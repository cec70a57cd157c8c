use axum::http::StatusCode;
use thiserror::Error;

/// Failures that abort a single invocation.
///
/// Nothing inside the pipeline retries; every variant is surfaced to the
/// caller with the status returned by [`TranslatorError::status_code`].
#[derive(Error, Debug)]
pub enum TranslatorError {
    /// Missing or invalid setting, or a malformed mapping row. HTTP 500.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Credential retrieval or token exchange failed. HTTP 502.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Mapping table or worksheet missing or unreachable. HTTP 502.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Request method other than GET or POST. HTTP 405.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// POST body that cannot be decoded. HTTP 400.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl TranslatorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TranslatorError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TranslatorError::Authentication(_) => StatusCode::BAD_GATEWAY,
            TranslatorError::Retrieval(_) => StatusCode::BAD_GATEWAY,
            TranslatorError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            TranslatorError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<config::ConfigError> for TranslatorError {
    fn from(err: config::ConfigError) -> Self {
        TranslatorError::Configuration(err.to_string())
    }
}

pub type Result<T, E = TranslatorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            TranslatorError::Configuration("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            TranslatorError::Authentication("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            TranslatorError::Retrieval("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            TranslatorError::MethodNotAllowed("PUT".into()).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            TranslatorError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn display_names_the_category() {
        let err = TranslatorError::Retrieval("worksheet 'Mappings' not found".into());
        assert_eq!(
            err.to_string(),
            "retrieval error: worksheet 'Mappings' not found"
        );
    }
}
