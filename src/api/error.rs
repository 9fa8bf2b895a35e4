use axum::http::StatusCode;

use crate::domain::DomainError;

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        DomainError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Logs `err` at a level matching its status and returns the status.
pub fn reject(err: DomainError, action: &str) -> StatusCode {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, action, "request failed");
    } else {
        tracing::warn!(error = %err, action, "request rejected");
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&DomainError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DomainError::timeout("slow")),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&DomainError::corrupt_index("x", "y")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
