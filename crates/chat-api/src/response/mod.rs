//! Mapping of HTTP responses to domain errors

use chat_core::DomainError;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::dto::ErrorBody;

/// Convert a non-success status and its body into a domain error
///
/// 401 means the token is no good, 403 a remote permission refusal and 404
/// a reference the server no longer knows. Everything else is reported as
/// an unexpected status.
#[must_use]
pub fn error_from_status(status: StatusCode, body: &str) -> DomainError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("no reason").to_string()
            } else {
                trimmed.to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED => DomainError::Unauthorized,
        StatusCode::FORBIDDEN => DomainError::Forbidden(message),
        StatusCode::NOT_FOUND => DomainError::NotFound(message),
        _ => DomainError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

/// Map a reqwest failure that never produced a status
#[must_use]
pub fn error_from_reqwest(err: &reqwest::Error) -> DomainError {
    if err.is_decode() {
        DomainError::InternalError(format!("invalid response body: {err}"))
    } else {
        DomainError::TransportError(err.to_string())
    }
}

/// Pass successful responses through, turn the rest into errors
pub async fn check(response: Response) -> Result<Response, DomainError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(url = %url, status = status.as_u16(), "Request failed");
    Err(error_from_status(status, &body))
}

/// Check the status and decode a JSON body
pub async fn json<T: DeserializeOwned>(response: Response) -> Result<T, DomainError> {
    check(response)
        .await?
        .json()
        .await
        .map_err(|e| error_from_reqwest(&e))
}
