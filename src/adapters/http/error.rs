//! Gate errors as HTTP responses.
//!
//! Every failure is rendered as `{ "ok": false, "code": ..., "error": ... }`
//! with the status from `GateError::http_status`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::domain::error::GateError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    ok: bool,
    code: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "Request failed");
        }

        let upstream_status = match &self {
            GateError::UpstreamRejected { status, .. } => *status,
            _ => None,
        };

        let body = Json(ErrorBody {
            ok: false,
            code: self.code(),
            error: self.to_string(),
            upstream_status,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_taxonomy() {
        assert_eq!(GateError::Geoblocked.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            GateError::SignerMismatch {
                expected: "a".into(),
                actual: "b".into()
            }
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GateError::UpstreamRejected {
                status: None,
                body: "timeout".into()
            }
            .into_response()
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
