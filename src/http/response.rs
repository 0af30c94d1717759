//! Mapping of invocation results to HTTP responses.
//!
//! | Classification | Status | Body                    |
//! |----------------|--------|-------------------------|
//! | Healthy        | 200    | result tree             |
//! | NoChecks       | 204    | empty                   |
//! | Unhealthy      | 503    | result tree             |
//! | Faulted        | 500    | result tree             |
//! | NotFound       | 404    | `{"message": ...}`      |

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::checks::{CheckError, CheckResult, Classification};
use crate::observability::metrics;

pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

pub fn status_code(classification: Classification) -> StatusCode {
    match classification {
        Classification::Healthy => StatusCode::OK,
        Classification::NoChecks => StatusCode::NO_CONTENT,
        Classification::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        Classification::Faulted => StatusCode::INTERNAL_SERVER_ERROR,
        Classification::NotFound => StatusCode::NOT_FOUND,
    }
}

/// Build the response for an invocation outcome.
pub fn health_response(outcome: Result<CheckResult, CheckError>) -> Response {
    let (status, body) = match outcome {
        Ok(result) => {
            let status = status_code(result.classify());
            if status == StatusCode::NO_CONTENT {
                (status, String::new())
            } else {
                match serde_json::to_string(&result) {
                    Ok(body) => (status, body),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode health result");
                        (StatusCode::INTERNAL_SERVER_ERROR, message_body(&e.to_string()))
                    }
                }
            }
        }
        Err(err @ CheckError::NotFound(_)) => (
            status_code(Classification::NotFound),
            message_body(&err.to_string()),
        ),
        Err(err) => (StatusCode::BAD_REQUEST, message_body(&err.to_string())),
    };

    metrics::record_http_response(status.as_u16());
    (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response()
}

fn message_body(message: &str) -> String {
    serde_json::json!({ "message": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Status;

    #[test]
    fn test_classification_codes() {
        let up = CheckResult::aggregate("", None, vec![CheckResult::aggregate("a", Some(Status::up()), vec![])]);
        assert_eq!(health_response(Ok(up)).status(), StatusCode::OK);

        let empty = CheckResult::aggregate("", None, vec![]);
        assert_eq!(health_response(Ok(empty)).status(), StatusCode::NO_CONTENT);

        let down = CheckResult::aggregate("a", Some(Status::down()), vec![]);
        assert_eq!(health_response(Ok(down)).status(), StatusCode::SERVICE_UNAVAILABLE);

        let faulted = CheckResult::aggregate(
            "a",
            Some(Status::failure(&crate::checks::ProcedureFault::Abandoned)),
            vec![],
        );
        assert_eq!(health_response(Ok(faulted)).status(), StatusCode::INTERNAL_SERVER_ERROR);

        let missing = health_response(Err(CheckError::NotFound("x".into())));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            missing.headers()[header::CONTENT_TYPE],
            JSON_CONTENT_TYPE
        );
    }
}
