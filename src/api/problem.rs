//! Problem-details payloads (`application/problem+json`).
//!
//! Every error the API returns with a body goes through [`Problem`]. Field
//! validation failures carry an ordered `violations` list, one entry per
//! failed constraint, in the order the fields are declared on the payload.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

pub const PROBLEM_JSON: &str = "application/problem+json";

pub const CONSTRAINT_VIOLATION_TYPE: &str = "https://zalando.github.io/problem/constraint-violation";

pub const CONSTRAINT_VIOLATION_TITLE: &str = "Constraint Violation";

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl Problem {
    /// Problem for a generic HTTP status, titled with the status' reason phrase.
    pub fn from_status(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            problem_type: None,
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: Some(detail.into()),
            violations: None,
        }
    }

    pub fn constraint_violation(violations: Vec<Violation>) -> Self {
        Self {
            problem_type: Some(CONSTRAINT_VIOLATION_TYPE.to_string()),
            title: CONSTRAINT_VIOLATION_TITLE.to_string(),
            status: StatusCode::BAD_REQUEST.as_u16(),
            detail: None,
            violations: Some(violations),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match serde_json::to_vec(&self) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON))],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize problem payload: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constraint_violation_serializes_in_declaration_order() {
        let problem = Problem::constraint_violation(vec![
            Violation::new("fruitId", "Fruit cannot be empty"),
            Violation::new("packSize", "Pack size cannot be empty"),
        ]);

        let value = serde_json::to_value(&problem).unwrap();
        assert_eq!(
            value,
            json!({
                "type": CONSTRAINT_VIOLATION_TYPE,
                "title": "Constraint Violation",
                "status": 400,
                "violations": [
                    { "field": "fruitId", "message": "Fruit cannot be empty" },
                    { "field": "packSize", "message": "Pack size cannot be empty" }
                ]
            })
        );
    }

    #[test]
    fn status_problem_uses_reason_phrase() {
        let problem = Problem::from_status(StatusCode::FORBIDDEN, "Access is denied");
        let value = serde_json::to_value(&problem).unwrap();
        assert_eq!(value["title"], "Forbidden");
        assert_eq!(value["status"], 403);
        assert!(value.get("type").is_none());
        assert!(value.get("violations").is_none());
    }

    #[test]
    fn response_has_problem_content_type() {
        let response = Problem::constraint_violation(vec![]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_JSON);
    }
}
