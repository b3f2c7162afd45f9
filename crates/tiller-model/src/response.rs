//! Operation responses and outcome validation.
//!
//! Every caller must inspect [`OperationResponse::outcome`] before trusting
//! the result payload; [`OperationResponse::into_result`] centralizes that
//! check and turns a failed outcome into a propagated error carrying the
//! failure description.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Outcome of a management operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
}

/// Result of executing a management operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(
        rename = "failure-description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub failure_description: Option<String>,
}

/// A non-success outcome surfaced as an error.
#[derive(Debug, Clone, Error)]
#[error("operation failed: {description}")]
pub struct OperationFailed {
    pub description: String,
}

impl OperationResponse {
    /// Successful response with a result payload.
    pub fn success(result: Value) -> Self {
        Self {
            outcome: Outcome::Success,
            result: Some(result),
            failure_description: None,
        }
    }

    /// Successful response with no result payload.
    pub fn success_empty() -> Self {
        Self {
            outcome: Outcome::Success,
            result: None,
            failure_description: None,
        }
    }

    /// Failed response with a failure description.
    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failed,
            result: None,
            failure_description: Some(description.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Validate the outcome: success yields the result payload, anything
    /// else becomes an [`OperationFailed`] carrying the description.
    pub fn into_result(self) -> Result<Value, OperationFailed> {
        match self.outcome {
            Outcome::Success => Ok(self.result.unwrap_or(Value::Null)),
            Outcome::Failed => Err(OperationFailed {
                description: self
                    .failure_description
                    .unwrap_or_else(|| "no failure description".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serde_shape() {
        let resp = OperationResponse::success(json!(["master", "slave"]));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            json!({"outcome": "success", "result": ["master", "slave"]})
        );
    }

    #[test]
    fn failed_serde_shape() {
        let resp = OperationResponse::failed("no rollout plan named: testPlan");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            json!({
                "outcome": "failed",
                "failure-description": "no rollout plan named: testPlan"
            })
        );
    }

    #[test]
    fn into_result_extracts_payload() {
        let value = OperationResponse::success(json!({"x": 1})).into_result().unwrap();
        assert_eq!(value, json!({"x": 1}));
    }

    #[test]
    fn into_result_on_empty_success_is_null() {
        let value = OperationResponse::success_empty().into_result().unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn into_result_propagates_failure_description() {
        let err = OperationResponse::failed("boom").into_result().unwrap_err();
        assert_eq!(err.description, "boom");
        assert_eq!(err.to_string(), "operation failed: boom");
    }
}
