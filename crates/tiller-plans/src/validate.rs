//! Structural validation of rollout-plan content.

use serde_json::Value;

use crate::error::{PlanError, PlanResult};

/// Step key for a single server group.
pub const SERVER_GROUP: &str = "server-group";
/// Step key for a set of server groups updated concurrently.
pub const CONCURRENT_GROUPS: &str = "concurrent-groups";

const ROLLOUT_PLAN: &str = "rollout-plan";
const IN_SERIES: &str = "in-series";

/// Validate rollout-plan content.
///
/// Content must hold a `rollout-plan` object with an `in-series` array of
/// one or more steps; each step names exactly one of `server-group` or
/// `concurrent-groups`.
pub fn validate_plan_content(content: &Value) -> PlanResult<()> {
    let plan = content
        .get(ROLLOUT_PLAN)
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("missing rollout-plan object"))?;

    let series = plan
        .get(IN_SERIES)
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("rollout-plan has no in-series list"))?;

    if series.is_empty() {
        return Err(malformed("in-series list is empty"));
    }

    for (idx, step) in series.iter().enumerate() {
        let step = step
            .as_object()
            .ok_or_else(|| malformed(&format!("in-series step {idx} is not an object")))?;

        match (
            step.contains_key(SERVER_GROUP),
            step.contains_key(CONCURRENT_GROUPS),
        ) {
            (true, false) | (false, true) => {}
            (true, true) => {
                return Err(malformed(&format!(
                    "in-series step {idx} names both server-group and concurrent-groups"
                )));
            }
            (false, false) => {
                return Err(malformed(&format!(
                    "in-series step {idx} names neither server-group nor concurrent-groups"
                )));
            }
        }
    }

    Ok(())
}

fn malformed(msg: &str) -> PlanError {
    PlanError::Malformed(msg.to_string())
}
