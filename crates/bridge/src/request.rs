use std::time::Duration;

use bridge_protocol::{FIELD_PROMPT, FIELD_TIMEOUT_MS};
use serde_json::Value;

use crate::error::AskError;

const PROMPT_REQUIRED: &str = "prompt (string) required";

/// A validated `/ask` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AskRequest {
    pub(crate) prompt: String,
    pub(crate) timeout_ms: Option<u64>,
}

pub(crate) fn parse_ask_request(body: &Value) -> Result<AskRequest, AskError> {
    let prompt = match body.get(FIELD_PROMPT) {
        Some(Value::String(prompt)) if !prompt.is_empty() => prompt.clone(),
        _ => return Err(AskError::Invalid(PROMPT_REQUIRED.to_string())),
    };
    let timeout_ms = body.get(FIELD_TIMEOUT_MS).and_then(coerce_timeout_ms);
    Ok(AskRequest { prompt, timeout_ms })
}

/// Smallest delay before the terminate signal; non-positive and
/// non-numeric timeouts collapse to this rather than to the default.
const MIN_TIMEOUT_MS: u64 = 1;

/// Falsy values (absent, `null`, `false`, `0`, `""`) mean "use the default".
/// Anything else is read as a number: `true` is 1, numeric strings parse,
/// and whatever is NaN, zero or negative after that fires almost at once.
fn coerce_timeout_ms(value: &Value) -> Option<u64> {
    let millis = match value {
        Value::Null | Value::Bool(false) => return None,
        Value::Bool(true) => 1.0,
        Value::Number(number) => {
            let millis = number.as_f64().unwrap_or(f64::NAN);
            if millis == 0.0 {
                return None;
            }
            millis
        }
        Value::String(raw) if raw.is_empty() => return None,
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    };
    if millis.is_nan() || millis <= 0.0 {
        return Some(MIN_TIMEOUT_MS);
    }
    // Saturating float-to-int cast; infinity lands on the ceiling later.
    Some(millis.ceil() as u64)
}

pub(crate) fn effective_timeout(
    requested_ms: Option<u64>,
    default_ms: u64,
    max_ms: u64,
) -> Duration {
    Duration::from_millis(requested_ms.unwrap_or(default_ms).min(max_ms))
}
