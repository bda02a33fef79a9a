//! Response envelope decoding.
//!
//! Every endpoint answers with `{code, message[, data]}`. The envelope is
//! decoded against a fixed schema first; the `/pop` payload is decoded in a
//! second stage because its `body` is itself a JSON document carried as a
//! string.

use serde::Deserialize;
use serde_json::Value;

use crate::error::DelayQueueError;
use crate::job::{JobBody, JobId, PoppedJob, HANDLER_KEY};

/// Response envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponseEnvelope {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl ResponseEnvelope {
    /// Decode a response body.
    ///
    /// Only a JSON object is an envelope; arrays and scalars never carry
    /// `code` or `message`.
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, DelayQueueError> {
        let invalid = |e: serde_json::Error| {
            DelayQueueError::invalid_response(format!("response body is not a valid envelope: {e}"))
        };

        let value: Value = serde_json::from_slice(bytes).map_err(invalid)?;
        let Value::Object(fields) = value else {
            return Err(DelayQueueError::invalid_response(
                "response body is not a JSON object",
            ));
        };

        serde_json::from_value(Value::Object(fields)).map_err(invalid)
    }

    /// Check the `code`/`message` pair.
    ///
    /// # Errors
    ///
    /// [`DelayQueueError::InvalidResponse`] if either field is missing,
    /// [`DelayQueueError::Operation`] if `code` is non-zero.
    pub(crate) fn check(&self) -> Result<(), DelayQueueError> {
        let (Some(code), Some(message)) = (self.code, self.message.as_ref()) else {
            return Err(DelayQueueError::invalid_response(
                "response body miss required parameter, code or message",
            ));
        };

        if code != 0 {
            return Err(DelayQueueError::Operation {
                code,
                message: message.clone(),
            });
        }

        Ok(())
    }

    /// Extract the popped job from a checked `/pop` envelope.
    ///
    /// Absent or empty `data` means no job was ready.
    pub(crate) fn into_popped_job(self) -> Result<Option<PoppedJob>, DelayQueueError> {
        let Some(data) = self.data.filter(|d| !is_empty(d)) else {
            return Ok(None);
        };

        let Value::Object(mut data) = data else {
            return Err(DelayQueueError::invalid_response(
                "response data is not an object",
            ));
        };

        let (Some(id), Some(body)) = (
            data.remove("id").filter(|v| !v.is_null()),
            data.remove("body").filter(|v| !v.is_null()),
        ) else {
            return Err(DelayQueueError::invalid_response(
                "response body miss required parameter, id or body",
            ));
        };

        let id = match id {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => {
                return Err(DelayQueueError::invalid_response(format!(
                    "job id has unexpected type: {other}"
                )))
            }
        };
        let id: JobId = id
            .parse()
            .map_err(|_| DelayQueueError::invalid_response("job id is empty"))?;

        let Value::String(body) = body else {
            return Err(DelayQueueError::invalid_response(
                "job body is not a JSON-encoded string",
            ));
        };
        let mut body: JobBody = serde_json::from_str(&body).map_err(|e| {
            DelayQueueError::invalid_response(format!("job body is not a JSON object: {e}"))
        })?;

        let handler = match body.shift_remove(HANDLER_KEY) {
            Some(Value::String(handler)) => handler,
            Some(other) => {
                return Err(DelayQueueError::invalid_response(format!(
                    "{HANDLER_KEY} has unexpected type: {other}"
                )))
            }
            None => {
                return Err(DelayQueueError::invalid_response(format!(
                    "response body miss required parameter {HANDLER_KEY}"
                )))
            }
        };

        Ok(Some(PoppedJob { id, handler, body }))
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
