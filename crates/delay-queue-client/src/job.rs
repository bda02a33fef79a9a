//! Job types exchanged with the delay queue service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ValidationError;

/// Key under which the handler identifier travels inside a job body.
pub const HANDLER_KEY: &str = "className";

/// Time-to-run applied to jobs that do not set one.
pub const DEFAULT_TTR: Duration = Duration::from_secs(60);

/// Free-form job payload. Insertion order is preserved on the wire.
pub type JobBody = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Identifiers
// ============================================================================

/// Validated topic name.
///
/// Topics are sent to `/pop` joined by `,`, so a topic may not contain a comma.
///
/// # Examples
///
/// ```rust
/// use delay_queue_client::Topic;
///
/// let topic = Topic::new("order-timeout").unwrap();
/// assert_eq!(topic.as_str(), "order-timeout");
///
/// assert!(Topic::new("").is_err());
/// assert!(Topic::new("a,b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Maximum topic length in characters.
    pub const MAX_LEN: usize = 128;

    /// Create a new topic with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "topic".to_string(),
            });
        }

        if name.chars().count() > Self::MAX_LEN {
            return Err(ValidationError::OutOfRange {
                field: "topic".to_string(),
                message: format!("maximum {} characters", Self::MAX_LEN),
            });
        }

        if name.contains(',') {
            return Err(ValidationError::InvalidFormat {
                field: "topic".to_string(),
                message: "must not contain ','".to_string(),
            });
        }

        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::InvalidFormat {
                field: "topic".to_string(),
                message: "whitespace and control characters are not allowed".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get topic as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Topic {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Topic {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

/// Unique job handle shared by the caller and the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Generate a new random job ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get job ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl TryFrom<String> for JobId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ValidationError::Required {
                field: "job_id".to_string(),
            });
        }

        Ok(Self(value))
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

// ============================================================================
// Job
// ============================================================================

/// A unit of deferred work submitted with [`enqueue`](crate::DelayQueueClient::enqueue).
///
/// # Examples
///
/// ```rust
/// use delay_queue_client::{Job, Topic};
/// use std::time::Duration;
///
/// let job = Job::new(Topic::new("order").unwrap())
///     .with_delay(Duration::from_secs(30))
///     .with_value("order_id", 1001);
///
/// assert_eq!(job.delay(), Duration::from_secs(30));
/// assert_eq!(job.body()["order_id"], 1001);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    topic: Topic,
    id: JobId,
    delay: Duration,
    ttr: Duration,
    body: JobBody,
}

impl Job {
    /// Create a job with a random id, no delay and the default time-to-run.
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            id: JobId::new(),
            delay: Duration::ZERO,
            ttr: DEFAULT_TTR,
            body: JobBody::new(),
        }
    }

    /// Use a caller-chosen job id.
    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }

    /// Delay before the job becomes ready. Sub-second parts are dropped.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the job ready at an absolute point in time.
    ///
    /// Instants in the past give a zero delay.
    pub fn ready_at(self, at: DateTime<Utc>) -> Self {
        let delay = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        self.with_delay(delay)
    }

    /// How long a popped job may stay unfinished before the server re-delivers it.
    pub fn with_ttr(mut self, ttr: Duration) -> Self {
        self.ttr = ttr;
        self
    }

    /// Replace the whole body.
    pub fn with_body(mut self, body: JobBody) -> Self {
        self.body = body;
        self
    }

    /// Add one entry to the body.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn ttr(&self) -> Duration {
        self.ttr
    }

    pub fn body(&self) -> &JobBody {
        &self.body
    }

    /// Build the `/push` payload with the handler identifier merged into the body.
    pub(crate) fn to_push_request(
        &self,
        handler: &str,
    ) -> Result<PushRequest<'_>, serde_json::Error> {
        let mut body = self.body.clone();
        body.insert(
            HANDLER_KEY.to_string(),
            serde_json::Value::String(handler.to_string()),
        );

        Ok(PushRequest {
            topic: self.topic.as_str(),
            id: self.id.as_str(),
            delay: self.delay.as_secs(),
            ttr: self.ttr.as_secs(),
            body: serde_json::to_string(&body)?,
        })
    }
}

/// Wire form of a job on `/push`. The body travels as a JSON-encoded string,
/// the same form `/pop` hands it back in.
#[derive(Debug, Serialize)]
pub(crate) struct PushRequest<'a> {
    pub topic: &'a str,
    pub id: &'a str,
    pub delay: u64,
    pub ttr: u64,
    pub body: String,
}

// ============================================================================
// PoppedJob
// ============================================================================

/// A ready job returned by [`dequeue`](crate::DelayQueueClient::dequeue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoppedJob {
    /// Server handle used for `finish` and `delete`
    pub id: JobId,

    /// Identifier of the handler that should process the job
    pub handler: String,

    /// Job body without the handler key
    pub body: JobBody,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
