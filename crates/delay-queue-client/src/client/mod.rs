//! HTTP client for the delay queue service.
//!
//! This module provides [`DelayQueueClient`], which maps the four queue
//! operations onto POST requests:
//!
//! | Operation | Endpoint  | Request body                       |
//! |-----------|-----------|------------------------------------|
//! | enqueue   | `/push`   | `{topic, id, delay, ttr, body}`    |
//! | dequeue   | `/pop`    | `{topic: "t1,t2,..."}`             |
//! | delete    | `/delete` | `{id}`                             |
//! | finish    | `/finish` | `{id}`                             |
//!
//! Every response is a `{code, message[, data]}` envelope. Redirects are
//! never followed.

mod response;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::DelayQueueError;
use crate::handler::HandlerRegistry;
use crate::job::{Job, JobId, PoppedJob, Topic};

use response::ResponseEnvelope;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for delay queue client behavior.
///
/// # Examples
///
/// ```
/// use delay_queue_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_server_url("http://queue.internal:9277")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base address of the delay queue service
    pub server_url: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// User agent string for requests
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:9277".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("delay-queue-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for client configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Set the server base address.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Builder for constructing `ClientConfig` instances.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new configuration builder with defaults.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the delay queue service.
///
/// The client keeps no state between calls apart from its configuration.
/// Each operation builds its own HTTP transport from the current settings
/// and performs a single request.
///
/// # Examples
///
/// ```no_run
/// # use delay_queue_client::{DelayQueueClient, HandlerName, HandlerRegistry, Job, Topic};
/// # use std::sync::Arc;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut registry = HandlerRegistry::new();
/// registry.register_name(HandlerName::new("SendMail")?);
///
/// let client = DelayQueueClient::new("http://127.0.0.1:9277", Arc::new(registry))?;
///
/// let job = Job::new(Topic::new("mail")?).with_value("to", "alice@example.com");
/// client.enqueue("SendMail", &job).await?;
///
/// if let Some(popped) = client.dequeue(&[Topic::new("mail")?]).await? {
///     println!("{} -> {}", popped.id, popped.handler);
///     client.finish(&popped.id).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DelayQueueClient {
    server: String,
    config: ClientConfig,
    registry: Arc<HandlerRegistry>,
}

impl DelayQueueClient {
    /// Create a client for `server` with default settings.
    ///
    /// # Errors
    ///
    /// Returns `DelayQueueError::Configuration` if `server` is not an http(s) URL.
    pub fn new(
        server: impl Into<String>,
        registry: Arc<HandlerRegistry>,
    ) -> Result<Self, DelayQueueError> {
        Self::builder(registry)
            .config(ClientConfig::default().with_server_url(server))
            .build()
    }

    /// Create a new builder for constructing a client.
    pub fn builder(registry: Arc<HandlerRegistry>) -> DelayQueueClientBuilder {
        DelayQueueClientBuilder::new(registry)
    }

    /// Normalized base address, without trailing `/`.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Change the timeout used by subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns [`DelayQueueError::Configuration`] for a zero timeout; the
    /// current timeout is kept.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), DelayQueueError> {
        check_timeout(timeout)?;
        self.config.timeout = timeout;
        Ok(())
    }

    /// Get the handler registry used to validate `enqueue` calls.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Add a job to the delay queue.
    ///
    /// `handler` is checked against the registry before anything is sent and
    /// is stored in the job body under [`HANDLER_KEY`](crate::HANDLER_KEY).
    ///
    /// # Errors
    ///
    /// Returns `DelayQueueError` if:
    /// - `handler` is not registered (`ClassNotFound`)
    /// - `handler` lacks the job handler capability (`SubClass`)
    /// - The request fails or the server rejects it
    pub async fn enqueue(&self, handler: &str, job: &Job) -> Result<(), DelayQueueError> {
        self.registry.validate(handler)?;

        let request = job.to_push_request(handler)?;
        self.post("/push", &request).await?;

        debug!(
            topic = %job.topic(),
            job_id = %job.id(),
            handler = %handler,
            delay_secs = job.delay().as_secs(),
            "Job pushed"
        );
        Ok(())
    }

    /// Take one ready job from the given topics.
    ///
    /// Returns `Ok(None)` when no job is ready. An empty topic list returns
    /// `Ok(None)` without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns `DelayQueueError` if the request fails, the server rejects it,
    /// or the returned job is malformed.
    pub async fn dequeue(&self, topics: &[Topic]) -> Result<Option<PoppedJob>, DelayQueueError> {
        if topics.is_empty() {
            return Ok(None);
        }

        let topic = topics
            .iter()
            .map(Topic::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let envelope = self.post("/pop", &PopRequest { topic: &topic }).await?;
        let job = envelope.into_popped_job()?;

        match &job {
            Some(job) => debug!(topics = %topic, job_id = %job.id, handler = %job.handler, "Job popped"),
            None => debug!(topics = %topic, "No job ready"),
        }
        Ok(job)
    }

    /// Remove a job from the queue.
    pub async fn delete(&self, id: &JobId) -> Result<(), DelayQueueError> {
        self.post("/delete", &IdRequest { id: id.as_str() }).await?;
        debug!(job_id = %id, "Job deleted");
        Ok(())
    }

    /// Acknowledge that a popped job was processed.
    pub async fn finish(&self, id: &JobId) -> Result<(), DelayQueueError> {
        self.post("/finish", &IdRequest { id: id.as_str() }).await?;
        debug!(job_id = %id, "Job finished");
        Ok(())
    }

    fn http_client(&self) -> Result<reqwest::Client, DelayQueueError> {
        reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DelayQueueError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })
    }

    /// Send one request and return its checked envelope.
    async fn post(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<ResponseEnvelope, DelayQueueError> {
        let url = format!("{}{}", self.server, path);

        let response = self.http_client()?.post(&url).json(body).send().await?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "Delay queue response received");

        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(DelayQueueError::UnexpectedRedirect {
                status: status.as_u16(),
                location,
            });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            return Err(DelayQueueError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope = ResponseEnvelope::parse(&bytes)?;
        envelope.check()?;

        Ok(envelope)
    }
}

impl std::fmt::Debug for DelayQueueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayQueueClient")
            .field("server", &self.server)
            .field("config", &self.config)
            .field("handlers", &self.registry.len())
            .finish()
    }
}

#[derive(Serialize)]
struct PopRequest<'a> {
    topic: &'a str,
}

#[derive(Serialize)]
struct IdRequest<'a> {
    id: &'a str,
}

/// Builder for constructing `DelayQueueClient` instances.
pub struct DelayQueueClientBuilder {
    registry: Arc<HandlerRegistry>,
    config: Option<ClientConfig>,
}

impl DelayQueueClientBuilder {
    fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            config: None,
        }
    }

    /// Set the client configuration.
    ///
    /// If not set, uses `ClientConfig::default()`.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `DelayQueueError::Configuration` if the server URL is not a
    /// valid http(s) URL or the timeout is zero.
    pub fn build(self) -> Result<DelayQueueClient, DelayQueueError> {
        let config = self.config.unwrap_or_default();

        let parsed = url::Url::parse(&config.server_url).map_err(|e| {
            DelayQueueError::Configuration {
                message: format!("Invalid server URL '{}': {}", config.server_url, e),
            }
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DelayQueueError::Configuration {
                message: format!(
                    "Unsupported scheme '{}' in server URL; use http or https",
                    parsed.scheme()
                ),
            });
        }

        check_timeout(config.timeout)?;

        Ok(DelayQueueClient {
            server: config.server_url.trim_end_matches('/').to_string(),
            config,
            registry: self.registry,
        })
    }
}

fn check_timeout(timeout: Duration) -> Result<(), DelayQueueError> {
    if timeout.is_zero() {
        return Err(DelayQueueError::Configuration {
            message: "Timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
