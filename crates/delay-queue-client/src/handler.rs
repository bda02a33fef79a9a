//! Handler registry used to validate and dispatch jobs.
//!
//! This module provides [`HandlerRegistry`] for associating handler
//! identifiers with [`HandlerDescriptor`]s. A descriptor lists the
//! [`Capability`]s the named type implements and, for in-process consumers,
//! the [`JobHandler`] that runs the job.
//!
//! The registry is built once at startup. Producers use it to reject jobs
//! addressed to unknown handlers before anything is sent; consumers use it to
//! find the handler for a popped job.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::{DelayQueueError, ValidationError};
use crate::job::PoppedJob;

// ============================================================================
// JobHandler
// ============================================================================

/// Error returned by a [`JobHandler`] that could not process its job.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Logic that processes popped jobs.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Process one job. Returning `Ok` acknowledges it with `finish`.
    async fn perform(&self, job: &PoppedJob) -> Result<(), HandlerError>;
}

// ============================================================================
// HandlerName
// ============================================================================

/// Validated handler identifier.
///
/// Any non-empty name without whitespace or control characters is accepted,
/// so namespaced names such as `App\Jobs\SendMail` or `app::jobs::SendMail`
/// are valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerName(String);

impl HandlerName {
    /// Maximum handler name length in characters.
    pub const MAX_LEN: usize = 256;

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "handler".to_string(),
            });
        }
        if s.chars().count() > Self::MAX_LEN {
            return Err(ValidationError::OutOfRange {
                field: "handler".to_string(),
                message: format!("maximum {} characters", Self::MAX_LEN),
            });
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::InvalidFormat {
                field: "handler".to_string(),
                message: "whitespace and control characters are not allowed".to_string(),
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HandlerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Capability / HandlerDescriptor
// ============================================================================

/// A capability a registered type can carry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Can process delay queue jobs. Required by `enqueue`.
    JobHandler,
    /// Caller-defined tag.
    Named(String),
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JobHandler => f.write_str("job-handler"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Registry entry for one handler identifier.
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: HandlerName,
    capabilities: BTreeSet<Capability>,
    handler: Option<Arc<dyn JobHandler>>,
}

impl HandlerDescriptor {
    pub fn name(&self) -> &HandlerName {
        &self.name
    }

    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    pub fn implements(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// The in-process handler, if one was registered.
    pub fn handler(&self) -> Option<Arc<dyn JobHandler>> {
        self.handler.clone()
    }
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("handler", &self.handler.as_ref().map(|_| "<JobHandler>"))
            .finish()
    }
}

// ============================================================================
// HandlerRegistry
// ============================================================================

/// Registry mapping handler identifiers to their descriptors.
///
/// # Examples
///
/// ```rust
/// use delay_queue_client::{Capability, HandlerName, HandlerRegistry};
///
/// let mut registry = HandlerRegistry::new();
/// registry.register_name(HandlerName::new("SendMail").unwrap());
/// registry.register_type(HandlerName::new("Mailer").unwrap(), []);
///
/// assert!(registry.validate("SendMail").is_ok());
/// assert!(registry.validate("Mailer").is_err()); // known, but not a job handler
/// assert!(registry.validate("Unknown").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct HandlerRegistry {
    descriptors: HashMap<String, HandlerDescriptor>,
}

impl HandlerRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-process job handler.
    ///
    /// If a descriptor with the same name is already registered it is replaced.
    pub fn register_handler(
        &mut self,
        name: HandlerName,
        handler: Arc<dyn JobHandler>,
    ) -> &mut Self {
        self.insert(name, BTreeSet::from([Capability::JobHandler]), Some(handler))
    }

    /// Register a job handler name without an in-process implementation.
    ///
    /// Producers that only push jobs for handlers living in another process use this.
    pub fn register_name(&mut self, name: HandlerName) -> &mut Self {
        self.insert(name, BTreeSet::from([Capability::JobHandler]), None)
    }

    /// Register a known type with an explicit capability set.
    pub fn register_type(
        &mut self,
        name: HandlerName,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> &mut Self {
        self.insert(name, capabilities.into_iter().collect(), None)
    }

    fn insert(
        &mut self,
        name: HandlerName,
        capabilities: BTreeSet<Capability>,
        handler: Option<Arc<dyn JobHandler>>,
    ) -> &mut Self {
        self.descriptors.insert(
            name.0.clone(),
            HandlerDescriptor {
                name,
                capabilities,
                handler,
            },
        );
        self
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Check that `name` is registered with the job handler capability.
    ///
    /// # Errors
    ///
    /// Returns [`DelayQueueError::ClassNotFound`] if the name is not registered and
    /// [`DelayQueueError::SubClass`] if it lacks [`Capability::JobHandler`].
    pub fn validate(&self, name: &str) -> Result<&HandlerDescriptor, DelayQueueError> {
        let descriptor = self
            .descriptors
            .get(name)
            .ok_or_else(|| DelayQueueError::ClassNotFound {
                handler: name.to_string(),
            })?;

        if !descriptor.implements(&Capability::JobHandler) {
            return Err(DelayQueueError::SubClass {
                handler: name.to_string(),
                capability: Capability::JobHandler,
            });
        }

        Ok(descriptor)
    }

    /// Find the in-process handler for `name`.
    pub fn handler_for(&self, name: &str) -> Option<Arc<dyn JobHandler>> {
        self.validate(name).ok().and_then(HandlerDescriptor::handler)
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
