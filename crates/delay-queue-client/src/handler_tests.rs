//! Tests for [`HandlerName`] and [`HandlerRegistry`].

use super::*;
use crate::job::JobBody;

// ============================================================================
// Minimal JobHandler
// ============================================================================

struct NoopHandler;

#[async_trait]
impl JobHandler for NoopHandler {
    async fn perform(&self, _job: &PoppedJob) -> Result<(), HandlerError> {
        Ok(())
    }
}

fn name(value: &str) -> HandlerName {
    HandlerName::new(value).unwrap()
}

// ============================================================================
// HandlerName tests
// ============================================================================

mod handler_name_tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(HandlerName::new("SendMail").is_ok());
        assert!(HandlerName::new("App\\Jobs\\SendMail").is_ok());
        assert!(HandlerName::new("app::jobs::SendMail").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(
            HandlerName::new(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            HandlerName::new("Send Mail"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            HandlerName::new("x".repeat(HandlerName::MAX_LEN + 1)),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}

// ============================================================================
// HandlerRegistry tests
// ============================================================================

mod registry_tests {
    use super::*;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = HandlerRegistry::new();

        assert!(registry.is_empty());
        assert!(!registry.contains("SendMail"));
    }

    #[test]
    fn test_register_handler_tags_capability() {
        let mut registry = HandlerRegistry::new();
        registry.register_handler(name("SendMail"), Arc::new(NoopHandler));

        let descriptor = registry.get("SendMail").unwrap();
        assert!(descriptor.implements(&Capability::JobHandler));
        assert!(descriptor.handler().is_some());
        assert_eq!(descriptor.name().as_str(), "SendMail");
    }

    #[test]
    fn test_register_name_has_no_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register_name(name("RemoteJob"));

        assert!(registry.validate("RemoteJob").is_ok());
        assert!(registry.handler_for("RemoteJob").is_none());
    }

    #[test]
    fn test_register_chaining() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_name(name("A"))
            .register_name(name("B"))
            .register_type(name("C"), [Capability::Named("serializable".to_string())]);

        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = HandlerRegistry::new();
        registry.register_type(name("SendMail"), []);
        registry.register_handler(name("SendMail"), Arc::new(NoopHandler));

        assert_eq!(registry.len(), 1);
        assert!(registry.validate("SendMail").is_ok());
    }

    #[test]
    fn test_validate_unknown_is_class_not_found() {
        let registry = HandlerRegistry::new();

        let err = registry.validate("Missing").unwrap_err();
        assert!(
            matches!(err, DelayQueueError::ClassNotFound { ref handler } if handler == "Missing"),
            "expected ClassNotFound, got: {:?}",
            err
        );
    }

    #[test]
    fn test_validate_without_capability_is_sub_class() {
        let mut registry = HandlerRegistry::new();
        registry.register_type(name("Mailer"), [Capability::Named("mailer".to_string())]);

        let err = registry.validate("Mailer").unwrap_err();
        assert!(
            matches!(
                err,
                DelayQueueError::SubClass {
                    ref handler,
                    capability: Capability::JobHandler,
                } if handler == "Mailer"
            ),
            "expected SubClass, got: {:?}",
            err
        );
    }

    #[test]
    fn test_handler_for_ignores_types_without_capability() {
        let mut registry = HandlerRegistry::new();
        registry.register_type(name("Mailer"), []);

        assert!(registry.handler_for("Mailer").is_none());
        assert!(registry.handler_for("Missing").is_none());
    }

    #[tokio::test]
    async fn test_handler_for_runs_registered_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register_handler(name("SendMail"), Arc::new(NoopHandler));

        let handler = registry.handler_for("SendMail").unwrap();
        let job = PoppedJob {
            id: "1".parse().unwrap(),
            handler: "SendMail".to_string(),
            body: JobBody::new(),
        };

        assert!(handler.perform(&job).await.is_ok());
    }

    #[test]
    fn test_descriptor_debug_hides_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register_handler(name("SendMail"), Arc::new(NoopHandler));

        let debug = format!("{:?}", registry.get("SendMail").unwrap());
        assert!(debug.contains("<JobHandler>"));
    }
}
