//! Tests for error types.

use super::*;

/// Verify that DelayQueueError variants correctly classify transient vs non-transient conditions.
///
/// Server errors (5xx) and rate limiting (429) are transient; protocol errors,
/// validation failures and server-reported operation errors are not.
#[test]
fn test_delay_queue_error_transience() {
    // Non-transient errors
    assert!(!DelayQueueError::ClassNotFound {
        handler: "Missing".to_string()
    }
    .is_transient());
    assert!(!DelayQueueError::SubClass {
        handler: "Plain".to_string(),
        capability: Capability::JobHandler,
    }
    .is_transient());
    assert!(!DelayQueueError::invalid_response("miss code").is_transient());
    assert!(!DelayQueueError::Operation {
        code: 1,
        message: "boom".to_string()
    }
    .is_transient());
    assert!(!DelayQueueError::UnexpectedRedirect {
        status: 302,
        location: None
    }
    .is_transient());
    assert!(!DelayQueueError::HttpStatus {
        status: 404,
        body: "not found".to_string()
    }
    .is_transient());

    // Transient errors
    assert!(DelayQueueError::HttpStatus {
        status: 503,
        body: "unavailable".to_string()
    }
    .is_transient());
    assert!(DelayQueueError::HttpStatus {
        status: 429,
        body: "slow down".to_string()
    }
    .should_retry());
}

/// Verify that only errors raised before sending a request are reported as local.
#[test]
fn test_delay_queue_error_is_local() {
    assert!(DelayQueueError::ClassNotFound {
        handler: "Missing".to_string()
    }
    .is_local());
    assert!(DelayQueueError::Configuration {
        message: "bad url".to_string()
    }
    .is_local());

    assert!(!DelayQueueError::Operation {
        code: 1,
        message: "boom".to_string()
    }
    .is_local());
    assert!(!DelayQueueError::invalid_response("miss id").is_local());
}

/// Verify that error messages carry the server message and handler names.
#[test]
fn test_delay_queue_error_display() {
    let err = DelayQueueError::Operation {
        code: 1,
        message: "boom".to_string(),
    };
    assert_eq!(err.to_string(), "Operation failed (1): boom");

    let err = DelayQueueError::ClassNotFound {
        handler: "SendMail".to_string(),
    };
    assert_eq!(err.to_string(), "can not find handler [SendMail]");

    let err = DelayQueueError::SubClass {
        handler: "SendMail".to_string(),
        capability: Capability::JobHandler,
    };
    assert_eq!(err.to_string(), "[SendMail] does not implement [job-handler]");

    let err = DelayQueueError::UnexpectedRedirect {
        status: 301,
        location: Some("http://elsewhere/push".to_string()),
    };
    assert_eq!(
        err.to_string(),
        "Unexpected redirect: 301 to http://elsewhere/push"
    );
}

/// Verify that a JSON failure converts into a serialization error.
#[test]
fn test_serde_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: DelayQueueError = json_err.into();

    assert!(matches!(err, DelayQueueError::Serialization(_)));
    assert!(!err.is_transient());
}

/// Verify ValidationError messages.
#[test]
fn test_validation_error_display() {
    let err = ValidationError::Required {
        field: "topic".to_string(),
    };
    assert_eq!(err.to_string(), "Required field missing: topic");

    let err = ValidationError::InvalidFormat {
        field: "topic".to_string(),
        message: "must not contain ','".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid format for topic: must not contain ','"
    );
}
