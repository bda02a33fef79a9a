//! Tests for response envelope decoding.

use super::*;
use serde_json::json;

fn envelope(value: Value) -> ResponseEnvelope {
    ResponseEnvelope::parse(value.to_string().as_bytes()).unwrap()
}

fn assert_invalid(result: Result<impl std::fmt::Debug, DelayQueueError>) {
    match result {
        Err(DelayQueueError::InvalidResponse { .. }) => {}
        other => panic!("expected InvalidResponse, got: {:?}", other),
    }
}

mod check_tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        assert!(envelope(json!({"code": 0, "message": "ok"})).check().is_ok());
    }

    #[test]
    fn test_non_zero_code_is_operation_error() {
        let err = envelope(json!({"code": 1, "message": "boom"}))
            .check()
            .unwrap_err();

        match err {
            DelayQueueError::Operation { code, message } => {
                assert_eq!(code, 1);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Operation, got: {:?}", other),
        }
    }

    #[test]
    fn test_missing_message_is_invalid_regardless_of_code() {
        assert_invalid(envelope(json!({"code": 0})).check());
        assert_invalid(envelope(json!({"code": 1})).check());
    }

    #[test]
    fn test_missing_code_is_invalid() {
        assert_invalid(envelope(json!({"message": "ok"})).check());
    }

    #[test]
    fn test_non_json_body_is_invalid() {
        assert_invalid(ResponseEnvelope::parse(b"<html>502 Bad Gateway</html>"));
        assert_invalid(ResponseEnvelope::parse(b""));
    }

    #[test]
    fn test_wrongly_typed_fields_are_invalid() {
        assert_invalid(ResponseEnvelope::parse(br#"{"code":"0","message":"ok"}"#));
        assert_invalid(ResponseEnvelope::parse(br#"{"code":0,"message":7}"#));
    }

    #[test]
    fn test_array_body_is_invalid() {
        assert_invalid(ResponseEnvelope::parse(br#"[0, "ok"]"#));
        assert_invalid(ResponseEnvelope::parse(br#"[1, "boom"]"#));
        assert_invalid(ResponseEnvelope::parse(
            br#"[0, "ok", {"id": "7", "body": "{\"className\":\"H\",\"a\":1}"}]"#,
        ));
    }

    #[test]
    fn test_scalar_body_is_invalid() {
        assert_invalid(ResponseEnvelope::parse(b"0"));
        assert_invalid(ResponseEnvelope::parse(br#""ok""#));
        assert_invalid(ResponseEnvelope::parse(b"null"));
    }
}

mod popped_job_tests {
    use super::*;

    #[test]
    fn test_popped_job_extracted() {
        let job = envelope(json!({
            "code": 0,
            "message": "ok",
            "data": {"id": "42", "body": "{\"className\":\"H\",\"x\":1}"}
        }))
        .into_popped_job()
        .unwrap()
        .unwrap();

        assert_eq!(job.id.as_str(), "42");
        assert_eq!(job.handler, "H");
        assert_eq!(Value::Object(job.body), json!({"x": 1}));
    }

    #[test]
    fn test_body_order_is_preserved() {
        let job = envelope(json!({
            "code": 0,
            "message": "ok",
            "data": {"id": "1", "body": "{\"z\":1,\"className\":\"H\",\"a\":2}"}
        }))
        .into_popped_job()
        .unwrap()
        .unwrap();

        let keys: Vec<&str> = job.body.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_numeric_id_is_accepted() {
        let job = envelope(json!({
            "code": 0,
            "message": "ok",
            "data": {"id": 42, "body": "{\"className\":\"H\"}"}
        }))
        .into_popped_job()
        .unwrap()
        .unwrap();

        assert_eq!(job.id.as_str(), "42");
        assert!(job.body.is_empty());
    }

    #[test]
    fn test_absent_or_empty_data_is_no_job() {
        for response in [
            json!({"code": 0, "message": "ok"}),
            json!({"code": 0, "message": "ok", "data": null}),
            json!({"code": 0, "message": "ok", "data": {}}),
            json!({"code": 0, "message": "ok", "data": []}),
            json!({"code": 0, "message": "ok", "data": ""}),
        ] {
            let result = envelope(response.clone()).into_popped_job().unwrap();
            assert!(result.is_none(), "expected no job for {}", response);
        }
    }

    #[test]
    fn test_missing_id_or_body_is_invalid() {
        assert_invalid(
            envelope(json!({"code": 0, "message": "ok", "data": {"body": "{}"}})).into_popped_job(),
        );
        assert_invalid(
            envelope(json!({"code": 0, "message": "ok", "data": {"id": "1"}})).into_popped_job(),
        );
        assert_invalid(
            envelope(json!({"code": 0, "message": "ok", "data": {"id": null, "body": "{}"}}))
                .into_popped_job(),
        );
    }

    #[test]
    fn test_missing_handler_key_is_invalid() {
        assert_invalid(
            envelope(json!({
                "code": 0,
                "message": "ok",
                "data": {"id": "1", "body": "{\"x\":1}"}
            }))
            .into_popped_job(),
        );
    }

    #[test]
    fn test_malformed_body_is_invalid() {
        for body in [json!("not json"), json!("[1,2]"), json!({"x": 1})] {
            assert_invalid(
                envelope(json!({"code": 0, "message": "ok", "data": {"id": "1", "body": body}}))
                    .into_popped_job(),
            );
        }
    }

    #[test]
    fn test_non_string_handler_is_invalid() {
        assert_invalid(
            envelope(json!({
                "code": 0,
                "message": "ok",
                "data": {"id": "1", "body": "{\"className\":5}"}
            }))
            .into_popped_job(),
        );
    }

    #[test]
    fn test_empty_id_is_invalid() {
        assert_invalid(
            envelope(json!({
                "code": 0,
                "message": "ok",
                "data": {"id": "", "body": "{\"className\":\"H\"}"}
            }))
            .into_popped_job(),
        );
    }
}
