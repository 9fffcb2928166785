use std::time::Duration;

use huginn::{FetchError, HuginnError, InjectionError, Ocid};

#[test]
fn fetch_error_converts_into_huginn_error() {
    let err: HuginnError = FetchError::NotFound("ocid1.instance.oc1..x".into()).into();
    assert!(matches!(err, HuginnError::Fetch(FetchError::NotFound(_))));
    assert_eq!(
        err.to_string(),
        "tag fetch failed: resource not found: ocid1.instance.oc1..x"
    );
}

#[test]
fn injection_error_names_the_segment() {
    let err = InjectionError::PathConflict {
        segment: "oracle".into(),
        found: "string",
    };
    assert_eq!(
        err.to_string(),
        "insertion path segment 'oracle' holds a string, not an object"
    );
    let wrapped: HuginnError = err.into();
    assert!(matches!(wrapped, HuginnError::Injection(_)));
}

#[test]
fn json_errors_convert() {
    let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
    let err: HuginnError = parse.unwrap_err().into();
    assert!(matches!(err, HuginnError::Json(_)));
}

#[test]
fn invalid_ocid_is_invalid_input() {
    let err = "not-an-ocid".parse::<Ocid>().unwrap_err();
    assert!(matches!(err, HuginnError::InvalidInput(_)));
}

#[test]
fn retry_hints() {
    let limited = FetchError::RateLimited {
        retry_after: Some(Duration::from_secs(3)),
    };
    assert_eq!(limited.retry_after(), Some(Duration::from_secs(3)));
    assert_eq!(FetchError::Transient("x".into()).retry_after(), None);
    assert!(
        !FetchError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_transient()
    );
}
