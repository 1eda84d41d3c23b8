//! Integration tests for defaulting lookups and error reporting.

use jsonnav::{resolve, resolve_or, ErrorKind, Node, Options, PathArg, PathError, Value};

fn doc(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

fn people() -> Value {
    doc(r#"{
        "a": {"name": "Jane", "age": 12},
        "b": {"name": "John", "age": 14}
    }"#)
}

#[test]
fn test_missing_sequence_index_raises() {
    let raw = doc("[[0, 1], [2, 3], [4, 5]]");
    let root = Node::wrap(&raw, Options::default()).unwrap();

    let err = root.resolve(3).unwrap_err();
    assert!(matches!(err, PathError::IndexOutOfRange { .. }));
    assert_eq!(err.kind(), ErrorKind::Index);

    let err = root.resolve("0.7").unwrap_err();
    let location = err.location().unwrap();
    assert_eq!(location.traversed, "0");
    assert_eq!(location.segment, "7");
    assert_eq!(
        err.to_string(),
        "error traversing \"0.7\", failed from \"0\" to \"7\": index does not exist"
    );
}

#[test]
fn test_missing_key_raises() {
    let raw = people();
    let root = Node::wrap(&raw, Options::default()).unwrap();

    let err = root.resolve("c").unwrap_err();
    assert!(matches!(err, PathError::KeyNotFound { .. }));
    assert!(err.to_string().ends_with("no such key"));
}

#[test]
fn test_bad_sequence_token_raises() {
    let raw = doc("[1, 2, 3]");
    let root = Node::wrap(&raw, Options::default()).unwrap();

    for token in ["x", "1:2:3:4", "::0"] {
        let err = root.resolve(token).unwrap_err();
        assert!(
            matches!(err, PathError::BadIndexToken { .. }),
            "{} gave {:?}",
            token,
            err
        );
    }
}

#[test]
fn test_get_returns_none_for_missing() {
    let raw = people();
    let root = Node::wrap(&raw, Options::default()).unwrap();

    assert_eq!(root.get("a.name").unwrap().unwrap(), Value::from("Jane"));
    assert!(root.get("c").unwrap().is_none());
    assert!(root.get("a.missing").unwrap().is_none());
}

#[test]
fn test_get_or_substitutes_default() {
    let raw = people();
    let root = Node::wrap(&raw, Options::default()).unwrap();

    assert_eq!(root.get_or("a.missing", "Unknown").unwrap(), Value::from("Unknown"));
    assert_eq!(root.get_or("a.age", 0).unwrap(), Value::from(12));

    let list = doc("[1, 2]");
    let list_root = Node::wrap(&list, Options::default()).unwrap();
    assert_eq!(list_root.get_or(5, Value::Null).unwrap(), Value::Null);
    assert_eq!(list_root.get_or("nope", -1).unwrap(), Value::from(-1));
}

#[test]
fn test_resolve_or_on_bare_values() {
    let raw = people();
    let options = Options::default();

    assert_eq!(
        resolve_or(&raw, "a.missing", "Unknown", &options).unwrap(),
        Value::from("Unknown")
    );
    assert_eq!(resolve_or(&raw, "b.name", "Unknown", &options).unwrap(), Value::from("John"));
}

#[test]
fn test_get_does_not_recover_bad_values() {
    let raw = people();
    let root = Node::wrap(&raw, Options::default()).unwrap();

    let err = root.get_or("a.name.first", "x").unwrap_err();
    assert!(matches!(err, PathError::BadValue { .. }));
    assert!(!err.is_lookup_failure());
}

#[test]
fn test_broadcast_failure_names_element() {
    let raw = doc(r#"[{"n": 1}, {"m": 2}]"#);
    let options = Options::default();

    let err = resolve(&raw, ":^.n", &options).unwrap_err();
    match &err {
        PathError::BroadcastElement {
            position, source, ..
        } => {
            assert_eq!(*position, 1);
            assert!(matches!(**source, PathError::KeyNotFound { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().ends_with("failed on 1"));
    assert!(std::error::Error::source(&err).is_some());

    let fallback = resolve_or(&raw, ":^.n", Value::Null, &options).unwrap();
    assert_eq!(fallback, Value::Null);
}

#[test]
fn test_dynamic_path_arguments() {
    let raw = doc("[10, 20, 30]");
    let options = Options::default();

    let from_int = PathArg::try_from(&Value::from(2)).unwrap();
    assert_eq!(resolve(&raw, from_int, &options).unwrap(), Value::from(30));

    let from_str = PathArg::try_from(&Value::from("0")).unwrap();
    assert_eq!(resolve(&raw, from_str, &options).unwrap(), Value::from(10));

    let err = PathArg::try_from(&Value::from(true)).unwrap_err();
    assert!(matches!(err, PathError::BadPathType { .. }));
    assert_eq!(err.kind(), ErrorKind::PathType);
}

#[test]
fn test_invalid_options_are_rejected() {
    let raw = people();
    let err = resolve(&raw, "a", &Options::default().with_broadcast_marker("")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Options);

    let err = Node::wrap(&raw, Options::default().with_separator("")).unwrap_err();
    assert!(matches!(err, PathError::InvalidOptions { .. }));
}

#[test]
fn test_scalar_document() {
    let raw = Value::from("just text");
    let options = Options::default();

    let err = resolve(&raw, "a", &options).unwrap_err();
    assert!(matches!(err, PathError::BadValue { .. }));
    assert!(jsonnav::wrap(&raw, &options).is_err());
}
