//! jsonnav - navigate JSON-shaped documents with delimited path strings.
//!
//! Instead of matching on nested sequences and mappings by hand, address any
//! descendant with one string such as `"a.b.2.c"`. Scalars come back as plain
//! values; sequences and mappings come back as [`Node`]s that remember their
//! path and the node they were reached from, so navigation can continue.
//!
//! # Example
//!
//! ```
//! use jsonnav::{resolve, resolve_or, wrap, Options, Value};
//!
//! let doc: Value = serde_json::from_str(
//!     r#"{"a": {"name": "Jane", "age": 12}, "b": {"name": "John", "age": 14}}"#,
//! )
//! .unwrap();
//! let options = Options::default();
//!
//! assert_eq!(resolve(&doc, "a.name", &options).unwrap(), Value::from("Jane"));
//! assert_eq!(
//!     resolve_or(&doc, "a.missing", "Unknown", &options).unwrap(),
//!     Value::from("Unknown")
//! );
//!
//! // Broadcast: the rest of the path is applied to every entry
//! let names = resolve(&doc, "^.name", &options).unwrap().into_value();
//! assert_eq!(names, serde_json::from_str::<Value>(r#"["Jane", "John"]"#).unwrap());
//!
//! let root = wrap(&doc, &options).unwrap();
//! let a = root.resolve("a").unwrap().into_node().unwrap();
//! assert_eq!(a.parent(), Some(&root));
//! ```

pub mod config;
pub mod document;
pub mod file;
pub mod path;

pub use config::Options;
pub use document::node::{Member, Node, NodeKind, Resolved};
pub use document::value::{Number, Value};
pub use path::{ErrorKind, Location, PathArg, PathError, SliceSpec};

/// Resolves `path` against `value`.
///
/// Returns the scalar at the path, or a [`Node`] when the path ends on a
/// sequence or mapping. The node's ancestry starts from a root wrapping
/// `value`.
pub fn resolve<'a>(
    value: &'a Value,
    path: impl Into<PathArg>,
    options: &Options,
) -> Result<Resolved<'a>, PathError> {
    path::evaluator::resolve_value(value, &path.into(), options)
}

/// Like [`resolve`], substituting `default` when a key or index is missing.
pub fn resolve_or<'a>(
    value: &'a Value,
    path: impl Into<PathArg>,
    default: impl Into<Value>,
    options: &Options,
) -> Result<Resolved<'a>, PathError> {
    let resolved = document::node::recover_lookup(resolve(value, path, options))?;
    Ok(resolved.unwrap_or_else(|| Resolved::Scalar(std::borrow::Cow::Owned(default.into()))))
}

/// Wraps a sequence or mapping as a root [`Node`].
pub fn wrap<'a>(value: &'a Value, options: &Options) -> Result<Node<'a>, PathError> {
    Node::wrap(value, options.clone())
}
