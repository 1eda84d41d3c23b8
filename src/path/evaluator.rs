//! Path traversal.
//!
//! The evaluator walks a path segment by segment. Every collection it passes
//! through becomes a `Node` whose parent is the node before it, so the result
//! of a walk carries the full chain back to where the walk started. A
//! broadcast segment hands the rest of the path to a nested walk per element
//! and gathers the results into a new sequence.

use super::ast::{MappingSegment, PathArg, Selector};
use super::error::{Location, PathError};
use super::parser::SegmentParser;
use crate::config::Options;
use crate::document::node::{Held, Node, NodeKind, Resolved};
use crate::document::value::Value;
use std::sync::Arc;

/// Resolves `path` against a bare value.
///
/// The walk starts from a root node wrapping `value`, or from no node at all
/// when `value` is a scalar.
pub(crate) fn resolve_value<'a>(
    value: &'a Value,
    path: &PathArg,
    options: &Options,
) -> Result<Resolved<'a>, PathError> {
    options.validate()?;
    let options = Arc::new(options.clone());
    let origin = Node::from_held(
        Held::Borrowed(value),
        None,
        String::new(),
        Arc::clone(&options),
    )
    .ok()
    .map(Arc::new);
    Evaluator::new(options).resolve(Held::Borrowed(value), origin, path)
}

/// Resolves `path` relative to an existing node.
///
/// The walk continues from the node's own path, except from a broadcast
/// result: that path does not lead back to the node, so the walk starts from
/// a new root wrapping the node's value.
pub(crate) fn resolve_from<'a>(node: &Node<'a>, path: &PathArg) -> Result<Resolved<'a>, PathError> {
    let origin = if node.is_broadcast_result() {
        Node::assemble(
            node.kind(),
            node.held().clone(),
            None,
            String::new(),
            node.shared_options(),
        )
    } else {
        node.clone()
    };
    let value = origin.held().clone();
    Evaluator::new(node.shared_options()).resolve(value, Some(Arc::new(origin)), path)
}

/// The result of applying one segment.
enum Step<'a> {
    /// Continue the walk from this value
    Descend(Held<'a>),
    /// Map the rest of the path over these elements
    Broadcast(Vec<Held<'a>>),
}

pub(crate) struct Evaluator {
    options: Arc<Options>,
}

impl Evaluator {
    pub(crate) fn new(options: Arc<Options>) -> Self {
        Evaluator { options }
    }

    fn parser(&self) -> SegmentParser<'_> {
        SegmentParser::new(&self.options)
    }

    fn resolve<'a>(
        &self,
        value: Held<'a>,
        origin: Option<Arc<Node<'a>>>,
        path: &PathArg,
    ) -> Result<Resolved<'a>, PathError> {
        log::debug!("resolving {:?}", path.to_string());
        let prefix = self.prefix_of(origin.as_deref());
        match path {
            PathArg::Index(index) => {
                self.select_direct(value, origin, prefix, Selector::Index(*index), path)
            }
            PathArg::Slice(spec) => {
                self.select_direct(value, origin, prefix, Selector::Slice(*spec), path)
            }
            PathArg::Str(path) => {
                let segments = self.parser().split(path);
                self.walk(value, origin, prefix, &segments, path)
            }
        }
    }

    /// Segments of the path that produced `origin`, which new paths extend.
    fn prefix_of(&self, origin: Option<&Node<'_>>) -> Vec<String> {
        match origin {
            Some(node) if !node.path().is_empty() => self
                .parser()
                .split(node.path())
                .into_iter()
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Applies an integer or slice path: one selection, no splitting.
    fn select_direct<'a>(
        &self,
        value: Held<'a>,
        origin: Option<Arc<Node<'a>>>,
        mut traversed: Vec<String>,
        selector: Selector,
        path: &PathArg,
    ) -> Result<Resolved<'a>, PathError> {
        let parser = self.parser();
        let segment = path.to_string();
        let location = Location::new(segment.as_str(), parser.join(&traversed), segment.as_str());

        let selected = match value.kind() {
            Some(NodeKind::Sequence) => select(&value, selector, &location)?,
            Some(NodeKind::Mapping) => return Err(PathError::KeyNotFound { location }),
            None => {
                return Err(PathError::BadValue {
                    location: Some(location),
                    found: value.type_name(),
                })
            }
        };

        traversed.push(segment);
        Ok(self.finish(selected, origin, parser.join(&traversed)))
    }

    /// Walks `segments` from `value`.
    ///
    /// `origin` is the node wrapping `value`, when one already exists;
    /// otherwise the first step builds it. `traversed` holds the segments
    /// consumed before this walk began and `path` is the text reported in
    /// errors.
    fn walk<'a>(
        &self,
        value: Held<'a>,
        origin: Option<Arc<Node<'a>>>,
        mut traversed: Vec<String>,
        segments: &[&str],
        path: &str,
    ) -> Result<Resolved<'a>, PathError> {
        let parser = self.parser();
        let mut current = value;
        let mut origin = origin;
        let mut parent: Option<Arc<Node<'a>>> = None;

        for (position, segment) in segments.iter().enumerate() {
            let location = Location::new(path, parser.join(&traversed), *segment);
            log::trace!("step {:?} from {:?}", segment, location.traversed);

            let node = match origin.take() {
                Some(node) => node,
                None => Arc::new(
                    Node::from_held(
                        current.clone(),
                        parent.take(),
                        location.traversed.clone(),
                        Arc::clone(&self.options),
                    )
                    .map_err(|found| PathError::BadValue {
                        location: Some(location.clone()),
                        found,
                    })?,
                ),
            };
            traversed.push(segment.to_string());

            let step = match current.kind() {
                Some(NodeKind::Sequence) => {
                    let parsed = parser.parse_sequence(segment).map_err(|_| {
                        PathError::BadIndexToken {
                            location: location.clone(),
                        }
                    })?;
                    let selected = select(&current, parsed.selector, &location)?;
                    if parsed.broadcast {
                        Step::Broadcast(self.elements_of(selected, &location)?)
                    } else {
                        Step::Descend(selected)
                    }
                }
                Some(NodeKind::Mapping) => match parser.parse_mapping(segment) {
                    MappingSegment::Broadcast => Step::Broadcast(self.inject_keys(&current)),
                    MappingSegment::Key(key) => {
                        Step::Descend(current.entry(key).ok_or_else(|| PathError::KeyNotFound {
                            location: location.clone(),
                        })?)
                    }
                },
                None => {
                    return Err(PathError::BadValue {
                        location: Some(location),
                        found: current.type_name(),
                    })
                }
            };

            match step {
                Step::Descend(next) => {
                    current = next;
                    parent = Some(node);
                }
                Step::Broadcast(elements) => {
                    let remaining = &segments[position + 1..];
                    return self.broadcast(elements, node, traversed, remaining, &location);
                }
            }
        }

        Ok(self.finish(current, parent, parser.join(&traversed)))
    }

    /// Resolves `remaining` against every element and collects the results,
    /// in order, into a new sequence node.
    ///
    /// The rest of the path is rejoined and split again, so an empty rest is
    /// one empty segment applied to every element.
    fn broadcast<'a>(
        &self,
        elements: Vec<Held<'a>>,
        parent: Arc<Node<'a>>,
        traversed: Vec<String>,
        remaining: &[&str],
        location: &Location,
    ) -> Result<Resolved<'a>, PathError> {
        let parser = self.parser();
        let sub_path = parser.join(remaining);
        let sub_segments = parser.split(&sub_path);
        log::debug!(
            "broadcasting {:?} over {} elements at {:?}",
            sub_path,
            elements.len(),
            location.segment
        );

        let mut results = Vec::with_capacity(elements.len());
        for (position, element) in elements.into_iter().enumerate() {
            let resolved = self
                .walk(element, None, traversed.clone(), &sub_segments, &sub_path)
                .map_err(|err| {
                    if err.is_lookup_failure() {
                        PathError::BroadcastElement {
                            location: location.clone(),
                            position,
                            source: Box::new(err),
                        }
                    } else {
                        err
                    }
                })?;
            results.push(resolved.into_held());
        }

        let mut full = traversed;
        full.extend(remaining.iter().map(|segment| segment.to_string()));
        let gathered = Node::assemble(
            NodeKind::Sequence,
            Held::gathered(results),
            Some(parent),
            parser.join(&full),
            Arc::clone(&self.options),
        );
        Ok(Resolved::Node(gathered.into_broadcast_result()))
    }

    /// The elements a trailing broadcast marker fans out over.
    fn elements_of<'a>(
        &self,
        selected: Held<'a>,
        location: &Location,
    ) -> Result<Vec<Held<'a>>, PathError> {
        match selected.kind() {
            Some(NodeKind::Sequence) => Ok(selected.elements()),
            Some(NodeKind::Mapping) => Ok(self.inject_keys(&selected)),
            None => Err(PathError::BadValue {
                location: Some(location.clone()),
                found: selected.type_name(),
            }),
        }
    }

    /// The entries of a mapping, with each mapping entry given its own key
    /// under the key field unless it already has one.
    ///
    /// Only entries that receive the field are copied.
    fn inject_keys<'a>(&self, mapping: &Held<'a>) -> Vec<Held<'a>> {
        let field = self.options.key_field.as_str();
        mapping
            .entries()
            .into_iter()
            .map(|(key, value)| {
                let injected = match &*value {
                    Value::Object(fields) if !fields.contains_key(field) => {
                        let mut fields = fields.clone();
                        fields.insert(field.to_string(), Value::String(key));
                        Some(Value::Object(fields))
                    }
                    _ => None,
                };
                injected.map(Held::owned).unwrap_or(value)
            })
            .collect()
    }

    /// Wraps a collection as a node, or unwraps a scalar.
    fn finish<'a>(
        &self,
        value: Held<'a>,
        parent: Option<Arc<Node<'a>>>,
        path: String,
    ) -> Resolved<'a> {
        match value.kind() {
            Some(kind) => Resolved::Node(Node::assemble(
                kind,
                value,
                parent,
                path,
                Arc::clone(&self.options),
            )),
            None => Resolved::Scalar(value.into_scalar()),
        }
    }
}

/// Applies an index or slice to a sequence.
///
/// A slice gathers handles to the selected elements without copying them.
fn select<'a>(
    sequence: &Held<'a>,
    selector: Selector,
    location: &Location,
) -> Result<Held<'a>, PathError> {
    let len = sequence.len();
    match selector {
        Selector::Index(index) => normalize_index(index, len)
            .and_then(|i| sequence.element(i))
            .ok_or_else(|| PathError::IndexOutOfRange {
                location: location.clone(),
            }),
        Selector::Slice(spec) => Ok(Held::gathered(
            spec.indices(len)
                .into_iter()
                .filter_map(|i| sequence.element(i))
                .collect(),
        )),
    }
}

/// Resolves a possibly negative index against `len`.
fn normalize_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        index.checked_add(isize::try_from(len).ok()?)?
    } else {
        index
    };
    usize::try_from(resolved).ok().filter(|&i| i < len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ast::SliceSpec;

    fn doc(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    fn resolve<'a>(value: &'a Value, path: impl Into<PathArg>) -> Result<Resolved<'a>, PathError> {
        resolve_value(value, &path.into(), &Options::default())
    }

    #[test]
    fn test_normalize_index() {
        assert_eq!(normalize_index(0, 3), Some(0));
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(-3, 3), Some(0));
        assert_eq!(normalize_index(-4, 3), None);
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(0, 0), None);
    }

    #[test]
    fn test_nested_scalar() {
        let value = doc("[[0, 1], [2, 3], [4, 5]]");
        assert_eq!(resolve(&value, "1.1").unwrap(), Value::from(3));
        assert_eq!(resolve(&value, "-1.0").unwrap(), Value::from(4));
    }

    #[test]
    fn test_scalar_results_borrow_from_document() {
        let value = doc(r#"{"a": {"name": "Jane"}}"#);
        match resolve(&value, "a.name").unwrap() {
            Resolved::Scalar(std::borrow::Cow::Borrowed(name)) => {
                assert_eq!(name, &Value::from("Jane"))
            }
            other => panic!("expected borrowed scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_stepping_into_scalar_is_bad_value() {
        let value = doc(r#"{"a": {"name": "Jane"}}"#);
        let err = resolve(&value, "a.name.first").unwrap_err();
        match err {
            PathError::BadValue { location, found } => {
                assert_eq!(found, "string");
                let location = location.unwrap();
                assert_eq!(location.traversed, "a.name");
                assert_eq!(location.segment, "first");
            }
            other => panic!("expected BadValue, got {:?}", other),
        }
    }

    #[test]
    fn test_scalar_root() {
        let value = Value::from(7);
        assert!(matches!(
            resolve(&value, "0"),
            Err(PathError::BadValue { .. })
        ));
        assert!(matches!(
            resolve(&value, 0),
            Err(PathError::BadValue { .. })
        ));
    }

    #[test]
    fn test_bad_sequence_index() {
        let value = doc("[1, 2]");
        let err = resolve(&value, "first").unwrap_err();
        assert!(matches!(err, PathError::BadIndexToken { .. }));
        assert!(err.to_string().ends_with("bad sequence index"));
    }

    #[test]
    fn test_integer_path_against_mapping_is_key_error() {
        let value = doc(r#"{"0": 1}"#);
        assert!(matches!(
            resolve(&value, 0),
            Err(PathError::KeyNotFound { .. })
        ));
        assert_eq!(resolve(&value, "0").unwrap(), Value::from(1));
    }

    #[test]
    fn test_direct_slice_path_string() {
        let value = doc("[1, 2, 3, 4]");
        let node = resolve(&value, SliceSpec::new(None, None, Some(2)))
            .unwrap()
            .into_node()
            .unwrap();
        assert_eq!(node.path(), "::2");
        assert_eq!(node.value(), &doc("[1, 3]"));
    }

    #[test]
    fn test_broadcast_with_empty_remainder_fails_on_first_element() {
        let value = doc("[[1, 2], [3]]");
        let err = resolve(&value, "0:2^").unwrap_err();
        match &err {
            PathError::BroadcastElement {
                position, source, ..
            } => {
                assert_eq!(*position, 0);
                assert!(matches!(**source, PathError::BadIndexToken { .. }));
            }
            other => panic!("expected BroadcastElement, got {:?}", other),
        }

        // An empty key is still a key
        let keyed = doc(r#"{"a": {"": 1}, "b": {"": 2}}"#);
        let node = resolve(&keyed, "^").unwrap().into_node().unwrap();
        assert_eq!(node.value(), &doc("[1, 2]"));
        assert_eq!(node.path(), "^");

        // Nothing to fail on
        let empty = doc("[]");
        let node = resolve(&empty, ":^").unwrap().into_node().unwrap();
        assert!(node.is_empty());
    }

    #[test]
    fn test_slice_with_step_beyond_isize() {
        let value = doc("[1, 2, 3]");
        let path = format!("1::{}", isize::MAX);
        let node = resolve(&value, path.as_str()).unwrap().into_node().unwrap();
        assert_eq!(node.value(), &doc("[2]"));
    }

    #[test]
    fn test_scalars_below_a_slice_borrow_from_document() {
        let value = doc(r#"[{"name": "Jane"}, {"name": "John"}, {"name": "Jill"}]"#);
        match resolve(&value, "1:3.0.name").unwrap() {
            Resolved::Scalar(std::borrow::Cow::Borrowed(name)) => {
                assert_eq!(name, &Value::from("John"))
            }
            other => panic!("expected borrowed scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_broadcast_results_are_marked() {
        let value = doc(r#"[{"n": 1}, {"n": 2}]"#);
        let gathered = resolve(&value, ":^.n").unwrap().into_node().unwrap();
        assert!(gathered.is_broadcast_result());
        let sliced = resolve(&value, ":").unwrap().into_node().unwrap();
        assert!(!sliced.is_broadcast_result());
    }

    #[test]
    fn test_broadcast_over_scalar_is_bad_value() {
        let value = doc("[5, 6]");
        assert!(matches!(
            resolve(&value, "0^.x"),
            Err(PathError::BadValue { .. })
        ));
    }

    #[test]
    fn test_broadcast_element_failure_names_position() {
        let value = doc(r#"{"a": {"name": "Jane"}, "b": {}}"#);
        let err = resolve(&value, "^.name").unwrap_err();
        match &err {
            PathError::BroadcastElement {
                position, source, ..
            } => {
                assert_eq!(*position, 1);
                assert!(matches!(**source, PathError::KeyNotFound { .. }));
            }
            other => panic!("expected BroadcastElement, got {:?}", other),
        }
        assert!(err.is_lookup_failure());
    }

    #[test]
    fn test_key_injection_does_not_overwrite() {
        let value = doc(r#"{"a": {"__key": "kept"}, "b": {"x": 1}}"#);
        let node = resolve(&value, "^.__key").unwrap().into_node().unwrap();
        assert_eq!(node.value(), &doc(r#"["kept", "b"]"#));
        // The document itself is untouched
        assert_eq!(value, doc(r#"{"a": {"__key": "kept"}, "b": {"x": 1}}"#));
    }

    #[test]
    fn test_mapping_broadcast_passes_non_mappings_through() {
        let value = doc(r#"{"a": [1, 2], "b": [3, 4]}"#);
        let node = resolve(&value, "^.1").unwrap().into_node().unwrap();
        assert_eq!(node.value(), &doc("[2, 4]"));
    }

    #[test]
    fn test_nested_broadcast() {
        let value = doc(r#"{"x": {"items": [{"n": 1}, {"n": 2}]}, "y": {"items": [{"n": 3}]}}"#);
        let node = resolve(&value, "^.items.:^.n").unwrap().into_node().unwrap();
        assert_eq!(node.value(), &doc("[[1, 2], [3]]"));
        assert_eq!(node.path(), "^.items.:^.n");
    }

    #[test]
    fn test_invalid_options_rejected() {
        let value = doc("[1]");
        let options = Options::default().with_separator("");
        assert!(matches!(
            resolve_value(&value, &PathArg::from("0"), &options),
            Err(PathError::InvalidOptions { .. })
        ));
    }
}
