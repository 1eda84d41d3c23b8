//! Navigable nodes over sequences and mappings.
//!
//! A `Node` is an immutable view of one sequence or mapping value together
//! with the path that produced it and the node it was resolved from. Nodes
//! borrow from the caller's document wherever they can. Slices and broadcast
//! results hold handles to their elements rather than copies of them.
//!
//! # Example
//!
//! ```
//! use jsonnav::{Node, Options, Value};
//!
//! let doc: Value = serde_json::from_str(r#"{"a": {"b": [10, 20, {"c": true}]}}"#).unwrap();
//! let root = Node::wrap(&doc, Options::default()).unwrap();
//!
//! let list = root.resolve("a.b").unwrap().into_node().unwrap();
//! assert_eq!(list.path(), "a.b");
//! assert_eq!(list.key(), Some("b"));
//! assert_eq!(list.len(), 3);
//! assert_eq!(list.root(), &root);
//!
//! let leaf = root.resolve("a.b.1").unwrap();
//! assert_eq!(leaf.as_scalar(), Some(&Value::from(20)));
//! ```

use super::value::Value;
use crate::config::Options;
use crate::path::ast::PathArg;
use crate::path::error::PathError;
use crate::path::evaluator;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

/// The two shapes a node can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sequence,
    Mapping,
}

impl NodeKind {
    /// Returns the kind of node that can wrap `value`, if any.
    pub fn of(value: &Value) -> Option<NodeKind> {
        match value {
            Value::Array(_) => Some(NodeKind::Sequence),
            Value::Object(_) => Some(NodeKind::Mapping),
            _ => None,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            NodeKind::Sequence => "SequenceNode",
            NodeKind::Mapping => "MappingNode",
        }
    }
}

/// Storage for a value reached during traversal.
///
/// Values inside the caller's document are borrowed. A value the traversal
/// builds itself is shared, and its children point back into it by position
/// instead of being copied out. Slices and broadcast results gather handles to
/// their elements and only build the sequence value when it is asked for.
#[derive(Debug, Clone)]
pub(crate) enum Held<'a> {
    Borrowed(&'a Value),
    Shared { owner: Arc<Value>, at: Vec<usize> },
    Gathered(Arc<Gathered<'a>>),
}

/// A sequence assembled from handles to existing values.
#[derive(Debug)]
pub(crate) struct Gathered<'a> {
    elements: Vec<Held<'a>>,
    value: OnceLock<Value>,
}

impl Gathered<'_> {
    fn value(&self) -> &Value {
        self.value.get_or_init(|| {
            Value::Array(self.elements.iter().map(|element| Value::clone(element)).collect())
        })
    }

    fn into_value(self) -> Value {
        match self.value.into_inner() {
            Some(value) => value,
            None => Value::Array(self.elements.into_iter().map(Held::into_value).collect()),
        }
    }
}

static NULL: Value = Value::Null;

/// Follows child positions down from `value`.
///
/// Positions index sequence elements and mapping entries alike. They are only
/// ever recorded for children that exist, so the `NULL` fallback is unreachable.
fn project<'v>(mut value: &'v Value, at: &[usize]) -> &'v Value {
    for &position in at {
        let child = match value {
            Value::Array(items) => items.get(position),
            Value::Object(entries) => entries.get_index(position).map(|(_, child)| child),
            _ => None,
        };
        value = match child {
            Some(child) => child,
            None => return &NULL,
        };
    }
    value
}

fn child_path(at: &[usize], position: usize) -> Vec<usize> {
    let mut path = Vec::with_capacity(at.len() + 1);
    path.extend_from_slice(at);
    path.push(position);
    path
}

impl<'a> Held<'a> {
    pub(crate) fn owned(value: Value) -> Self {
        Held::Shared {
            owner: Arc::new(value),
            at: Vec::new(),
        }
    }

    pub(crate) fn gathered(elements: Vec<Held<'a>>) -> Self {
        Held::Gathered(Arc::new(Gathered {
            elements,
            value: OnceLock::new(),
        }))
    }

    /// The node kind this value can be wrapped as, without building gathered values.
    pub(crate) fn kind(&self) -> Option<NodeKind> {
        match self {
            Held::Gathered(_) => Some(NodeKind::Sequence),
            other => NodeKind::of(other),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Held::Gathered(gathered) => gathered.elements.len(),
            other => match &**other {
                Value::Array(items) => items.len(),
                Value::Object(entries) => entries.len(),
                _ => 0,
            },
        }
    }

    pub(crate) fn element(&self, index: usize) -> Option<Held<'a>> {
        match self {
            Held::Borrowed(value) => {
                let value: &'a Value = *value;
                value.as_array()?.get(index).map(Held::Borrowed)
            }
            Held::Shared { owner, at } => {
                let len = self.as_array()?.len();
                (index < len).then(|| Held::Shared {
                    owner: Arc::clone(owner),
                    at: child_path(at, index),
                })
            }
            Held::Gathered(gathered) => gathered.elements.get(index).cloned(),
        }
    }

    pub(crate) fn entry(&self, key: &str) -> Option<Held<'a>> {
        match self {
            Held::Borrowed(value) => {
                let value: &'a Value = *value;
                value.as_object()?.get(key).map(Held::Borrowed)
            }
            Held::Shared { owner, at } => {
                let position = self.as_object()?.get_index_of(key)?;
                Some(Held::Shared {
                    owner: Arc::clone(owner),
                    at: child_path(at, position),
                })
            }
            Held::Gathered(_) => None,
        }
    }

    /// All elements of a sequence, in order.
    pub(crate) fn elements(&self) -> Vec<Held<'a>> {
        match self {
            Held::Gathered(gathered) => gathered.elements.clone(),
            other => (0..other.len()).filter_map(|i| other.element(i)).collect(),
        }
    }

    /// All entries of a mapping, in insertion order.
    pub(crate) fn entries(&self) -> Vec<(String, Held<'a>)> {
        match self {
            Held::Borrowed(value) => {
                let value: &'a Value = *value;
                value
                    .as_object()
                    .map(|entries| {
                        entries
                            .iter()
                            .map(|(key, child)| (key.clone(), Held::Borrowed(child)))
                            .collect()
                    })
                    .unwrap_or_default()
            }
            Held::Shared { owner, at } => self
                .as_object()
                .map(|entries| {
                    entries
                        .keys()
                        .enumerate()
                        .map(|(position, key)| {
                            let child = Held::Shared {
                                owner: Arc::clone(owner),
                                at: child_path(at, position),
                            };
                            (key.clone(), child)
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Held::Gathered(_) => Vec::new(),
        }
    }

    pub(crate) fn into_scalar(self) -> Cow<'a, Value> {
        match self {
            Held::Borrowed(value) => Cow::Borrowed(value),
            Held::Shared { owner, at } if at.is_empty() => Cow::Owned(Arc::unwrap_or_clone(owner)),
            Held::Shared { owner, at } => Cow::Owned(project(&owner, &at).clone()),
            Held::Gathered(gathered) => Cow::Owned(match Arc::try_unwrap(gathered) {
                Ok(gathered) => gathered.into_value(),
                Err(shared) => shared.value().clone(),
            }),
        }
    }

    pub(crate) fn into_value(self) -> Value {
        self.into_scalar().into_owned()
    }
}

impl Deref for Held<'_> {
    type Target = Value;

    fn deref(&self) -> &Value {
        match self {
            Held::Borrowed(value) => value,
            Held::Shared { owner, at } => project(owner, at),
            Held::Gathered(gathered) => gathered.value(),
        }
    }
}

/// An immutable, navigable view over a sequence or mapping.
///
/// Equality is structural and includes ancestry: two nodes are equal when they
/// have the same kind, equal values, equal parents, equal paths and equal
/// options.
///
/// A broadcast result is a sequence gathered from many places. Its path
/// records how it was gathered, so resolving relative to it starts over from
/// its own value as a new root.
#[derive(Clone)]
pub struct Node<'a> {
    kind: NodeKind,
    value: Held<'a>,
    parent: Option<Arc<Node<'a>>>,
    path: String,
    options: Arc<Options>,
    broadcast: bool,
}

impl<'a> Node<'a> {
    /// Wraps a sequence or mapping as a root node with an empty path.
    ///
    /// Fails with `PathError::BadValue` for scalars and with
    /// `PathError::InvalidOptions` for unusable options.
    pub fn wrap(value: &'a Value, options: Options) -> Result<Self, PathError> {
        options.validate()?;
        Self::from_held(Held::Borrowed(value), None, String::new(), Arc::new(options))
            .map_err(|found| PathError::BadValue {
                location: None,
                found,
            })
    }

    /// Builds a node as if it had been resolved from `parent` by `path`.
    ///
    /// The node inherits the parent's options. This is mostly useful for
    /// comparing against the nodes traversal produces.
    pub fn with_parent(
        value: &'a Value,
        parent: &Node<'a>,
        path: impl Into<String>,
    ) -> Result<Self, PathError> {
        Self::from_held(
            Held::Borrowed(value),
            Some(Arc::new(parent.clone())),
            path.into(),
            Arc::clone(&parent.options),
        )
        .map_err(|found| PathError::BadValue {
            location: None,
            found,
        })
    }

    /// Builds a node, returning the value's type name if it cannot be wrapped.
    pub(crate) fn from_held(
        value: Held<'a>,
        parent: Option<Arc<Node<'a>>>,
        path: String,
        options: Arc<Options>,
    ) -> Result<Self, &'static str> {
        match value.kind() {
            Some(kind) => Ok(Self::assemble(kind, value, parent, path, options)),
            None => Err(value.type_name()),
        }
    }

    pub(crate) fn assemble(
        kind: NodeKind,
        value: Held<'a>,
        parent: Option<Arc<Node<'a>>>,
        path: String,
        options: Arc<Options>,
    ) -> Self {
        Self {
            kind,
            value,
            parent,
            path,
            options,
            broadcast: false,
        }
    }

    pub(crate) fn into_broadcast_result(mut self) -> Self {
        self.broadcast = true;
        self
    }

    pub(crate) fn held(&self) -> &Held<'a> {
        &self.value
    }

    pub(crate) fn shared_options(&self) -> Arc<Options> {
        Arc::clone(&self.options)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The wrapped sequence or mapping.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        self.value.as_array().map(Vec::as_slice)
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        self.value.as_object()
    }

    /// The node this one was resolved from, or `None` for a root.
    pub fn parent(&self) -> Option<&Node<'a>> {
        self.parent.as_deref()
    }

    /// Follows parents until reaching a node without one.
    pub fn root(&self) -> &Node<'a> {
        let mut node = self;
        while let Some(parent) = node.parent.as_deref() {
            node = parent;
        }
        node
    }

    /// The path that produced this node, relative to its root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last segment of this node's path, or `None` for a root.
    pub fn key(&self) -> Option<&str> {
        if self.path.is_empty() {
            return None;
        }
        self.path.rsplit(self.options.separator.as_str()).next()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// True when this node was gathered by a broadcast.
    pub fn is_broadcast_result(&self) -> bool {
        self.broadcast
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the wrapped collection: elements of a sequence, keys of a mapping.
    pub fn iter(&self) -> Iter<'_> {
        let inner = match &*self.value {
            Value::Object(entries) => IterInner::Keys(entries.keys()),
            Value::Array(items) => IterInner::Elements(items.iter()),
            _ => IterInner::Elements([].iter()),
        };
        Iter { inner }
    }

    /// Elements of a sequence node; empty for a mapping.
    pub fn elements(&self) -> &[Value] {
        self.as_sequence().unwrap_or_default()
    }

    /// Keys of a mapping node in insertion order; empty for a sequence.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.as_mapping()
            .into_iter()
            .flat_map(|entries| entries.keys().map(String::as_str))
    }

    /// Key/value pairs of a mapping node in insertion order; empty for a sequence.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.as_mapping()
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(key, value)| (key.as_str(), value)))
    }

    /// Resolves `path` relative to this node.
    ///
    /// Nodes produced this way keep this node as an ancestor, and their paths
    /// continue from this node's path. A broadcast result is the exception:
    /// its value is wrapped as a fresh root and `path` is resolved from there.
    pub fn resolve(&self, path: impl Into<PathArg>) -> Result<Resolved<'a>, PathError> {
        evaluator::resolve_from(self, &path.into())
    }

    /// Like `resolve`, but returns `Ok(None)` when a key or index is missing.
    ///
    /// Other failures, such as stepping into a scalar, are still errors.
    pub fn get(&self, path: impl Into<PathArg>) -> Result<Option<Resolved<'a>>, PathError> {
        recover_lookup(self.resolve(path))
    }

    /// Like `get`, substituting `default` for a missing key or index.
    pub fn get_or(
        &self,
        path: impl Into<PathArg>,
        default: impl Into<Value>,
    ) -> Result<Resolved<'a>, PathError> {
        Ok(self
            .get(path)?
            .unwrap_or_else(|| Resolved::Scalar(Cow::Owned(default.into()))))
    }

    /// Consumes the node, returning the wrapped value.
    pub fn into_value(self) -> Value {
        self.value.into_value()
    }
}

/// Turns lookup failures into `None`, passing every other error through.
pub(crate) fn recover_lookup<'a>(
    result: Result<Resolved<'a>, PathError>,
) -> Result<Option<Resolved<'a>>, PathError> {
    match result {
        Ok(resolved) => Ok(Some(resolved)),
        Err(err) if err.is_lookup_failure() => {
            log::debug!("lookup failed, using default: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && *self.value == *other.value
            && self.parent == other.parent
            && self.path == other.path
            && self.options == other.options
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind.type_name();
        let indent = format!("\n{}", " ".repeat(name.len() + 1));
        let dump = serde_json::to_string_pretty(self.value()).map_err(|_| fmt::Error)?;
        let dump = dump.lines().collect::<Vec<_>>().join(&indent);
        write!(
            f,
            "{}({},{}path={:?},{}sep={:?},{}marker={:?},{}key_field={:?})",
            name,
            dump,
            indent,
            self.path,
            indent,
            self.options.separator,
            indent,
            self.options.broadcast_marker,
            indent,
            self.options.key_field
        )
    }
}

impl fmt::Display for Node<'_> {
    /// Formats the wrapped value as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.value(), f)
    }
}

/// One item of a node's iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Member<'n> {
    /// An element of a sequence
    Element(&'n Value),
    /// A key of a mapping
    Key(&'n str),
}

/// Iterator over a node's elements or keys.
pub struct Iter<'n> {
    inner: IterInner<'n>,
}

enum IterInner<'n> {
    Elements(std::slice::Iter<'n, Value>),
    Keys(indexmap::map::Keys<'n, String, Value>),
}

impl<'n> Iterator for Iter<'n> {
    type Item = Member<'n>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterInner::Elements(items) => items.next().map(Member::Element),
            IterInner::Keys(keys) => keys.next().map(|key| Member::Key(key.as_str())),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Elements(items) => items.size_hint(),
            IterInner::Keys(keys) => keys.size_hint(),
        }
    }
}

impl<'n, 'a> IntoIterator for &'n Node<'a> {
    type Item = Member<'n>;
    type IntoIter = Iter<'n>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The outcome of resolving a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    /// A leaf value, or the default substituted by `get_or`
    Scalar(Cow<'a, Value>),
    /// A sequence or mapping, wrapped with its ancestry
    Node(Node<'a>),
}

impl<'a> Resolved<'a> {
    pub fn is_node(&self) -> bool {
        matches!(self, Resolved::Node(_))
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Resolved::Scalar(value) => Some(value),
            Resolved::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node<'a>> {
        match self {
            Resolved::Node(node) => Some(node),
            Resolved::Scalar(_) => None,
        }
    }

    pub fn into_node(self) -> Option<Node<'a>> {
        match self {
            Resolved::Node(node) => Some(node),
            Resolved::Scalar(_) => None,
        }
    }

    /// The resolved value, whether scalar or wrapped.
    pub fn value(&self) -> &Value {
        match self {
            Resolved::Scalar(value) => value,
            Resolved::Node(node) => node.value(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Resolved::Scalar(value) => value.into_owned(),
            Resolved::Node(node) => node.into_value(),
        }
    }

    pub(crate) fn into_held(self) -> Held<'a> {
        match self {
            Resolved::Scalar(Cow::Borrowed(value)) => Held::Borrowed(value),
            Resolved::Scalar(Cow::Owned(value)) => Held::owned(value),
            Resolved::Node(node) => node.value,
        }
    }
}

impl PartialEq<Value> for Resolved<'_> {
    /// Only scalars compare equal to a bare value; nodes carry ancestry a
    /// bare value lacks.
    fn eq(&self, other: &Value) -> bool {
        self.as_scalar() == Some(other)
    }
}
