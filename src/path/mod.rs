//! Path parsing and traversal.
//!
//! A path is a string of segments joined by a separator (`.` by default).
//! Each segment is interpreted against the value it is applied to:
//!
//! - Against a sequence: an index (`2`, `-1`) or a slice (`1:3`, `::-1`),
//!   optionally followed by the broadcast marker (`0:3^`)
//! - Against a mapping: a literal key, or the bare broadcast marker (`^`)
//!
//! A broadcast applies the rest of the path to every element of the selected
//! collection and gathers the results into a new sequence. Broadcasting over a
//! mapping gives each mapping entry its key under the key field (`__key`).
//!
//! # Examples
//!
//! ```text
//! a.b.2.c        - key a, key b, element 2, key c
//! items.-1       - last element of items
//! items.0:3^.id  - id of each of the first three items
//! ^.__key        - every key of a mapping of mappings
//! ^.name         - name field of every entry
//! ```

pub mod ast;
pub mod error;
pub(crate) mod evaluator;
pub mod parser;

pub use ast::{MappingSegment, PathArg, Selector, SequenceSegment, SliceSpec};
pub use error::{ErrorKind, Location, PathError};
pub use parser::SegmentParser;
