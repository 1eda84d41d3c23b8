//! Path string parser.
//!
//! Paths are split on the separator with no escaping, so a key can never
//! contain the separator. Segments are classified lazily: the same text is an
//! index or slice against a sequence and a literal key against a mapping.

use super::ast::{MappingSegment, Selector, SequenceSegment, SliceSpec};
use crate::config::Options;

/// A segment that is neither an integer nor a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadToken;

/// Parser for delimited path strings.
pub struct SegmentParser<'o> {
    separator: &'o str,
    marker: &'o str,
}

impl<'o> SegmentParser<'o> {
    /// Creates a parser using the separator and marker of `options`.
    pub fn new(options: &'o Options) -> Self {
        Self {
            separator: &options.separator,
            marker: &options.broadcast_marker,
        }
    }

    /// Splits a path into raw segments. Always yields at least one segment.
    pub fn split<'p>(&self, path: &'p str) -> Vec<&'p str> {
        path.split(self.separator).collect()
    }

    /// Joins segments back into a path string.
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let mut joined = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                joined.push_str(self.separator);
            }
            joined.push_str(segment.as_ref());
        }
        joined
    }

    /// Interprets a segment against a sequence: an index or slice, optionally
    /// followed by the broadcast marker.
    pub fn parse_sequence(&self, segment: &str) -> Result<SequenceSegment, BadToken> {
        let (text, broadcast) = match segment.strip_suffix(self.marker) {
            Some(stripped) => (stripped, true),
            None => (segment, false),
        };

        let selector = if text.contains(':') {
            Selector::Slice(parse_slice(text)?)
        } else {
            Selector::Index(parse_index(text)?)
        };

        Ok(SequenceSegment {
            selector,
            broadcast,
        })
    }

    /// Interprets a segment against a mapping. Only the bare marker is special.
    pub fn parse_mapping<'s>(&self, segment: &'s str) -> MappingSegment<'s> {
        if segment == self.marker {
            MappingSegment::Broadcast
        } else {
            MappingSegment::Key(segment)
        }
    }
}

/// Parses a signed integer index.
fn parse_index(text: &str) -> Result<isize, BadToken> {
    text.parse::<isize>().map_err(|_| BadToken)
}

/// Parses `start:stop` or `start:stop:step`, each part optional.
fn parse_slice(text: &str) -> Result<SliceSpec, BadToken> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return Err(BadToken);
    }

    let bound = |part: &str| -> Result<Option<isize>, BadToken> {
        if part.is_empty() {
            Ok(None)
        } else {
            parse_index(part).map(Some)
        }
    };

    let start = bound(parts[0])?;
    let stop = bound(parts[1])?;
    let step = match parts.get(2) {
        Some(part) => bound(part)?,
        None => None,
    };
    if step == Some(0) {
        return Err(BadToken);
    }

    Ok(SliceSpec::new(start, stop, step))
}
