//! Syntax types for path segments and path arguments.

use super::error::PathError;
use crate::document::value::Value;
use std::fmt;

/// A sequence slice with optional bounds and step, sliced the usual way:
/// half-open, negative bounds count from the end and out-of-range bounds clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl SliceSpec {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// The full slice, `:`.
    pub fn full() -> Self {
        Self::default()
    }

    /// Returns the positions selected from a sequence of `len` elements, in order.
    ///
    /// A zero step selects nothing; the parser never produces one.
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let len = isize::try_from(len).unwrap_or(isize::MAX);
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Vec::new();
        }

        // Clamp a bound into [lower, upper] after resolving negatives
        let clamp = |bound: isize, lower: isize, upper: isize| {
            let bound = if bound < 0 { bound + len } else { bound };
            bound.clamp(lower, upper)
        };

        let (start, stop) = if step > 0 {
            (
                self.start.map_or(0, |s| clamp(s, 0, len)),
                self.stop.map_or(len, |s| clamp(s, 0, len)),
            )
        } else {
            (
                self.start.map_or(len - 1, |s| clamp(s, -1, len - 1)),
                self.stop.map_or(-1, |s| clamp(s, -1, len - 1)),
            )
        };

        let mut positions = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            if let Ok(position) = usize::try_from(i) {
                positions.push(position);
            }
            // A step past the end of isize is past the end of any sequence
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        positions
    }
}

impl fmt::Display for SliceSpec {
    /// Formats as `start:stop` or `start:stop:step`, leaving unset bounds empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<isize>| b.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{}:{}", bound(self.start), bound(self.stop))?;
        if let Some(step) = self.step {
            write!(f, ":{}", step)?;
        }
        Ok(())
    }
}

/// What a segment selects from a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// A single element ([0], [-1])
    Index(isize),
    /// A range of elements ([1:3], [::-1])
    Slice(SliceSpec),
}

/// A segment interpreted against a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceSegment {
    pub selector: Selector,
    /// The segment ended with the broadcast marker
    pub broadcast: bool,
}

/// A segment interpreted against a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSegment<'s> {
    /// A literal key lookup
    Key(&'s str),
    /// The bare broadcast marker: every entry of the mapping
    Broadcast,
}

/// A path argument: a direct index, a direct slice, or a delimited string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathArg {
    Index(isize),
    Slice(SliceSpec),
    Str(String),
}

impl fmt::Display for PathArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathArg::Index(i) => write!(f, "{}", i),
            PathArg::Slice(spec) => write!(f, "{}", spec),
            PathArg::Str(s) => f.write_str(s),
        }
    }
}

impl From<isize> for PathArg {
    fn from(i: isize) -> Self {
        PathArg::Index(i)
    }
}

impl From<i32> for PathArg {
    /// Indices outside `isize` saturate, which is out of range for any sequence.
    fn from(i: i32) -> Self {
        let saturated = if i < 0 { isize::MIN } else { isize::MAX };
        PathArg::Index(isize::try_from(i).unwrap_or(saturated))
    }
}

impl TryFrom<i64> for PathArg {
    type Error = PathError;

    fn try_from(i: i64) -> Result<Self, Self::Error> {
        isize::try_from(i)
            .map(PathArg::Index)
            .map_err(|_| PathError::BadPathType {
                found: i.to_string(),
            })
    }
}

impl From<SliceSpec> for PathArg {
    fn from(spec: SliceSpec) -> Self {
        PathArg::Slice(spec)
    }
}

impl From<&str> for PathArg {
    fn from(s: &str) -> Self {
        PathArg::Str(s.to_string())
    }
}

impl From<String> for PathArg {
    fn from(s: String) -> Self {
        PathArg::Str(s)
    }
}

impl From<&String> for PathArg {
    fn from(s: &String) -> Self {
        PathArg::Str(s.clone())
    }
}

impl TryFrom<&Value> for PathArg {
    type Error = PathError;

    /// Converts a dynamically typed path. Only integers and strings are paths.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(PathArg::Str(s.clone())),
            Value::Number(n) if n.is_integer() => match n.as_i64() {
                Some(i) => PathArg::try_from(i),
                None => Err(PathError::BadPathType {
                    found: value.to_string(),
                }),
            },
            other => Err(PathError::BadPathType {
                found: format!("{} of type {}", other, other.type_name()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(spec: SliceSpec, len: usize) -> Vec<usize> {
        spec.indices(len)
    }

    #[test]
    fn test_slice_basic_ranges() {
        assert_eq!(select(SliceSpec::new(Some(0), Some(3), None), 3), vec![0, 1, 2]);
        assert_eq!(select(SliceSpec::new(Some(1), None, None), 4), vec![1, 2, 3]);
        assert_eq!(select(SliceSpec::new(None, Some(2), None), 4), vec![0, 1]);
        assert_eq!(select(SliceSpec::full(), 2), vec![0, 1]);
    }

    #[test]
    fn test_slice_negative_bounds_and_clamping() {
        assert_eq!(select(SliceSpec::new(Some(-2), None, None), 5), vec![3, 4]);
        assert_eq!(select(SliceSpec::new(None, Some(-1), None), 3), vec![0, 1]);
        assert_eq!(select(SliceSpec::new(Some(-10), Some(10), None), 3), vec![0, 1, 2]);
        assert!(select(SliceSpec::new(Some(3), Some(1), None), 5).is_empty());
    }

    #[test]
    fn test_slice_steps() {
        assert_eq!(select(SliceSpec::new(None, None, Some(2)), 5), vec![0, 2, 4]);
        assert_eq!(select(SliceSpec::new(None, None, Some(-1)), 3), vec![2, 1, 0]);
        assert_eq!(select(SliceSpec::new(Some(3), Some(0), Some(-2)), 5), vec![3, 1]);
        assert!(select(SliceSpec::new(None, None, Some(-1)), 0).is_empty());
    }

    #[test]
    fn test_slice_steps_beyond_isize_stop_cleanly() {
        assert_eq!(select(SliceSpec::new(Some(1), None, Some(isize::MAX)), 3), vec![1]);
        assert_eq!(select(SliceSpec::new(None, None, Some(isize::MIN)), 3), vec![2]);
        assert_eq!(
            select(SliceSpec::new(Some(-1), Some(isize::MIN), Some(isize::MIN + 1)), 4),
            vec![3]
        );
    }

    #[test]
    fn test_slice_display() {
        assert_eq!(SliceSpec::new(Some(0), Some(3), None).to_string(), "0:3");
        assert_eq!(SliceSpec::full().to_string(), ":");
        assert_eq!(SliceSpec::new(None, Some(-1), Some(2)).to_string(), ":-1:2");
    }

    #[test]
    fn test_path_arg_from_value() {
        assert_eq!(PathArg::try_from(&Value::from(2)), Ok(PathArg::Index(2)));
        assert_eq!(
            PathArg::try_from(&Value::from("a.b")),
            Ok(PathArg::Str("a.b".to_string()))
        );
        assert!(matches!(
            PathArg::try_from(&Value::Null),
            Err(PathError::BadPathType { .. })
        ));
        assert!(matches!(
            PathArg::try_from(&Value::from(1.5)),
            Err(PathError::BadPathType { .. })
        ));
    }

    #[test]
    fn test_path_arg_from_integers() {
        assert_eq!(PathArg::from(-3), PathArg::Index(-3));
        assert_eq!(PathArg::from(i32::MAX), PathArg::Index(i32::MAX as isize));
        assert_eq!(PathArg::try_from(7_i64), Ok(PathArg::Index(7)));
    }
}
