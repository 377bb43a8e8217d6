use std::{cmp::Ordering, fmt, ops::Range, sync::Arc};

use crate::util::{Result, Status};

/// User supplied key comparison; an error aborts the join.
pub type CompareFn = dyn Fn(&[u8], &[u8]) -> Result<Ordering> + Send + Sync;

/// How a merge join decides that a left key and a right key match.
///
/// Both sides must be sorted consistently with the comparator: whenever it
/// reports `Less`, no later right key can match the current left key.
#[derive(Clone, Default)]
pub enum JoinComparator {
    /// Whole keys, unsigned lexicographic.
    #[default]
    Bytewise,
    /// The left key against the right key truncated to the left key's
    /// length, so a left key matches every right key it prefixes.
    LeftPrefix,
    /// A byte segment of the left key against a byte segment of the right
    /// key. Keys too short for their segment are corrupt.
    Segments { left: Range<usize>, right: Range<usize> },
    Custom(Arc<CompareFn>),
}

impl JoinComparator {
    pub fn custom<F>(compare: F) -> Self
    where F: Fn(&[u8], &[u8]) -> Result<Ordering> + Send + Sync + 'static {
        JoinComparator::Custom(Arc::new(compare))
    }

    pub fn compare(&self, left: &[u8], right: &[u8]) -> Result<Ordering> {
        match self {
            JoinComparator::Bytewise => Ok(left.cmp(right)),
            JoinComparator::LeftPrefix => {
                let len = left.len().min(right.len());
                Ok(left.cmp(&right[..len]))
            },
            JoinComparator::Segments {
                left: left_range,
                right: right_range,
            } => {
                let a = segment(left, left_range, "left")?;
                let b = segment(right, right_range, "right")?;
                Ok(a.cmp(b))
            },
            JoinComparator::Custom(compare) => compare(left, right),
        }
    }
}

fn segment<'a>(key: &'a [u8], range: &Range<usize>, side: &str) -> Result<&'a [u8]> {
    key.get(range.clone()).ok_or_else(|| {
        Status::corruption(format!(
            "{side} key of {} bytes has no segment {range:?}",
            key.len()
        ))
    })
}

impl fmt::Debug for JoinComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinComparator::Bytewise => write!(f, "Bytewise"),
            JoinComparator::LeftPrefix => write!(f, "LeftPrefix"),
            JoinComparator::Segments { left, right } => f
                .debug_struct("Segments")
                .field("left", left)
                .field("right", right)
                .finish(),
            JoinComparator::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_prefix() {
        let cmp = JoinComparator::LeftPrefix;
        assert_eq!(cmp.compare(b"p1", b"p1c1").unwrap(), Ordering::Equal);
        assert_eq!(cmp.compare(b"p1", b"p2c1").unwrap(), Ordering::Less);
        assert_eq!(cmp.compare(b"p2", b"p1c1").unwrap(), Ordering::Greater);
        assert_eq!(cmp.compare(b"p10", b"p1").unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_segments() {
        let cmp = JoinComparator::Segments {
            left: 1..5,
            right: 5..9,
        };
        let parent = [1, 0, 0, 0, 7];
        let child = [2, 0, 0, 0, 3, 0, 0, 0, 7];
        assert_eq!(cmp.compare(&parent, &child).unwrap(), Ordering::Equal);

        let err = cmp.compare(&parent, &child[..6]).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_custom_error_propagates() {
        let cmp = JoinComparator::custom(|_, _| Err(Status::corruption("bad key")));
        assert!(cmp.compare(b"a", b"b").is_err());
        assert_eq!(format!("{cmp:?}"), "Custom(..)");
    }
}
