use super::Key;

use std::{fmt, ops::Bound};

/// A half-open slice of a table's primary key space.
///
/// Ranges produced by [`KeyRange::partition`] are disjoint and their union
/// is the whole key space.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Bound<Key>,
    pub end: Bound<Key>,
}

impl KeyRange {
    /// The range covering every key.
    pub fn full() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(
            (&self.start, &self.end),
            (Bound::Unbounded, Bound::Unbounded)
        )
    }

    pub fn contains(&self, key: &Key) -> bool {
        let after_start = match &self.start {
            Bound::Unbounded => true,
            Bound::Included(start) => key >= start,
            Bound::Excluded(start) => key > start,
        };

        let before_end = match &self.end {
            Bound::Unbounded => true,
            Bound::Included(end) => key <= end,
            Bound::Excluded(end) => key < end,
        };

        after_start && before_end
    }

    /// Splits the key space at `split_points`.
    ///
    /// Points are sorted and de-duplicated first. `k` distinct points yield
    /// `k + 1` ranges: `(.., p1)`, `[p1, p2)`, ..., `[pk, ..)`. No points
    /// yields the single full range.
    pub fn partition(mut split_points: Vec<Key>) -> Vec<KeyRange> {
        split_points.sort();
        split_points.dedup();

        let mut ranges = Vec::with_capacity(split_points.len() + 1);
        let mut start = Bound::Unbounded;

        for point in split_points {
            ranges.push(KeyRange {
                start,
                end: Bound::Excluded(point.clone()),
            });
            start = Bound::Included(point);
        }

        ranges.push(KeyRange {
            start,
            end: Bound::Unbounded,
        });

        ranges
    }
}

impl fmt::Debug for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.start {
            Bound::Unbounded => f.write_str("(..")?,
            Bound::Included(key) => write!(f, "[{key:?}")?,
            Bound::Excluded(key) => write!(f, "({key:?}")?,
        }
        f.write_str(", ")?;
        match &self.end {
            Bound::Unbounded => f.write_str("..)"),
            Bound::Included(key) => write!(f, "{key:?}]"),
            Bound::Excluded(key) => write!(f, "{key:?})"),
        }
    }
}
