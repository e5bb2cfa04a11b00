use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Level;

/// Inclusive span of levels, written as a two-element array in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct LevelRange {
    start: u32,
    end: u32,
}

/// Rejection raised for malformed level ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RangeError {
    /// Levels are one-based.
    #[error("level ranges start at level 1, found [{start}, {end}]")]
    StartsAtZero {
        /// First level of the rejected range.
        start: u32,
        /// Last level of the rejected range.
        end: u32,
    },
    /// The start of a range lies after its end.
    #[error("level range [{start}, {end}] ends before it starts")]
    Inverted {
        /// First level of the rejected range.
        start: u32,
        /// Last level of the rejected range.
        end: u32,
    },
}

impl LevelRange {
    /// Creates a range covering `start..=end`.
    pub const fn new(start: u32, end: u32) -> Result<Self, RangeError> {
        if start == 0 {
            return Err(RangeError::StartsAtZero { start, end });
        }
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a range from bounds already known to be well formed.
    pub(crate) const fn from_trusted(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Creates a range that covers a single level.
    #[must_use]
    pub const fn single(level: Level) -> Self {
        Self {
            start: level.get(),
            end: level.get(),
        }
    }

    /// First level covered by the range.
    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// Last level covered by the range.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Reports whether the level lies inside the range, bounds included.
    #[must_use]
    pub const fn contains(&self, level: Level) -> bool {
        self.start <= level.get() && level.get() <= self.end
    }

    /// Reports whether the range covers exactly one level.
    #[must_use]
    pub const fn is_single_point(&self) -> bool {
        self.start == self.end
    }

    /// Linear position of the level between the bounds, in `[0, 1]`.
    ///
    /// Single-point ranges report `1.0` so interpolation lands on the terminal
    /// value.
    #[must_use]
    pub fn progress(&self, level: Level) -> f64 {
        if self.is_single_point() {
            return 1.0;
        }
        let offset = f64::from(level.get().clamp(self.start, self.end) - self.start);
        offset / f64::from(self.end - self.start)
    }
}

impl TryFrom<[u32; 2]> for LevelRange {
    type Error = RangeError;

    fn try_from(value: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1])
    }
}

impl From<LevelRange> for [u32; 2] {
    fn from(range: LevelRange) -> Self {
        [range.start, range.end]
    }
}

/// Table entry keyed by a level range.
pub trait Ranged {
    /// Levels the entry applies to.
    fn levels(&self) -> LevelRange;
}

/// Finds the first entry whose range contains the level.
///
/// Entries are consulted in declaration order; overlapping ranges resolve to
/// whichever appears first.
pub fn find_for_level<T: Ranged>(entries: &[T], level: Level) -> Option<&T> {
    entries.iter().find(|entry| entry.levels().contains(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(LevelRange, &'static str);

    impl Ranged for Entry {
        fn levels(&self) -> LevelRange {
            self.0
        }
    }

    fn range(start: u32, end: u32) -> LevelRange {
        LevelRange::new(start, end).expect("valid range")
    }

    #[test]
    fn bounds_are_inclusive() {
        let span = range(5, 9);
        assert!(span.contains(Level::new(5)));
        assert!(span.contains(Level::new(9)));
        assert!(!span.contains(Level::new(4)));
        assert!(!span.contains(Level::new(10)));
    }

    #[test]
    fn first_matching_entry_wins_on_overlap() {
        let entries = [Entry(range(1, 10), "first"), Entry(range(5, 20), "second")];
        let found = find_for_level(&entries, Level::new(7)).expect("entry");
        assert_eq!(found.1, "first");
        assert!(find_for_level(&entries, Level::new(21)).is_none());
    }

    #[test]
    fn progress_spans_zero_to_one() {
        let span = range(11, 31);
        assert_eq!(span.progress(Level::new(11)), 0.0);
        assert_eq!(span.progress(Level::new(31)), 1.0);
        assert!((span.progress(Level::new(21)) - 0.5).abs() < f64::EPSILON);
        assert_eq!(range(4, 4).progress(Level::new(4)), 1.0);
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        assert_eq!(
            LevelRange::new(0, 3),
            Err(RangeError::StartsAtZero { start: 0, end: 3 })
        );
        assert_eq!(
            LevelRange::new(8, 3),
            Err(RangeError::Inverted { start: 8, end: 3 })
        );
        assert!(LevelRange::try_from([3, 8]).is_ok());
    }
}
