use std::{
    fmt,
    ops::{Range, RangeFrom, RangeInclusive, RangeToInclusive},
};

/// Inclusive count range a verification checks observed calls against.
///
/// | Preset | Range |
/// |--------|-------|
/// | [`never`](Self::never) | `[0, 0]` |
/// | [`once`](Self::once) | `[1, 1]` |
/// | [`at_least_once`](Self::at_least_once) | `[1, ∞)` |
/// | [`at_most_once`](Self::at_most_once) | `[0, 1]` |
/// | [`exactly(n)`](Self::exactly) | `[n, n]` |
/// | [`between(a, b)`](Self::between) | `[a, b]` |
///
/// Ranges convert too: `2`, `1..=3`, `1..4`, `2..` and `..=2` are all `Times`.
///
/// ```rust
/// use decoy::Times;
///
/// assert!(Times::exactly(2).is_satisfied_by(2));
/// assert!(!Times::at_least_once().is_satisfied_by(0));
/// assert_eq!(Times::from(1usize..=3), Times::between(1, 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Times {
    min: usize,
    max: Option<usize>,
}

impl Times {
    pub const fn never() -> Self {
        Self::exactly(0)
    }

    pub const fn once() -> Self {
        Self::exactly(1)
    }

    pub const fn at_least_once() -> Self {
        Self::at_least(1)
    }

    pub const fn at_most_once() -> Self {
        Self::at_most(1)
    }

    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    pub const fn at_most(n: usize) -> Self {
        Self {
            min: 0,
            max: Some(n),
        }
    }

    /// Inclusive range. Bounds are swapped if given in reverse order.
    pub const fn between(min: usize, max: usize) -> Self {
        if min <= max {
            Self {
                min,
                max: Some(max),
            }
        } else {
            Self {
                min: max,
                max: Some(min),
            }
        }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    /// Upper bound, `None` when unbounded.
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn is_satisfied_by(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl Default for Times {
    fn default() -> Self {
        Times::at_least_once()
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, Some(0)) => write!(f, "never"),
            (1, Some(1)) => write!(f, "once"),
            (n, Some(m)) if n == m => write!(f, "exactly {n} times"),
            (1, None) => write!(f, "at least once"),
            (n, None) => write!(f, "at least {n} times"),
            (0, Some(1)) => write!(f, "at most once"),
            (0, Some(m)) => write!(f, "at most {m} times"),
            (n, Some(m)) => write!(f, "between {n} and {m} times"),
        }
    }
}

impl From<usize> for Times {
    fn from(n: usize) -> Self {
        Times::exactly(n)
    }
}

impl From<RangeInclusive<usize>> for Times {
    fn from(range: RangeInclusive<usize>) -> Self {
        Times::between(*range.start(), *range.end())
    }
}

impl From<Range<usize>> for Times {
    fn from(range: Range<usize>) -> Self {
        if range.end <= range.start {
            return Times::never();
        }
        Times::between(range.start, range.end - 1)
    }
}

impl From<RangeFrom<usize>> for Times {
    fn from(range: RangeFrom<usize>) -> Self {
        Times::at_least(range.start)
    }
}

impl From<RangeToInclusive<usize>> for Times {
    fn from(range: RangeToInclusive<usize>) -> Self {
        Times::at_most(range.end)
    }
}
