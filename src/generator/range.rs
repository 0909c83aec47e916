//! Closed integer ranges
//!
//! A [`Range`] is the key space that samplers draw from. It is an inclusive
//! interval `[min, max]` over any of the unsigned or signed primitive integers
//! listed under [`RangeInt`].
//!
//! # Example
//!
//! ```
//! use kvpulse::generator::range::Range;
//!
//! let range = Range::new(10u64, 19u64);
//! assert_eq!(range.size(), 10);
//! assert!(range.contains(15));
//! assert!(!range.contains(20));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Integer types a [`Range`] can be built over
///
/// Samplers work on `u64` offsets from `min`, so every implementor must be
/// able to convert an offset back into its own domain.
pub trait RangeInt: Copy + Ord + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Distance from `min` to `self` (requires `self >= min`)
    fn offset_from(self, min: Self) -> u64;

    /// `min + offset` (requires the result to be representable)
    fn add_offset(min: Self, offset: u64) -> Self;
}

macro_rules! impl_range_int {
    ($($t:ty),*) => {
        $(
            impl RangeInt for $t {
                #[inline(always)]
                fn offset_from(self, min: Self) -> u64 {
                    (self as i128 - min as i128) as u64
                }

                #[inline(always)]
                fn add_offset(min: Self, offset: u64) -> Self {
                    (min as i128 + offset as i128) as $t
                }
            }
        )*
    };
}

impl_range_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Inclusive interval `[min, max]`
///
/// Immutable once constructed. The size of the interval must fit in a `u64`,
/// so the full `u64`/`i64` domain is not a valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range<T> {
    min: T,
    max: T,
}

impl<T: RangeInt> Range<T> {
    /// Create a new range
    ///
    /// # Panics
    ///
    /// Panics if `min > max` or if the interval covers the entire 64-bit domain.
    pub fn new(min: T, max: T) -> Self {
        assert!(min <= max, "Range min ({:?}) must not exceed max ({:?})", min, max);
        assert!(
            max.offset_from(min) < u64::MAX,
            "Range [{:?}, {:?}] is too wide",
            min,
            max
        );
        Self { min, max }
    }

    #[inline]
    pub fn min(&self) -> T {
        self.min
    }

    #[inline]
    pub fn max(&self) -> T {
        self.max
    }

    /// Number of values in the range (`max - min + 1`)
    #[inline]
    pub fn size(&self) -> u64 {
        self.max.offset_from(self.min) + 1
    }

    /// Whether `value` lies inside the range
    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// Value at `offset` from `min`
    #[inline(always)]
    pub(crate) fn at_offset(&self, offset: u64) -> T {
        debug_assert!(offset < self.size());
        T::add_offset(self.min, offset)
    }
}

impl<T: fmt::Display> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
