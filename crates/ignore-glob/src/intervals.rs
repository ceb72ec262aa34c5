use alloc::vec::Vec;

/// A set of closed byte intervals, merged on demand.
///
/// While a bracket expression is parsed, the same byte can be named several
/// times over: overlapping ranges (`[a-ca-c]`), case-folded twins, POSIX
/// named classes. The parser records everything here and asks for the
/// merged, disjoint form once at the end, so the emitted class instruction
/// never carries redundant entries.
#[derive(Debug, Default)]
pub(crate) struct CharIntervalSet {
    bounds: Vec<Bound>,
}

/// One endpoint of an inserted interval.
#[derive(Clone, Copy, Debug)]
struct Bound {
    value: u8,
    /// False: an interval starts before this byte.
    /// True: an interval ends after this byte.
    is_end: bool,
}

impl CharIntervalSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert the closed interval `[lo, hi]`. `lo` must not exceed `hi`.
    pub(crate) fn insert(&mut self, lo: u8, hi: u8) {
        debug_assert!(lo <= hi);
        self.bounds.push(Bound {
            value: lo,
            is_end: false,
        });
        self.bounds.push(Bound {
            value: hi,
            is_end: true,
        });
    }

    /// Consume the set and return the minimal list of disjoint intervals
    /// covering the same bytes, in ascending order.
    pub(crate) fn into_merged(mut self) -> Vec<(u8, u8)> {
        // Ascending by value; at equal values, starts sort before ends so
        // that intervals sharing a byte fuse into one.
        self.bounds.sort_unstable_by_key(|b| (b.value, b.is_end));

        let mut merged: Vec<(u8, u8)> = Vec::new();
        let mut depth = 0u32;
        for bound in &self.bounds {
            if bound.is_end {
                depth -= 1;
                if depth == 0 {
                    if let Some(last) = merged.last_mut() {
                        last.1 = bound.value;
                    }
                }
            } else {
                depth += 1;
                if depth == 1 {
                    // Open a new output interval; its end is patched when
                    // the depth next returns to zero.
                    merged.push((bound.value, u8::MAX));
                }
            }
        }
        merged
    }
}
