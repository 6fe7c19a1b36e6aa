// 🏁 Ranker - deterministic ordering by elapsed time
// Ties on total are broken explicitly, never by incidental input order

use crate::entry::Entry;
use crate::time::RaceTime;
use std::cmp::Ordering;

/// Something that can be placed in a time ranking.
pub trait Ranked {
    /// Numeric key; `None` for anything without a comparable time.
    fn rank_time(&self) -> Option<RaceTime>;

    /// Order between two items with the same time.
    fn tie_break(&self, other: &Self) -> Ordering;
}

impl Ranked for Entry {
    fn rank_time(&self) -> Option<RaceTime> {
        self.time()
    }

    /// Lower bib first
    fn tie_break(&self, other: &Self) -> Ordering {
        self.bib.cmp(&other.bib)
    }
}

impl<T: Ranked + ?Sized> Ranked for &T {
    fn rank_time(&self) -> Option<RaceTime> {
        (**self).rank_time()
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        (**self).tie_break(*other)
    }
}

/// Compare by time ascending; items without a time go last.
pub fn compare_by_total<T: Ranked>(a: &T, b: &T) -> Ordering {
    match (a.rank_time(), b.rank_time()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.tie_break(b))
}

/// Ascending by total time.
///
/// Callers are expected to have filtered out non-finishers; if any slip
/// through they are placed after every finisher.
pub fn sort_by_total<T: Ranked>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by(compare_by_total);
    items
}

/// Ascending by bib, for the unranked listings.
pub fn sort_by_bib<'a>(mut entries: Vec<&'a Entry>) -> Vec<&'a Entry> {
    entries.sort_by_key(|e| e.bib);
    entries
}

// ============================================================================
// TESTS
// ============================================================================
