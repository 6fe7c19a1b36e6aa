// 👥 Aggregator - team scores from the fastest N members
// A subgroup smaller than the cutoff size does not form a team

use crate::entry::{Entry, Sex};
use crate::ranker::{sort_by_total, Ranked};
use crate::selector::{select, GroupFilter, Selection};
use crate::time::RaceTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// AGGREGATE
// ============================================================================

/// A team (or city) scored on the sum of its `cutoff_size` fastest times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate<'a> {
    /// Subgroup key, e.g. the city name
    pub label: String,
    /// Fastest members, ascending, at least `cutoff_size` long
    pub entries: Vec<&'a Entry>,
    pub cutoff_size: usize,
    pub total: RaceTime,
}

impl Ranked for Aggregate<'_> {
    fn rank_time(&self) -> Option<RaceTime> {
        Some(self.total)
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        self.label.cmp(&other.label)
    }
}

/// Build the aggregate for one subgroup.
///
/// Non-finishers in `subgroup` are ignored. Returns `None` when fewer than
/// `cutoff_size` finishers remain. Up to `display_size` members are kept for
/// listing (never fewer than `cutoff_size`).
///
/// # Panics
/// If `cutoff_size` is zero.
pub fn aggregate<'a>(
    label: impl Into<String>,
    subgroup: Vec<&'a Entry>,
    cutoff_size: usize,
    display_size: usize,
) -> Option<Aggregate<'a>> {
    assert!(cutoff_size > 0, "aggregate cutoff size must be positive");

    let finishers: Vec<&Entry> = subgroup.into_iter().filter(|e| e.is_finisher()).collect();
    if finishers.len() < cutoff_size {
        return None;
    }

    let mut sorted = sort_by_total(finishers);
    let total: RaceTime = sorted[..cutoff_size].iter().filter_map(|e| e.time()).sum();
    sorted.truncate(display_size.max(cutoff_size));

    Some(Aggregate {
        label: label.into(),
        entries: sorted,
        cutoff_size,
        total,
    })
}

// ============================================================================
// TEAM STANDINGS
// ============================================================================

/// Which entry attribute defines a team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamGrouping {
    #[default]
    City,
    Group,
}

impl TeamGrouping {
    pub fn key<'a>(&self, entry: &'a Entry) -> &'a str {
        match self {
            TeamGrouping::City => &entry.city,
            TeamGrouping::Group => &entry.group,
        }
    }
}

/// Parameters of one team ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSpec {
    pub grouping: TeamGrouping,
    pub group: GroupFilter,
    pub sex: Option<Sex>,
    pub cutoff_size: usize,
    pub display_size: usize,
}

impl TeamSpec {
    pub fn by_city(cutoff_size: usize) -> Self {
        TeamSpec {
            grouping: TeamGrouping::City,
            group: GroupFilter::Any,
            sex: None,
            cutoff_size,
            display_size: cutoff_size,
        }
    }

    pub fn with_group(mut self, group: GroupFilter) -> Self {
        self.group = group;
        self
    }

    pub fn with_display_size(mut self, display_size: usize) -> Self {
        self.display_size = display_size;
        self
    }

    fn selection(&self) -> Selection {
        Selection {
            sex: self.sex,
            group: self.group.clone(),
            ..Selection::default()
        }
    }
}

/// Qualifying aggregates, ranked by aggregate total.
pub fn team_standings<'a>(entries: &'a [Entry], spec: &TeamSpec) -> Vec<Aggregate<'a>> {
    let mut subgroups: BTreeMap<&str, Vec<&Entry>> = BTreeMap::new();
    for entry in select(entries, &spec.selection()) {
        let key = spec.grouping.key(entry);
        if key.is_empty() {
            continue;
        }
        subgroups.entry(key).or_default().push(entry);
    }

    let mut qualifying = Vec::new();
    for (label, members) in subgroups {
        let size = members.len();
        match aggregate(label, members, spec.cutoff_size, spec.display_size) {
            Some(team) => qualifying.push(team),
            None => debug!(team = label, size, cutoff = spec.cutoff_size, "below team threshold"),
        }
    }

    sort_by_total(qualifying)
}

// ============================================================================
// TESTS
// ============================================================================
