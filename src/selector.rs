// 🔎 Selector - pure filters over entries
// Criteria are AND-composed; input order is preserved and nothing is mutated

use crate::entry::{Entry, Sex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// GROUP FILTER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFilter {
    /// Accept every group, including entries with no affiliation
    #[default]
    Any,
    Exactly(String),
}

impl GroupFilter {
    /// An empty criterion means "no group filter".
    pub fn from_criterion(group: &str) -> Self {
        let group = group.trim();
        if group.is_empty() {
            GroupFilter::Any
        } else {
            GroupFilter::Exactly(group.to_string())
        }
    }

    pub fn accepts(&self, group: &str) -> bool {
        match self {
            GroupFilter::Any => true,
            GroupFilter::Exactly(wanted) => wanted == group,
        }
    }
}

impl From<Option<String>> for GroupFilter {
    fn from(group: Option<String>) -> Self {
        group.map(|g| GroupFilter::from_criterion(&g)).unwrap_or_default()
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// A conjunction of optional criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub sex: Option<Sex>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub group: GroupFilter,
}

impl Selection {
    /// Matches every entry
    pub fn all() -> Self {
        Selection::default()
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_group(mut self, group: GroupFilter) -> Self {
        self.group = group;
        self
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.sex.map_or(true, |sex| entry.sex == sex)
            && self.category.as_deref().map_or(true, |c| entry.category == c)
            && self.city.as_deref().map_or(true, |c| entry.city == c)
            && self.group.accepts(&entry.group)
    }
}

/// Entries matching `selection`, in input order.
pub fn select<'a, I>(entries: I, selection: &Selection) -> Vec<&'a Entry>
where
    I: IntoIterator<Item = &'a Entry>,
{
    entries.into_iter().filter(|e| selection.matches(e)).collect()
}

pub fn select_by_sex(entries: &[Entry], sex: Sex) -> Vec<&Entry> {
    select(entries, &Selection::all().with_sex(sex))
}

pub fn select_by_city<'a>(entries: &'a [Entry], city: &str) -> Vec<&'a Entry> {
    select(entries, &Selection::all().with_city(city))
}

pub fn select_by_group<'a>(entries: &'a [Entry], group: &str) -> Vec<&'a Entry> {
    select(entries, &Selection::all().with_group(GroupFilter::from_criterion(group)))
}

pub fn select_by_city_and_group<'a>(entries: &'a [Entry], city: &str, group: &str) -> Vec<&'a Entry> {
    let selection = Selection::all()
        .with_city(city)
        .with_group(GroupFilter::from_criterion(group));
    select(entries, &selection)
}

pub fn select_by_category_and_sex<'a>(entries: &'a [Entry], category: &str, sex: Sex) -> Vec<&'a Entry> {
    select(entries, &Selection::all().with_category(category).with_sex(sex))
}

// ============================================================================
// KEY EXTRACTION
// ============================================================================

pub fn list_cities(entries: &[Entry]) -> Vec<String> {
    distinct(entries, |e| &e.city)
}

pub fn list_categories(entries: &[Entry]) -> Vec<String> {
    distinct(entries, |e| &e.category)
}

pub fn list_groups(entries: &[Entry]) -> Vec<String> {
    distinct(entries, |e| &e.group)
}

fn distinct<F>(entries: &[Entry], key: F) -> Vec<String>
where
    F: Fn(&Entry) -> &String,
{
    entries
        .iter()
        .map(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
