// 🏆 Report Generator - the ordered sequence of award rankings
// Selector + Ranker (+ Aggregator) per configured section, rendered to lines

use crate::aggregate::{team_standings, Aggregate, TeamGrouping, TeamSpec};
use crate::config::{ReportConfig, SectionSpec};
use crate::entry::{Entry, Sex};
use crate::loader::RaceData;
use crate::ranker::{sort_by_bib, sort_by_total};
use crate::selector::{list_categories, select, GroupFilter, Selection};
use serde::Serialize;
use tracing::{debug, info};

// ============================================================================
// REPORT TYPES
// ============================================================================

/// One render-ready competitor line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryLine {
    pub rank: usize,
    pub bib: u32,
    pub name: String,
    pub sex: Sex,
    pub category: String,
    pub year_of_birth: String,
    pub city: String,
    pub group: String,
    pub splits: Vec<String>,
    pub total: String,
}

impl EntryLine {
    pub fn new(rank: usize, entry: &Entry) -> Self {
        EntryLine {
            rank,
            bib: entry.bib,
            name: entry.name.clone(),
            sex: entry.sex,
            category: entry.category.clone(),
            year_of_birth: entry.year_of_birth.clone(),
            city: entry.city.clone(),
            group: entry.group.clone(),
            splits: entry.splits.iter().map(|s| s.mark.to_string()).collect(),
            total: entry.total.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportLine {
    Entry(EntryLine),
    /// Prize-winners above, the rest below
    AwardCutoff,
    /// The section selected nothing
    NoEntries,
    TeamHeader { rank: usize, label: String },
    TeamTotal { total: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    /// `None` renders as a bare rule
    pub title: Option<String>,
    pub lines: Vec<ReportLine>,
}

impl ReportSection {
    pub fn entry_lines(&self) -> impl Iterator<Item = &EntryLine> {
        self.lines.iter().filter_map(|line| match line {
            ReportLine::Entry(e) => Some(e),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportBlock {
    Section(ReportSection),
    PageBreak,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub blocks: Vec<ReportBlock>,
}

impl Report {
    pub fn sections(&self) -> impl Iterator<Item = &ReportSection> {
        self.blocks.iter().filter_map(|block| match block {
            ReportBlock::Section(s) => Some(s),
            ReportBlock::PageBreak => None,
        })
    }

    pub fn section(&self, title: &str) -> Option<&ReportSection> {
        self.sections().find(|s| s.title.as_deref() == Some(title))
    }
}

// ============================================================================
// GENERATOR
// ============================================================================

pub struct ReportGenerator<'c> {
    config: &'c ReportConfig,
}

impl<'c> ReportGenerator<'c> {
    pub fn new(config: &'c ReportConfig) -> Self {
        ReportGenerator { config }
    }

    /// Run every configured section, in order, over the same race data.
    pub fn generate(&self, data: &RaceData) -> Report {
        let mut report = Report::default();

        for spec in &self.config.sections {
            match spec {
                SectionSpec::Qualifiers { title } => {
                    let listed = sort_by_bib(data.finishers.iter().collect());
                    self.push(&mut report, self.listing(title.clone(), &listed));
                }
                SectionSpec::NonFinishers { title } => {
                    let listed = sort_by_bib(data.non_finishers.iter().collect());
                    self.push(&mut report, self.listing(title.clone(), &listed));
                }
                SectionSpec::Scratch { title, sex, group, category, cutoff } => {
                    let selection = Selection {
                        sex: *sex,
                        category: category.clone(),
                        city: None,
                        group: GroupFilter::from(group.clone()),
                    };
                    let ranked = sort_by_total(select(&data.finishers, &selection));
                    let title = title.clone().or_else(|| self.category_title(category.as_deref(), *sex));
                    self.push(&mut report, self.ranking(title, &ranked, self.cutoff(*cutoff)));
                }
                SectionSpec::Categories { group, cutoff } => {
                    for section in self.categories(data, GroupFilter::from(group.clone()), self.cutoff(*cutoff)) {
                        self.push(&mut report, section);
                    }
                }
                SectionSpec::Teams { title, grouping, group, sex, cutoff_size, display_size, cutoff } => {
                    let spec = TeamSpec {
                        grouping: *grouping,
                        group: GroupFilter::from(group.clone()),
                        sex: *sex,
                        cutoff_size: *cutoff_size,
                        display_size: *display_size,
                    };
                    let teams = team_standings(&data.finishers, &spec);
                    self.push(&mut report, self.teams(title.clone(), &teams, *grouping, self.cutoff(*cutoff)));
                }
                SectionSpec::Rule => {
                    self.push(&mut report, ReportSection { title: None, lines: Vec::new() });
                }
                SectionSpec::PageBreak => report.blocks.push(ReportBlock::PageBreak),
            }
        }

        info!(blocks = report.blocks.len(), "report generated");
        report
    }

    fn push(&self, report: &mut Report, section: ReportSection) {
        debug!(
            title = section.title.as_deref().unwrap_or("-"),
            lines = section.lines.len(),
            "section ready"
        );
        report.blocks.push(ReportBlock::Section(section));
    }

    fn cutoff(&self, section_cutoff: Option<usize>) -> usize {
        section_cutoff.unwrap_or(self.config.award_cutoff)
    }

    /// Unranked listing: position column, no award marker.
    fn listing(&self, title: Option<String>, entries: &[&Entry]) -> ReportSection {
        let lines = if entries.is_empty() {
            vec![ReportLine::NoEntries]
        } else {
            entries
                .iter()
                .enumerate()
                .map(|(i, e)| ReportLine::Entry(EntryLine::new(i + 1, e)))
                .collect()
        };
        ReportSection { title, lines }
    }

    /// Ranked listing with the award marker after the `cutoff`-th line.
    fn ranking(&self, title: Option<String>, ranked: &[&Entry], cutoff: usize) -> ReportSection {
        if ranked.is_empty() {
            return ReportSection { title, lines: vec![ReportLine::NoEntries] };
        }

        let mut lines = Vec::with_capacity(ranked.len() + 1);
        for (i, entry) in ranked.iter().enumerate() {
            lines.push(ReportLine::Entry(EntryLine::new(i + 1, entry)));
            if i + 1 == cutoff && i + 1 < ranked.len() {
                lines.push(ReportLine::AwardCutoff);
            }
        }
        ReportSection { title, lines }
    }

    /// Title of an untitled single-category ranking, e.g. "Vétérans 1 FEMMES".
    fn category_title(&self, category: Option<&str>, sex: Option<Sex>) -> Option<String> {
        let label = self.config.category_label(category?);
        Some(match sex {
            Some(sex) => format!("{} {}", label, self.config.labels.sex(sex)),
            None => label.to_string(),
        })
    }

    /// One ranking per (category, sex), categories in table order.
    ///
    /// Categories absent from the data are skipped, and so is any
    /// (category, sex) pair with no finisher.
    fn categories(&self, data: &RaceData, group: GroupFilter, cutoff: usize) -> Vec<ReportSection> {
        let present = list_categories(&data.finishers);
        let mut sections = Vec::new();

        for category in self.config.ordered_categories() {
            if !present.contains(&category.code) {
                continue;
            }
            for sex in Sex::ALL {
                let selection = Selection::all()
                    .with_category(category.code.clone())
                    .with_sex(sex)
                    .with_group(group.clone());
                let ranked = sort_by_total(select(&data.finishers, &selection));
                if ranked.is_empty() {
                    continue;
                }
                let title = format!("{} {}", category.label, self.config.labels.sex(sex));
                sections.push(self.ranking(Some(title), &ranked, cutoff));
            }
        }

        sections
    }

    fn teams(&self, title: Option<String>, teams: &[Aggregate<'_>], grouping: TeamGrouping, cutoff: usize) -> ReportSection {
        if teams.is_empty() {
            return ReportSection { title, lines: vec![ReportLine::NoEntries] };
        }

        let mut lines = Vec::new();
        for (i, team) in teams.iter().enumerate() {
            debug!(rank = i + 1, team = %team.label, ?grouping, total = %team.total, "team ranked");
            lines.push(ReportLine::TeamHeader { rank: i + 1, label: team.label.clone() });
            for (j, entry) in team.entries.iter().enumerate() {
                lines.push(ReportLine::Entry(EntryLine::new(j + 1, entry)));
            }
            lines.push(ReportLine::TeamTotal { total: team.total.to_string() });
            if i + 1 == cutoff && i + 1 < teams.len() {
                lines.push(ReportLine::AwardCutoff);
            }
        }
        ReportSection { title, lines }
    }
}

// ============================================================================
// TESTS
// ============================================================================
