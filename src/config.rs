// ⚙️ Report Configuration - rankings as data
// Category ordering, labels and the section sequence live in one table

use crate::aggregate::TeamGrouping;
use crate::entry::Sex;
use crate::error::{RaceError, RaceResult};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_AWARD_CUTOFF: usize = 3;
pub const DEFAULT_TEAM_SIZE: usize = 3;

/// Affiliation group codes used by the default layout.
pub mod groups {
    /// Municipal police
    pub const MUNICIPAL_POLICE: &str = "PM";
    pub const OPEN: &str = "OPEN";
    /// National police and gendarmerie
    pub const NATIONAL_POLICE: &str = "PNG";
    /// Rural wardens
    pub const RURAL_WARDENS: &str = "GC";
}

// ============================================================================
// TABLE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub code: String,
    pub label: String,
    /// Position in the category breakdown (lower first)
    pub rank: u32,
}

impl CategoryDef {
    pub fn new(code: &str, label: &str, rank: u32) -> Self {
        CategoryDef {
            code: code.to_string(),
            label: label.to_string(),
            rank,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    pub men: String,
    pub women: String,
    pub no_entries: String,
    pub not_awarded: String,
    pub team_total: String,
}

impl Labels {
    pub fn sex(&self, sex: Sex) -> &str {
        match sex {
            Sex::Male => &self.men,
            Sex::Female => &self.women,
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            men: "HOMMES".to_string(),
            women: "FEMMES".to_string(),
            no_entries: "*** VIDE".to_string(),
            not_awarded: "--- non primés ---".to_string(),
            team_total: "TOT:".to_string(),
        }
    }
}

/// One step of the report sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionSpec {
    /// Every finisher, by bib, unranked
    Qualifiers { title: Option<String> },
    /// Every non-finisher, by bib, with the failed split
    NonFinishers { title: Option<String> },
    /// Individual ranking over an optional sex / group / category filter
    Scratch {
        title: Option<String>,
        sex: Option<Sex>,
        group: Option<String>,
        category: Option<String>,
        cutoff: Option<usize>,
    },
    /// One ranking per configured category and sex
    Categories {
        group: Option<String>,
        cutoff: Option<usize>,
    },
    /// Aggregate standings (sum of the `cutoff_size` best times)
    Teams {
        title: Option<String>,
        #[serde(default)]
        grouping: TeamGrouping,
        group: Option<String>,
        sex: Option<Sex>,
        cutoff_size: usize,
        display_size: usize,
        cutoff: Option<usize>,
    },
    /// Title-less separator
    Rule,
    PageBreak,
}

impl SectionSpec {
    pub fn scratch(title: &str, sex: Option<Sex>, group: Option<&str>) -> Self {
        SectionSpec::Scratch {
            title: Some(title.to_string()),
            sex,
            group: group.map(str::to_string),
            category: None,
            cutoff: None,
        }
    }

    pub fn teams(title: &str, group: Option<&str>, cutoff_size: usize, display_size: usize) -> Self {
        SectionSpec::Teams {
            title: Some(title.to_string()),
            grouping: TeamGrouping::City,
            group: group.map(str::to_string),
            sex: None,
            cutoff_size,
            display_size,
            cutoff: None,
        }
    }
}

// ============================================================================
// REPORT CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of awarded places per ranking
    #[serde(default = "default_award_cutoff")]
    pub award_cutoff: usize,
    #[serde(default)]
    pub labels: Labels,
    pub categories: Vec<CategoryDef>,
    pub sections: Vec<SectionSpec>,
}

fn default_award_cutoff() -> usize {
    DEFAULT_AWARD_CUTOFF
}

impl Default for ReportConfig {
    /// The championship layout: listings, scratch, categories, then teams.
    fn default() -> Self {
        use groups::*;

        let categories = ["SENIOR", "M1", "M2", "M3", "M4", "M5", "V1", "V2", "V3", "SNOW"]
            .iter()
            .zip(1..)
            .map(|(code, rank)| CategoryDef::new(code, code, rank))
            .collect();

        let sections = vec![
            SectionSpec::Qualifiers { title: Some("QUALIFIES RENTRANT DANS LES CLASSEMENTS".to_string()) },
            SectionSpec::NonFinishers { title: Some("DNF".to_string()) },
            SectionSpec::PageBreak,
            SectionSpec::scratch("SCRATCH HOMMES", Some(Sex::Male), None),
            SectionSpec::scratch("SCRATCH FEMMES", Some(Sex::Female), None),
            SectionSpec::PageBreak,
            SectionSpec::Categories { group: None, cutoff: None },
            SectionSpec::PageBreak,
            SectionSpec::teams("PAR VILLES", None, DEFAULT_TEAM_SIZE, DEFAULT_TEAM_SIZE),
            SectionSpec::teams("PAR POLICES MUNICIPALES", Some(MUNICIPAL_POLICE), DEFAULT_TEAM_SIZE, DEFAULT_TEAM_SIZE),
            SectionSpec::Rule,
            SectionSpec::scratch("POLICE NATIONALE - GENDARMERIE", None, Some(NATIONAL_POLICE)),
            SectionSpec::scratch("OPEN HOMMES", Some(Sex::Male), Some(OPEN)),
            SectionSpec::scratch("OPEN FEMMES", Some(Sex::Female), Some(OPEN)),
            SectionSpec::PageBreak,
            SectionSpec::teams("GARDES CHAMPETRES PAR VILLES", Some(RURAL_WARDENS), 1, 1),
        ];

        ReportConfig {
            award_cutoff: DEFAULT_AWARD_CUTOFF,
            labels: Labels::default(),
            categories,
            sections,
        }
    }
}

impl ReportConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config = ReportConfig::from_json(&content)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))?;

        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> RaceResult<()> {
        if self.award_cutoff == 0 {
            return Err(RaceError::Config("award_cutoff must be positive".to_string()));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.code.trim().is_empty() {
                return Err(RaceError::Config("category code must not be empty".to_string()));
            }
            if !seen.insert(category.code.as_str()) {
                return Err(RaceError::Config(format!("duplicate category {:?}", category.code)));
            }
        }

        for section in &self.sections {
            match section {
                SectionSpec::Teams { cutoff_size, display_size, cutoff, .. } => {
                    if *cutoff_size == 0 || *display_size == 0 {
                        return Err(RaceError::Config("team cutoff_size and display_size must be positive".to_string()));
                    }
                    check_cutoff(*cutoff)?;
                }
                SectionSpec::Scratch { category, cutoff, .. } => {
                    check_cutoff(*cutoff)?;
                    if let Some(code) = category {
                        if !seen.contains(code.as_str()) {
                            return Err(RaceError::Config(format!("unknown category {:?} in section", code)));
                        }
                    }
                }
                SectionSpec::Categories { cutoff, .. } => check_cutoff(*cutoff)?,
                _ => {}
            }
        }

        Ok(())
    }

    /// Categories in breakdown order
    pub fn ordered_categories(&self) -> Vec<&CategoryDef> {
        let mut ordered: Vec<&CategoryDef> = self.categories.iter().collect();
        ordered.sort_by_key(|c| c.rank);
        ordered
    }

    /// Display label for a category code, the code itself when unlisted
    pub fn category_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.categories
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.label.as_str())
            .unwrap_or(code)
    }
}

fn check_cutoff(cutoff: Option<usize>) -> RaceResult<()> {
    if cutoff == Some(0) {
        return Err(RaceError::Config("section cutoff must be positive".to_string()));
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.award_cutoff, 3);
        assert_eq!(config.ordered_categories()[0].code, "SENIOR");
        assert_eq!(config.ordered_categories().last().unwrap().code, "SNOW");
    }

    #[test]
    fn test_json_round_trip() {
        let config = ReportConfig::default();
        let json = config.to_json_pretty().unwrap();
        let back = ReportConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_minimal_json() {
        let json = r#"{
            "categories": [
                {"code": "V1", "label": "Vétérans 1", "rank": 2},
                {"code": "SENIOR", "label": "Seniors", "rank": 1}
            ],
            "sections": [
                {"kind": "scratch", "title": "SCRATCH", "sex": "F"},
                {"kind": "teams", "title": "EQUIPES", "group": "PM", "cutoff_size": 2, "display_size": 4},
                {"kind": "page_break"}
            ]
        }"#;

        let config = ReportConfig::from_json(json).unwrap();
        assert_eq!(config.award_cutoff, DEFAULT_AWARD_CUTOFF);
        assert_eq!(config.labels, Labels::default());
        assert_eq!(config.ordered_categories()[0].label, "Seniors");
        assert_eq!(config.category_label("V1"), "Vétérans 1");
        assert_eq!(config.category_label("M9"), "M9");
        assert!(matches!(
            config.sections[1],
            SectionSpec::Teams { grouping: TeamGrouping::City, cutoff_size: 2, display_size: 4, .. }
        ));
    }

    #[test]
    fn test_rejects_bad_config() {
        let duplicate = r#"{"categories": [{"code": "M1", "label": "a", "rank": 1}, {"code": "M1", "label": "b", "rank": 2}], "sections": []}"#;
        assert!(ReportConfig::from_json(duplicate).is_err());

        let zero_team = r#"{"categories": [], "sections": [{"kind": "teams", "cutoff_size": 0, "display_size": 3}]}"#;
        assert!(ReportConfig::from_json(zero_team).is_err());

        let bad_sex = r#"{"categories": [], "sections": [{"kind": "scratch", "sex": "X"}]}"#;
        assert!(ReportConfig::from_json(bad_sex).is_err());

        let mut config = ReportConfig::default();
        config.award_cutoff = 0;
        assert!(matches!(config.validate(), Err(RaceError::Config(_))));

        let mut config = ReportConfig::default();
        config.sections.push(SectionSpec::Scratch {
            title: None,
            sex: None,
            group: None,
            category: Some("XYZ".to_string()),
            cutoff: None,
        });
        assert!(matches!(config.validate(), Err(RaceError::Config(m)) if m.contains("XYZ")));

        let zero_team_cutoff = r#"{"categories": [], "sections": [{"kind": "teams", "cutoff_size": 3, "display_size": 3, "cutoff": 0}]}"#;
        assert!(ReportConfig::from_json(zero_team_cutoff).is_err());
        let mut config = ReportConfig::default();
        config.sections = vec![SectionSpec::Teams {
            title: None,
            grouping: TeamGrouping::Group,
            group: None,
            sex: None,
            cutoff_size: 1,
            display_size: 1,
            cutoff: Some(0),
        }];
        assert!(matches!(config.validate(), Err(RaceError::Config(_))));
    }

    #[test]
    fn test_known_category_in_scratch() {
        let json = r#"{
            "categories": [{"code": "V1", "label": "Vétérans 1", "rank": 1}],
            "sections": [{"kind": "scratch", "category": "V1", "cutoff": 5}]
        }"#;
        assert!(ReportConfig::from_json(json).is_ok());
    }
}
