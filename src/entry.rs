// 🏃 Entry Model - one competitor's validated race record
// Rows are validated once at the boundary, entries are immutable afterwards

use crate::error::{RaceError, RaceResult};
use crate::time::{is_unavailable, parse_time, RaceTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alternate male code used by French registration sheets ("Homme").
const ALTERNATE_MALE_CODE: &str = "H";

// ============================================================================
// SEX
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Canonical one-letter code
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sex {
    type Err = String;

    /// Accepts the canonical codes plus the alternate male marker.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let code = if code == ALTERNATE_MALE_CODE { "M" } else { code.as_str() };
        match code {
            "M" => Ok(Sex::Male),
            "F" => Ok(Sex::Female),
            _ => Err(format!("expected M or F, got {:?}", s)),
        }
    }
}

// ============================================================================
// RAW ROW
// ============================================================================

/// One input row, every field still a string.
///
/// Column order in the results file:
/// Bib, Name, Sex, Category, Yob, City, Group, M1, M2, Tot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub bib: String,
    pub name: String,
    pub sex: String,
    pub category: String,
    pub year_of_birth: String,
    pub city: String,
    pub group: String,
    pub split1: String,
    pub split2: String,
    pub total: String,
}

// ============================================================================
// SPLITS AND TOTALS
// ============================================================================

/// A lap mark: either a time or whatever marker the timing system wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    Time(RaceTime),
    Unavailable(String),
}

impl Mark {
    fn parse(raw: &str) -> RaceResult<Mark> {
        let raw = raw.trim();
        if is_unavailable(raw) {
            Ok(Mark::Unavailable(raw.to_string()))
        } else {
            parse_time(raw).map(Mark::Time)
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Mark::Time(_))
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::Time(t) => write!(f, "{}", t),
            Mark::Unavailable(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub label: String,
    pub mark: Mark,
}

/// Which intermediate mark first went missing for a non-finisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedAt {
    Unknown,
    Split1,
    Split2,
}

impl fmt::Display for FailedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailedAt::Unknown => "?",
            FailedAt::Split1 => "M1",
            FailedAt::Split2 => "M2",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Total {
    Finished(RaceTime),
    NotFinished { code: String, failed_at: FailedAt },
}

impl Total {
    pub fn time(&self) -> Option<RaceTime> {
        match self {
            Total::Finished(t) => Some(*t),
            Total::NotFinished { .. } => None,
        }
    }
}

impl fmt::Display for Total {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Total::Finished(t) => write!(f, "{}", t),
            Total::NotFinished { code, failed_at } if code.is_empty() => write!(f, "{}", failed_at),
            Total::NotFinished { code, failed_at } => write!(f, "{} {}", code, failed_at),
        }
    }
}

// ============================================================================
// ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub bib: u32,
    pub name: String,
    pub sex: Sex,
    pub category: String,
    pub year_of_birth: String,
    pub city: String,
    /// Affiliation label, empty when the competitor races for no team.
    pub group: String,
    pub splits: Vec<Split>,
    pub total: Total,
}

impl Entry {
    /// Build an entry from a row, choosing finishing or non-finishing mode
    /// from the total mark.
    pub fn from_row(row: &RawRow) -> RaceResult<Entry> {
        if is_unavailable(&row.total) {
            Entry::non_finisher(row)
        } else {
            Entry::finisher(row)
        }
    }

    /// Finishing mode: the total must be a parseable time.
    pub fn finisher(row: &RawRow) -> RaceResult<Entry> {
        let (bib, sex) = validate_mandatory(row)?;
        let total = parse_time(&row.total)?;
        Ok(Entry::assemble(row, bib, sex, parse_splits(row)?, Total::Finished(total)))
    }

    /// Non-finishing mode: the total is kept as its marker, tagged with the
    /// first intermediate split that is also missing.
    pub fn non_finisher(row: &RawRow) -> RaceResult<Entry> {
        let (bib, sex) = validate_mandatory(row)?;
        if !is_unavailable(&row.total) {
            return Err(RaceError::validation(
                &row.bib,
                "total",
                format!("{:?} is a finishing time", row.total.trim()),
            ));
        }

        let splits = parse_splits(row)?;
        let failed_at = if !splits[0].mark.is_available() {
            FailedAt::Split1
        } else if !splits[1].mark.is_available() {
            FailedAt::Split2
        } else {
            FailedAt::Unknown
        };

        let total = Total::NotFinished {
            code: row.total.trim().to_string(),
            failed_at,
        };
        Ok(Entry::assemble(row, bib, sex, splits, total))
    }

    fn assemble(row: &RawRow, bib: u32, sex: Sex, splits: Vec<Split>, total: Total) -> Entry {
        Entry {
            bib,
            name: row.name.trim().to_string(),
            sex,
            category: row.category.trim().to_string(),
            year_of_birth: row.year_of_birth.trim().to_string(),
            city: row.city.trim().to_string(),
            group: row.group.trim().to_string(),
            splits,
            total,
        }
    }

    /// Numeric total, `None` for non-finishers.
    pub fn time(&self) -> Option<RaceTime> {
        self.total.time()
    }

    pub fn is_finisher(&self) -> bool {
        self.time().is_some()
    }

    pub fn has_group(&self) -> bool {
        !self.group.is_empty()
    }
}

fn validate_mandatory(row: &RawRow) -> RaceResult<(u32, Sex)> {
    let bib_text = row.bib.trim();
    for (field, value) in [
        ("bib", bib_text),
        ("name", row.name.trim()),
        ("sex", row.sex.trim()),
        ("category", row.category.trim()),
    ] {
        if value.is_empty() {
            return Err(RaceError::validation(bib_text, field, "required field is empty"));
        }
    }

    let bib: u32 = bib_text
        .parse()
        .ok()
        .filter(|b| *b > 0)
        .ok_or_else(|| RaceError::validation(bib_text, "bib", "must be a positive integer"))?;

    let sex = row
        .sex
        .parse::<Sex>()
        .map_err(|message| RaceError::validation(bib_text, "sex", message))?;

    Ok((bib, sex))
}

fn parse_splits(row: &RawRow) -> RaceResult<Vec<Split>> {
    Ok(vec![
        Split { label: "M1".to_string(), mark: Mark::parse(&row.split1)? },
        Split { label: "M2".to_string(), mark: Mark::parse(&row.split2)? },
    ])
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn row(bib: &str, name: &str, sex: &str, category: &str, city: &str, group: &str, total: &str) -> RawRow {
        RawRow {
            bib: bib.to_string(),
            name: name.to_string(),
            sex: sex.to_string(),
            category: category.to_string(),
            year_of_birth: "1985".to_string(),
            city: city.to_string(),
            group: group.to_string(),
            split1: "30.10".to_string(),
            split2: "1:00.20".to_string(),
            total: total.to_string(),
        }
    }

    #[test]
    fn test_finisher_from_row() {
        let entry = Entry::from_row(&row("7", "DUPONT Marie", "F", "M1", "Annecy", "PM", "1:23.65")).unwrap();

        assert_eq!(entry.bib, 7);
        assert_eq!(entry.sex, Sex::Female);
        assert_eq!(entry.time().unwrap().hundredths(), 8365);
        assert_eq!(entry.splits[0].mark, Mark::Time(RaceTime::from_hundredths(3010)));
        assert!(entry.is_finisher());
        assert!(entry.has_group());
    }

    #[test]
    fn test_malformed_split_rejects_finisher() {
        for bad in ["1:2:3.00", "30.1"] {
            let mut raw = row("7", "DUPONT Marie", "F", "M1", "Annecy", "PM", "1:23.65");
            raw.split1 = bad.to_string();
            assert!(matches!(Entry::from_row(&raw), Err(RaceError::Format(_))), "{}", bad);
        }
    }

    #[test]
    fn test_alternate_male_code() {
        let entry = Entry::from_row(&row("3", "MARTIN Paul", "H", "SENIOR", "Sallanches", "", "59.00")).unwrap();
        assert_eq!(entry.sex, Sex::Male);
        assert!(!entry.has_group());
    }

    #[test]
    fn test_missing_mandatory_fields() {
        let cases = [
            (row("", "A", "M", "SENIOR", "X", "PM", "50.00"), "bib"),
            (row("4", " ", "M", "SENIOR", "X", "PM", "50.00"), "name"),
            (row("4", "A", "", "SENIOR", "X", "PM", "50.00"), "sex"),
            (row("4", "A", "M", "", "X", "PM", "50.00"), "category"),
        ];
        for (raw, expected) in cases {
            match Entry::from_row(&raw) {
                Err(RaceError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error on {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_bad_sex_and_bib() {
        let err = Entry::from_row(&row("4", "A", "X", "SENIOR", "", "", "50.00")).unwrap_err();
        assert!(matches!(err, RaceError::Validation { field: "sex", .. }));

        let err = Entry::from_row(&row("0", "A", "M", "SENIOR", "", "", "50.00")).unwrap_err();
        assert!(matches!(err, RaceError::Validation { field: "bib", .. }));

        let err = Entry::from_row(&row("12b", "A", "M", "SENIOR", "", "", "50.00")).unwrap_err();
        assert!(matches!(err, RaceError::Validation { field: "bib", .. }));
    }

    #[test]
    fn test_malformed_total_is_format_error() {
        let err = Entry::finisher(&row("4", "A", "M", "SENIOR", "", "", "1:2:3.00")).unwrap_err();
        assert!(matches!(err, RaceError::Format(_)));
    }

    #[test]
    fn test_non_finisher_annotation() {
        let mut raw = row("9", "B", "M", "V1", "Cluses", "PM", "DSQ");
        let entry = Entry::from_row(&raw).unwrap();
        assert_eq!(
            entry.total,
            Total::NotFinished { code: "DSQ".to_string(), failed_at: FailedAt::Unknown }
        );
        assert_eq!(entry.total.to_string(), "DSQ ?");
        assert!(entry.time().is_none());

        raw.split2 = "Abs".to_string();
        let entry = Entry::non_finisher(&raw).unwrap();
        assert_eq!(entry.total.to_string(), "DSQ M2");

        // The first missing mark wins
        raw.split1 = String::new();
        let entry = Entry::non_finisher(&raw).unwrap();
        assert_eq!(entry.total.to_string(), "DSQ M1");

        raw.total = String::new();
        let entry = Entry::from_row(&raw).unwrap();
        assert_eq!(entry.total.to_string(), "M1");
    }

    #[test]
    fn test_non_finisher_rejects_finishing_time() {
        let err = Entry::non_finisher(&row("9", "B", "M", "V1", "", "", "58.00")).unwrap_err();
        assert!(matches!(err, RaceError::Validation { field: "total", .. }));
    }
}
