// 📂 Results Loader - delimited rows → RaceData
// The race is read once into an immutable value and passed by reference

use crate::entry::{Entry, RawRow};
use crate::error::RaceError;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_DELIMITER: u8 = b'\t';

// ============================================================================
// RACE DATA
// ============================================================================

/// Every validated entry of one race, split by finishing status.
///
/// Built once at load time and never mutated; report sections only read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaceData {
    /// Entries with a numeric total, in input order
    pub finishers: Vec<Entry>,
    /// Entries with a DNF/DNS/DSQ marker, in input order
    pub non_finishers: Vec<Entry>,
}

impl RaceData {
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let (finishers, non_finishers) = entries.into_iter().partition(Entry::is_finisher);
        RaceData { finishers, non_finishers }
    }

    pub fn len(&self) -> usize {
        self.finishers.len() + self.non_finishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// LOADING
// ============================================================================

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    /// Abort on the first invalid row instead of skipping it
    pub strict: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: DEFAULT_DELIMITER,
            strict: false,
        }
    }
}

/// A row that could not become an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// 1-based line in the input
    pub line: usize,
    pub error: RaceError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub data: RaceData,
    pub rejected: Vec<RowRejection>,
}

/// Column order: Bib, Name, Sex, Category, Yob, City, Group, M1, M2, Tot
pub fn row_from_record(record: &StringRecord) -> RawRow {
    let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
    RawRow {
        bib: field(0),
        name: field(1),
        sex: field(2),
        category: field(3),
        year_of_birth: field(4),
        city: field(5),
        group: field(6),
        split1: field(7),
        split2: field(8),
        total: field(9),
    }
}

/// Read raw rows (headerless) with their line numbers.
pub fn read_rows<R: Read>(reader: R, delimiter: u8) -> Result<Vec<(usize, RawRow)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read results line {}", index + 1))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line() as usize).unwrap_or(index + 1);
        rows.push((line, row_from_record(&record)));
    }

    Ok(rows)
}

/// Validate rows into entries.
///
/// Invalid rows (and repeated bibs) are logged and collected in
/// `rejected`, unless `strict` is set, in which case the first one aborts.
pub fn load_results<R: Read>(reader: R, options: &LoadOptions) -> Result<LoadOutcome> {
    let rows = read_rows(reader, options.delimiter)?;

    let mut entries = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    let mut bibs = HashSet::new();

    for (line, raw) in rows {
        let result = Entry::from_row(&raw).and_then(|entry| {
            if bibs.insert(entry.bib) {
                Ok(entry)
            } else {
                Err(RaceError::validation(&raw.bib, "bib", "duplicate bib"))
            }
        });

        match result {
            Ok(entry) => {
                if !entry.is_finisher() {
                    info!(bib = entry.bib, name = %entry.name, total = %entry.total, "non-finisher");
                }
                entries.push(entry);
            }
            Err(error) if options.strict => {
                return Err(error).with_context(|| format!("Invalid results line {}", line));
            }
            Err(error) => {
                warn!(line, %error, "row skipped");
                rejected.push(RowRejection { line, error });
            }
        }
    }

    let data = RaceData::from_entries(entries);
    info!(
        finishers = data.finishers.len(),
        non_finishers = data.non_finishers.len(),
        rejected = rejected.len(),
        "results loaded"
    );

    Ok(LoadOutcome { data, rejected })
}

pub fn load_results_file(path: &Path, options: &LoadOptions) -> Result<LoadOutcome> {
    let file = File::open(path).with_context(|| format!("Failed to open results file: {}", path.display()))?;
    load_results(file, options).with_context(|| format!("Failed to load {}", path.display()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{FailedAt, Total};

    const RESULTS: &str = "\
12\tDUPONT Marie\tF\tM1\t1984\tAnnecy\tPM\t30.12\t1:01.40\t1:32.65
3\tMARTIN Paul\tH\tSENIOR\t1995\tCluses\tOPEN\t28.00\t58.10\t1:27.90

7\tDURAND Luc\tM\tV1\t1970\tAnnecy\tPM\t31.00\tDSQ\tDSQ
9\t\tM\tV1\t1971\tAnnecy\tPM\t31.00\t1:00.00\t1:30.00
";

    #[test]
    fn test_read_rows() {
        let rows = read_rows(RESULTS.as_bytes(), b'\t').unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].1.name, "DUPONT Marie");
        assert_eq!(rows[1].1.total, "1:27.90");
        assert_eq!(rows[2].0, 4);
    }

    #[test]
    fn test_load_splits_finishers() {
        let outcome = load_results(RESULTS.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(outcome.data.finishers.iter().map(|e| e.bib).collect::<Vec<_>>(), vec![12, 3]);
        assert_eq!(outcome.data.non_finishers.len(), 1);
        assert_eq!(
            outcome.data.non_finishers[0].total,
            Total::NotFinished { code: "DSQ".to_string(), failed_at: FailedAt::Split2 }
        );
        assert_eq!(outcome.data.len(), 3);

        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].line, 5);
        assert!(outcome.rejected[0].error.is_validation());
    }

    #[test]
    fn test_strict_aborts() {
        let options = LoadOptions { strict: true, ..LoadOptions::default() };
        let err = load_results(RESULTS.as_bytes(), &options).unwrap_err();
        assert!(err.to_string().contains("line 5"));
    }

    #[test]
    fn test_duplicate_bib_rejected() {
        let input = "1;A;M;SENIOR;1990;X;PM;;;1:00.00\n1;B;F;SENIOR;1991;Y;PM;;;1:01.00\n";
        let options = LoadOptions { delimiter: b';', strict: false };
        let outcome = load_results(input.as_bytes(), &options).unwrap();

        assert_eq!(outcome.data.finishers.len(), 1);
        assert_eq!(outcome.data.finishers[0].name, "A");
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn test_bad_marks_become_rejections() {
        let input = "\
1\tA\tM\tSENIOR\t1990\tX\tPM\t1:2:3.00\t1:00.00\t1:30.00
2\tB\tF\tSENIOR\t1991\tY\tPM\t30.00\t1:00.00\t3074457345618259:00.00
3\tC\tF\tSENIOR\t1992\tY\tPM\t30.00\t1:00.00\t1:31.00
";
        let outcome = load_results(input.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(outcome.data.finishers.iter().map(|e| e.bib).collect::<Vec<_>>(), vec![3]);
        assert_eq!(outcome.rejected.iter().map(|r| r.line).collect::<Vec<_>>(), vec![1, 2]);
        assert!(outcome.rejected.iter().all(|r| matches!(r.error, RaceError::Format(_))));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let input = "4\tA\tF\tSNOW\n";
        let outcome = load_results(input.as_bytes(), &LoadOptions::default()).unwrap();
        // Missing total is a non-finish with no split information
        assert_eq!(outcome.data.non_finishers[0].total.to_string(), "M1");
    }
}
