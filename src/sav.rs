// 🎿 SAV Interchange - registrations in, team race out
// Pipe-separated records consumed by the federation timing software

use crate::entry::Sex;
use crate::error::{RaceError, RaceResult};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use tracing::{info, warn};

const SAV_SEPARATOR: char = '|';
const RACE_HEADER_MARKER: &str = "CALEND";
const LICENSE_PREFIX: &str = "FFS";
const TEAM_RACE_SUFFIX: &str = " (Equipes)";

// ============================================================================
// REGISTRATION EXPORT
// ============================================================================

/// One row of the registration sheet (comma separated, with headers).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationRow {
    #[serde(rename = "Nom")]
    pub name: String,

    #[serde(rename = "Prénom")]
    pub surname: String,

    #[serde(rename = "Ville")]
    pub city: String,

    #[serde(rename = "Année de Naissance")]
    pub year_of_birth: String,

    #[serde(rename = "Sexe")]
    pub sex: String,

    #[serde(rename = "Cat")]
    pub category: String,

    #[serde(rename = "Groupe")]
    pub group: String,
}

impl RegistrationRow {
    /// Rows without a group are helpers, officials, etc.
    pub fn is_racer(&self) -> bool {
        !self.group.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavEntry {
    pub name: String,
    pub surname: String,
    pub sex: Sex,
    pub year_of_birth: String,
    pub group: String,
    pub city: String,
    pub category: String,
}

impl SavEntry {
    /// Every field is mandatory for an import record.
    pub fn from_row(row: &RegistrationRow) -> RaceResult<SavEntry> {
        let id = format!("{} {}", row.name.trim(), row.surname.trim());
        let required = |field: &'static str, value: &str| -> RaceResult<String> {
            let value = value.trim();
            if value.is_empty() {
                Err(RaceError::validation(&id, field, "required field is empty"))
            } else {
                Ok(value.to_string())
            }
        };

        let sex = required("sex", &row.sex)?
            .parse::<Sex>()
            .map_err(|message| RaceError::validation(&id, "sex", message))?;

        Ok(SavEntry {
            name: required("name", &row.name)?,
            surname: required("surname", &row.surname)?,
            sex,
            year_of_birth: required("year_of_birth", &row.year_of_birth)?,
            group: required("group", &row.group)?,
            city: required("city", &row.city)?,
            category: required("category", &row.category)?,
        })
    }

    /// The import record; `index` numbers the team registration (from 1).
    pub fn to_line(&self, index: usize) -> String {
        format!(
            "EQU{}|{}|{}|{}|{}|||||||||||{}|{}||||{}|||||||||||||",
            index, self.sex, self.name, self.surname, self.year_of_birth, self.city, self.group, self.category
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SavExport {
    pub lines: Vec<String>,
    pub skipped: usize,
}

/// Registration sheet → SAV import lines.
///
/// Non-racers are skipped and logged; any other invalid row aborts.
pub fn export_registrations<R: Read>(reader: R) -> Result<SavExport> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let mut export = SavExport::default();
    for (index, result) in reader.deserialize().enumerate() {
        let line = index + 2; // 1-indexed + header row
        let row: RegistrationRow = result.with_context(|| format!("Failed to parse registration line {}", line))?;

        if !row.is_racer() {
            warn!(name = %row.name, surname = %row.surname, city = %row.city, "skipping non racer");
            export.skipped += 1;
            continue;
        }

        let entry = SavEntry::from_row(&row).with_context(|| format!("Invalid registration line {}", line))?;
        export.lines.push(entry.to_line(export.lines.len() + 1));
    }

    info!(exported = export.lines.len(), skipped = export.skipped, "registrations exported");
    Ok(export)
}

// ============================================================================
// TEAM RACE REWRITE
// ============================================================================

/// Turn an individual race SAV file into its team race counterpart.
///
/// The race header gets a " (Equipes)" title suffix and every licensed
/// competitor is registered under "Team <club>". Other lines are copied
/// as-is (right-trimmed).
pub fn rewrite_for_teams(input: &str) -> String {
    let mut racers = 0usize;
    let mut output = String::with_capacity(input.len() + 64);

    for line in input.lines() {
        let mut fields: Vec<String> = line.split(SAV_SEPARATOR).map(str::to_string).collect();

        if fields.len() > 30 && fields[5] == RACE_HEADER_MARKER {
            fields[8].push_str(TEAM_RACE_SUFFIX);
        }
        if fields.len() > 40 && fields[1].starts_with(LICENSE_PREFIX) {
            fields[12] = format!("Team {}", fields[9]);
            racers += 1;
        }

        output.push_str(fields.join("|").trim_end());
        output.push('\n');
    }

    info!(racers, "team race rewritten");
    output
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRATIONS: &str = "\
Nom,Prénom,Ville,Année de Naissance,Sexe,Cat,Groupe
DUPONT,Marie,Annecy,1984,F,M1,PM
MARTIN,Paul,Cluses,1995,H,SENIOR,OPEN
DURAND,Luc,Annecy,1970,M,V1,
";

    #[test]
    fn test_export_registrations() {
        let export = export_registrations(REGISTRATIONS.as_bytes()).unwrap();

        assert_eq!(export.skipped, 1);
        assert_eq!(export.lines.len(), 2);
        assert_eq!(
            export.lines[0],
            "EQU1|F|DUPONT|Marie|1984|||||||||||Annecy|PM||||M1|||||||||||||"
        );
        assert!(export.lines[1].starts_with("EQU2|M|MARTIN|Paul|1995|"));
    }

    #[test]
    fn test_export_rejects_incomplete_racer() {
        let input = "Nom,Prénom,Ville,Année de Naissance,Sexe,Cat,Groupe\nDUPONT,Marie,,1984,F,M1,PM\n";
        let err = export_registrations(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let row = RegistrationRow {
            name: "A".to_string(),
            surname: "B".to_string(),
            city: "C".to_string(),
            year_of_birth: "1990".to_string(),
            sex: "X".to_string(),
            category: "SENIOR".to_string(),
            group: "PM".to_string(),
        };
        assert!(matches!(SavEntry::from_row(&row), Err(RaceError::Validation { field: "sex", .. })));
    }

    fn sav_line(len: usize, set: &[(usize, &str)]) -> String {
        let mut fields = vec![String::new(); len];
        for (i, value) in set {
            fields[*i] = value.to_string();
        }
        fields.join("|")
    }

    #[test]
    fn test_rewrite_for_teams() {
        let header = sav_line(32, &[(5, "CALEND"), (8, "Slalom PM")]);
        let racer = sav_line(45, &[(1, "FFS123456"), (9, "Annecy"), (12, "Individuel")]);
        let other = sav_line(45, &[(1, "XYZ"), (9, "Cluses"), (12, "Individuel")]);
        let input = format!("{}\n{}\n{}   \n", header, racer, other);

        let output = rewrite_for_teams(&input);
        let lines: Vec<Vec<&str>> = output.lines().map(|l| l.split('|').collect()).collect();

        assert_eq!(lines[0][8], "Slalom PM (Equipes)");
        assert_eq!(lines[1][12], "Team Annecy");
        assert_eq!(lines[2][12], "Individuel");
        assert!(!output.lines().nth(2).unwrap().ends_with(' '));
    }

    #[test]
    fn test_rewrite_ignores_short_lines() {
        let output = rewrite_for_teams("FFS|CALEND|x\n");
        assert_eq!(output, "FFS|CALEND|x\n");
    }
}
