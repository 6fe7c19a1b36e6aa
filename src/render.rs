// 🖨️ Report Rendering - fixed-width text and JSON
// Presentation only: the report is already ranked and cut

use crate::config::Labels;
use crate::report::{EntryLine, Report, ReportBlock, ReportLine, ReportSection};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

const PAGE_WIDTH: usize = 110;
const PAGE_BREAK: &str = "\u{0c}";

// ============================================================================
// TEXT
// ============================================================================

pub struct TextRenderer<'a> {
    labels: &'a Labels,
}

impl<'a> TextRenderer<'a> {
    pub fn new(labels: &'a Labels) -> Self {
        TextRenderer { labels }
    }

    pub fn render<W: Write + ?Sized>(&self, report: &Report, out: &mut W) -> io::Result<()> {
        for block in &report.blocks {
            match block {
                ReportBlock::Section(section) => self.render_section(section, out)?,
                ReportBlock::PageBreak => writeln!(out, "{}", PAGE_BREAK)?,
            }
        }
        Ok(())
    }

    pub fn render_to_string(&self, report: &Report) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.render(report, &mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn render_section<W: Write + ?Sized>(&self, section: &ReportSection, out: &mut W) -> io::Result<()> {
        let rule = "-".repeat(PAGE_WIDTH);
        writeln!(out, "{}", rule)?;
        let Some(title) = &section.title else {
            return writeln!(out);
        };
        writeln!(out, "{:^width$}", title, width = PAGE_WIDTH)?;
        writeln!(out, "{}", rule)?;

        let mut header_pending = true;
        for line in &section.lines {
            match line {
                ReportLine::Entry(entry) => {
                    if header_pending {
                        write_column_header(out)?;
                        header_pending = false;
                    }
                    write_entry(entry, out)?;
                }
                ReportLine::AwardCutoff => {
                    writeln!(out)?;
                    writeln!(out, "{:^width$}", self.labels.not_awarded, width = PAGE_WIDTH)?;
                    writeln!(out)?;
                }
                ReportLine::NoEntries => {
                    writeln!(out, "{}", self.labels.no_entries)?;
                }
                ReportLine::TeamHeader { rank, label } => {
                    writeln!(out, "{}. {}", rank, label)?;
                }
                ReportLine::TeamTotal { total } => {
                    let indent = PAGE_WIDTH - 16;
                    writeln!(out, "{:indent$}{}", "", "-".repeat(16), indent = indent)?;
                    writeln!(out, "{:indent$}{} {:>10}", "", self.labels.team_total, total, indent = indent)?;
                    writeln!(out)?;
                }
            }
        }
        writeln!(out)
    }
}

fn write_column_header<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{:<4} {:<4} {:<28} {:<4} {:<6} {:<5} {:<20} {:<5} {:>8} {:>8} {:>8}",
        "Rang", "Dos", "Nom", "Sexe", "Cat", "Annee", "Ville", "Grp", "M1", "M2", "Tot"
    )?;
    writeln!(out)
}

fn write_entry<W: Write + ?Sized>(entry: &EntryLine, out: &mut W) -> io::Result<()> {
    let split = |i: usize| entry.splits.get(i).map(String::as_str).unwrap_or("");
    writeln!(
        out,
        "{:<4} {:<4} {:<28} {:<4} {:<6} {:<5} {:<20} {:<5} {:>8} {:>8} {:>8}",
        entry.rank,
        entry.bib,
        entry.name,
        entry.sex.code(),
        entry.category,
        entry.year_of_birth,
        entry.city,
        entry.group,
        split(0),
        split(1),
        entry.total
    )
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a str,
    generated_at: DateTime<Utc>,
    blocks: &'a [ReportBlock],
}

/// Pretty JSON with a provenance header.
pub fn render_json(report: &Report, source: &str, generated_at: DateTime<Utc>) -> Result<String> {
    let output = JsonReport {
        source,
        generated_at,
        blocks: &report.blocks,
    };
    serde_json::to_string_pretty(&output).context("Failed to serialize report")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::row;
    use crate::entry::Entry;

    fn entry_line(rank: usize, bib: &str, total: &str) -> ReportLine {
        let entry = Entry::from_row(&row(bib, "DUPONT Marie", "F", "M1", "Annecy", "PM", total)).unwrap();
        ReportLine::Entry(EntryLine::new(rank, &entry))
    }

    fn sample_report() -> Report {
        Report {
            blocks: vec![
                ReportBlock::Section(ReportSection {
                    title: Some("SCRATCH FEMMES".to_string()),
                    lines: vec![entry_line(1, "12", "1:32.65"), ReportLine::AwardCutoff, entry_line(2, "14", "1:40.00")],
                }),
                ReportBlock::PageBreak,
                ReportBlock::Section(ReportSection {
                    title: Some("OPEN".to_string()),
                    lines: vec![ReportLine::NoEntries],
                }),
                ReportBlock::Section(ReportSection { title: None, lines: Vec::new() }),
            ],
        }
    }

    #[test]
    fn test_text_layout() {
        let labels = Labels::default();
        let text = TextRenderer::new(&labels).render_to_string(&sample_report());

        assert!(text.contains("SCRATCH FEMMES"));
        assert!(text.contains("Rang Dos  Nom"));
        assert!(text.contains("1:32.65"));
        assert!(text.contains(&labels.not_awarded));
        assert!(text.contains(&labels.no_entries));
        assert!(text.contains(PAGE_BREAK));

        let first_row = text.lines().find(|l| l.starts_with("1 ")).unwrap();
        assert!(first_row.starts_with("1    12   DUPONT Marie"));
        assert!(first_row.ends_with(" 1:32.65"));

        // Only one column header even with an award cutoff in between
        assert_eq!(text.matches("Rang").count(), 1);
    }

    #[test]
    fn test_team_lines() {
        let labels = Labels::default();
        let report = Report {
            blocks: vec![ReportBlock::Section(ReportSection {
                title: Some("PAR VILLES".to_string()),
                lines: vec![
                    ReportLine::TeamHeader { rank: 1, label: "Annecy".to_string() },
                    entry_line(1, "12", "1:32.65"),
                    ReportLine::TeamTotal { total: "4:40.00".to_string() },
                ],
            })],
        };
        let text = TextRenderer::new(&labels).render_to_string(&report);
        assert!(text.contains("1. Annecy"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("TOT:") && l.ends_with("4:40.00")));
    }

    #[test]
    fn test_json_output() {
        let generated_at = DateTime::parse_from_rfc3339("2026-02-01T10:00:00Z").unwrap().with_timezone(&Utc);
        let json = render_json(&sample_report(), "EDITION.txt", generated_at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["source"], "EDITION.txt");
        assert_eq!(value["blocks"][0]["type"], "section");
        assert_eq!(value["blocks"][0]["lines"][0]["type"], "entry");
        assert_eq!(value["blocks"][0]["lines"][0]["bib"], 12);
        assert_eq!(value["blocks"][0]["lines"][0]["sex"], "F");
        assert_eq!(value["blocks"][0]["lines"][1]["type"], "award_cutoff");
        assert_eq!(value["blocks"][1]["type"], "page_break");
        assert!(value["blocks"][3]["title"].is_null());
    }
}
