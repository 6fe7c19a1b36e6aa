// Race Rankings - Core Library
// Ranking engine for timed multi-lap races, exposed for the CLI and tests

pub mod error;
pub mod time;
pub mod entry;
pub mod selector;
pub mod ranker;
pub mod aggregate;
pub mod config;
pub mod loader;
pub mod report;
pub mod render;
pub mod sav;            // Registration export / team race rewrite

// Re-export commonly used types
pub use error::{RaceError, RaceResult};
pub use time::{format_time, is_unavailable, parse_time, RaceTime};
pub use entry::{Entry, FailedAt, Mark, RawRow, Sex, Split, Total};
pub use selector::{
    select, select_by_category_and_sex, select_by_city, select_by_city_and_group,
    select_by_group, select_by_sex, list_categories, list_cities, list_groups,
    GroupFilter, Selection,
};
pub use ranker::{sort_by_bib, sort_by_total, Ranked};
pub use aggregate::{aggregate, team_standings, Aggregate, TeamGrouping, TeamSpec};
pub use config::{CategoryDef, Labels, ReportConfig, SectionSpec};
pub use loader::{
    load_results, load_results_file, read_rows, LoadOptions, LoadOutcome, RaceData, RowRejection,
};
pub use report::{EntryLine, Report, ReportBlock, ReportGenerator, ReportLine, ReportSection};
pub use render::{render_json, TextRenderer};
pub use sav::{export_registrations, rewrite_for_teams, RegistrationRow, SavEntry, SavExport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
