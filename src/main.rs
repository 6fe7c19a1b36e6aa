use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use race_rankings::{
    export_registrations, load_results_file, render_json, rewrite_for_teams, LoadOptions,
    ReportConfig, ReportGenerator, TextRenderer,
};

/// Command-line arguments for race-rankings
#[derive(Parser, Debug)]
#[command(name = "race-rankings")]
#[command(about = "Award rankings for timed multi-lap races")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Produce every configured ranking from a results file
    Report {
        /// Results file: Bib, Name, Sex, Category, Yob, City, Group, M1, M2, Tot
        input: PathBuf,

        /// Column delimiter ("tab" or a single character)
        #[arg(short, long, default_value = "tab", value_parser = parse_delimiter)]
        delimiter: u8,

        /// JSON report configuration (default: built-in championship layout)
        #[arg(short, long, env = "RACE_RANKINGS_CONFIG")]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Abort on the first invalid row
        #[arg(long)]
        strict: bool,
    },
    /// Convert a registration sheet (CSV) into SAV import lines
    SavExport {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rewrite an individual race SAV file for the team race
    SavTeams {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default report configuration as JSON
    InitConfig {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    // Logs go to stderr, stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Report { input, delimiter, config, format, output, strict } => {
            run_report(&input, delimiter, config.as_deref(), format, output.as_deref(), strict)
        }
        Command::SavExport { input, output } => run_sav_export(&input, output.as_deref()),
        Command::SavTeams { input, output } => run_sav_teams(&input, output.as_deref()),
        Command::InitConfig { output } => {
            let json = ReportConfig::default().to_json_pretty()?;
            write_output(output.as_deref(), |out| writeln!(out, "{}", json))
        }
    }
}

fn run_report(
    input: &Path,
    delimiter: u8,
    config_path: Option<&Path>,
    format: Format,
    output: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            info!("Loading report configuration from {}", path.display());
            ReportConfig::from_file(path)?
        }
        None => ReportConfig::default(),
    };

    let options = LoadOptions { delimiter, strict };
    let outcome = load_results_file(input, &options)?;
    if outcome.data.is_empty() {
        bail!("No valid entries in {}", input.display());
    }

    let report = ReportGenerator::new(&config).generate(&outcome.data);

    match format {
        Format::Text => {
            let renderer = TextRenderer::new(&config.labels);
            write_output(output, |out| renderer.render(&report, out))
        }
        Format::Json => {
            let source = input.display().to_string();
            let json = render_json(&report, &source, chrono::Utc::now())?;
            write_output(output, |out| writeln!(out, "{}", json))
        }
    }
}

fn run_sav_export(input: &Path, output: Option<&Path>) -> Result<()> {
    let file = File::open(input).with_context(|| format!("Failed to open registrations: {}", input.display()))?;
    let export = export_registrations(file)?;

    write_output(output, |out| {
        for line in &export.lines {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    })
}

fn run_sav_teams(input: &Path, output: Option<&Path>) -> Result<()> {
    let content = fs::read_to_string(input).with_context(|| format!("Can not read race file {}", input.display()))?;
    let rewritten = rewrite_for_teams(&content);
    write_output(output, |out| out.write_all(rewritten.as_bytes()))
}

/// Run `write` against the output file, or stdout when none is given.
fn write_output<F>(path: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write(&mut out).with_context(|| format!("Failed to write {}", path.display()))?;
            out.flush()?;
            info!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write(&mut out).context("Failed to write to stdout")?;
            out.flush()?;
        }
    }
    Ok(())
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ if value.len() == 1 && value.is_ascii() => Ok(value.as_bytes()[0]),
        _ => Err(format!("delimiter must be \"tab\" or a single ASCII character, got {:?}", value)),
    }
}
