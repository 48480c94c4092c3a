//! # ID Card CLI
//!
//! Renders every person in a JSON file as a card and exports it.
//!
//! ## Usage
//!
//! ```bash
//! idcard --people people.json --out cards pdf
//! idcard --people people.json --out cards --single-side png
//! idcard --people people.json print
//! ```
//!
//! `--people` accepts a single record or an array of records. Export timing
//! comes from `--config` (JSON) overridden by `IDCARD_*` variables.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use card_core::{ExportConfig, PersonFields, QrEndpoint};
use card_export::{CardBoard, CardExporter, DirectorySink, FilePrintHost, SvgFaceRasterizer};
use clap::{Parser, Subcommand};

/// Command-line arguments for idcard.
#[derive(Debug, Clone, Parser)]
#[command(name = "idcard")]
#[command(about = "Export dual-sided ID cards as PDF, PNG or print documents")]
#[command(version)]
pub struct CliArgs {
    /// JSON file holding one person record or an array of them
    #[arg(long, env = "IDCARD_PEOPLE")]
    pub people: PathBuf,

    /// Output directory
    #[arg(long, env = "IDCARD_OUT", default_value = "out")]
    pub out: PathBuf,

    /// Export configuration file (JSON)
    #[arg(long, env = "IDCARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Export the front face only
    #[arg(long)]
    pub single_side: bool,

    /// QR code service base URL
    #[arg(long, env = "IDCARD_QR_ENDPOINT")]
    pub qr_endpoint: Option<String>,

    /// What to export
    #[command(subcommand)]
    pub command: Command,
}

/// Export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// A4 PDF per card
    Pdf,
    /// PNG per card (composite sheet when both sides are exported)
    Png,
    /// Print document per card
    Print,
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Cards attempted.
    pub total: usize,
    /// Cards exported successfully.
    pub succeeded: usize,
}

impl RunSummary {
    /// True if every card exported.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.total == self.succeeded
    }
}

/// Load the export configuration named by the arguments.
///
/// # Errors
///
/// Returns an error if the file cannot be read, an override is malformed,
/// or the result is invalid.
pub fn load_config(args: &CliArgs) -> anyhow::Result<ExportConfig> {
    let config = match &args.config {
        Some(path) => ExportConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ExportConfig::default(),
    };
    let config = config
        .with_env_overrides()
        .context("applying IDCARD_* overrides")?;
    config.validate().context("invalid export configuration")?;
    Ok(config)
}

/// Load the person records named by the arguments.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_people(args: &CliArgs) -> anyhow::Result<Vec<PersonFields>> {
    let json = std::fs::read_to_string(&args.people)
        .with_context(|| format!("reading {}", args.people.display()))?;
    PersonFields::list_from_json(&json)
        .with_context(|| format!("parsing {}", args.people.display()))
}

/// Claim `stem` in `taken`, suffixing `-2`, `-3`, ... if it is already used.
fn unique_stem(taken: &mut HashSet<String>, stem: String) -> String {
    if taken.insert(stem.clone()) {
        return stem;
    }
    let unique = (2..)
        .map(|n| format!("{stem}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_default();
    tracing::warn!(%stem, renamed = %unique, "duplicate output name");
    taken.insert(unique.clone());
    unique
}

/// Render every person and export them one after another.
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded. Failed exports are counted
/// in the summary, not returned as errors.
pub async fn run(args: CliArgs) -> anyhow::Result<RunSummary> {
    let config = load_config(&args)?;
    let people = load_people(&args)?;
    let qr = match &args.qr_endpoint {
        Some(base) => QrEndpoint::new(base, card_core::qr::DEFAULT_QR_SIZE)
            .with_context(|| format!("invalid QR endpoint {base}"))?,
        None => QrEndpoint::default(),
    };
    let both_sides = !args.single_side;

    let board = Arc::new(CardBoard::new());
    let mut stems = HashSet::new();
    let jobs: Vec<(String, String)> = people
        .into_iter()
        .enumerate()
        .map(|(i, person)| {
            let id = format!("card-{}", i + 1);
            let stem = unique_stem(&mut stems, person.file_stem());
            board.insert(id.clone(), person);
            (id, stem)
        })
        .collect();

    tracing::info!(
        cards = jobs.len(),
        out = %args.out.display(),
        command = ?args.command,
        both_sides,
        "starting export"
    );

    let print_delay = config.print_delay();
    let exporter = CardExporter::new(
        board.clone(),
        Arc::new(SvgFaceRasterizer::new(board.clone()).with_qr_endpoint(qr.clone())),
        Arc::new(DirectorySink::new(&args.out)),
        Arc::new(FilePrintHost::new(&args.out).with_auto_print(print_delay)),
    )
    .with_config(config)
    .with_qr_endpoint(qr);

    let succeeded = match args.command {
        Command::Pdf => exporter.generate_pdfs(&jobs, both_sides).await,
        Command::Png => {
            let mut ok = 0;
            for (id, stem) in &jobs {
                if exporter.download_card_image(id, stem, both_sides).await {
                    ok += 1;
                }
            }
            ok
        }
        Command::Print => {
            let mut ok = 0;
            for (id, _) in &jobs {
                if exporter.print_card(id, both_sides).await {
                    ok += 1;
                }
            }
            let printed = exporter.wait_for_prints().await;
            tracing::debug!(printed, "print tasks finished");
            ok
        }
    };

    Ok(RunSummary {
        total: jobs.len(),
        succeeded,
    })
}
