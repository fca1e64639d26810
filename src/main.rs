// Open Pockets - CLI
// Import FEC bulk drops, resolve candidate names and print money reports

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use open_pockets::remote::{CandidateRegistry, TextGenerator};
use open_pockets::resolver::CandidateSelector;
use open_pockets::summary::format_money;
use open_pockets::{
    open_store, render_text, run_manifest, summarize, CandidateResolver, ChatCompletionClient, CommitteeConnection,
    Config, ContributionAggregator, DisambiguationMode, DisambiguationPolicy, FecClient, ImportManifest,
    LittleSisClient, RecordLinker, RegistryCandidate, ReportAssembler, SummaryInput,
};
use rusqlite::Connection;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "open-pockets")]
#[command(about = "Follow the money behind a federal candidate")]
struct Cli {
    /// SQLite store (overrides OPEN_POCKETS_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Pick among several registry matches by hand
    #[arg(long, global = true)]
    interactive: bool,

    /// Never call the remote registry (overrides OPEN_POCKETS_OFFLINE)
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the files listed in a JSON manifest
    Import { manifest: PathBuf },

    /// Resolve a name to a candidate id
    Resolve { name: String },

    /// Committees linked to a candidate
    Committees { name: String },

    /// Contributors and industry totals for a candidate
    Contributions {
        name: String,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Full money report
    Report {
        name: String,
        #[arg(long)]
        json: bool,
        /// Look up PAC sponsors in the entity graph
        #[arg(long)]
        enrich: bool,
    },

    /// Narrative summary of the contributions
    Summary { name: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if cli.interactive {
        config.disambiguation = DisambiguationMode::Interactive;
    }
    if cli.offline {
        config.offline = true;
    }

    let conn = open_store(&config.db_path)
        .with_context(|| format!("Cannot open store at {}", config.db_path.display()))?;
    info!(db = %config.db_path.display(), "store opened");

    match &cli.command {
        Command::Import { manifest } => run_import(&conn, manifest),
        Command::Resolve { name } => run_resolve(&conn, &config, name),
        Command::Committees { name } => {
            let id = resolve_or_bail(&conn, &config, name)?;
            run_committees(&conn, &id)
        }
        Command::Contributions { name, top } => {
            let id = resolve_or_bail(&conn, &config, name)?;
            run_contributions(&conn, &id, *top)
        }
        Command::Report { name, json, enrich } => {
            let id = resolve_or_bail(&conn, &config, name)?;
            run_report(&conn, &config, &id, *json, *enrich)
        }
        Command::Summary { name } => {
            let id = resolve_or_bail(&conn, &config, name)?;
            run_summary(&conn, &config, &id)
        }
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Numbered list on stdout, selection from stdin. Blank input or `q` cancels.
struct StdinSelector;

impl CandidateSelector for StdinSelector {
    fn select(&self, query: &str, candidates: &[RegistryCandidate]) -> open_pockets::Result<Option<usize>> {
        println!("\nSeveral candidates match '{}':", query);
        for (i, c) in candidates.iter().enumerate() {
            let years: Vec<String> = c.election_years.iter().map(|y| y.to_string()).collect();
            println!(
                "  {}. {} ({}) office={} party={} years=[{}]",
                i + 1,
                c.name,
                c.candidate_id,
                c.office.as_deref().unwrap_or("?"),
                c.party.as_deref().unwrap_or("?"),
                years.join(", ")
            );
        }

        let stdin = io::stdin();
        loop {
            print!("Select 1-{} (blank to cancel): ", candidates.len());
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim();
            if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=candidates.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => println!("Not a valid choice: {}", answer),
            }
        }
    }
}

fn resolve_id(conn: &Connection, config: &Config, name: &str) -> Result<Option<String>> {
    let fec = if config.offline {
        None
    } else {
        Some(FecClient::new(&config.fec, config.http_timeout_secs)?)
    };

    let mut resolver = CandidateResolver::new(conn);
    if let Some(fec) = &fec {
        let policy = match config.disambiguation {
            DisambiguationMode::Auto => DisambiguationPolicy::AutoSelect,
            DisambiguationMode::Interactive => DisambiguationPolicy::Explicit(Box::new(StdinSelector)),
        };
        resolver = resolver.with_registry(fec as &dyn CandidateRegistry, policy, config.fec.per_page);
    }

    match resolver.resolve_detailed(name)? {
        Some(resolution) => {
            if resolution.is_low_confidence() {
                eprintln!("⚠️  Low-confidence match for '{}' ({:?})", name, resolution.resolved_by);
            }
            Ok(Some(resolution.candidate_id))
        }
        None => Ok(None),
    }
}

fn resolve_or_bail(conn: &Connection, config: &Config, name: &str) -> Result<String> {
    match resolve_id(conn, config, name)? {
        Some(id) => Ok(id),
        None => bail!("No candidate found for '{}'", name),
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_import(conn: &Connection, manifest_path: &Path) -> Result<()> {
    println!("🗄️  Import - FEC bulk files → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let manifest = ImportManifest::from_file(manifest_path)
        .with_context(|| format!("Cannot read manifest {}", manifest_path.display()))?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let reports = run_manifest(conn, &manifest, base_dir)?;
    for report in &reports {
        println!(
            "✓ {:<26} {:>9} loaded {:>6} skipped  {}",
            report.source_kind.name(), report.rows_loaded, report.rows_skipped, report.file_path
        );
    }

    let loaded: u64 = reports.iter().map(|r| r.rows_loaded).sum();
    let skipped: u64 = reports.iter().map(|r| r.rows_skipped).sum();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {} files, {} rows loaded, {} skipped", reports.len(), loaded, skipped);

    Ok(())
}

fn run_resolve(conn: &Connection, config: &Config, name: &str) -> Result<()> {
    match resolve_id(conn, config, name)? {
        Some(id) => println!("{}", id),
        None => println!("❌ No candidate found for '{}'", name),
    }
    Ok(())
}

fn run_committees(conn: &Connection, candidate_id: &str) -> Result<()> {
    let linker = RecordLinker::new(conn);
    let linked = linker.linked_committees(candidate_id)?;

    println!("🏛️  Committees linked to {} ({})", candidate_id, linked.len());
    let mut shown = HashSet::new();
    for link in &linked {
        let details = linker.committee_details(&link.committee_id, Some(link.year))?;
        let name = details.as_ref().map(|d| d.committee.name.as_str()).unwrap_or("(unknown committee)");
        let pac = if details.as_ref().map(|d| d.is_pac).unwrap_or(false) { " PAC" } else { "" };
        println!(
            "  {} {:<40} {} {}/{} {}{}",
            link.year, name, link.committee_id, link.type_code, link.designation_code, link.source, pac
        );

        if pac.is_empty() || !shown.insert(link.committee_id.clone()) {
            continue;
        }
        for other in linker.connected_committees(&link.committee_id)? {
            let via = match &other.connection {
                CommitteeConnection::CandidateRelationship { candidate_id } => format!("candidate {}", candidate_id),
                CommitteeConnection::SameOrganization { organization } => format!("organization {}", organization),
            };
            println!("      ↳ connected: {} ({}) via {}", other.committee.name, other.committee.id, via);
        }
    }

    Ok(())
}

fn run_contributions(conn: &Connection, candidate_id: &str, top: usize) -> Result<()> {
    let aggregator = ContributionAggregator::new(conn);

    println!("💵 Top contributors to {}", candidate_id);
    for c in aggregator.top_contributors(candidate_id, top)? {
        println!("  {:<45} {:>16} {:<4} {}", c.name, format_money(c.amount), c.entity_type, c.industry);
    }

    println!("\n🏷️  By industry (institutional contributors)");
    for total in aggregator.totals_by_industry(candidate_id)? {
        println!("  {:<10} {:>16}", total.industry, format_money(total.total));
    }

    let totals = aggregator.contribution_totals(candidate_id)?;
    println!(
        "\n💰 Total: {} across {} rows",
        format_money(totals.combined_total),
        totals.combined_count
    );

    Ok(())
}

fn run_report(conn: &Connection, config: &Config, candidate_id: &str, json: bool, enrich: bool) -> Result<()> {
    let lookup = if enrich {
        Some(LittleSisClient::new(&config.entity_graph_base_url, config.http_timeout_secs)?)
    } else {
        None
    };

    let mut assembler = ReportAssembler::new(conn);
    if let Some(lookup) = &lookup {
        assembler = assembler.with_entity_lookup(lookup);
    }
    let report = assembler.build_report(candidate_id);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_text(&report));
    }

    Ok(())
}

fn run_summary(conn: &Connection, config: &Config, candidate_id: &str) -> Result<()> {
    let generator = match &config.llm {
        Some(llm) => Some(ChatCompletionClient::new(llm, config.http_timeout_secs)?),
        None => None,
    };

    let input = SummaryInput::for_candidate(&ContributionAggregator::new(conn), candidate_id)?;
    let summary = summarize(&input, generator.as_ref().map(|g| g as &dyn TextGenerator));

    println!("{}", summary.text);
    info!(source = ?summary.source, "summary produced");

    Ok(())
}
