mod export;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use csindex_core::tables::load_researchers;
use csindex_core::{
    BibliographicEntry, BibliographySource, ClassificationPolicy, Decision, LinkResolver,
    MalformedPolicy, NoLinkResolver, PolicyContext, PolicyTables, Researcher, RunConfig,
    RunDriver, TriageLog,
};
use csindex_science::{ArxivClient, ArxivLinkResolver, DblpSource, LinkCache};

use crate::export::OutputFiles;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "csindex",
    about = "Department publication ranking from DBLP records",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.config/csindex/config.toml or $CSINDEX_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output in JSON format. Also enabled by setting CSINDEX_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Log per-entry decisions (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every researcher of the roster and write the output tables.
    Run {
        /// Research area prefix (overrides run.area).
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        first_year: Option<i32>,
        #[arg(long)]
        last_year: Option<i32>,
        /// Skip arXiv lookups; every paper gets the `none` link.
        #[arg(long)]
        no_arxiv: bool,
        /// Skip malformed records instead of aborting.
        #[arg(long)]
        skip_malformed: bool,
    },

    /// Evaluate one researcher's cached DBLP records and print each decision.
    Classify {
        /// Researcher name or DBLP pid, as listed in the roster.
        researcher: String,
        #[arg(long)]
        area: Option<String>,
        /// Print accepted entries only.
        #[arg(long)]
        accepted: bool,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Write the default configuration file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json_output = cli.json || std::env::var("CSINDEX_JSON").as_deref() == Ok("1");
    let config_path = cli.config.clone().unwrap_or_else(RunConfig::config_path);

    match cli.command {
        Commands::Run {
            area,
            first_year,
            last_year,
            no_arxiv,
            skip_malformed,
        } => {
            let mut config = load_config(&config_path)?;
            if let Some(area) = area {
                config.run.area = area;
            }
            if let Some(year) = first_year {
                config.run.first_year = year;
            }
            if let Some(year) = last_year {
                config.run.last_year = year;
            }
            if no_arxiv {
                config.arxiv.enabled = false;
            }
            if skip_malformed {
                config.run.on_malformed = MalformedPolicy::Skip;
            }
            config.validate()?;
            run_pipeline(&config, json_output).await?;
        }

        Commands::Classify {
            researcher,
            area,
            accepted,
        } => {
            let mut config = load_config(&config_path)?;
            if let Some(area) = area {
                config.run.area = area;
            }
            classify(&config, &researcher, accepted, json_output).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(&config_path)?;
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "path": config_path, "config": config }
                    }))?;
                } else {
                    println!("# {}", config_path.display());
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        config_path.display()
                    );
                }
                RunConfig::default().save_to(&config_path)?;
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":config_path}}))?;
                } else {
                    println!("Wrote {}", config_path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Commands ───────────────────────────────────────────────────────────────

async fn run_pipeline(config: &RunConfig, json_output: bool) -> Result<()> {
    let start = Instant::now();
    let tables = PolicyTables::load(config).context("loading policy tables")?;
    let registry = tables.registry.clone();
    let researchers = load_researchers(&config.researchers_path())
        .with_context(|| format!("loading {}", config.researchers_path().display()))?;
    info!(
        "area {}: {} venues, {} researchers, years {}..={}",
        config.run.area,
        registry.len(),
        researchers.len(),
        config.run.first_year,
        config.run.last_year
    );

    let output = OutputFiles::new(&config.paths.output_dir, &config.run.area);
    output.clear_professor_files()?;

    let ctx = PolicyContext::new(config, tables);
    let source = DblpSource::new(
        &config.dblp.base_url,
        config.dblp_cache_dir(),
        Duration::from_millis(config.dblp.min_interval_ms),
        Duration::from_secs(config.dblp.timeout_secs),
    )?;

    let outcome = if config.arxiv.enabled {
        let client = ArxivClient::with_params(
            &config.arxiv.base_url,
            Duration::from_millis(config.arxiv.min_interval_ms),
            Duration::from_secs(config.arxiv.timeout_secs),
        )?;
        let cache = LinkCache::load(config.arxiv_cache_path())?;
        let resolver = ArxivLinkResolver::new(client, cache)
            .with_threshold(config.arxiv.similarity_threshold);
        drive(config, &ctx, source, resolver, &researchers).await?
    } else {
        drive(config, &ctx, source, NoLinkResolver, &researchers).await?
    };

    let written = output.write_all(&outcome, &registry, config.run.professor_table_limit)?;
    let dur = start.elapsed().as_millis();

    if json_output {
        print_json(&serde_json::json!({
            "status": "ok",
            "data": {
                "area": config.run.area,
                "stats": outcome.stats,
                "papers": outcome.store.len(),
                "scores": outcome.store.department_scores(),
                "unresolved": outcome.unresolved,
                "written": written,
            },
            "meta": { "duration_ms": dur }
        }))?;
    } else {
        println!(
            "{} papers from {} of {} researchers ({} entries rejected)",
            outcome.store.len(),
            outcome.stats.active_researchers,
            outcome.stats.researchers,
            outcome.stats.rejected_entries
        );
        for (dept, score) in outcome.store.department_scores().into_iter().take(10) {
            println!("  {dept:<20} {score:>8.2}");
        }
        if !outcome.unresolved.is_empty() {
            println!(
                "{} entries await manual classification in {}",
                outcome.unresolved.len(),
                config.unresolved_log_path().display()
            );
        }
        println!("Wrote {} files to {}", written.len(), config.paths.output_dir.display());
    }
    Ok(())
}

async fn drive<R: LinkResolver>(
    config: &RunConfig,
    ctx: &PolicyContext,
    source: DblpSource,
    resolver: R,
    researchers: &[Researcher],
) -> Result<csindex_core::RunOutcome> {
    let triage = TriageLog::with_path(config.unresolved_log_path());
    let outcome = RunDriver::new(ctx, source, resolver, triage)
        .with_malformed_policy(config.run.on_malformed)
        .run(researchers)
        .await?;
    Ok(outcome)
}

async fn classify(
    config: &RunConfig,
    query: &str,
    accepted_only: bool,
    json_output: bool,
) -> Result<()> {
    let researchers = load_researchers(&config.researchers_path())
        .with_context(|| format!("loading {}", config.researchers_path().display()))?;
    let Some(researcher) = researchers
        .iter()
        .find(|r| r.name == query || r.pid == query)
    else {
        bail!("{query} is not in {}", config.researchers_path().display());
    };

    let tables = PolicyTables::load(config).context("loading policy tables")?;
    let ctx = PolicyContext::new(config, tables);
    let policy = ClassificationPolicy::new(&ctx);
    let mut source = DblpSource::offline(config.dblp_cache_dir());
    let records = source.records(researcher).await?;

    // Never written: classify must not touch the shared triage file.
    let mut triage = TriageLog::in_memory();
    let mut rows = Vec::new();
    for raw in &records {
        let entry = BibliographicEntry::from_raw(raw);
        let decision = match policy.evaluate(&entry, &mut triage) {
            Ok(decision) => decision,
            Err(e) if e.is_malformed_source() => {
                warn!("{e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if accepted_only && !decision.is_accepted() {
            continue;
        }
        rows.push((entry, decision));
    }

    if json_output {
        let items: Vec<_> = rows
            .iter()
            .map(|(entry, decision)| {
                serde_json::json!({
                    "title": entry.title,
                    "year": entry.year,
                    "url": entry.url,
                    "decision": decision,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "status": "ok",
            "data": {
                "researcher": researcher,
                "records": records.len(),
                "items": items,
                "unresolved": triage.cases(),
            }
        }))?;
    } else {
        println!("{} ({}), {} records", researcher.name, researcher.department, records.len());
        for (entry, decision) in &rows {
            let year = entry.year.map(|y| y.to_string()).unwrap_or_default();
            match decision {
                Decision::Accepted(c) => println!(
                    "  + {year}  {:<12} {:<8} {}",
                    c.venue,
                    c.tier.as_str(),
                    entry.title
                ),
                Decision::Rejected(reason) => {
                    println!("  - {year}  {reason:<30} {}", entry.title)
                }
            }
        }
    }
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::load_from(path).with_context(|| format!("loading config {}", path.display()))
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
