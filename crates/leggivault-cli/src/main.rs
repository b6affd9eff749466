//! `leggivault`: index an Italian-law Markdown vault and query it.
//!
//! Every command ingests the vault into an in-memory index first, then
//! answers from it.

mod display;

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use leggivault_core::{LegislativeRecord, vault};
use leggivault_ingest::{IngestReport, Pipeline};
use leggivault_store::{IndexStore, Resolution, edges_to_batch, write_parquet};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "leggivault", version, about, long_about = None)]
struct Cli {
    /// Vault root directory.
    #[arg(long, env = "LEGGIVAULT_VAULT", default_value = "vault", global = true)]
    vault: PathBuf,

    /// Parser threads. Defaults to one per core.
    #[arg(long, env = "LEGGIVAULT_THREADS", global = true)]
    threads: Option<usize>,

    /// Exit with status 2 when any block is rejected.
    #[arg(long, global = true)]
    strict: bool,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest the vault and print the ingest report.
    Ingest,

    /// Show one record.
    Get {
        /// Codice redazionale, e.g. 26G00017.
        codice: String,
    },

    /// Records enacted between two dates, inclusive.
    Range { start: NaiveDate, end: NaiveDate },

    /// Records enacted in a year.
    Year { year: i32 },

    /// Records with a given act number, optionally within one year.
    Numero {
        numero: u32,
        #[arg(long)]
        year: Option<i32>,
    },

    /// Resolved links of one record, or every dangling reference.
    Links {
        codice: Option<String>,
        /// Also list records reachable within this many hops.
        #[arg(long)]
        hops: Option<usize>,
    },

    /// Write `legislation.parquet` and `law_edges.parquet`.
    Export {
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("leggivault v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let pipeline = match cli.threads {
        Some(threads) => Pipeline::with_threads(threads)
            .with_context(|| format!("building a pool of {threads} parser threads"))?,
        None => Pipeline::new(),
    };

    let mut store = IndexStore::new();
    let report = pipeline
        .ingest_dir(&cli.vault, &mut store)
        .with_context(|| format!("ingesting vault {}", cli.vault.display()))?;

    match cli.command {
        Commands::Ingest => print_report(&report, cli.json)?,
        Commands::Get { codice } => {
            let record = store.get(&codice)?;
            if cli.json {
                print_json(record)?;
            } else {
                let batch = vault::records_to_batch([record])?;
                display::print_record_card(&batch)?;
                if let Some(links) = store.links() {
                    display::print_links(&record.codice_redazionale, links, None);
                }
            }
        }
        Commands::Range { start, end } => {
            print_records(&store.query_by_date_range(start, end), cli.json)?
        }
        Commands::Year { year } => print_records(&store.query_by_year(year), cli.json)?,
        Commands::Numero { numero, year } => {
            let records = match year {
                Some(year) => store.find_citation(year, numero),
                None => store.query_by_numero(numero),
            };
            print_records(&records, cli.json)?
        }
        Commands::Links { codice, hops } => {
            let links: &Resolution = &links_of(&store);
            match codice {
                Some(codice) => {
                    let codice = store.get(&codice)?.codice_redazionale.as_str();
                    let reachable = hops.map(|h| links.reachable_within(codice, h));
                    if cli.json {
                        print_json(&LinksView {
                            codice,
                            links: links.get(codice),
                            referenced_by: links.referenced_by(codice).collect(),
                            reachable: reachable.as_ref(),
                        })?;
                    } else {
                        display::print_links(codice, links, reachable.as_ref());
                    }
                }
                None if cli.json => print_json(&links.dangling().collect::<Vec<_>>())?,
                None => display::print_dangling(links),
            }
        }
        Commands::Export { out } => export(&store, &out)?,
    }

    if cli.strict && !report.is_clean() {
        tracing::warn!(failures = report.failures.len(), "strict mode: rejected blocks");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Links materialised by the last ingest, resolved afresh only if the store
/// changed since.
fn links_of(store: &IndexStore) -> Cow<'_, Resolution> {
    match store.links() {
        Some(links) => Cow::Borrowed(links),
        None => Cow::Owned(leggivault_store::resolve(store)),
    }
}

#[derive(Serialize)]
struct LinksView<'a> {
    codice: &'a str,
    links: &'a leggivault_store::RecordLinks,
    referenced_by: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reachable: Option<&'a std::collections::BTreeMap<String, usize>>,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &IngestReport, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(report);
    }
    display::print_report(report);
    Ok(())
}

fn print_records(records: &[&LegislativeRecord], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(records);
    }
    let batch = vault::records_to_batch(records.iter().copied())?;
    display::print_record_table(&batch)
}

fn export(store: &IndexStore, out: &Path) -> anyhow::Result<()> {
    let legislation = vault::records_to_batch(store.list_all())?;
    let path = out.join(format!("{}.parquet", vault::LEGISLATION_TABLE));
    write_parquet(&path, &legislation).with_context(|| format!("writing {}", path.display()))?;

    let edges = edges_to_batch(&links_of(store))?;
    let path = out.join(format!("{}.parquet", vault::LAW_EDGES_TABLE));
    write_parquet(&path, &edges).with_context(|| format!("writing {}", path.display()))?;

    println!(
        "Exported {} records and {} edges to {}",
        legislation.num_rows(),
        edges.num_rows(),
        out.display()
    );
    Ok(())
}
