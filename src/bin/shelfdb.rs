//! shelfdb admin CLI
//!
//! Inspects, verifies, dumps, queries and compacts the journals of a data
//! directory. Only `compact` rewrites files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use shelfdb::entity::{Account, Book, Entity, SchemaVersion, Transaction, TransactionCounter};
use shelfdb::journal::{scratch_path, JournalReader, JournalRecovery};
use shelfdb::{query, Config, KeyOrder, Limit, Predicate, Result, StoreError, Table};
use tracing_subscriber::{fmt, EnvFilter};

/// shelfdb admin tool
#[derive(Parser, Debug)]
#[command(name = "shelfdb")]
#[command(about = "Inspect and maintain shelfdb journals")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, global = true, default_value = "./shelfdb_data")]
    data_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Delete scratch files left by interrupted compactions instead of failing
    #[arg(long, global = true)]
    discard_interrupted_compaction: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Live record count and journal size of every table
    Inspect,

    /// Replay every journal without rewriting it
    Verify,

    /// Rewrite every journal down to its live records
    Compact,

    /// Print the raw records of a journal in file order
    Dump {
        /// Table name
        table: String,
    },

    /// Query a table
    Find {
        /// Table name
        table: String,

        /// Clause `field=value`; repeat for several
        #[arg(short, long = "where", value_name = "FIELD=VALUE")]
        clauses: Vec<String>,

        /// Maximum number of matches, taken in the table's key order
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Tables of a data directory and their key orders
const TABLES: [(&str, KeyOrder); 5] = [
    (SchemaVersion::TABLE, SchemaVersion::ORDER),
    (Account::TABLE, Account::ORDER),
    (Book::TABLE, Book::ORDER),
    (TransactionCounter::TABLE, TransactionCounter::ORDER),
    (Transaction::TABLE, Transaction::ORDER),
];

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing/logging
    let default_filter = if args.verbose { "info,shelfdb=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .discard_interrupted_compaction(args.discard_interrupted_compaction)
        .build();

    let outcome = match &args.command {
        Commands::Inspect => inspect(&config),
        Commands::Verify => verify(&config),
        Commands::Compact => compact(&config),
        Commands::Dump { table } => dump(&config, table),
        Commands::Find {
            table,
            clauses,
            limit,
        } => find(&config, table, clauses, *limit),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn inspect(config: &Config) -> Result<bool> {
    println!("{:<16} {:>8} {:>8} {:>10}", "table", "live", "records", "bytes");
    for (name, _) in TABLES {
        let path = config.journal_path(name);
        if !path.exists() {
            println!("{:<16} {:>8} {:>8} {:>10}", name, "-", "-", "-");
            continue;
        }
        let bytes = std::fs::metadata(&path)?.len();
        let stats = JournalRecovery::verify(&path)?;
        println!(
            "{:<16} {:>8} {:>8} {:>10}",
            name, stats.live, stats.records, bytes
        );
    }
    Ok(true)
}

fn verify(config: &Config) -> Result<bool> {
    let mut healthy = true;
    for (name, _) in TABLES {
        let path = config.journal_path(name);
        let scratch = scratch_path(&path);
        if scratch.exists() {
            println!("{}: interrupted compaction ({} present)", name, scratch.display());
            healthy = false;
        }
        if !path.exists() {
            println!("{}: no journal", name);
            continue;
        }
        match JournalRecovery::verify(&path) {
            Ok(stats) => println!(
                "{}: ok ({} records, {} upserts, {} tombstones, {} rekeys, {} live{})",
                name,
                stats.records,
                stats.upserts,
                stats.tombstones,
                stats.rekeys,
                stats.live,
                if stats.torn_tail { ", torn tail" } else { "" }
            ),
            Err(e) => {
                println!("{}: FAILED: {}", name, e);
                healthy = false;
            }
        }
    }
    Ok(healthy)
}

fn compact(config: &Config) -> Result<bool> {
    for (name, order) in TABLES {
        if !config.journal_path(name).exists() {
            continue;
        }
        let mut table = Table::open(config, name, order)?;
        let replayed = table.replay_stats().records;
        println!("{}: {} records -> {} live", name, replayed, table.len());
        table.close()?;
    }
    Ok(true)
}

fn dump(config: &Config, table: &str) -> Result<bool> {
    table_order(table)?;
    let reader = JournalReader::open(&config.journal_path(table))?;
    for record in reader {
        println!("{}", record?.encode()?);
    }
    Ok(true)
}

fn find(config: &Config, table: &str, clauses: &[String], limit: Option<usize>) -> Result<bool> {
    let order = table_order(table)?;

    let mut predicate = Predicate::new();
    for clause in clauses {
        let (field, matcher) = query::parse_clause(clause)?;
        predicate = predicate.with(field, matcher);
    }

    let (live, _) = JournalRecovery::recover(&config.journal_path(table))?;
    for (id, fields) in query::find_many(&live, order, &predicate, Limit::from(limit)) {
        println!("{}\t{}", id, serde_json::to_string(&fields)?);
    }
    Ok(true)
}

fn table_order(table: &str) -> Result<KeyOrder> {
    TABLES
        .iter()
        .find(|(name, _)| *name == table)
        .map(|(_, order)| *order)
        .ok_or_else(|| StoreError::Config(format!("unknown table '{}'", table)))
}
