mod config;
mod db;
mod export;
mod extract;
mod joblog;
mod rates;
mod transform;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use config::{EtlConfig, MissingTablePolicy};
use joblog::JobLog;

#[derive(Parser)]
#[command(name = "bankcap", about = "Largest-banks market-cap ETL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, transform, load to CSV + SQLite, then report
    Run {
        /// Page to extract the market-cap table from
        #[arg(long)]
        url: Option<String>,
        /// Exchange-rate CSV (Currency,Rate with header)
        #[arg(long)]
        rates: Option<PathBuf>,
        /// Output CSV path
        #[arg(long)]
        out: Option<PathBuf>,
        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
        /// Database table name
        #[arg(long)]
        table: Option<String>,
        /// Job log path
        #[arg(long)]
        log: Option<PathBuf>,
        /// What to do when the page has no matching table
        #[arg(long, value_enum, default_value_t = MissingTablePolicy::Continue)]
        on_missing_table: MissingTablePolicy,
    },
    /// Re-run the report queries against an existing database
    Report {
        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
        /// Database table name
        #[arg(long)]
        table: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            url,
            rates,
            out,
            db,
            table,
            log,
            on_missing_table,
        } => {
            let mut cfg = EtlConfig::default();
            if let Some(url) = url {
                cfg.url = url;
            }
            if let Some(rates) = rates {
                cfg.rates_path = rates;
            }
            if let Some(out) = out {
                cfg.csv_path = out;
            }
            if let Some(db) = db {
                cfg.db_path = db;
            }
            if let Some(table) = table {
                cfg.table_name = table;
            }
            if let Some(log) = log {
                cfg.log_path = log;
            }
            cfg.missing_table = on_missing_table;

            run_etl(&cfg).await
        }
        Commands::Report { db, table } => {
            let defaults = EtlConfig::default();
            let db_path = db.unwrap_or(defaults.db_path);
            let table = table.unwrap_or(defaults.table_name);
            report(&db_path, &table)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

/// The full pipeline, strictly sequential: extract → transform → CSV →
/// database load → the three report queries.
async fn run_etl(cfg: &EtlConfig) -> Result<()> {
    let log = JobLog::new(&cfg.log_path);
    log.record("Preliminaries complete. Initiating ETL process")?;
    info!("Extracting from {}", cfg.url);

    let records = extract::extract(&cfg.url, cfg.missing_table, &log).await?;
    log.record("Data extraction complete. Initiating Transformation process")?;

    let rates = rates::ExchangeRates::from_csv_file(&cfg.rates_path)?;
    let enriched = transform::convert(&records, &rates)?;
    log.record("Data transformation complete. Initiating Loading process")?;

    export::save_csv(&enriched, &cfg.csv_path)?;
    log.record("Data saved to CSV file")?;

    let conn = db::connect(&cfg.db_path)?;
    log.record("SQL Connection initiated")?;

    db::replace_table(&conn, &cfg.table_name, &enriched)?;
    log.record("Data loaded to Database as a table, Executing queries")?;

    for query in db::report_queries(&cfg.table_name)? {
        println!("\n{}", query);
        db::run_query(&conn, &query)?.print();
    }
    log.record("Process Complete")?;

    conn.close().map_err(|(_, e)| e)?;
    log.record("Server Connection closed")?;
    log.record("ETL Job Ended")?;
    Ok(())
}

/// Run the three fixed queries against an already-loaded database.
fn report(db_path: &Path, table: &str) -> Result<()> {
    let conn = db::connect(db_path)?;
    for query in db::report_queries(table)? {
        println!("\n{}", query);
        db::run_query(&conn, &query)?.print();
    }
    Ok(())
}
