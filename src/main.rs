//! Command-line entry point: reads the input CSV, runs both vendors over
//! every row, and writes the enriched CSV.

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use company_enrich::config::Config;
use company_enrich::enrichment::{enrich_row, vendor_matched};
use company_enrich::models::FieldMapping;
use company_enrich::retry::per_call_delay;
use company_enrich::services::{ApolloClient, ZoomInfoClient};
use company_enrich::table::{self, InputTable};

/// Company enrichment via ZoomInfo + Apollo.
#[derive(Parser)]
#[command(
    name = "company-enrich",
    version,
    about = "Enrich a CSV of companies with ZoomInfo and Apollo data."
)]
struct Cli {
    /// Path to input CSV.
    #[arg(short, long)]
    input: PathBuf,

    /// Path to output CSV.
    #[arg(short, long)]
    output: PathBuf,

    /// Path to YAML config (optional).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CRM accounts CSV used to backfill blank website cells (optional).
    #[arg(long)]
    crm_accounts: Option<PathBuf>,

    /// JSON object renaming output columns (optional).
    #[arg(long)]
    rename: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "company_enrich=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let mut input = InputTable::read(&cli.input)
        .with_context(|| format!("failed to read input CSV {}", cli.input.display()))?;
    if input.is_empty() {
        println!("No rows processed; nothing to write.");
        return Ok(());
    }
    tracing::info!("loaded {} rows from {}", input.len(), cli.input.display());

    let mut mapping = config.mapping.clone();
    if mapping.is_unbound() {
        if io::stdin().is_terminal() {
            prompt_for_mapping(&mut mapping, input.headers())?;
        } else {
            tracing::warn!(
                "no field mapping configured and stdin is not a terminal; every lookup will be skipped"
            );
        }
    }

    if let Some(crm_path) = cli.crm_accounts.as_deref() {
        let crm_domains = table::load_crm_domains(crm_path, &config.crm_backfill)
            .with_context(|| format!("failed to read CRM accounts CSV {}", crm_path.display()))?;
        let filled = input.backfill_websites(&mapping, &crm_domains);
        tracing::info!(
            "backfilled {} website cells from {}",
            filled,
            crm_path.display()
        );
    }

    let zoominfo = ZoomInfoClient::new(&config)?;
    let apollo = ApolloClient::new(&config)?;

    let pacing = per_call_delay(config.rate_limits.zoominfo_per_min)
        .max(per_call_delay(config.rate_limits.apollo_per_min));

    let progress = ProgressBar::new(input.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} rows ({elapsed_precise})")
            .unwrap(),
    );

    let mut out_rows = Vec::with_capacity(input.len());
    for row in input.rows() {
        let enriched = enrich_row(&row, &mapping, &config.output, &zoominfo, &apollo).await;
        tracing::debug!(
            "row {}: zoominfo match={}, apollo match={}",
            out_rows.len() + 1,
            vendor_matched(&enriched, &config.output.prefix_zoominfo),
            vendor_matched(&enriched, &config.output.prefix_apollo)
        );
        out_rows.push(enriched);
        progress.inc(1);
        if !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
    }
    progress.finish_and_clear();

    let zi_matches = out_rows
        .iter()
        .filter(|row| vendor_matched(row, &config.output.prefix_zoominfo))
        .count();
    let ap_matches = out_rows
        .iter()
        .filter(|row| vendor_matched(row, &config.output.prefix_apollo))
        .count();
    tracing::info!(
        "enriched {} rows: {} ZoomInfo matches, {} Apollo matches",
        out_rows.len(),
        zi_matches,
        ap_matches
    );

    let rename = match cli.rename.as_deref() {
        Some(path) => table::load_rename_map(path)
            .with_context(|| format!("failed to read rename map {}", path.display()))?,
        None => Default::default(),
    };

    let columns = table::output_columns(
        input.headers(),
        config.output.include_input_columns,
        &out_rows,
    );
    table::write_output(&cli.output, &columns, &rename, &out_rows)
        .with_context(|| format!("failed to write output CSV {}", cli.output.display()))?;
    tracing::info!(
        "wrote {} columns x {} rows to {}",
        columns.len(),
        out_rows.len(),
        cli.output.display()
    );
    println!("Wrote {}", cli.output.display());

    Ok(())
}

/// Asks the user to bind each lookup role to an input column. Blank or
/// out-of-range answers leave the role unbound; end of input stops early.
fn prompt_for_mapping(mapping: &mut FieldMapping, columns: &[String]) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("No mapping provided; select columns by number or press Enter to skip.");
    for role in FieldMapping::ROLES {
        println!("Select column for {}:", role);
        for (i, column) in columns.iter().enumerate() {
            println!("  [{}] {}", i, column);
        }
        print!("Enter number (or blank to skip): ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let selection = line?
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&i| i < columns.len());
        mapping.bind(role, selection.map(|i| columns[i].clone()));
    }
    Ok(())
}
