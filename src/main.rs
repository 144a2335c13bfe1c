use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use registration_analytics::analytics::top_manufacturers;
use registration_analytics::analytics::FactFilter;
use registration_analytics::analytics::Kpis;
use registration_analytics::analytics::MarketInsights;
use registration_analytics::analytics::Share;
use registration_analytics::analytics::DEFAULT_TOP_MANUFACTURERS;
use registration_analytics::config::DEFAULT_DATABASE;
use registration_analytics::config::DEFAULT_DATA_DIR;
use registration_analytics::extract::DEFAULT_HEADER_ROWS;
use registration_analytics::growth::GrowthRow;
use registration_analytics::storage::DEFAULT_TABLE;
use registration_analytics::{compute_growth, load_fact_table, Config, DuckDbGateway, FactRecord, FactTable};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "registration-analytics", version)]
#[command(about = "Loads vehicle registration exports into DuckDB and reports growth trends", long_about = None)]
struct Args {
    /// Folder holding `<year>_<category>` spreadsheet exports.
    #[arg(long, global = true, env = "VEHICLE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// DuckDB database file.
    #[arg(long, global = true, env = "VEHICLE_DATABASE", default_value = DEFAULT_DATABASE)]
    database: PathBuf,
    #[arg(long, global = true, env = "VEHICLE_TABLE", default_value = DEFAULT_TABLE)]
    table: String,
    /// Sheet rows above the data: the column header row and the banner rows.
    #[arg(long, global = true, env = "VEHICLE_HEADER_ROWS", default_value_t = DEFAULT_HEADER_ROWS)]
    header_rows: usize,
    /// Sheet name glob; the first sheet is read when unset.
    #[arg(long, global = true, env = "VEHICLE_SHEET")]
    sheet: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load every export of the data folder into the database.
    Ingest,
    /// Print yearly and quarterly growth of the stored facts.
    Growth {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print KPIs, market insights and the top manufacturers.
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
        /// Number of manufacturers to rank.
        #[arg(long, default_value_t = DEFAULT_TOP_MANUFACTURERS)]
        top: usize,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Keep only these years (repeatable).
    #[arg(long = "year")]
    years: Vec<i32>,
    /// Keep only these categories (repeatable).
    #[arg(long = "category")]
    categories: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> FactFilter {
        let mut filter = FactFilter::default();
        if !self.years.is_empty() {
            filter = filter.with_years(self.years.iter().copied());
        }
        if !self.categories.is_empty() {
            filter = filter.with_categories(self.categories.iter().map(|category| category.to_uppercase()));
        }
        filter
    }
}

impl Args {
    fn config(&self) -> Config {
        Config {
            data_dir: self.data_dir.clone(),
            database: self.database.clone(),
            table: self.table.clone(),
            header_rows: self.header_rows,
            sheet_pattern: self.sheet.clone(),
        }
    }
}

fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();
    match &args.command {
        Command::Ingest => ingest(&config),
        Command::Growth { filter } => {
            let table = filter.to_filter().apply(&load(&config)?);
            print_growth(&table);
            Ok(ExitCode::SUCCESS)
        }
        Command::Summary { filter, top } => {
            let table = filter.to_filter().apply(&load(&config)?);
            print_summary(&table, *top);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn ingest(config: &Config) -> Result<ExitCode> {
    let ingestor = config.ingestor().context("Invalid sheet pattern")?;
    let mut gateway = DuckDbGateway::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;
    gateway
        .ensure_schema(&config.table)
        .with_context(|| format!("Failed to prepare table {}", config.table))?;

    match ingestor.ingest_all(&config.data_dir, &mut gateway) {
        Ok(report) => {
            for skipped in report.diagnostics.skipped() {
                println!("Skipped {}: {}", skipped.path.display(), skipped.reason);
            }
            println!("Successfully processed and loaded {} records", report.records.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprintln!("Data processing failed: {error}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load(config: &Config) -> Result<FactTable> {
    let mut gateway = DuckDbGateway::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;
    let table = load_fact_table(&mut gateway, &config.table)
        .with_context(|| format!("Failed to load fact table {}", config.table))?;
    info!(records = table.len(), "Loaded fact table");
    Ok(table)
}

fn format_change(change: Option<f64>) -> String {
    change.map_or_else(|| "n/a".to_owned(), |change| format!("{change:+.1}%"))
}

fn print_rows(title: &str, rows: &[GrowthRow]) {
    println!("{title}");
    if rows.is_empty() {
        println!("  (no data)");
    }
    for row in rows {
        println!(
            "  {:<28} {:<8} {:>14.0} {:>9}  {}",
            row.group,
            row.period.to_string(),
            row.total,
            format_change(row.percent_change),
            row.basis
        );
    }
    println!();
}

fn print_growth(table: &[FactRecord]) {
    let report = compute_growth(table);
    print_rows("Year-over-year growth by category", &report.yearly_by_category);
    print_rows(
        "Quarter-over-quarter growth by category (estimated from yearly totals with seasonal weights)",
        &report.quarterly_by_category,
    );
    print_rows("Year-over-year growth by manufacturer", &report.yearly_by_manufacturer);
}

fn format_share(share: Option<&Share>) -> String {
    share.map_or_else(
        || "n/a".to_owned(),
        |share| format!("{} ({:.1}%, {} registrations)", share.label, share.percent, share.registrations),
    )
}

fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_owned(), |value| format!("{value:.1}%"))
}

fn print_summary(table: &[FactRecord], top: usize) {
    let kpis = Kpis::compute(table);
    println!("Total registrations: {}", kpis.total_registrations);
    println!("Vehicle types:       {}", kpis.vehicle_types);
    println!("Categories:          {}", kpis.categories);
    println!(
        "Average per record:  {}",
        kpis.average_per_record
            .map_or_else(|| "n/a".to_owned(), |average| format!("{average:.0}"))
    );
    println!();

    let insights = MarketInsights::compute(table);
    println!("Market leader:       {}", format_share(insights.market_leader.as_ref()));
    println!("Segment leader:      {}", format_share(insights.segment_leader.as_ref()));
    println!("Electric share:      {}", format_percent(insights.electric_share));
    println!("Top-3 concentration: {}", format_percent(insights.top_three_concentration));
    println!("Latest YoY growth:   {}", format_change(insights.latest_growth));
    println!();

    println!("Top {top} manufacturers");
    for (rank, (manufacturer, total)) in top_manufacturers(table, top).iter().enumerate() {
        println!("  {:>2}. {:<28} {:>14}", rank + 1, manufacturer, total);
    }
}
