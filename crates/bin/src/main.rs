//! Fairval CLI binary.
//!
//! Values snapshots through the method fallback chain, maintains the fair
//! value store and ranks quoted tickers by their discount to fair value.

mod config_paths;

use clap::{Parser, Subcommand, ValueEnum};
use fairval::engine::fetch_skip;
use fairval::universe::{AexUniverse, GicsSector, TickerList, Universe};
use fairval::{FairValueEngine, ScanReport};
use fairval_data::{FundamentalsProvider, JsonFileProvider, load_quotes};
use fairval_output::{ExportFormat, Exporter, Ranking};
use fairval_store::{FairValueSource, FairValueStore};
use fairval_valuation::{
    CompanyType, FairValueResolver, SectorClassifier, ValuationResult, available_methods,
    company_types_using, get_method_info, method_chain, usage_counts,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fairval")]
#[command(about = "Fairval: fair value estimation with method fallback", long_about = None)]
#[command(version)]
struct Cli {
    /// Fair value store document (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON file overriding valuation constants
    #[arg(long, global = true)]
    valuation_config: Option<PathBuf>,

    /// JSON or CSV sector table merged over the built-in one
    #[arg(long, global = true)]
    sector_table: Option<PathBuf>,

    /// Back up the store document here before every save
    #[arg(long, global = true)]
    backup_dir: Option<PathBuf>,

    /// Number of backups to keep
    #[arg(long, global = true)]
    max_backups: Option<usize>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value tickers from a snapshots file
    Value {
        /// JSON array of fundamentals snapshots
        snapshots: PathBuf,

        /// Only value tickers listed in this file (JSON or CSV)
        #[arg(long, conflicts_with = "aex")]
        tickers: Option<PathBuf>,

        /// Only value AEX constituents
        #[arg(long)]
        aex: bool,

        /// Record computed values as the dcf source
        #[arg(long)]
        record: bool,

        /// Rank these quotes once the values are recorded
        #[arg(long, requires = "record")]
        quotes: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record a fair value for one source
    Record {
        /// Source: dcf, manual or analyst
        source: String,

        /// Ticker
        ticker: String,

        /// Fair value per share
        value: f64,
    },

    /// Remove a recorded fair value
    Remove {
        /// Ticker
        ticker: String,

        /// Source to remove from
        #[arg(long, default_value = "manual")]
        source: String,
    },

    /// Show the effective fair value of a ticker
    Resolve {
        /// Ticker
        ticker: String,
    },

    /// Show or change the source priority order
    Priority {
        #[command(subcommand)]
        action: Option<PriorityAction>,
    },

    /// Show the store contents
    Show {
        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Import legacy fair value files
    ImportLegacy {
        /// Legacy DCF file (`{"values": {...}}`)
        #[arg(long)]
        dcf: Option<PathBuf>,

        /// Legacy analyst file (flat ticker map)
        #[arg(long)]
        analyst: Option<PathBuf>,
    },

    /// Rank quoted tickers by discount to effective fair value
    Rank {
        /// JSON array of quotes
        #[arg(long)]
        quotes: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show the top N tickers
        #[arg(long)]
        top: Option<usize>,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the AEX universe
    Universe {
        /// Filter by GICS sector
        #[arg(long)]
        sector: Option<String>,

        /// List all sectors
        #[arg(long)]
        list_sectors: bool,
    },

    /// List valuation methods and the chain for each company type
    Methods {
        /// Show one method in detail (dcf, earnings, book_value, multiple)
        method: Option<String>,
    },
}

#[derive(Subcommand)]
enum PriorityAction {
    /// Print the current order
    Show,

    /// Replace the order, highest priority first
    Set {
        /// Exactly three source names
        #[arg(num_args = 3, required = true)]
        order: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Csv,
    Json,
}

impl OutputFormat {
    const fn export_format(self) -> Option<ExportFormat> {
        match self {
            Self::Csv => Some(ExportFormat::Csv),
            Self::Json => Some(ExportFormat::PrettyJson),
            Self::Text | Self::Markdown => None,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        config,
        valuation_config,
        sector_table,
        backup_dir,
        max_backups,
        command,
        ..
    } = cli;
    let options =
        config_paths::store_options(config.as_deref(), backup_dir.as_deref(), max_backups);
    let store = FairValueStore::new(options);

    match command {
        Commands::Value {
            snapshots,
            tickers,
            aex,
            record,
            quotes,
            format,
        } => {
            let engine = build_engine(valuation_config.as_deref(), sector_table.as_deref(), store)?;
            let report =
                value_snapshots(&engine, &snapshots, tickers.as_deref(), aex, record, format)?;
            if let Some(path) = quotes {
                let ranking = engine.rank_scan(&load_quotes(&path)?, &report)?;
                print!("{}", render_ranking(ranking, format, None)?);
            }
        }
        Commands::Record {
            source,
            ticker,
            value,
        } => {
            let source: FairValueSource = source.parse()?;
            store.set(source, &ticker, value)?;
            println!("Recorded {} {} = {:.2}", source, ticker, value);
        }
        Commands::Remove { ticker, source } => {
            let source: FairValueSource = source.parse()?;
            match store.remove(source, &ticker)? {
                Some(old) => println!("Removed {} {} (was {:.2})", source, ticker, old),
                None => println!("No {} value recorded for {}", source, ticker),
            }
        }
        Commands::Resolve { ticker } => match store.resolve(&ticker)? {
            Some(effective) => println!(
                "{}: {:.2} (source: {})",
                ticker, effective.value, effective.source
            ),
            None => println!("{}: no fair value from any source", ticker),
        },
        Commands::Priority { action } => match action {
            None | Some(PriorityAction::Show) => println!("{}", store.priority()?),
            Some(PriorityAction::Set { order }) => {
                store.set_priority_names(&order)?;
                println!("Priority set to {}", store.priority()?);
            }
        },
        Commands::Show { format } => show_store(&store, format)?,
        Commands::ImportLegacy { dcf, analyst } => {
            if dcf.is_none() && analyst.is_none() {
                return Err("Nothing to import. Use --dcf and/or --analyst".into());
            }
            if let Some(path) = dcf {
                let imported = store.import_legacy_dcf(&path)?;
                print_import("dcf", &path, imported.values.len(), &imported.skipped);
            }
            if let Some(path) = analyst {
                let imported = store.import_legacy_analyst(&path)?;
                print_import("analyst", &path, imported.values.len(), &imported.skipped);
            }
        }
        Commands::Rank {
            quotes,
            format,
            top,
            output,
        } => {
            let quotes = load_quotes(&quotes)?;
            let ranking = fairval_output::rank(&quotes, &store.combined()?);
            let rendered = render_ranking(ranking, format, top)?;
            let output = output.map(|path| output_path(path, format));
            emit(&rendered, output.as_deref())?;
        }
        Commands::Universe {
            sector,
            list_sectors,
        } => {
            if list_sectors {
                list_all_sectors();
            } else {
                show_universe(sector.as_deref())?;
            }
        }
        Commands::Methods { method } => match method {
            Some(id) => show_method(&id)?,
            None => list_methods(),
        },
    }

    Ok(())
}

fn build_engine(
    valuation_config: Option<&Path>,
    sector_table: Option<&Path>,
    store: FairValueStore,
) -> Result<FairValueEngine, Box<dyn std::error::Error>> {
    let config = config_paths::valuation_config(valuation_config)?;
    let table = config_paths::sector_table(AexUniverse::new().sector_table(), sector_table)?;
    info!(entries = table.len(), "Sector table loaded");
    let resolver = FairValueResolver::new(SectorClassifier::new(table), config);
    Ok(FairValueEngine::new(resolver, store))
}

fn value_snapshots(
    engine: &FairValueEngine,
    path: &Path,
    ticker_file: Option<&Path>,
    aex: bool,
    record: bool,
    format: OutputFormat,
) -> Result<ScanReport, Box<dyn std::error::Error>> {
    let provider = JsonFileProvider::open(path)?;
    let tickers = if aex {
        AexUniverse::new().symbols()
    } else if let Some(file) = ticker_file {
        TickerList::from_file(file)?.symbols()
    } else {
        provider.tickers()
    };

    let pb = ProgressBar::new(tickers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Loading snapshots...");

    let mut snapshots = Vec::with_capacity(tickers.len());
    let mut fetch_skips = Vec::new();
    for ticker in &tickers {
        match provider.fetch(ticker) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => fetch_skips.push(fetch_skip(ticker.as_str(), &e)),
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("Loaded {} snapshots", snapshots.len()));

    let report = if record {
        engine.scan_snapshots(&snapshots, fetch_skips)?
    } else {
        engine.evaluate(&snapshots, fetch_skips)
    };

    match format.export_format() {
        Some(ExportFormat::Csv) => print!("{}", report.valued.export_to_string(ExportFormat::Csv)?),
        Some(_) => println!("{}", serde_json::to_string_pretty(&report)?),
        None => print_report(&report, format == OutputFormat::Markdown),
    }
    if record {
        println!(
            "\nRecorded {} dcf values to {}",
            report.valued.len(),
            engine.store().path().display()
        );
    }
    Ok(report)
}

fn render_ranking(
    mut ranking: Ranking,
    format: OutputFormat,
    top: Option<usize>,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(n) = top {
        ranking.ranked = ranking.top(n).to_vec();
    }
    Ok(match format.export_format() {
        Some(export) => ranking.export_to_string(export)?,
        None if format == OutputFormat::Markdown => ranking.to_markdown(),
        None => ranking.to_ascii_table(),
    })
}

/// `path` with the export format's extension when it has none.
fn output_path(path: PathBuf, format: OutputFormat) -> PathBuf {
    match format.export_format() {
        Some(export) if path.extension().is_none() => path.with_extension(export.extension()),
        _ => path,
    }
}

fn print_report(report: &ScanReport, markdown: bool) {
    if markdown {
        println!("| Ticker | Fair Value | Method | Fallbacks |");
        println!("|--------|-----------:|--------|-----------|");
        for r in &report.valued {
            println!(
                "| {} | {:.2} | {} | {} |",
                r.ticker,
                r.fair_value_per_share,
                r.method_used,
                fallback_summary(r)
            );
        }
    } else {
        println!("\n{:<12} {:>12}  {:<12} Fallbacks", "Ticker", "Fair Value", "Method");
        println!("{}", "-".repeat(72));
        for r in &report.valued {
            println!(
                "{:<12} {:>12.2}  {:<12} {}",
                r.ticker,
                r.fair_value_per_share,
                r.method_used.to_string(),
                fallback_summary(r)
            );
        }
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped ({}):", report.skipped.len());
        for s in &report.skipped {
            println!("  {:<12} {}", s.ticker, s.reason);
        }
    }
}

fn fallback_summary(result: &ValuationResult) -> String {
    result
        .diagnostics
        .iter()
        .map(|d| d.method.id())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn show_store(store: &FairValueStore, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let as_json = show_as_json(format)?;
    let document = store.load()?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("Fair Value Store");
    println!("================\n");
    println!("File:     {}", store.path().display());
    println!("Priority: {}", document.priority);
    match &document.last_updated {
        Some(last) => println!(
            "Updated:  {} ({})",
            last.time.format("%Y-%m-%d %H:%M:%S UTC"),
            last.source
        ),
        None => println!("Updated:  never"),
    }

    println!("\nSources:");
    for source in FairValueSource::ALL {
        let updated = document
            .source_updated
            .get(&source)
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "  {:<8} {:>4} tickers   updated {}",
            source.name(),
            document.sources.get(source).len(),
            updated
        );
    }

    let combined = document.combined();
    if combined.is_empty() {
        return Ok(());
    }
    println!("\n{:<12} {:>10}  Source", "Ticker", "Effective");
    println!("{}", "-".repeat(32));
    for (ticker, effective) in &combined {
        println!("{:<12} {:>10.2}  {}", ticker, effective.value, effective.source);
    }
    Ok(())
}

/// Whether `show` prints JSON; the store document has no CSV layout.
fn show_as_json(format: OutputFormat) -> Result<bool, String> {
    match format {
        OutputFormat::Json => Ok(true),
        OutputFormat::Text | OutputFormat::Markdown => Ok(false),
        OutputFormat::Csv => Err("show supports text or json output, not csv".to_string()),
    }
}

fn print_import(source: &str, path: &Path, imported: usize, skipped: &[String]) {
    println!(
        "Imported {} {} values from {}",
        imported,
        source,
        path.display()
    );
    if !skipped.is_empty() {
        println!("  Skipped invalid entries: {}", skipped.join(", "));
    }
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn show_universe(sector_filter: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let universe = AexUniverse::new();

    println!("AEX Universe");
    println!("============\n");

    if let Some(sector_name) = sector_filter {
        let sector = parse_sector(sector_name)?;
        let symbols = universe.symbols_in_sector(sector);

        println!("Sector: {}", sector);
        println!("Constituents: {}\n", symbols.len());

        for symbol in symbols {
            println!("  {}", symbol);
        }
    } else {
        let table = universe.sector_table();
        println!("Total constituents: {}\n", universe.size());
        for c in universe.constituents() {
            let company_type = table.ticker(&c.symbol).unwrap_or_default();
            println!(
                "  {:<10} {:<28} {:<24} {}",
                c.symbol, c.name, c.sector.name(), company_type
            );
        }

        let sector_counts = universe.sector_counts();
        println!("\nBreakdown by sector:");
        for sector in GicsSector::all() {
            let count = sector_counts.get(&sector).unwrap_or(&0);
            println!("  {:30} {:3} stocks", sector.name(), count);
        }
    }

    Ok(())
}

fn list_all_sectors() {
    println!("GICS Sectors:");
    println!("=============\n");

    for sector in GicsSector::all() {
        println!("{:2} - {}", sector.code(), sector.name());
    }
}

fn parse_sector(name: &str) -> Result<GicsSector, Box<dyn std::error::Error>> {
    let normalized = name.to_lowercase().replace(' ', "");

    let sector = match normalized.as_str() {
        "informationtechnology" | "it" | "tech" => GicsSector::InformationTechnology,
        "healthcare" | "health" => GicsSector::HealthCare,
        "financials" | "finance" => GicsSector::Financials,
        "consumerdiscretionary" | "discretionary" => GicsSector::ConsumerDiscretionary,
        "communicationservices" | "communication" | "comms" => GicsSector::CommunicationServices,
        "industrials" | "industrial" => GicsSector::Industrials,
        "consumerstaples" | "staples" => GicsSector::ConsumerStaples,
        "energy" => GicsSector::Energy,
        "utilities" | "utility" => GicsSector::Utilities,
        "realestate" | "estate" => GicsSector::RealEstate,
        "materials" => GicsSector::Materials,
        _ => return Err(format!("Unknown sector: {}", name).into()),
    };

    Ok(sector)
}

fn list_methods() {
    println!("Valuation Methods:");
    println!("==================\n");
    let counts = usage_counts();
    for info in available_methods() {
        let used_by = counts.get(&info.method).copied().unwrap_or(0);
        println!("{:<10} {}", info.method.id(), info.description);
        println!("{:<10} needs: {}", "", info.required_fields.join(", "));
        println!("{:<10} in {} of {} chains", "", used_by, CompanyType::all().len());
    }

    println!("\nFallback chains:");
    for company_type in CompanyType::all() {
        let chain: Vec<&str> = method_chain(company_type).iter().map(|m| m.id()).collect();
        println!("  {:<14} {}", company_type.to_string(), chain.join(" -> "));
    }
}

fn show_method(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let info = get_method_info(id).ok_or_else(|| format!("Unknown method: {}", id))?;
    let used_by: Vec<String> = company_types_using(info.method)
        .iter()
        .map(ToString::to_string)
        .collect();

    println!("{} ({})", info.method.label(), info.method.id());
    println!("  {}", info.description);
    println!("  Needs:   {}", info.required_fields.join(", "));
    println!("  Used by: {}", used_by.join(", "));
    Ok(())
}
