//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use crate::adapters::csv_provider::CsvProvider;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::book::PairBook;
use crate::domain::config_validation::{
    validate_database_config, validate_pair_config, validate_provider_config,
    validate_schedule_config, ProviderKind,
};
use crate::domain::csv_format::CsvFormat;
use crate::domain::error::PairviewError;
use crate::domain::import::ImportPipeline;
use crate::domain::pair::PairConfig;
use crate::domain::schedule::ScheduleConfig;
use crate::domain::scheduler::Scheduler;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_provider::DataProvider;
use crate::ports::instrument_store::InstrumentStore;
use crate::ports::progress_port::ProgressSink;

#[derive(Parser, Debug)]
#[command(name = "pairview", about = "Pair trading data service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the background refresh/persist cycles
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many seconds instead of waiting for 'q' on stdin
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Bulk-import flat-file history into the store
    Import {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Derive the configured pair series and print it
    Synthesize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        x: Option<String>,
        #[arg(long)]
        y: Option<String>,
    },
    /// List instruments visible to the configured provider
    ListInstruments {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Watch { config, duration } => run_watch(&config, duration),
        Command::Import { config } => run_import(&config),
        Command::Synthesize { config, x, y } => {
            run_synthesize(&config, x.as_deref(), y.as_deref())
        }
        Command::ListInstruments { config } => run_list_instruments(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Builds the ingestion side of the configured provider.
pub fn build_data_provider(
    config: &dyn ConfigPort,
) -> Result<Arc<dyn DataProvider + Send + Sync>, PairviewError> {
    match validate_provider_config(config)? {
        ProviderKind::Csv => Ok(build_csv_provider(config)?),
        ProviderKind::Database => build_database_provider(config),
    }
}

fn build_csv_provider(
    config: &dyn ConfigPort,
) -> Result<Arc<CsvProvider>, PairviewError> {
    let root = config
        .get_string("provider", "root")
        .ok_or_else(|| PairviewError::ConfigMissing {
            section: "provider".into(),
            key: "root".into(),
        })?;
    let format = CsvFormat::from_config(config)?;
    Ok(Arc::new(CsvProvider::new(root, format)?))
}

fn build_database_provider(
    config: &dyn ConfigPort,
) -> Result<Arc<dyn DataProvider + Send + Sync>, PairviewError> {
    match config.get_string("database", "backend").as_deref() {
        Some("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                let provider: Arc<dyn DataProvider + Send + Sync> = open_sqlite(config)?;
                Ok(provider)
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(feature_required("sqlite"))
            }
        }
        Some("postgres") => {
            #[cfg(feature = "postgres")]
            {
                let provider: Arc<dyn DataProvider + Send + Sync> = open_postgres(config)?;
                Ok(provider)
            }
            #[cfg(not(feature = "postgres"))]
            {
                Err(feature_required("postgres"))
            }
        }
        _ => {
            validate_database_config(config)?;
            unreachable!("validate_database_config accepts only known backends")
        }
    }
}

/// Builds the persistence target.
pub fn build_store(
    config: &dyn ConfigPort,
) -> Result<Arc<dyn InstrumentStore + Send + Sync>, PairviewError> {
    match config.get_string("database", "backend").as_deref() {
        Some("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                let store: Arc<dyn InstrumentStore + Send + Sync> = open_sqlite(config)?;
                Ok(store)
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(feature_required("sqlite"))
            }
        }
        Some("postgres") => {
            #[cfg(feature = "postgres")]
            {
                let store: Arc<dyn InstrumentStore + Send + Sync> = open_postgres(config)?;
                Ok(store)
            }
            #[cfg(not(feature = "postgres"))]
            {
                Err(feature_required("postgres"))
            }
        }
        _ => {
            validate_database_config(config)?;
            unreachable!("validate_database_config accepts only known backends")
        }
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(
    config: &dyn ConfigPort,
) -> Result<Arc<crate::adapters::sqlite_store::SqliteStore>, PairviewError> {
    let store = crate::adapters::sqlite_store::SqliteStore::from_config(config)?;
    store.initialize_schema()?;
    Ok(Arc::new(store))
}

#[cfg(feature = "postgres")]
fn open_postgres(
    config: &dyn ConfigPort,
) -> Result<Arc<crate::adapters::postgres_store::PostgresStore>, PairviewError> {
    let store = crate::adapters::postgres_store::PostgresStore::from_config(config)?;
    store.initialize_schema()?;
    Ok(Arc::new(store))
}

#[allow(dead_code)]
fn feature_required(backend: &str) -> PairviewError {
    PairviewError::ConfigInvalid {
        section: "database".into(),
        key: "backend".into(),
        reason: format!("{backend} feature is required for this backend"),
    }
}

/// Progress sink that reports to stderr.
struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn on_progress(&self, fraction: f64) {
        eprintln!("  progress: {:.0}%", fraction * 100.0);
    }

    fn on_complete(&self, success: bool, message: &str) {
        if success {
            eprintln!("{message}");
        } else {
            eprintln!("error: {message}");
        }
    }
}

fn run_watch(config_path: &PathBuf, duration: Option<u64>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_pair_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_schedule_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_database_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let pair = match PairConfig::from_config(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let schedule = match ScheduleConfig::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let provider = match build_data_provider(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let store = match build_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let book = Arc::new(Mutex::new(PairBook::new(pair)));
    let mut scheduler = Scheduler::new(schedule, Arc::clone(&book), provider, store);
    scheduler.start();
    eprintln!(
        "Watching: refresh every {}s, persist every {}s",
        schedule.refresh.as_secs(),
        schedule.persist.as_secs(),
    );

    match duration {
        Some(secs) => std::thread::sleep(std::time::Duration::from_secs(secs)),
        None => {
            eprintln!("Enter 'q' to stop");
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match std::io::BufRead::read_line(&mut stdin.lock(), &mut line) {
                    Ok(0) => break,
                    Ok(_) if line.trim() == "q" => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        }
    }

    scheduler.stop();

    // final pair snapshot for the configured legs
    let x = config.get_string("pair", "x").unwrap_or_default();
    let y = config.get_string("pair", "y").unwrap_or_default();
    let book = book.lock().unwrap();
    match book.synthesize_pair(&x, &y) {
        Ok(result) => eprintln!(
            "Pair {}: r = {:.4}, {} points, {} skipped",
            result.series.code,
            result.r,
            result.series.len(),
            result.skipped,
        ),
        Err(e) => eprintln!("warning: no pair snapshot ({e})"),
    }

    ExitCode::SUCCESS
}

fn run_import(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // import always reads flat files into the store
    let provider = match build_csv_provider(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let store = match build_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let pipeline = ImportPipeline::new();
    let outcome = pipeline.run(provider.as_ref(), store.as_ref(), &StderrProgress);

    if outcome.skipped_rows > 0 {
        eprintln!("warning: {} malformed rows skipped", outcome.skipped_rows);
    }

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(4)
    }
}

fn run_synthesize(
    config_path: &PathBuf,
    x_override: Option<&str>,
    y_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let pair = match PairConfig::from_config(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let x = x_override
        .map(str::to_string)
        .or_else(|| config.get_string("pair", "x"));
    let y = y_override
        .map(str::to_string)
        .or_else(|| config.get_string("pair", "y"));
    let (x, y) = match (x, y) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            eprintln!("error: pair legs are required (use --x/--y or set [pair] x and y)");
            return ExitCode::from(2);
        }
    };

    let provider = match build_data_provider(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let report = match provider.fetch_all() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if report.skipped_rows > 0 {
        eprintln!("warning: {} malformed rows skipped", report.skipped_rows);
    }

    let mut book = PairBook::new(pair);
    book.replace_instruments(report.instruments);

    let result = match book.synthesize_pair(&x, &y) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for sample in result.series.samples() {
        println!(
            "{},{},{}",
            sample.timestamp.to_rfc3339(),
            sample.price,
            sample.volume
        );
    }
    eprintln!(
        "Pair {} ({}): r = {:.4}, {} points, {} skipped",
        result.series.code,
        book.pair_config().kind,
        result.r,
        result.series.len(),
        result.skipped,
    );

    ExitCode::SUCCESS
}

fn run_list_instruments(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let provider = match build_data_provider(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let report = match provider.fetch_all() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if report.instruments.is_empty() {
        eprintln!("No instruments found");
    } else {
        for series in &report.instruments {
            println!("{}", series.code);
        }
        eprintln!("{} instruments found", report.instruments.len());
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match validate_provider_config(&config) {
        Ok(kind) => eprintln!("  provider: ok ({kind:?})"),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }
    if let Err(e) = validate_pair_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("  pair: ok");
    if let Err(e) = validate_schedule_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("  schedule: ok");
    if let Err(e) = validate_database_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("  database: ok");

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}
