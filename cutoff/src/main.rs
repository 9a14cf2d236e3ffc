// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{env, fs, io, path::PathBuf, process, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use core_types::{ConfigError, CutoffConfig};
use cutoff_service::{CutoffService, ServiceError};
use history_store::{ExportFormat, StoreError};
use log::info;
use thiserror::Error;

const USAGE: &str = "usage: cutoff [--config <path>] <stats | integrity | export <json|csv> | \
import <json|csv> <file> | show <market_tag> | check <market_tag> <start> <end> | summary>";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("cutoff failed: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args = CliArgs::parse(env::args().skip(1))?;
    let config = CutoffConfig::load(args.config.as_deref())?;
    let service = CutoffService::open(&config)?;
    let store = service.store();

    match args.command {
        Command::Stats => println!("{}", store.stats()),
        Command::Integrity => {
            let report = store.validate_integrity();
            for error in &report.errors {
                println!("error: {error}");
            }
            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            if !report.is_valid {
                return Err(AppError::IntegrityFailed(report.errors.len()));
            }
            println!(
                "document is valid ({} warning(s))",
                report.warnings.len()
            );
        }
        Command::Export(format) => print!("{}", store.export(format)?),
        Command::Import { format, path } => {
            let data = fs::read_to_string(&path).map_err(|source| AppError::Read {
                path: path.clone(),
                source,
            })?;
            let imported = store.import(&data, format)?;
            info!("imported {} new record(s) from {}", imported, path.display());
            println!("imported {imported} record(s)");
        }
        Command::Show(market_tag) => match store.get(&market_tag) {
            Some(record) => {
                println!("market:      {}", record.market_tag);
                println!(
                    "components:  {} / {} / {}",
                    record.exchange, record.primary_asset, record.secondary_asset
                );
                println!("cutoff:      {}", record.cutoff_date.to_rfc3339());
                println!("discovered:  {}", record.discovery_date.to_rfc3339());
                println!("precision:   {}h", record.precision_hours);
                for (key, value) in &record.discovery_metadata {
                    println!("  {key}: {value}");
                }
            }
            None => return Err(AppError::UnknownMarket(market_tag)),
        },
        Command::Check {
            market_tag,
            start,
            end,
        } => {
            let check = service.ensure_sufficient_history(&market_tag, start, end);
            let validation = &check.validation;
            println!(
                "{}: {}",
                if validation.is_valid { "valid" } else { "invalid" },
                validation.message
            );
            if let Some(adjusted) = validation.adjusted_start {
                println!("adjusted start: {}", adjusted.to_rfc3339());
            }
            if let Some(wait) = check.estimated_sync_wait {
                println!("estimated sync wait: {} minute(s)", wait.as_secs() / 60);
            }
        }
        Command::Summary => println!("{}", service.summary()),
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Command {
    Stats,
    Integrity,
    Export(ExportFormat),
    Import {
        format: ExportFormat,
        path: PathBuf,
    },
    Show(String),
    Check {
        market_tag: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Summary,
}

#[derive(Debug, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    command: Command,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, AppError> {
        let mut args = args.into_iter();
        let mut config = None;
        let mut positional = Vec::new();
        while let Some(arg) = args.next() {
            if arg == "--config" {
                config = Some(PathBuf::from(args.next().ok_or(AppError::Usage)?));
            } else if let Some(value) = arg.strip_prefix("--config=") {
                config = Some(PathBuf::from(value));
            } else if arg.starts_with("--") {
                return Err(AppError::UnknownArg(arg));
            } else {
                positional.push(arg);
            }
        }

        let command = match positional
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .as_slice()
        {
            ["stats"] => Command::Stats,
            ["integrity"] => Command::Integrity,
            ["summary"] => Command::Summary,
            ["export", format] => Command::Export(ExportFormat::from_str(format)?),
            ["import", format, path] => Command::Import {
                format: ExportFormat::from_str(format)?,
                path: PathBuf::from(path),
            },
            ["show", market_tag] => Command::Show(market_tag.to_string()),
            ["check", market_tag, start, end] => Command::Check {
                market_tag: market_tag.to_string(),
                start: parse_instant(start)?,
                end: parse_instant(end)?,
            },
            _ => return Err(AppError::Usage),
        };
        Ok(Self { config, command })
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_instant(value: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::InvalidDate(value.to_string()))
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{}", USAGE)]
    Usage,
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    #[error("invalid date '{0}' (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate(String),
    #[error("no cutoff stored for {0}")]
    UnknownMarket(String),
    #[error("document failed integrity check with {0} error(s)")]
    IntegrityFailed(usize),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}
