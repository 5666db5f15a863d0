pub mod api;
pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

#[cfg(test)]
mod test_utils;

use crate::core::config::AppConfig;
use crate::core::engine::RateEngine;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    List,
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
    Rates {
        base: String,
    },
    Historical {
        from: String,
        to: String,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Query(String),
}

/// Wires the registry and forex provider from `config` into an engine.
pub fn build_engine(config: &AppConfig) -> Result<RateEngine> {
    let registry = store::MemoryRegistry::new(config.currencies.clone())
        .context("Invalid currency definitions in config")?;
    let forex = providers::FrankfurterProvider::new(&config.frankfurter())
        .context("Failed to create forex provider")?;
    Ok(RateEngine::new(Arc::new(registry), Arc::new(forex)))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("pegfx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let engine = Arc::new(build_engine(&config)?);

    match command {
        AppCommand::List => cli::list::run(&engine).await,
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(&engine, amount, &from, &to).await
        }
        AppCommand::Rates { base } => cli::rates::run(&engine, &base).await,
        AppCommand::Historical {
            from,
            to,
            start,
            end,
        } => cli::historical::run(&engine, &from, &to, start, end).await,
        AppCommand::Query(query) => {
            let api = api::Api::new(Arc::clone(&engine), config.api.debug);
            cli::query::run(&api, &query).await
        }
    }
}
