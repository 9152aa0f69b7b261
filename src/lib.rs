pub mod candidates;
pub mod cli;
pub mod config;
pub mod encoded;
pub mod error;
pub mod expand;
pub mod header;
pub mod io_utils;
pub mod pipeline;
pub mod sink;

use std::{env, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, ConfigArgs, SplitArgs},
    config::{DEFAULT_CONFIG_FILE, SplitConfig},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_col_splitter", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Split(args) => handle_split(&args),
        Commands::Config(args) => handle_config(&args),
    }
}

fn handle_split(args: &SplitArgs) -> Result<()> {
    let config = SplitConfig::resolve(&args.options)?;
    debug!("Resolved configuration: {config:?}");
    let settings = config.validate().context("Validating configuration")?;
    let reports = pipeline::run_split(&settings, args.first_only)?;
    let rows: usize = reports.iter().map(|report| report.rows_written).sum();
    info!("Split {} file(s), {} row(s) written", reports.len(), rows);
    Ok(())
}

fn handle_config(args: &ConfigArgs) -> Result<()> {
    let config = if args.freeze {
        SplitConfig::resolve_for_freeze(&args.options)?
    } else {
        SplitConfig::resolve(&args.options)?
    };
    config.validate().context("Validating configuration")?;
    if args.show || !args.freeze {
        print!("{}", config.to_yaml()?);
    }
    if args.freeze {
        let path = args
            .options
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        config
            .save(&path)
            .with_context(|| format!("Freezing configuration into {path:?}"))?;
        info!("Configuration written to {path:?}");
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
