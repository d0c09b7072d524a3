//! SQLStage command-line tool.
//!
//! Resolves connection configuration and copies query results into staging
//! tables.
//!
//! # Security Guarantees
//! - Passwords are never printed or logged; addresses are shown redacted
//! - Passwords can come from the environment or an interactive prompt

use clap::Parser;
use sqlstage::{CheckArgs, Cli, Command, ConfigArgs, CopyArgs, CopyPlan, assemble_request};
use sqlstage_core::{
    Connector, DefaultEngineFactory, HostResolver, IfExists, Result, StageConfig,
    SystemHostResolver, TableRef, init_logging,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        cli.global.verbose,
        cli.global.quiet,
        cli.global.log_file.as_deref(),
    )?;

    match &cli.command {
        Command::Check(args) => run_check(args).await,
        Command::Copy(args) => run_copy(args).await,
    }
}

fn read_password(label: &str) -> std::io::Result<String> {
    rpassword::prompt_password(label)
}

fn load(args: &ConfigArgs) -> Result<(StageConfig, Connector)> {
    let config = StageConfig::from_path(&args.config).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    info!("Loaded {}", args.config.display());

    let connector =
        Connector::new(Arc::new(DefaultEngineFactory)).with_options(config.engine.clone());
    Ok((config, connector))
}

async fn run_check(args: &CheckArgs) -> Result<()> {
    let (config, connector) = load(&args.config)?;
    let prompt = args.config.prompt_password.then_some(read_password);

    let requests = config
        .connection_names()
        .map(|name| assemble_request(&config, name, prompt))
        .collect::<Result<Vec<_>>>()?;

    let probe = SystemHostResolver::default();
    let hosts = if args.probe {
        Some(&probe as &dyn HostResolver)
    } else {
        None
    };

    let report = sqlstage::check(&connector, &requests, hosts).await?;
    for outcome in &report.outcomes {
        println!("{}", outcome);
    }

    if !report.is_complete() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_copy(args: &CopyArgs) -> Result<()> {
    let (config, connector) = load(&args.config)?;
    let prompt = args.config.prompt_password.then_some(read_password);

    let table = match &args.schema {
        Some(schema) => TableRef::in_schema(schema, &args.table),
        None => TableRef::new(&args.table),
    };
    let plan = CopyPlan {
        source: assemble_request(&config, &args.source, prompt)?,
        query: args.query.clone(),
        target: assemble_request(&config, &args.target, prompt)?,
        table,
        if_exists: if args.replace {
            IfExists::Replace
        } else {
            IfExists::Append
        },
    };

    let written = sqlstage::copy(&connector, &plan).await.map_err(|e| {
        error!("Copy failed: {}", e);
        e
    })?;

    info!("✓ Copy completed");
    println!("Rows written: {}", written);
    Ok(())
}
