// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TAXII server binary

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use taxii_logging::CliLoggingArgs;
use taxii_server::{dependencies::DefaultServerDependencies, Server};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, default_value = "etc/freetaxii.conf")]
    config: PathBuf,

    /// JSON file mapping collection ids to STIX objects, loaded into storage at startup
    #[arg(long)]
    seed: Option<PathBuf>,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = taxii_config::load(&args.config)
        .with_context(|| format!("loading configuration {}", args.config.display()))?;

    let configured_log = config
        .logging
        .enabled
        .then(|| config.logging.log_file.as_deref().map(|file| PathBuf::from(config.prefixed(file))))
        .flatten();
    let target = args
        .logging
        .init("taxii-server", configured_log.as_deref())
        .context("initializing logging")?;

    tracing::info!(
        config = %args.config.display(),
        log_target = ?target,
        "starting TAXII server"
    );

    let mut dependencies = DefaultServerDependencies::new(&config)
        .await
        .context("opening storage backend")?;
    if let Some(seed) = &args.seed {
        dependencies = dependencies
            .seed(seed)
            .await
            .with_context(|| format!("seeding storage from {}", seed.display()))?;
    }

    let server = Server::with_state(&config, dependencies.into_state())
        .context("assembling endpoints")?;
    server.run().await.context("serving")?;

    Ok(())
}
