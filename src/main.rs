// src/main.rs
//! GPS Fix Server - reads a serial GPS receiver and serves the latest fix over HTTP

use anyhow::{anyhow, Context};
use clap::Parser;
use gps_fix_server::{
    config::{Cli, ServerConfig},
    monitor, server, FixStore, StreamIngester,
};
use log::{debug, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.list_ports {
        monitor::list_serial_ports()?;
        return Ok(());
    }

    let config = ServerConfig::load(&cli)?;
    init_logging(config.verbose);
    debug!("Running in verbose mode.");
    debug!("Using configuration {:?}", config);

    let serial = monitor::open_serial(&config.tty, config.baudrate, config.read_timeout())?;

    let store = FixStore::new();
    let running = Arc::new(AtomicBool::new(true));
    let ingester = StreamIngester::new(store.clone(), Arc::clone(&running))
        .with_read_timeout(config.read_timeout())
        .with_max_consecutive_read_errors(config.max_consecutive_read_errors);
    let mut ingest = tokio::spawn(async move { ingester.run(serial).await });

    let http = server::build(store, &config.bind_address())?;
    let http_handle = http.handle();

    tokio::select! {
        result = http => {
            result.context("HTTP server failed")?;
            info!("HTTP server stopped, shutting down");
            running.store(false, Ordering::Relaxed);
            ingest.abort();
            Ok(())
        }
        result = &mut ingest => {
            http_handle.stop(true).await;
            let stats = result.context("GPS ingestion task failed")??;
            info!("GPS ingestion finished: {:?}", stats);
            Err(anyhow!("GPS stream on {} ended", config.tty))
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}
