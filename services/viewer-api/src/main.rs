//! Mapfile viewer.
//!
//! Serves a browser viewer for a MapServer mapfile and proxies its render
//! requests to the `mapserv` CGI binary.
//!
//! Example: `mapfile-viewer -m map/viewer.map`, then point a browser to
//! `http://127.0.0.1:9991`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use mapfile::{concatenate_files, ConcatenatedMapfile, MapDocument};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use viewer_api::config::{CliArgs, LogFormat, ViewerSettings};
use viewer_api::engine::MapservEngine;
use viewer_api::metrics;
use viewer_api::routing::router;
use viewer_api::state::AppState;

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    init_tracing(&args.log_level, args.log_format)?;

    let Some(paths) = args.mapfile_paths() else {
        CliArgs::command().print_help()?;
        println!();
        return Ok(());
    };

    // Several paths are fragments joined into one mapfile for the whole run
    let concatenated = if paths.len() > 1 {
        Some(concatenate_files(&paths).context("cannot concatenate mapfiles")?)
    } else {
        None
    };
    let mapfile: PathBuf = match &concatenated {
        Some(combined) => combined.path().to_path_buf(),
        None => paths[0].clone(),
    };

    if args.test {
        check_mapfile(&mapfile);
        drop(concatenated);
        return Ok(());
    }

    let settings = ViewerSettings::from_args(&args, &mapfile)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        info!("Configuring tokio runtime with {} worker threads", threads);
        runtime_builder.worker_threads(threads);
    }
    let runtime = runtime_builder.build()?;

    let result = runtime.block_on(serve(args, settings, concatenated));
    if let Err(e) = &result {
        error!(error = %e, "Server failed");
    }
    result
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = FmtSubscriber::builder().with_env_filter(filter).with_target(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

/// Test mode: report whether the mapfile parses.
fn check_mapfile(mapfile: &Path) {
    println!("Checking mapfile.");
    match MapDocument::from_path(mapfile) {
        Ok(document) => println!("OK, {} layers found.", document.description().layer_count()),
        Err(e) => println!("ERROR: {}", e),
    }
}

async fn serve(
    args: CliArgs,
    settings: ViewerSettings,
    concatenated: Option<ConcatenatedMapfile>,
) -> Result<()> {
    if let Some(addr) = args.metrics_listen {
        metrics::install_exporter(addr).context("cannot start metrics exporter")?;
    }

    let port = settings.port;
    let engine = Arc::new(MapservEngine::new(args.mapserv));
    info!(
        mapfile = %settings.mapfile.display(),
        scales = %settings.scales,
        mapserv = %engine.binary().display(),
        "Starting mapfile viewer"
    );

    let state = Arc::new(AppState::new(settings, engine)?);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot listen on port {}", port))?;
    info!(address = %addr, "Listening");
    println!(
        "Starting server. Point your web browser to 'http://127.0.0.1:{}'.",
        port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(concatenated);
    println!("Shutting down server.");
    Ok(())
}

/// Wait for Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
