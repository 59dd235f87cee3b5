// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Quantum Random Bit Server
//!
//! Serves random bits produced by a simulated Hadamard circuit or by a remote
//! quantum device, with automatic fallback to the simulator.
//!
//! # Features
//!
//! - `POST /quantum-random` returning packed bits as `application/octet-stream`
//! - Shared-secret authentication via `X-API-Key`
//! - Health and Prometheus metrics endpoints
//! - HTTPS when a certificate and key are present

mod api;

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use qrand_core::ServiceConfig;
use std::net::SocketAddr;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "qrand-server")]
#[command(about = "Quantum random bit server - Serves quantum random bits via REST API", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Override the PORT environment variable
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve plain HTTP even if certificate files are present
    #[arg(long, default_value = "false")]
    no_tls: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .json()
        .init();

    info!("Quantum random bit server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ServiceConfig::from_env()
        .context("Failed to load configuration from environment")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("Qubit width: {}", config.n_qubits);
    info!("Default backend: {}", config.backend);
    info!("Sampling mode: {:?}", config.sampling_mode);
    match &config.hardware_url {
        Some(url) => info!(
            "Hardware device: {} (timeout {:?})",
            url,
            config.hardware_timeout()
        ),
        None => info!("No hardware device configured; hardware requests use the simulator"),
    }
    if config.api_key().is_none() {
        warn!("API_KEY is not set; every bit request will fail with 500");
    }

    let addr: SocketAddr = config
        .listen_address()
        .parse()
        .context("Invalid listen address")?;
    let tls_files = if args.no_tls { None } else { config.tls_files() };

    let state = api::AppState::new(config).context("Failed to initialise generator")?;
    let app = api::router(state);

    match tls_files {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(&cert, &key)
                .await
                .with_context(|| format!("Failed to load TLS files {:?} / {:?}", cert, key))?;

            info!("Starting HTTPS server on {}", addr);
            axum_server::bind_rustls(addr, tls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("Starting HTTP server on {}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
