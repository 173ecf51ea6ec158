// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use consent_gateway::{
    app::{self, AppError},
    config::{GatewayConfig, DEFAULT_LOG_FILTER},
    logging,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from the same environment, so report plainly.
            eprintln!("consent-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.log_format, DEFAULT_LOG_FILTER);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GatewayConfig) -> Result<(), AppError> {
    let addr = config.bind_addr()?;
    let gateway = app::build(&config).await?;
    let shutdown = CancellationToken::new();

    tracing::info!(
        mode = %gateway.state.store.backend(),
        network = %config.network_id,
        contract = config
            .contract_address
            .as_ref()
            .map(|c| c.as_str())
            .unwrap_or("not deployed"),
        "Consent gateway configured"
    );

    if let Some(ledger) = gateway.ledger.clone() {
        tracing::info!(
            bridge = %config.bridge_url,
            indexer = %config.indexer_url,
            "Connecting to ledger in the background"
        );
        app::warm_up(ledger, shutdown.clone());
    }

    tokio::spawn(app::shutdown_signal(shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Consent gateway listening (docs at /docs)");

    app::serve(listener, gateway.state, shutdown).await?;

    tracing::info!("Consent gateway stopped");
    Ok(())
}
