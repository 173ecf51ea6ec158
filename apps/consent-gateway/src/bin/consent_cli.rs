// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! consent-cli - grant, revoke and verify parental consent from a terminal.
//!
//! Talks to a running gateway with `--gateway`, otherwise straight to the
//! ledger bridge and indexer configured through the same environment
//! variables as the server.

use std::process::ExitCode;
use std::sync::Arc;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use consent_gateway::{
    app,
    config::{load_deployment, GatewayConfig, LogFormat, LOG_FORMAT_ENV},
    consent::{hash_identifier, is_valid_identifier, normalize, validate_identifier, ConsentHash},
    ledger::IndexerClient,
    logging,
    store::{bounded, bounded_verify, Authorization, ConsentStore, GatewayConsentStore},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use url::Url;

/// consent-cli - parental consent registry client
#[derive(Parser, Debug)]
#[command(name = "consent-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of a running consent gateway. Without it the ledger is used directly.
    #[arg(long, env = "CONSENT_GATEWAY_URL", global = true)]
    gateway: Option<Url>,

    /// Log filter used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the normalized form and consent hash of an identifier
    Hash {
        /// Email or username
        identifier: String,
    },

    /// Grant consent
    Grant(Target),

    /// Revoke consent
    Revoke(Target),

    /// Check consent (exit 0 authorized, 1 denied, 2 unknown)
    Verify(Target),
}

#[derive(Args, Debug)]
struct Target {
    /// Email or username. Prompted for when neither this nor --hash is given.
    identifier: Option<String>,

    /// Use a precomputed hex consent hash instead of an identifier
    #[arg(long, conflicts_with = "identifier")]
    hash: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_format = match std::env::var(LOG_FORMAT_ENV) {
        Ok(raw) => LogFormat::parse(&raw)?,
        Err(_) => LogFormat::default(),
    };
    logging::init_with_writer(log_format, &cli.log_level, std::io::stderr);

    let (command, target) = match cli.command {
        Commands::Hash { identifier } => {
            print_hash(&identifier)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Grant(target) => (Action::Grant, target),
        Commands::Revoke(target) => (Action::Revoke, target),
        Commands::Verify(target) => (Action::Verify, target),
    };

    // Bad input fails here, before any backend is contacted.
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let hash = resolve(target, &mut stdin, &mut tokio::io::stdout()).await?;

    let (store, config) = open_store(cli.gateway).await?;
    let code = execute(command, store.as_ref(), config.store_timeout, &hash).await?;
    Ok(ExitCode::from(code))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Grant,
    Revoke,
    Verify,
}

/// Run `action` against `store` and return the process exit code.
async fn execute(
    action: Action,
    store: &dyn ConsentStore,
    timeout: Duration,
    hash: &ConsentHash,
) -> Result<u8> {
    match action {
        Action::Grant => {
            let receipt = bounded(timeout, store.grant(hash))
                .await
                .context("grant failed")?;

            if receipt.already_granted {
                println!("Consent was already granted for {}", hash.short());
            } else {
                println!("Consent granted for {}", hash.short());
            }
            print_tx(receipt.tx_id.as_deref());
            Ok(0)
        }
        Action::Revoke => {
            let receipt = bounded(timeout, store.revoke(hash))
                .await
                .context("revoke failed")?;

            if receipt.existed {
                println!("Consent revoked for {}", hash.short());
            } else {
                println!("No consent was recorded for {}", hash.short());
            }
            print_tx(receipt.tx_id.as_deref());
            Ok(0)
        }
        Action::Verify => {
            let outcome = bounded_verify(timeout, store.verify(hash)).await;
            match &outcome {
                Authorization::Authorized => {
                    println!("AUTHORIZED: parental consent is on record for {}", hash.short())
                }
                Authorization::Denied => {
                    println!("DENIED: no parental consent for {}", hash.short())
                }
                Authorization::Unknown(reason) => {
                    println!("UNKNOWN: consent could not be verified ({reason})")
                }
            }
            Ok(exit_code(&outcome))
        }
    }
}

/// Exit status of `verify`: 0 authorized, 1 denied, 2 unknown.
fn exit_code(outcome: &Authorization) -> u8 {
    match outcome {
        Authorization::Authorized => 0,
        Authorization::Denied => 1,
        Authorization::Unknown(_) => 2,
    }
}

fn print_hash(identifier: &str) -> Result<()> {
    let normalized = normalize(identifier);
    let hash = hash_identifier(identifier)?;

    println!("normalized: {normalized}");
    println!(
        "valid:      {}",
        if is_valid_identifier(identifier) { "yes" } else { "no" }
    );
    println!("hash:       {}", hash.to_hex());
    Ok(())
}

fn print_tx(tx_id: Option<&str>) {
    if let Some(tx) = tx_id {
        println!("Transaction: {tx}");
    }
}

/// Pick the backend: a remote gateway if given, otherwise the ledger.
async fn open_store(gateway: Option<Url>) -> Result<(Arc<dyn ConsentStore>, GatewayConfig)> {
    let mut config = GatewayConfig::from_env()?;
    if config.contract_address.is_none() {
        config.contract_address = load_deployment(&config.deployment_file)?;
    }

    let store: Arc<dyn ConsentStore> = match gateway {
        Some(url) => {
            let mut store = GatewayConsentStore::new(url, config.store_timeout)?;
            if let Some(contract) = config.contract_address.clone() {
                let indexer = IndexerClient::new(
                    config.indexer_url.clone(),
                    config.indexer_fallback_url.clone(),
                    config.store_timeout,
                )?;
                store = store.with_indexer_fallback(indexer, contract);
            }
            Arc::new(store)
        }
        None => {
            if config.contract_address.is_none() {
                bail!(
                    "no contract address: set CONTRACT_ADDRESS or deploy first ({})",
                    config.deployment_file.display()
                );
            }
            Arc::new(app::ledger_store(&config)?)
        }
    };

    tracing::debug!(backend = %store.backend(), "Consent store selected");
    Ok((store, config))
}

/// Turn the command target into a consent hash, prompting on `input` if
/// neither an identifier nor `--hash` was given.
async fn resolve<R, W>(target: Target, input: &mut Lines<R>, output: &mut W) -> Result<ConsentHash>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Some(raw) = target.hash {
        return Ok(ConsentHash::from_hex(&raw)?);
    }

    let identifier = match target.identifier {
        Some(identifier) => validate_identifier(&identifier)?,
        None => prompt_identifier(input, output).await?,
    };
    Ok(hash_identifier(&identifier)?)
}

/// Ask until a valid identifier is entered or the input ends.
async fn prompt_identifier<R, W>(input: &mut Lines<R>, output: &mut W) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        output.write_all(b"Child email or username: ").await?;
        output.flush().await?;

        let Some(line) = input.next_line().await? else {
            bail!("no identifier given");
        };

        match validate_identifier(&line) {
            Ok(identifier) => return Ok(identifier),
            Err(e) => {
                output.write_all(format!("{e}\n").as_bytes()).await?;
            }
        }
    }
}
