mod script;

use anyhow::{bail, Context};
use quorumvault_authorization::{AuthorizationEngine, InMemoryTreasury};
use quorumvault_core::{logging, Config};
use serde::Serialize;
use std::path::PathBuf;

const NODE_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    protocol_version: u32,
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    let config_path = parse_path_arg(&args, "--config")?
        .context("missing required --config <path> argument")?;
    let config = Config::from_file(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    logging::init_from_config(&config.logging);

    let engine = AuthorizationEngine::from_config(&config.wallet, InMemoryTreasury::new())
        .context("invalid wallet configuration")?;
    tracing::info!(
        wallet = %config.wallet.name,
        owners = config.wallet.owners.len(),
        threshold = config.wallet.threshold,
        "Wallet node started"
    );

    let Some(script_path) = parse_path_arg(&args, "--script")? else {
        tracing::info!("No --script given, nothing to replay");
        return Ok(());
    };

    let raw = std::fs::read_to_string(&script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let operations = script::parse_script(&raw)?;

    for operation in operations {
        let outcome = script::apply(&engine, operation)?;
        println!("{}", serde_json::to_string(&outcome)?);
    }

    engine
        .verify_journal()
        .context("audit journal failed verification")?;
    let metrics = engine.metrics();
    tracing::info!(
        actions = engine.action_count(),
        executions = metrics.executions_total,
        rejected = metrics.rejected_operations_total,
        "Script replay finished"
    );

    Ok(())
}

fn parse_path_arg(args: &[String], flag: &str) -> anyhow::Result<Option<PathBuf>> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == flag {
            if let Some(path) = args_iter.next() {
                return Ok(Some(PathBuf::from(path)));
            }
            bail!("{} was provided without a path", flag);
        }
    }

    Ok(None)
}
