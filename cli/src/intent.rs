use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use wasm_intent_builder::{build_transaction, ParamBag, SuiCliCompiler};

use crate::network::load_registry;

#[derive(Args)]
pub struct BuildArgs {
    /// Intents in execution order (repeat or comma-separate)
    #[arg(short, long = "intent", required = true, value_delimiter = ',')]
    intents: Vec<String>,
    /// JSON file with the parameter bag (use '-' to read from stdin)
    #[arg(short, long)]
    params: PathBuf,
    /// Network id (default MAINNET)
    #[arg(short, long)]
    network: Option<String>,
    /// JSON file with extra network profiles
    #[arg(long, env = "INTENT_BUILDER_NETWORKS")]
    networks: Option<PathBuf>,
    /// Directory holding the token factory packages
    #[arg(long, env = "INTENT_BUILDER_PACKAGES_DIR", default_value = "contracts")]
    packages_dir: PathBuf,
    /// Path to the sui binary
    #[arg(long, default_value = "sui")]
    sui_bin: PathBuf,
}

fn read_params(path: &Path) -> Result<ParamBag> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read params from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read params from {}", path.display()))?
    };
    let value: serde_json::Value = serde_json::from_str(&text).context("Params are not JSON")?;
    Ok(ParamBag::from_value(value)?)
}

pub fn handle_build(args: BuildArgs) -> Result<()> {
    let params = read_params(&args.params)?;
    let registry = load_registry(args.networks.as_deref())?;
    let compiler = SuiCliCompiler::new(&args.packages_dir).with_sui_bin(&args.sui_bin);

    info!(intents = ?args.intents, "Building transaction");
    let built = build_transaction(
        &args.intents,
        &params,
        args.network.as_deref(),
        &registry,
        &compiler,
    )?;
    println!("{}", serde_json::to_string_pretty(&built)?);
    Ok(())
}
