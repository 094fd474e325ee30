use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use wasm_intent_builder::NetworkRegistry;

#[derive(Subcommand)]
pub enum NetworkCommand {
    /// Print the merged network registry as JSON
    List {
        /// JSON file with extra network profiles
        #[arg(long, env = "INTENT_BUILDER_NETWORKS")]
        networks: Option<PathBuf>,
    },
    /// Print one resolved profile
    Show {
        /// Network id (case-insensitive)
        network: String,
        /// JSON file with extra network profiles
        #[arg(long, env = "INTENT_BUILDER_NETWORKS")]
        networks: Option<PathBuf>,
    },
}

/// Built-in profiles overlaid with the ones in `path`
pub fn load_registry(path: Option<&Path>) -> Result<NetworkRegistry> {
    let builtin = NetworkRegistry::builtin();
    let Some(path) = path else {
        return Ok(builtin);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read network profiles from {}", path.display()))?;
    let custom = NetworkRegistry::from_json(&json).context("Invalid network profiles")?;
    Ok(builtin.merge(custom))
}

pub fn handle_command(command: NetworkCommand) -> Result<()> {
    match command {
        NetworkCommand::List { networks } => {
            let registry = load_registry(networks.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&registry)?);
            Ok(())
        }
        NetworkCommand::Show { network, networks } => {
            let registry = load_registry(networks.as_deref())?;
            let resolved = registry.resolve(&network)?;
            println!("{}", serde_json::to_string_pretty(&resolved.profile)?);
            Ok(())
        }
    }
}
