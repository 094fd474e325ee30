use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod intent;
mod network;
mod pool;

#[derive(Parser)]
#[command(name = "wasm-intent-builder-cli")]
#[command(about = "Build unsigned transactions from intents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a transaction from an ordered list of intents
    Build(intent::BuildArgs),
    /// Network profile operations
    Networks {
        #[command(subcommand)]
        command: network::NetworkCommand,
    },
    /// Resolve the symbol and decimals of a coin type
    Coin {
        /// Fully-qualified coin type, e.g. 0x2::sui::SUI
        coin_type: String,
    },
    /// Compute the sqrt price and tick range of an EVM pool
    PoolParams(pool::PoolParamsArgs),
    /// Convert a Q64.96 sqrt price back to a decimal price
    SqrtPrice(pool::SqrtPriceArgs),
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => intent::handle_build(args),
        Commands::Networks { command } => network::handle_command(command),
        Commands::Coin { coin_type } => {
            let metadata = wasm_intent_builder::coin_metadata(&coin_type);
            println!("{}", serde_json::to_string_pretty(&metadata)?);
            Ok(())
        }
        Commands::PoolParams(args) => pool::handle_pool_params(args),
        Commands::SqrtPrice(args) => pool::handle_sqrt_price(args),
    }
}

/// Logs go to stderr so stdout carries only JSON.
fn init_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wasm_intent_builder=info,warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .with(env_filter)
        .init();
}
