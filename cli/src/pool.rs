use alloy_primitives::U256;
use anyhow::Result;
use clap::Args;
use wasm_intent_builder::{calculate_pool_parameters, price_from_sqrt_price};

#[derive(Args)]
pub struct PoolParamsArgs {
    /// Price of token A in token B, as a decimal
    #[arg(long)]
    price: String,
    #[arg(long, default_value_t = 60)]
    tick_spacing: i32,
    #[arg(long, default_value_t = 18)]
    decimals_a: u8,
    #[arg(long, default_value_t = 18)]
    decimals_b: u8,
}

#[derive(Args)]
pub struct SqrtPriceArgs {
    /// Q64.96 sqrt price as a base-10 integer
    sqrt_price_x96: U256,
    #[arg(long, default_value_t = 18)]
    decimals_a: u8,
    #[arg(long, default_value_t = 18)]
    decimals_b: u8,
    /// Fractional digits to print
    #[arg(long, default_value_t = 18)]
    precision: u8,
}

pub fn handle_pool_params(args: PoolParamsArgs) -> Result<()> {
    let pool = calculate_pool_parameters(
        &args.price,
        args.tick_spacing,
        args.decimals_a,
        args.decimals_b,
    )?;
    println!("{}", serde_json::to_string_pretty(&pool)?);
    Ok(())
}

pub fn handle_sqrt_price(args: SqrtPriceArgs) -> Result<()> {
    let price = price_from_sqrt_price(
        args.sqrt_price_x96,
        args.decimals_a,
        args.decimals_b,
        args.precision,
    )?;
    println!("{}", price);
    Ok(())
}
