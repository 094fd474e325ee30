//! Object-chain call assembly.
//!
//! Each function appends the commands for one logical operation. Argument
//! order and widths follow the destination function signatures exactly.
//! Every value is parsed and encoded before the first command is appended,
//! so a failing call leaves the accumulator untouched.

use crate::address::{validate_type_tag, SuiAddress};
use crate::coin::{coin_metadata, CoinMetadata};
use crate::compiler::GeneratedContractArtifact;
use crate::error::AssemblyError;
use crate::network::{MoveProfile, MAINNET_USDC_TYPE};
use crate::transaction::{Argument, MoveCall, PureValue, TransactionAccumulator, PUBLISH_GAS_BUDGET};
use crate::validation::{
    AddLiquidityParams, MetadataParams, MintParams, PoolOnlyParams, TokenAndPoolParams,
};
use tracing::info;

/// Amount split from coin A to seed a pool created from existing coins
pub const POOL_LIQUIDITY: u64 = 1_000_000_000;

const EXECUTOR_MODULE: &str = "executor";
const TOKEN_FACTORY_MODULE: &str = "token_factory";

/// Network ids in parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveContext {
    pub executor: SuiAddress,
    pub clock: SuiAddress,
    pub protocol_config: SuiAddress,
    pub usdc_type: String,
}

impl MoveContext {
    pub fn from_profile(profile: &MoveProfile) -> Result<Self, AssemblyError> {
        Ok(MoveContext {
            executor: SuiAddress::parse_field(&profile.executor_address, "package ID")?,
            clock: SuiAddress::parse_field(&profile.clock_id, "clock")?,
            protocol_config: SuiAddress::parse_field(
                &profile.protocol_config_id,
                "protocol config",
            )?,
            usdc_type: profile
                .usdc_type
                .clone()
                .unwrap_or_else(|| MAINNET_USDC_TYPE.to_string()),
        })
    }
}

/// One positional argument of a call, before it is added to the inputs
enum CallInput {
    Object(SuiAddress),
    Pure(PureValue),
    Result(Argument),
}

impl From<PureValue> for CallInput {
    fn from(v: PureValue) -> Self {
        CallInput::Pure(v)
    }
}

fn string(s: &str) -> CallInput {
    CallInput::Pure(PureValue::String(s.to_string()))
}

/// Append a move call built from `inputs`.
fn append_call(
    tx: &mut TransactionAccumulator,
    package: SuiAddress,
    module: &str,
    function: &str,
    type_arguments: Vec<String>,
    inputs: Vec<CallInput>,
) -> Result<Argument, AssemblyError> {
    // encode every pure value up front so failures happen before mutation
    for input in &inputs {
        if let CallInput::Pure(v) = input {
            v.to_bcs()?;
        }
    }
    let mut arguments = Vec::with_capacity(inputs.len());
    for input in inputs {
        arguments.push(match input {
            CallInput::Object(id) => tx.object(id)?,
            CallInput::Pure(v) => tx.pure(v)?,
            CallInput::Result(arg) => arg,
        });
    }
    tx.move_call(MoveCall {
        package,
        module: module.to_string(),
        function: function.to_string(),
        type_arguments,
        arguments,
    })
}

fn type_argument(tag: &str) -> Result<String, AssemblyError> {
    validate_type_tag(tag)?;
    Ok(tag.to_string())
}

// =============================================================================
// Executor module
// =============================================================================

/// `executor::create_token_and_pool<CoinB>`.
///
/// Coin B defaults to the network's USDC type; its symbol and decimals come
/// from the coin registry (`UNKNOWN`/9 for unregistered types).
pub fn create_token_and_pool(
    tx: &mut TransactionAccumulator,
    ctx: &MoveContext,
    params: &TokenAndPoolParams,
    coin_b_type: Option<&str>,
    amounts: (u64, u64),
) -> Result<Argument, AssemblyError> {
    let coin_b_type = coin_b_type.unwrap_or(&ctx.usdc_type);
    let selected: CoinMetadata = coin_metadata(coin_b_type);
    let type_arg = type_argument(&selected.type_identifier)?;

    let pool = &params.pool;
    let token = &params.token;
    let coin_b = SuiAddress::parse_field(&pool.coin_b, "coin B")?;
    let creation_fee = SuiAddress::parse_field(&pool.creation_fee, "creation fee")?;
    // the network's shared config object is used; the caller's id must still be well-formed
    SuiAddress::parse_field(&pool.protocol_config_id, "protocol config")?;

    let result = append_call(
        tx,
        ctx.executor,
        EXECUTOR_MODULE,
        "create_token_and_pool",
        vec![type_arg],
        vec![
            CallInput::Object(ctx.clock),
            CallInput::Object(ctx.protocol_config),
            PureValue::U64(token.initial_supply).into(),
            PureValue::U8(token.decimals).into(),
            string(&token.symbol),
            string(&token.name),
            string(&token.description),
            string(&token.icon_url),
            string(&pool.pool_icon_url),
            CallInput::Object(coin_b),
            string(&selected.symbol),
            PureValue::U8(selected.decimals).into(),
            PureValue::U32(pool.tick_spacing).into(),
            PureValue::U64(pool.fee_basis_points).into(),
            PureValue::U128(pool.current_sqrt_price).into(),
            CallInput::Object(creation_fee),
            PureValue::U64(amounts.0).into(),
            PureValue::U64(amounts.1).into(),
        ],
    )?;

    info!(
        symbol = %token.symbol,
        name = %token.name,
        coin_b_type = %selected.type_identifier,
        "Token and pool creation transaction built"
    );
    Ok(result)
}

/// `SplitCoins(coin_a, [POOL_LIQUIDITY])` followed by
/// `executor::create_pool_with_liquidity_only<A, B>`.
pub fn create_pool_with_liquidity_only(
    tx: &mut TransactionAccumulator,
    ctx: &MoveContext,
    params: &PoolOnlyParams,
) -> Result<Argument, AssemblyError> {
    let coin_b_type = params.coin_b_type.as_deref().unwrap_or(&ctx.usdc_type);
    let registered = coin_metadata(coin_b_type);
    let coin_b_symbol = params
        .coin_b_symbol
        .clone()
        .unwrap_or_else(|| registered.symbol.clone());
    let coin_b_decimals = params.coin_b_decimals.unwrap_or(registered.decimals);
    let type_arguments = vec![
        type_argument(&params.coin_a_type)?,
        type_argument(coin_b_type)?,
    ];
    let coin_a = SuiAddress::parse_field(&params.coin_a, "coin A")?;
    let coin_b = SuiAddress::parse_field(&params.coin_b, "coin B")?;
    PureValue::U64(POOL_LIQUIDITY).to_bcs()?;

    let coin_a_arg = tx.object(coin_a)?;
    let liquidity = tx.pure(PureValue::U64(POOL_LIQUIDITY))?;
    let split = tx.split_coins(coin_a_arg, vec![liquidity])?;
    let Argument::Result(split_index) = split else {
        return Err(AssemblyError::Encoding(
            "split did not produce a command result".to_string(),
        ));
    };

    let result = append_call(
        tx,
        ctx.executor,
        EXECUTOR_MODULE,
        "create_pool_with_liquidity_only",
        type_arguments,
        vec![
            CallInput::Object(ctx.clock),
            CallInput::Object(ctx.protocol_config),
            CallInput::Result(Argument::NestedResult(split_index, 0)),
            CallInput::Object(coin_b),
            string(&params.coin_a_symbol),
            PureValue::U8(params.coin_a_decimals).into(),
            string(&params.coin_a_url),
            string(&coin_b_symbol),
            PureValue::U8(coin_b_decimals).into(),
            string(&params.pool_icon_url),
            PureValue::U32(params.tick_spacing).into(),
            PureValue::U64(params.fee_basis_points).into(),
            PureValue::U128(params.current_sqrt_price).into(),
            PureValue::U64(params.amount_a).into(),
            PureValue::U64(params.amount_b).into(),
        ],
    )?;

    info!(
        coin_a_type = %params.coin_a_type,
        coin_b_type = %coin_b_type,
        "Pool creation transaction built"
    );
    Ok(result)
}

/// `executor::add_liquidity<A, B>`
pub fn add_liquidity(
    tx: &mut TransactionAccumulator,
    ctx: &MoveContext,
    params: &AddLiquidityParams,
) -> Result<Argument, AssemblyError> {
    let type_arguments = vec![
        type_argument(&params.coin_a_type)?,
        type_argument(&params.coin_b_type)?,
    ];
    let pool = SuiAddress::parse_field(&params.pool, "pool")?;
    let coin_a = SuiAddress::parse_field(&params.coin_a, "coin A")?;
    let coin_b = SuiAddress::parse_field(&params.coin_b, "coin B")?;

    info!(
        clock = %ctx.clock,
        config = %ctx.protocol_config,
        pool = %pool,
        amount = params.amount,
        "Add liquidity arguments"
    );
    let result = append_call(
        tx,
        ctx.executor,
        EXECUTOR_MODULE,
        "add_liquidity",
        type_arguments,
        vec![
            CallInput::Object(ctx.clock),
            CallInput::Object(ctx.protocol_config),
            CallInput::Object(pool),
            CallInput::Object(coin_a),
            CallInput::Object(coin_b),
            PureValue::U64(params.amount).into(),
        ],
    )?;
    info!(pool = %pool, "Add liquidity transaction built");
    Ok(result)
}

// =============================================================================
// Token factory module
// =============================================================================

/// `<package>::token_factory::mint(treasury_cap, amount, recipient)`
pub fn mint(
    tx: &mut TransactionAccumulator,
    package: &str,
    params: &MintParams,
) -> Result<Argument, AssemblyError> {
    let package = SuiAddress::parse_field(package, "package ID")?;
    let treasury_cap = SuiAddress::parse_field(&params.treasury_cap, "treasury cap")?;
    let recipient = SuiAddress::parse_field(&params.recipient, "recipient")?;

    let result = append_call(
        tx,
        package,
        TOKEN_FACTORY_MODULE,
        "mint",
        vec![],
        vec![
            CallInput::Object(treasury_cap),
            PureValue::U64(params.amount).into(),
            PureValue::Address(recipient).into(),
        ],
    )?;
    info!(package = %package, amount = params.amount, "Token minting prepared");
    Ok(result)
}

/// `<package>::token_factory::set_metadata(upgrade_cap, symbol, name,
/// description, icon_url, decimals)`
pub fn set_metadata(
    tx: &mut TransactionAccumulator,
    params: &MetadataParams,
) -> Result<Argument, AssemblyError> {
    let package = SuiAddress::parse_field(&params.package_id, "package ID")?;
    let upgrade_cap = SuiAddress::parse_field(&params.upgrade_cap, "upgrade cap")?;

    let result = append_call(
        tx,
        package,
        TOKEN_FACTORY_MODULE,
        "set_metadata",
        vec![],
        vec![
            CallInput::Object(upgrade_cap),
            string(&params.symbol),
            string(&params.name),
            string(&params.description),
            string(&params.icon_url),
            PureValue::U8(params.decimals).into(),
        ],
    )?;
    info!(package = %package, symbol = %params.symbol, "Token metadata setup prepared");
    Ok(result)
}

// =============================================================================
// Publish
// =============================================================================

/// Publish a generated package and hand its upgrade capability to
/// `recipient`. Raises the gas budget to [`PUBLISH_GAS_BUDGET`].
pub fn publish_and_transfer(
    tx: &mut TransactionAccumulator,
    artifact: GeneratedContractArtifact,
    recipient: SuiAddress,
) -> Result<Argument, AssemblyError> {
    let GeneratedContractArtifact { source, package } = artifact;
    info!(
        package = source.package,
        module = source.module,
        source_bytes = source.source.len(),
        "Publishing generated package"
    );
    tx.set_gas_budget(PUBLISH_GAS_BUDGET);
    let upgrade_cap = tx.publish(package.modules, package.dependencies)?;
    let address = tx.pure(PureValue::Address(recipient))?;
    tx.transfer_objects(vec![upgrade_cap], address)?;
    Ok(upgrade_cap)
}
