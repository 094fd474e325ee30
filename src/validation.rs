//! Per-intent parameter validation.
//!
//! Each validator reads the subset of the [`ParamBag`] its intent needs and
//! returns a typed record, so assemblers never see unchecked values. Checks
//! run in a fixed order and the first failure is reported.

use crate::error::ValidationError;
use crate::params::ParamBag;
use tracing::error;

/// Largest decimals value a token may declare
pub const MAX_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_supply: u64,
    pub description: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    pub pool_icon_url: String,
    pub coin_b: String,
    pub creation_fee: String,
    pub protocol_config_id: String,
    pub tick_spacing: u32,
    pub fee_basis_points: u64,
    pub current_sqrt_price: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAndPoolParams {
    pub token: TokenParams,
    pub pool: PoolParams,
}

/// Fields of a pool created from two existing coins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOnlyParams {
    pub coin_a: String,
    pub coin_a_type: String,
    pub coin_a_symbol: String,
    pub coin_a_decimals: u8,
    pub coin_a_url: String,
    pub coin_b: String,
    pub coin_b_type: Option<String>,
    pub coin_b_symbol: Option<String>,
    pub coin_b_decimals: Option<u8>,
    pub pool_icon_url: String,
    pub tick_spacing: u32,
    pub fee_basis_points: u64,
    pub current_sqrt_price: u128,
    pub amount_a: u64,
    pub amount_b: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub pool: String,
    pub coin_a: String,
    pub coin_b: String,
    pub coin_a_type: String,
    pub coin_b_type: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintParams {
    pub package_id: Option<String>,
    pub treasury_cap: String,
    pub amount: u64,
    pub recipient: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataParams {
    pub package_id: String,
    pub upgrade_cap: String,
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub icon_url: String,
    pub decimals: u8,
}

/// Log and build a validation failure
fn reject(params: &ParamBag, err: ValidationError) -> ValidationError {
    error!(params = ?params.as_map(), message = %err, "Validation failed");
    err
}

fn required(params: &ParamBag, key: &str, message: &str) -> Result<String, ValidationError> {
    params
        .require_str(key, message)
        .map(str::to_string)
        .map_err(|e| reject(params, e))
}

fn logged<T>(params: &ParamBag, result: Result<T, ValidationError>) -> Result<T, ValidationError> {
    result.map_err(|e| reject(params, e))
}

/// Validate the fields needed to publish a token.
///
/// Check order: name and symbol, decimals, initial supply, description,
/// icon URL.
pub fn validate_token_params(params: &ParamBag) -> Result<TokenParams, ValidationError> {
    let (name, symbol) = match (params.str_field("name"), params.str_field("symbol")) {
        (Some(name), Some(symbol)) => (name.to_string(), symbol.to_string()),
        _ => {
            return Err(reject(
                params,
                ValidationError::new("Token name and symbol are required"),
            ))
        }
    };

    let decimals = match logged(params, params.int("decimal", "Decimal places"))? {
        None => {
            return Err(reject(
                params,
                ValidationError::new("Decimal places are required"),
            ))
        }
        Some(d) if d > MAX_DECIMALS as i128 => {
            return Err(reject(
                params,
                ValidationError::new("Decimal places cannot exceed 18"),
            ))
        }
        Some(d) if d < 0 => {
            return Err(reject(
                params,
                ValidationError::new("Decimal places cannot be negative"),
            ))
        }
        Some(d) => d as u8,
    };

    let initial_supply = match logged(params, params.int("initialSupply", "Initial supply"))? {
        Some(s) if s > 0 => u64::try_from(s).map_err(|_| {
            reject(
                params,
                ValidationError::new("Initial supply does not fit in u64"),
            )
        })?,
        _ => {
            return Err(reject(
                params,
                ValidationError::new("Initial supply must be greater than 0"),
            ))
        }
    };

    let description = required(params, "description", "Token description is required")?;
    let icon_url = required(params, "iconUrl", "Token icon URL is required")?;

    Ok(TokenParams {
        name,
        symbol,
        decimals,
        initial_supply,
        description,
        icon_url,
    })
}

/// Validate a token plus the pool created alongside it.
///
/// Tick spacing, fee and sqrt price must arrive as arbitrary-precision
/// integers; machine numbers are rejected instead of being truncated.
pub fn validate_token_and_pool_params(
    params: &ParamBag,
) -> Result<TokenAndPoolParams, ValidationError> {
    let token = validate_token_params(params)?;

    let pool_icon_url = required(params, "pool_icon_url", "Pool icon URL is required")?;
    let coin_b = required(params, "coin_b", "Coin B object ID is required")?;
    let creation_fee = required(
        params,
        "creation_fee",
        "Creation fee coin object ID is required",
    )?;
    let protocol_config_id = required(
        params,
        "protocol_config_id",
        "Protocol config ID is required",
    )?;

    let tick_spacing = big_required(params, "tick_spacing", "Tick spacing")?;
    let tick_spacing = u32::try_from(tick_spacing).map_err(|_| {
        reject(params, ValidationError::new("Tick spacing does not fit in u32"))
    })?;
    let fee_basis_points = big_required(params, "fee_basis_points", "Fee basis points")?;
    let fee_basis_points = u64::try_from(fee_basis_points).map_err(|_| {
        reject(
            params,
            ValidationError::new("Fee basis points does not fit in u64"),
        )
    })?;
    let current_sqrt_price = big_required(params, "current_sqrt_price", "Current sqrt price")?;

    Ok(TokenAndPoolParams {
        token,
        pool: PoolParams {
            pool_icon_url,
            coin_b,
            creation_fee,
            protocol_config_id,
            tick_spacing,
            fee_basis_points,
            current_sqrt_price,
        },
    })
}

fn big_required(params: &ParamBag, key: &str, label: &str) -> Result<u128, ValidationError> {
    match logged(params, params.big_uint(key, label))? {
        Some(v) => Ok(v),
        None => Err(reject(
            params,
            ValidationError::new(format!("{} must be a BigInt", label)),
        )),
    }
}

fn u64_required(params: &ParamBag, key: &str, label: &str) -> Result<u64, ValidationError> {
    logged(params, params.uint::<u64>(key, label, "u64"))?.ok_or_else(|| {
        reject(
            params,
            ValidationError::new(format!("{} is required", label)),
        )
    })
}

/// The two liquidity amounts that accompany a pool creation
pub fn validate_pool_amounts(params: &ParamBag) -> Result<(u64, u64), ValidationError> {
    Ok((
        u64_required(params, "amount_a", "Amount A")?,
        u64_required(params, "amount_b", "Amount B")?,
    ))
}

/// Validate a pool built from two coins the sender already owns.
pub fn validate_pool_only_params(params: &ParamBag) -> Result<PoolOnlyParams, ValidationError> {
    let coin_a = required(params, "coin_a", "Coin A object ID is required")?;
    let coin_a_type = required(params, "coin_a_type", "Coin A type is required")?;
    let coin_a_symbol = required(params, "coin_a_symbol", "Coin A symbol is required")?;
    let coin_a_decimals = logged(
        params,
        params.uint::<u8>("coin_a_decimals", "Coin A decimals", "u8"),
    )?
    .ok_or_else(|| reject(params, ValidationError::new("Coin A decimals are required")))?;
    let coin_a_url = required(params, "coin_a_url", "Coin A icon URL is required")?;
    let coin_b = required(params, "coin_b", "Coin B object ID is required")?;
    let coin_b_type = params
        .get_any(&["coin_b_type", "coin_type_b"])
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let coin_b_symbol = params.str_field("coin_b_symbol").map(str::to_string);
    let coin_b_decimals = logged(
        params,
        params.uint::<u8>("coin_b_decimals", "Coin B decimals", "u8"),
    )?;
    let pool_icon_url = required(params, "pool_icon_url", "Pool icon URL is required")?;

    let tick_spacing = logged(
        params,
        params.uint::<u32>("tick_spacing", "Tick spacing", "u32"),
    )?
    .ok_or_else(|| reject(params, ValidationError::new("Tick spacing is required")))?;
    let fee_basis_points = u64_required(params, "fee_basis_points", "Fee basis points")?;
    let current_sqrt_price = logged(
        params,
        params.uint::<u128>("current_sqrt_price", "Current sqrt price", "u128"),
    )?
    .ok_or_else(|| {
        reject(
            params,
            ValidationError::new("Current sqrt price is required"),
        )
    })?;
    let (amount_a, amount_b) = validate_pool_amounts(params)?;

    Ok(PoolOnlyParams {
        coin_a,
        coin_a_type,
        coin_a_symbol,
        coin_a_decimals,
        coin_a_url,
        coin_b,
        coin_b_type,
        coin_b_symbol,
        coin_b_decimals,
        pool_icon_url,
        tick_spacing,
        fee_basis_points,
        current_sqrt_price,
        amount_a,
        amount_b,
    })
}

pub fn validate_add_liquidity_params(
    params: &ParamBag,
) -> Result<AddLiquidityParams, ValidationError> {
    let pool = required(params, "pool", "Pool object ID is required")?;
    let coin_a = required(params, "coin_a", "Coin A object ID is required")?;
    let coin_b = required(params, "coin_b", "Coin B object ID is required")?;
    let coin_a_type = required(params, "coin_a_type", "Coin A type is required")?;
    let coin_b_type = match params
        .get_any(&["coin_b_type", "coin_type_b"])
        .and_then(|v| v.as_str())
    {
        Some(t) => t.to_string(),
        None => {
            return Err(reject(
                params,
                ValidationError::new("Coin B type is required"),
            ))
        }
    };
    let amount = u64_required(params, "amount", "Amount")?;
    if amount == 0 {
        return Err(reject(
            params,
            ValidationError::new("Amount must be greater than 0"),
        ));
    }

    Ok(AddLiquidityParams {
        pool,
        coin_a,
        coin_b,
        coin_a_type,
        coin_b_type,
        amount,
    })
}

pub fn validate_mint_params(params: &ParamBag) -> Result<MintParams, ValidationError> {
    let package_id = params.str_field("executor_address").map(str::to_string);
    let treasury_cap = required(params, "treasury_cap", "Invalid treasury cap format")?;
    let amount = u64_required(params, "amount", "Amount")?;
    let recipient = required(params, "recipient", "Recipient address is required")?;
    Ok(MintParams {
        package_id,
        treasury_cap,
        amount,
        recipient,
    })
}

/// Validate a metadata update. Supply is not part of an update.
pub fn validate_metadata_params(params: &ParamBag) -> Result<MetadataParams, ValidationError> {
    let package_id = required(params, "package_id", "Invalid package ID format")?;
    let upgrade_cap = required(params, "upgrade_cap", "Invalid upgrade cap format")?;
    let name = required(params, "name", "Token name and symbol are required")?;
    let symbol = required(params, "symbol", "Token name and symbol are required")?;
    let decimals = logged(params, params.uint::<u8>("decimal", "Decimal places", "u8"))?
        .ok_or_else(|| reject(params, ValidationError::new("Decimal places are required")))?;
    if decimals > MAX_DECIMALS {
        return Err(reject(
            params,
            ValidationError::new("Decimal places cannot exceed 18"),
        ));
    }
    let description = required(params, "description", "Token description is required")?;
    let icon_url = required(params, "iconUrl", "Token icon URL is required")?;

    Ok(MetadataParams {
        package_id,
        upgrade_cap,
        symbol,
        name,
        description,
        icon_url,
        decimals,
    })
}

/// Recipient of the upgrade capability produced by a publish
pub fn validate_recipient(params: &ParamBag) -> Result<String, ValidationError> {
    required(params, "recipientAddress", "Recipient address is required")
}
