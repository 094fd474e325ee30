//! EVM contract calls: token factory, mintable token and pool creator.
//!
//! Calls are populated, never sent: the result carries `to`, ABI-encoded
//! `data` and, for payable calls, `value`.

use super::pool_math::{calculate_pool_parameters, PoolParameters};
use super::units::parse_units;
use crate::address::parse_evm_address;
use crate::error::{AssemblyError, StepError, ValidationError};
use crate::network::EvmProfile;
use crate::params::ParamBag;
use crate::transaction::ContractTransaction;
use crate::validation::MAX_DECIMALS;
use alloy_primitives::aliases::{I24, U160, U24};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use tracing::info;

sol! {
    interface ITokenFactory {
        function createToken(
            string name,
            string symbol,
            uint8 decimals,
            uint256 initialSupply,
            address owner
        ) external returns (address token);
    }

    interface IMintableToken {
        function mint(address to, uint256 amount) external;
    }

    interface IPoolCreator {
        function createPoolAndAddLiquidity(
            address tokenA,
            address tokenB,
            uint24 fee,
            int24 tickSpacing,
            address hooks,
            uint160 sqrtPriceX96,
            uint256 token0Amount,
            uint256 token1Amount,
            int24 tickLower,
            int24 tickUpper
        ) external payable;
    }
}

/// Largest fee a pool accepts (100% in hundredths of a bip)
pub const MAX_FEE: u32 = 1_000_000;

// =============================================================================
// Parameters
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTokenParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Human-readable supply, scaled by `decimals` when encoded
    pub initial_supply: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmMintParams {
    pub token_address: String,
    pub to: String,
    pub amount: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolToken {
    pub address: String,
    pub decimals: u8,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmPoolParams {
    pub token_a: PoolToken,
    pub token_b: PoolToken,
    pub fee: u32,
    pub tick_spacing: i32,
    pub price: String,
    pub hooks: Option<String>,
    pub token0_amount: String,
    pub token1_amount: String,
}

fn decimals_field(params: &ParamBag, key: &str) -> Result<u8, ValidationError> {
    let decimals = params
        .uint::<u8>(key, "Decimals", "u8")?
        .ok_or_else(|| ValidationError::new("Decimals are required"))?;
    if decimals > MAX_DECIMALS {
        return Err(ValidationError::new("Decimal places cannot exceed 18"));
    }
    Ok(decimals)
}

fn text_field(params: &ParamBag, key: &str, message: &str) -> Result<String, ValidationError> {
    params
        .decimal_text(key)
        .ok_or_else(|| ValidationError::new(message))
}

impl EvmTokenParams {
    pub fn from_params(params: &ParamBag) -> Result<Self, ValidationError> {
        let (name, symbol) = match (params.str_field("name"), params.str_field("symbol")) {
            (Some(n), Some(s)) => (n.to_string(), s.to_string()),
            _ => return Err(ValidationError::new("Token name and symbol are required")),
        };
        let decimals = decimals_field(params, "decimals")?;
        let initial_supply = text_field(
            params,
            "initialSupply",
            "Initial supply must be greater than 0",
        )?;
        let owner = params
            .str_field("owner")
            .unwrap_or_default()
            .to_string();
        Ok(EvmTokenParams {
            name,
            symbol,
            decimals,
            initial_supply,
            owner,
        })
    }
}

impl EvmMintParams {
    pub fn from_params(params: &ParamBag) -> Result<Self, ValidationError> {
        Ok(EvmMintParams {
            token_address: params
                .require_str("tokenAddress", "Token address is required")?
                .to_string(),
            to: params
                .require_str("to", "Recipient address is required")?
                .to_string(),
            amount: text_field(params, "amount", "Amount is required")?,
            decimals: decimals_field(params, "decimals")?,
        })
    }
}

impl PoolToken {
    fn from_params(params: &ParamBag, key: &str, label: &str) -> Result<Self, ValidationError> {
        let token = params
            .object(key)
            .ok_or_else(|| ValidationError::new(format!("{} is required", label)))?;
        Ok(PoolToken {
            address: token
                .require_str("address", &format!("{} address is required", label))?
                .to_string(),
            decimals: decimals_field(&token, "decimals")?,
            symbol: token.str_field("symbol").map(str::to_string),
        })
    }
}

impl EvmPoolParams {
    pub fn from_params(params: &ParamBag) -> Result<Self, ValidationError> {
        let token_a = PoolToken::from_params(params, "tokenA", "Token A")?;
        let token_b = PoolToken::from_params(params, "tokenB", "Token B")?;
        let fee = params
            .uint::<u32>("fee", "Fee", "uint24")?
            .ok_or_else(|| ValidationError::new("Fee is required"))?;
        if fee > MAX_FEE {
            return Err(ValidationError::new(format!("Fee cannot exceed {}", MAX_FEE)));
        }
        let tick_spacing = params
            .int("tickSpacing", "Tick spacing")?
            .ok_or_else(|| ValidationError::new("Tick spacing is required"))?;
        let tick_spacing = i32::try_from(tick_spacing)
            .map_err(|_| ValidationError::new("Tick spacing does not fit in int24"))?;
        Ok(EvmPoolParams {
            token_a,
            token_b,
            fee,
            tick_spacing,
            price: text_field(params, "price", "Price is required")?,
            hooks: params.str_field("hooks").map(str::to_string),
            token0_amount: text_field(params, "token0Amount", "Token 0 amount is required")?,
            token1_amount: text_field(params, "token1Amount", "Token 1 amount is required")?,
        })
    }
}

// =============================================================================
// Call composition
// =============================================================================

/// `ITokenFactory.createToken` with the supply scaled by `10^decimals`
pub fn create_token(
    profile: &EvmProfile,
    params: &EvmTokenParams,
) -> Result<ContractTransaction, AssemblyError> {
    let factory = parse_evm_address(&profile.token_factory_address, "token factory address")?;
    let owner = parse_evm_address(&params.owner, "owner address")?;
    let supply = parse_units(&params.initial_supply, params.decimals, "initial supply")?;

    let call = ITokenFactory::createTokenCall {
        name: params.name.clone(),
        symbol: params.symbol.clone(),
        decimals: params.decimals,
        initialSupply: supply,
        owner,
    };

    info!(
        name = %params.name,
        symbol = %params.symbol,
        factory = %factory,
        "EVM token creation transaction populated"
    );
    Ok(populate(factory, call.abi_encode(), None, profile.chain_id))
}

/// `mint(to, amount)` on an existing token
pub fn mint_token(
    profile: &EvmProfile,
    params: &EvmMintParams,
) -> Result<ContractTransaction, AssemblyError> {
    let token = parse_evm_address(&params.token_address, "token address")?;
    let to = parse_evm_address(&params.to, "recipient address")?;
    let amount = parse_units(&params.amount, params.decimals, "amount")?;

    let call = IMintableToken::mintCall { to, amount };

    info!(token = %token, to = %to, "EVM token mint transaction populated");
    Ok(populate(token, call.abi_encode(), None, profile.chain_id))
}

/// Pool creation plus initial liquidity around the current price.
///
/// Returns the populated call together with the derived price parameters.
pub fn create_pool(
    profile: &EvmProfile,
    params: &EvmPoolParams,
) -> Result<(ContractTransaction, PoolParameters), AssemblyError> {
    let creator = parse_evm_address(&profile.pool_creator_address, "pool creator address")?;
    let token_a = parse_evm_address(&params.token_a.address, "token A address")?;
    let token_b = parse_evm_address(&params.token_b.address, "token B address")?;
    let hooks = match params.hooks.as_deref() {
        Some(h) => parse_evm_address(h, "hooks address")?,
        None => Address::ZERO,
    };
    let token0_amount = parse_units(&params.token0_amount, 0, "token0Amount")?;
    let token1_amount = parse_units(&params.token1_amount, 0, "token1Amount")?;

    let pool = calculate_pool_parameters(
        &params.price,
        params.tick_spacing,
        params.token_a.decimals,
        params.token_b.decimals,
    )?;

    let call = IPoolCreator::createPoolAndAddLiquidityCall {
        tokenA: token_a,
        tokenB: token_b,
        fee: U24::from(params.fee),
        tickSpacing: int24(pool.tick_spacing, "tickSpacing")?,
        hooks,
        sqrtPriceX96: uint160(pool.sqrt_price_x96)?,
        token0Amount: token0_amount,
        token1Amount: token1_amount,
        tickLower: int24(pool.lower_tick, "tickLower")?,
        tickUpper: int24(pool.upper_tick, "tickUpper")?,
    };

    info!(
        creator = %creator,
        sqrt_price_x96 = %pool.sqrt_price_x96,
        tick_lower = pool.lower_tick,
        tick_upper = pool.upper_tick,
        "EVM pool creation transaction populated"
    );
    let tx = populate(
        creator,
        call.abi_encode(),
        Some(token1_amount),
        profile.chain_id,
    );
    Ok((tx, pool))
}

fn populate(
    to: Address,
    data: Vec<u8>,
    value: Option<U256>,
    chain_id: Option<u64>,
) -> ContractTransaction {
    ContractTransaction {
        to,
        data: Bytes::from(data),
        value,
        chain_id,
    }
}

fn int24(value: i32, field: &str) -> Result<I24, AssemblyError> {
    I24::try_from(value).map_err(|_| AssemblyError::Overflow {
        field: field.to_string(),
        width: "int24",
    })
}

fn uint160(value: U256) -> Result<U160, AssemblyError> {
    let bytes = value.to_be_bytes::<32>();
    if bytes[..12].iter().any(|b| *b != 0) {
        return Err(AssemblyError::Overflow {
            field: "sqrtPriceX96".to_string(),
            width: "uint160",
        });
    }
    Ok(U160::from_be_slice(&bytes[12..]))
}

/// Compose from a raw parameter bag
pub fn compose_create_token(
    profile: &EvmProfile,
    params: &ParamBag,
) -> Result<ContractTransaction, StepError> {
    let parsed = EvmTokenParams::from_params(params)?;
    Ok(create_token(profile, &parsed)?)
}

pub fn compose_mint_token(
    profile: &EvmProfile,
    params: &ParamBag,
) -> Result<ContractTransaction, StepError> {
    let parsed = EvmMintParams::from_params(params)?;
    Ok(mint_token(profile, &parsed)?)
}

pub fn compose_create_pool(
    profile: &EvmProfile,
    params: &ParamBag,
) -> Result<ContractTransaction, StepError> {
    let parsed = EvmPoolParams::from_params(params)?;
    Ok(create_pool(profile, &parsed)?.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) const FACTORY: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    pub(crate) const CREATOR: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
    const OWNER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const TOKEN_A: &str = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0";
    const TOKEN_B: &str = "0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9";

    pub(crate) fn profile() -> EvmProfile {
        EvmProfile {
            token_factory_address: FACTORY.to_string(),
            pool_creator_address: CREATOR.to_string(),
            provider_endpoint: "http://127.0.0.1:8545".to_string(),
            chain_id: Some(31337),
        }
    }

    pub(crate) fn token_bag() -> ParamBag {
        ParamBag::from_value(json!({
            "name": "Test Token",
            "symbol": "TEST",
            "decimals": 18,
            "initialSupply": "1000000",
            "owner": OWNER
        }))
        .unwrap()
    }

    pub(crate) fn pool_bag() -> ParamBag {
        ParamBag::from_value(json!({
            "tokenA": { "address": TOKEN_A, "decimals": 18, "symbol": "AAA" },
            "tokenB": { "address": TOKEN_B, "decimals": 18, "symbol": "BBB" },
            "fee": 3000,
            "tickSpacing": 60,
            "price": "1",
            "token0Amount": "1000000000000000000",
            "token1Amount": "2000000000000000000"
        }))
        .unwrap()
    }

    #[test]
    fn test_create_token_calldata() {
        let tx = compose_create_token(&profile(), &token_bag()).unwrap();
        assert_eq!(tx.to, FACTORY.parse::<Address>().unwrap());
        assert_eq!(tx.value, None);
        assert_eq!(tx.chain_id, Some(31337));
        assert_eq!(&tx.data[..4], ITokenFactory::createTokenCall::SELECTOR.as_slice());

        let decoded = ITokenFactory::createTokenCall::abi_decode(&tx.data, true).unwrap();
        assert_eq!(decoded.name, "Test Token");
        assert_eq!(decoded.decimals, 18);
        assert_eq!(
            decoded.initialSupply,
            U256::from(1_000_000u64) * U256::from(10u64).pow(U256::from(18u64))
        );
        assert_eq!(decoded.owner, OWNER.parse::<Address>().unwrap());
    }

    #[test]
    fn test_create_token_rejects_bad_addresses() {
        let err = compose_create_token(&profile(), &token_bag().with("owner", "0x1234"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid owner address: 0x1234");

        let mut bad_factory = profile();
        bad_factory.token_factory_address = "factory".to_string();
        let err = compose_create_token(&bad_factory, &token_bag()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid token factory address: factory");
    }

    #[test]
    fn test_create_token_too_many_fraction_digits() {
        let bag = token_bag().with("decimals", 2).with("initialSupply", "1.001");
        assert!(matches!(
            compose_create_token(&profile(), &bag),
            Err(StepError::Assembly(AssemblyError::InvalidAmount { .. }))
        ));
    }

    #[test]
    fn test_mint_scales_amount() {
        let bag = ParamBag::from_value(json!({
            "tokenAddress": TOKEN_A, "to": OWNER, "amount": "2.5", "decimals": 6
        }))
        .unwrap();
        let tx = compose_mint_token(&profile(), &bag).unwrap();
        assert_eq!(tx.to, TOKEN_A.parse::<Address>().unwrap());
        let decoded = IMintableToken::mintCall::abi_decode(&tx.data, true).unwrap();
        assert_eq!(decoded.amount, U256::from(2_500_000u64));
    }

    #[test]
    fn test_create_pool_at_price_one() {
        let parsed = EvmPoolParams::from_params(&pool_bag()).unwrap();
        let (tx, pool) = create_pool(&profile(), &parsed).unwrap();
        assert_eq!(tx.to, CREATOR.parse::<Address>().unwrap());
        assert_eq!(tx.value, Some(U256::from(2_000_000_000_000_000_000u64)));
        assert_eq!(pool.current_tick, 0);

        let decoded =
            IPoolCreator::createPoolAndAddLiquidityCall::abi_decode(&tx.data, true).unwrap();
        assert_eq!(decoded.sqrtPriceX96, U160::from(1u8) << 96);
        assert_eq!(decoded.fee, U24::from(3000u32));
        assert_eq!(decoded.hooks, Address::ZERO);
        assert_eq!(decoded.tickSpacing, I24::try_from(60).unwrap());
        assert_eq!(decoded.tickLower, I24::try_from(-6000).unwrap());
        assert_eq!(decoded.tickUpper, I24::try_from(6000).unwrap());
    }

    #[test]
    fn test_create_pool_requires_tokens() {
        let mut bag = pool_bag();
        bag.insert("tokenA", serde_json::Value::Null);
        let err = compose_create_pool(&profile(), &bag).unwrap_err();
        assert_eq!(err.to_string(), "Token A is required");
    }

    #[test]
    fn test_create_pool_fee_bound() {
        let bag = pool_bag().with("fee", 1_000_001);
        assert!(compose_create_pool(&profile(), &bag).is_err());
    }
}
