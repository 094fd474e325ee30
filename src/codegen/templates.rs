use super::{
    address_literal, byte_literal, PackageSource, PoolTokenTemplate, TokenTemplate,
    POOL_TOKEN_FACTORY_PACKAGE, TOKEN_FACTORY_MODULE, TOKEN_FACTORY_PACKAGE,
};
use crate::error::BuildError;
use crate::validation::MAX_DECIMALS;

const TOKEN_FACTORY: &str = r#"/// Module: token_factory
module token_factory::token_factory {
    use sui::coin::{Self, TreasuryCap};
    use sui::package::{Self, UpgradeCap};
    use std::ascii::String;

    /// One-time witness
    public struct TOKEN_FACTORY has drop {}

    /// Token metadata record
    public struct TokenMetadata has key, store {
        id: UID,
        symbol: vector<u8>,
        name: vector<u8>,
        description: vector<u8>,
        icon_url: String,
        decimals: u8
    }

    fun init(witness: TOKEN_FACTORY, ctx: &mut TxContext) {
        let (treasury_cap, metadata) = coin::create_currency(
            witness,
            __DECIMALS__,
            __SYMBOL__,
            __NAME__,
            __DESCRIPTION__,
            option::none(),
            ctx
        );
        let sender = tx_context::sender(ctx);
        transfer::public_transfer(treasury_cap, sender);
        transfer::public_transfer(metadata, sender);
    }

    /// Set/Update token metadata, gated by the package upgrade cap
    public entry fun set_metadata(
        upgrade_cap: &UpgradeCap,
        symbol: vector<u8>,
        name: vector<u8>,
        description: vector<u8>,
        icon_url: String,
        decimals: u8,
        ctx: &mut TxContext
    ) {
        assert!(package::upgrade_policy(upgrade_cap) == 0, 0);
        let metadata = TokenMetadata {
            id: object::new(ctx),
            symbol,
            name,
            description,
            icon_url,
            decimals
        };
        transfer::public_transfer(metadata, tx_context::sender(ctx));
    }

    public entry fun mint(
        treasury_cap: &mut TreasuryCap<TOKEN_FACTORY>,
        amount: u64,
        recipient: address,
        ctx: &mut TxContext
    ) {
        let coin = coin::mint(treasury_cap, amount, ctx);
        transfer::public_transfer(coin, recipient)
    }
}
"#;

const POOL_TOKEN_FACTORY: &str = r#"/// Module: pool_token_factory
module token_factory::pool_token_factory {
    use sui::clock::Clock;
    use sui::coin::{Self, Coin, TreasuryCap};
    use std::string;
    use executor::executor::{Self, ProtocolConfig};

    /// One-time witness
    public struct POOL_TOKEN_FACTORY has drop {}

    const DECIMALS: u8 = __DECIMALS__;
    const INITIAL_SUPPLY: u64 = __INITIAL_SUPPLY__;
    const PROTOCOL_CONFIG: address = __PROTOCOL_CONFIG__;
    const COIN_B: address = __COIN_B__;
    const COIN_B_DECIMALS: u8 = __COIN_B_DECIMALS__;
    const TICK_SPACING: u32 = __TICK_SPACING__;
    const FEE_BASIS_POINTS: u64 = __FEE_BASIS_POINTS__;
    const CURRENT_SQRT_PRICE: u128 = __CURRENT_SQRT_PRICE__;

    const EWrongProtocolConfig: u64 = 1;
    const EWrongCoinB: u64 = 2;

    fun init(witness: POOL_TOKEN_FACTORY, ctx: &mut TxContext) {
        let (treasury_cap, metadata) = coin::create_currency(
            witness,
            DECIMALS,
            __SYMBOL__,
            __NAME__,
            __DESCRIPTION__,
            option::none(),
            ctx
        );
        let sender = tx_context::sender(ctx);
        transfer::public_transfer(treasury_cap, sender);
        transfer::public_transfer(metadata, sender);
    }

    /// Mint the initial supply and open a pool against coin B
    public entry fun create_pool<CoinTypeB>(
        treasury_cap: &mut TreasuryCap<POOL_TOKEN_FACTORY>,
        clock: &Clock,
        protocol_config: &mut ProtocolConfig,
        coin_b: Coin<CoinTypeB>,
        amount_b: u64,
        ctx: &mut TxContext
    ) {
        assert!(object::id_address(protocol_config) == PROTOCOL_CONFIG, EWrongProtocolConfig);
        assert!(object::id_address(&coin_b) == COIN_B, EWrongCoinB);
        let coins = coin::mint(treasury_cap, INITIAL_SUPPLY, ctx);
        executor::create_pool_with_liquidity_only<POOL_TOKEN_FACTORY, CoinTypeB>(
            clock,
            protocol_config,
            coins,
            coin_b,
            string::utf8(__SYMBOL__),
            DECIMALS,
            string::utf8(b""),
            string::utf8(__COIN_B_SYMBOL__),
            COIN_B_DECIMALS,
            string::utf8(b""),
            TICK_SPACING,
            FEE_BASIS_POINTS,
            CURRENT_SQRT_PRICE,
            INITIAL_SUPPLY,
            amount_b,
            ctx
        );
    }

    public entry fun mint(
        treasury_cap: &mut TreasuryCap<POOL_TOKEN_FACTORY>,
        amount: u64,
        recipient: address,
        ctx: &mut TxContext
    ) {
        let coin = coin::mint(treasury_cap, amount, ctx);
        transfer::public_transfer(coin, recipient)
    }
}
"#;

fn check_decimals(field: &str, decimals: u8) -> Result<(), BuildError> {
    if decimals > MAX_DECIMALS {
        return Err(BuildError::Template(format!(
            "{} {} exceeds {}",
            field, decimals, MAX_DECIMALS
        )));
    }
    Ok(())
}

/// Fill `__MARKER__` slots in one left-to-right pass. Substituted text is
/// never scanned again, so a value that spells a marker stays a literal.
fn fill(template: &str, slots: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("__") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match slots.iter().find(|(marker, _)| tail.starts_with(marker)) {
            Some((marker, value)) => {
                out.push_str(value);
                rest = &tail[marker.len()..];
            }
            None => {
                out.push_str("__");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn token_slots(token: &TokenTemplate) -> Vec<(&'static str, String)> {
    vec![
        ("__DECIMALS__", token.decimals.to_string()),
        ("__SYMBOL__", byte_literal(&token.symbol)),
        ("__NAME__", byte_literal(&token.name)),
        ("__DESCRIPTION__", byte_literal(&token.description)),
    ]
}

/// Token factory module: currency creation, metadata update and mint.
pub fn render_token_factory(token: &TokenTemplate) -> Result<PackageSource, BuildError> {
    check_decimals("decimals", token.decimals)?;
    Ok(PackageSource {
        package: TOKEN_FACTORY_PACKAGE,
        module: TOKEN_FACTORY_MODULE,
        source: fill(TOKEN_FACTORY, &token_slots(token)),
    })
}

/// Pool token factory module: a token whose supply seeds a pool.
pub fn render_pool_token_factory(
    template: &PoolTokenTemplate,
) -> Result<PackageSource, BuildError> {
    check_decimals("decimals", template.token.decimals)?;
    check_decimals("coin B decimals", template.coin_b_decimals)?;
    let mut slots = token_slots(&template.token);
    slots.extend([
        ("__INITIAL_SUPPLY__", template.initial_supply.to_string()),
        (
            "__PROTOCOL_CONFIG__",
            address_literal(&template.protocol_config),
        ),
        ("__COIN_B__", address_literal(&template.coin_b)),
        ("__COIN_B_SYMBOL__", byte_literal(&template.coin_b_symbol)),
        ("__COIN_B_DECIMALS__", template.coin_b_decimals.to_string()),
        ("__TICK_SPACING__", template.tick_spacing.to_string()),
        ("__FEE_BASIS_POINTS__", template.fee_basis_points.to_string()),
        (
            "__CURRENT_SQRT_PRICE__",
            template.current_sqrt_price.to_string(),
        ),
    ]);
    Ok(PackageSource {
        package: POOL_TOKEN_FACTORY_PACKAGE,
        module: TOKEN_FACTORY_MODULE,
        source: fill(POOL_TOKEN_FACTORY, &slots),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> TokenTemplate {
        TokenTemplate {
            name: "Test Token".to_string(),
            symbol: "TEST".to_string(),
            decimals: 9,
            description: "A token for tests".to_string(),
        }
    }

    fn pool_template() -> PoolTokenTemplate {
        PoolTokenTemplate {
            token: token(),
            initial_supply: 1_000_000_000,
            protocol_config: "0xc0f".parse().unwrap(),
            coin_b: "0xb0b".parse().unwrap(),
            coin_b_symbol: "USDC".to_string(),
            coin_b_decimals: 6,
            tick_spacing: 60,
            fee_basis_points: 30,
            current_sqrt_price: 1 << 64,
        }
    }

    #[test]
    fn test_token_factory_substitutes_metadata() {
        let rendered = render_token_factory(&token()).unwrap();
        assert_eq!(rendered.package, "token_factory");
        assert!(rendered.source.contains("            9,\n"));
        assert!(rendered.source.contains("b\"TEST\","));
        assert!(rendered.source.contains("b\"Test Token\","));
        assert!(rendered.source.contains("b\"A token for tests\","));
        assert!(!rendered.source.contains("__"));
    }

    #[test]
    fn test_token_factory_escapes_quotes() {
        let mut hostile = token();
        hostile.name = "Evil\", 0, ctx); abort 1; (b\"".to_string();
        let rendered = render_token_factory(&hostile).unwrap();
        assert!(!rendered.source.contains("abort 1"));
        assert!(rendered.source.contains("x\"4576696c22"));
    }

    #[test]
    fn test_pool_token_factory_constants() {
        let rendered = render_pool_token_factory(&pool_template()).unwrap();
        assert_eq!(rendered.package, "token_pool_factory");
        assert!(rendered.source.contains("const TICK_SPACING: u32 = 60;"));
        assert!(rendered
            .source
            .contains("const CURRENT_SQRT_PRICE: u128 = 18446744073709551616;"));
        assert!(rendered.source.contains(
            "const COIN_B: address = @0x0000000000000000000000000000000000000000000000000000000000000b0b;"
        ));
        assert!(rendered.source.contains("string::utf8(b\"USDC\")"));
        assert!(!rendered.source.contains("__"));
    }

    #[test]
    fn test_marker_text_in_values_stays_literal() {
        let mut hostile = token();
        hostile.symbol = "__NAME__".to_string();
        hostile.name = "); } public fun drain() { abort 0 } fun f() { (".to_string();
        let rendered = render_token_factory(&hostile).unwrap();
        assert!(rendered.source.contains("            b\"__NAME__\",\n"));
        assert!(rendered
            .source
            .contains("            b\"); } public fun drain() { abort 0 } fun f() { (\",\n"));
        assert!(!rendered.source.contains("b\"b\""));
        assert_eq!(rendered.source.matches("public fun drain").count(), 1);
    }

    #[test]
    fn test_pool_marker_name_is_not_rewritten() {
        let mut template = pool_template();
        template.token.name = "__TICK_SPACING__".to_string();
        let rendered = render_pool_token_factory(&template).unwrap();
        assert!(rendered.source.contains("b\"__TICK_SPACING__\""));
        assert!(rendered.source.contains("const TICK_SPACING: u32 = 60;"));
    }

    #[test]
    fn test_unknown_markers_pass_through() {
        let slots = [("__A__", "1".to_string())];
        assert_eq!(fill("x__A__y__B__z__", &slots), "x1y__B__z__");
    }

    #[test]
    fn test_rejects_out_of_range_decimals() {
        let mut template = pool_template();
        template.coin_b_decimals = 30;
        assert!(matches!(
            render_pool_token_factory(&template),
            Err(BuildError::Template(_))
        ));
    }
}
