//! Concentrated-liquidity price math (Q64.96 sqrt prices and ticks).
//!
//! Matches the on-chain TickMath library bit for bit: the sqrt ratio at a
//! tick is computed from the same fixed-point constants and rounding.

use super::units::{parse_decimal, pow10};
use crate::error::AssemblyError;
use crate::validation::MAX_DECIMALS;
use alloy_primitives::{U256, U512};
use serde::{Serialize, Serializer};

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;
/// Largest tick spacing a pool accepts
pub const MAX_TICK_SPACING: i32 = 32767;
/// Ticks on either side of the current tick covered by the initial position
pub const RANGE_SPACINGS: i32 = 100;
/// Fractional digits accepted in a price
const MAX_PRICE_SCALE: u32 = 38;

/// `getSqrtRatioAtTick(MIN_TICK)`
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);
/// `getSqrtRatioAtTick(MAX_TICK)`
pub const MAX_SQRT_RATIO: U256 = U256::from_limbs([
    0x5d951d5263988d26,
    0xefd1fc6a50648849,
    0xfffd8963,
    0,
]);

/// `1.0001^(-bit/2)` in Q128.128 for each bit of the absolute tick
const TICK_FACTORS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

/// Result of [`calculate_pool_parameters`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolParameters {
    #[serde(serialize_with = "decimal_string")]
    pub sqrt_price_x96: U256,
    pub current_tick: i32,
    pub lower_tick: i32,
    pub upper_tick: i32,
    pub tick_spacing: i32,
}

fn decimal_string<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// Sqrt price (Q64.96) at `tick`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, AssemblyError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(AssemblyError::PriceOutOfRange(format!(
            "tick {} outside [{}, {}]",
            tick, MIN_TICK, MAX_TICK
        )));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::from(1u8) << 128
    };
    for (bit, factor) in TICK_FACTORS {
        if abs_tick & bit != 0 {
            ratio = (ratio * U256::from(factor)) >> 128;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let remainder = ratio & U256::from(u32::MAX);
    let rounded = (ratio >> 32) + U256::from(u8::from(!remainder.is_zero()));
    Ok(rounded)
}

/// Greatest tick whose sqrt ratio is at most `sqrt_price_x96`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, AssemblyError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(AssemblyError::PriceOutOfRange(format!(
            "sqrt price {} outside the supported range",
            sqrt_price_x96
        )));
    }
    let (mut lo, mut hi) = (MIN_TICK, MAX_TICK);
    while lo < hi {
        // upper midpoint so `lo = mid` always makes progress
        let mid = lo + (hi - lo + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// Round `tick` to the nearest multiple of `tick_spacing` (halves round up),
/// keeping the result inside the tick bounds.
pub fn nearest_usable_tick(tick: i32, tick_spacing: i32) -> Result<i32, AssemblyError> {
    check_tick_spacing(tick_spacing)?;
    let tick = i64::from(tick.clamp(MIN_TICK, MAX_TICK));
    let spacing = i64::from(tick_spacing);
    let rounded = (2 * tick + spacing).div_euclid(2 * spacing) * spacing;
    let adjusted = if rounded < i64::from(MIN_TICK) {
        rounded + spacing
    } else if rounded > i64::from(MAX_TICK) {
        rounded - spacing
    } else {
        rounded
    };
    // within bounds after adjustment, so this always fits
    Ok(adjusted as i32)
}

fn check_tick_spacing(tick_spacing: i32) -> Result<(), AssemblyError> {
    if tick_spacing <= 0 || tick_spacing > MAX_TICK_SPACING {
        return Err(AssemblyError::PriceOutOfRange(format!(
            "tick spacing {} outside [1, {}]",
            tick_spacing, MAX_TICK_SPACING
        )));
    }
    Ok(())
}

/// `floor(sqrt((amount1 << 192) / amount0))`
pub fn encode_sqrt_ratio_x96(amount1: U256, amount0: U256) -> Result<U256, AssemblyError> {
    encode_ratio(widen(amount1), widen(amount0))
}

fn widen(value: U256) -> U512 {
    let l = value.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

fn narrow(value: U512) -> Option<U256> {
    let l = value.as_limbs();
    if l[4..].iter().any(|limb| *limb != 0) {
        return None;
    }
    Some(U256::from_limbs([l[0], l[1], l[2], l[3]]))
}

fn encode_ratio(numerator: U512, denominator: U512) -> Result<U256, AssemblyError> {
    if denominator.is_zero() {
        return Err(AssemblyError::PriceOutOfRange(
            "ratio denominator is zero".to_string(),
        ));
    }
    let ratio_x192 = (numerator << 192usize) / denominator;
    narrow(isqrt(ratio_x192)).ok_or_else(|| {
        AssemblyError::PriceOutOfRange("sqrt price does not fit in uint256".to_string())
    })
}

/// Floor square root by Newton iteration
fn isqrt(n: U512) -> U512 {
    if n < U512::from(2u8) {
        return n;
    }
    let mut x = n;
    let mut y = (x + U512::from(1u8)) >> 1;
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }
    x
}

fn check_decimals(decimals_a: u8, decimals_b: u8) -> Result<(), AssemblyError> {
    for decimals in [decimals_a, decimals_b] {
        if decimals > MAX_DECIMALS {
            return Err(AssemblyError::InvalidAmount {
                field: "decimals".to_string(),
                reason: format!("{} exceeds {}", decimals, MAX_DECIMALS),
            });
        }
    }
    Ok(())
}

/// Sqrt price for `price` units of token B per unit of token A.
///
/// The price is parsed as an exact decimal and scaled by each token's
/// decimals: `sqrt((price * 10^decimals_a << 192) / 10^decimals_b)`.
pub fn sqrt_price_from_price(
    price: &str,
    decimals_a: u8,
    decimals_b: u8,
) -> Result<U256, AssemblyError> {
    check_decimals(decimals_a, decimals_b)?;
    let price = parse_decimal(price, "price")?;
    if price.scale > MAX_PRICE_SCALE {
        return Err(AssemblyError::InvalidAmount {
            field: "price".to_string(),
            reason: format!("more than {} fractional digits", MAX_PRICE_SCALE),
        });
    }
    if price.is_zero() {
        return Err(AssemblyError::PriceOutOfRange(
            "price must be greater than 0".to_string(),
        ));
    }
    let numerator = widen(price.digits) * widen(pow10(u32::from(decimals_a)));
    let denominator = widen(pow10(price.scale)) * widen(pow10(u32::from(decimals_b)));
    encode_ratio(numerator, denominator)
}

/// Inverse of [`sqrt_price_from_price`], rendered with `precision` fractional
/// digits (truncated, at most 38).
pub fn price_from_sqrt_price(
    sqrt_price_x96: U256,
    decimals_a: u8,
    decimals_b: u8,
    precision: u8,
) -> Result<String, AssemblyError> {
    check_decimals(decimals_a, decimals_b)?;
    if !(MIN_SQRT_RATIO..=MAX_SQRT_RATIO).contains(&sqrt_price_x96) {
        return Err(AssemblyError::PriceOutOfRange(format!(
            "sqrt price {} outside [{}, {}]",
            sqrt_price_x96, MIN_SQRT_RATIO, MAX_SQRT_RATIO
        )));
    }
    let precision = precision.min(MAX_PRICE_SCALE as u8);
    let sqrt = widen(sqrt_price_x96);
    let numerator: U512 = sqrt * sqrt
        * widen(pow10(u32::from(decimals_b)))
        * widen(pow10(u32::from(precision)));
    let denominator: U512 = (U512::from(1u8) << 192usize) * widen(pow10(u32::from(decimals_a)));
    let scaled: U512 = numerator / denominator;
    let text = scaled.to_string();
    if precision == 0 {
        return Ok(text);
    }
    let width = precision as usize + 1;
    let padded = format!("{:0>width$}", text, width = width);
    let (whole, frac) = padded.split_at(padded.len() - precision as usize);
    Ok(format!("{}.{}", whole, frac))
}

/// Initial sqrt price, current tick and a position range of
/// [`RANGE_SPACINGS`] tick spacings on either side of the current tick.
pub fn calculate_pool_parameters(
    price: &str,
    tick_spacing: i32,
    decimals_a: u8,
    decimals_b: u8,
) -> Result<PoolParameters, AssemblyError> {
    check_tick_spacing(tick_spacing)?;
    let sqrt_price_x96 = sqrt_price_from_price(price, decimals_a, decimals_b)?;
    let current_tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;
    let offset = RANGE_SPACINGS * tick_spacing;
    let lower_tick = nearest_usable_tick(current_tick.saturating_sub(offset), tick_spacing)?;
    let upper_tick = nearest_usable_tick(current_tick.saturating_add(offset), tick_spacing)?;

    Ok(PoolParameters {
        sqrt_price_x96,
        current_tick,
        lower_tick,
        upper_tick,
        tick_spacing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn q96() -> U256 {
        U256::from(1u8) << 96
    }

    #[test]
    fn test_sqrt_ratio_bounds() {
        assert_eq!(get_sqrt_ratio_at_tick(MIN_TICK).unwrap(), MIN_SQRT_RATIO);
        assert_eq!(get_sqrt_ratio_at_tick(MAX_TICK).unwrap(), MAX_SQRT_RATIO);
        assert_eq!(
            MAX_SQRT_RATIO.to_string(),
            "1461446703485210103287273052203988822378723970342"
        );
        assert!(get_sqrt_ratio_at_tick(MAX_TICK + 1).is_err());
    }

    #[test]
    fn test_sqrt_ratio_at_zero_is_one() {
        assert_eq!(get_sqrt_ratio_at_tick(0).unwrap(), q96());
    }

    #[test]
    fn test_sqrt_ratio_is_monotonic() {
        let mut prev = get_sqrt_ratio_at_tick(-1000).unwrap();
        for tick in -999..=1000 {
            let next = get_sqrt_ratio_at_tick(tick).unwrap();
            assert!(next > prev);
            prev = next;
        }
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(-1)]
    #[case(6931)]
    #[case(-276325)]
    #[case(MIN_TICK)]
    #[case(MAX_TICK - 1)]
    fn test_tick_round_trip(#[case] tick: i32) {
        let ratio = get_sqrt_ratio_at_tick(tick).unwrap();
        assert_eq!(get_tick_at_sqrt_ratio(ratio).unwrap(), tick);
        if tick > MIN_TICK {
            assert_eq!(get_tick_at_sqrt_ratio(ratio - U256::from(1u8)).unwrap(), tick - 1);
        }
    }

    #[rstest]
    #[case(0, 60, 0)]
    #[case(29, 60, 0)]
    #[case(30, 60, 60)]
    #[case(-30, 60, 0)]
    #[case(-31, 60, -60)]
    #[case(-150, 60, -120)]
    #[case(MIN_TICK, 60, -887220)]
    #[case(MAX_TICK, 60, 887220)]
    #[case(MAX_TICK, 1, MAX_TICK)]
    fn test_nearest_usable_tick(#[case] tick: i32, #[case] spacing: i32, #[case] expected: i32) {
        assert_eq!(nearest_usable_tick(tick, spacing).unwrap(), expected);
    }

    #[test]
    fn test_nearest_usable_tick_rejects_bad_spacing() {
        assert!(nearest_usable_tick(0, 0).is_err());
        assert!(nearest_usable_tick(0, -60).is_err());
    }

    #[test]
    fn test_price_one() {
        let params = calculate_pool_parameters("1", 60, 18, 18).unwrap();
        assert_eq!(params.sqrt_price_x96, q96());
        assert_eq!(params.current_tick, 0);
        assert_eq!(params.lower_tick, -6000);
        assert_eq!(params.upper_tick, 6000);
        assert_eq!(params.lower_tick % 60, 0);
        assert_eq!(params.lower_tick + params.upper_tick, 0);
    }

    #[test]
    fn test_encode_sqrt_ratio() {
        assert_eq!(
            encode_sqrt_ratio_x96(U256::from(1u8), U256::from(1u8)).unwrap(),
            q96()
        );
        // sqrt(4) = 2
        assert_eq!(
            encode_sqrt_ratio_x96(U256::from(4u8), U256::from(1u8)).unwrap(),
            q96() * U256::from(2u8)
        );
        assert!(encode_sqrt_ratio_x96(U256::from(1u8), U256::ZERO).is_err());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 1)]
    #[case(3, 1)]
    #[case(4, 2)]
    #[case(99, 9)]
    #[case(100, 10)]
    fn test_isqrt(#[case] n: u64, #[case] root: u64) {
        assert_eq!(isqrt(U512::from(n)), U512::from(root));
    }

    #[test]
    fn test_decimal_price_matches_integer_ratio() {
        // 2.5 with equal decimals is the ratio 5/2
        let from_price = sqrt_price_from_price("2.5", 6, 6).unwrap();
        let from_ratio = encode_sqrt_ratio_x96(U256::from(5u8), U256::from(2u8)).unwrap();
        assert_eq!(from_price, from_ratio);
    }

    #[test]
    fn test_decimals_shift_the_tick() {
        // 1 token A (6 decimals) = 1 token B (18 decimals): raw ratio 10^-12
        let params = calculate_pool_parameters("1", 10, 18, 6).unwrap();
        assert!(params.current_tick > 0);
        let params = calculate_pool_parameters("1", 10, 6, 18).unwrap();
        assert!(params.current_tick < 0);
        assert_eq!(params.lower_tick % 10, 0);
        assert_eq!(params.upper_tick % 10, 0);
    }

    #[test]
    fn test_price_out_of_range() {
        assert!(calculate_pool_parameters("0", 60, 18, 18).is_err());
        assert!(calculate_pool_parameters("-1", 60, 18, 18).is_err());
        assert!(calculate_pool_parameters("1", 0, 18, 18).is_err());
    }

    #[test]
    fn test_price_from_sqrt_price() {
        assert_eq!(price_from_sqrt_price(q96(), 18, 18, 4).unwrap(), "1.0000");
        let sqrt = sqrt_price_from_price("2.5", 6, 6).unwrap();
        assert_eq!(price_from_sqrt_price(sqrt, 6, 6, 1).unwrap(), "2.4");
        assert_eq!(price_from_sqrt_price(q96(), 18, 18, 0).unwrap(), "1");
    }

    #[test]
    fn test_price_from_sqrt_price_rejects_out_of_range() {
        assert!(price_from_sqrt_price(U256::ZERO, 18, 18, 4).is_err());
        assert!(price_from_sqrt_price(MAX_SQRT_RATIO + U256::from(1u8), 18, 18, 4).is_err());
        assert!(price_from_sqrt_price(q96(), 19, 18, 4).is_err());
    }
}
