//! Minimum fee components
//!
//! All arithmetic is exact: prices are rationals and results are rounded
//! once, at the end. A fee that doesn't fit a [Coin] is an error.

use crate::{
    params::{NetworkParams, RationalNumber},
    redeemer::ExUnits,
    Coin, Error,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

fn to_coin(value: BigInt) -> Result<Coin, Error> {
    value
        .to_u64()
        .ok_or_else(|| Error::CoinOutOfRange(value.to_string()))
}

/// `fee_fixed + fee_per_byte * size`
pub fn calc_linear_fee(size: u64, params: &NetworkParams) -> Result<Coin, Error> {
    to_coin(BigInt::from(params.fee_per_byte) * size + params.fee_fixed)
}

/// Price of an execution budget, rounded up
pub fn calc_ex_fee(units: &ExUnits, params: &NetworkParams) -> Result<Coin, Error> {
    let price = |p: &RationalNumber| p.to_rational().unwrap_or_else(BigRational::zero);

    let total = price(&params.price_mem) * BigInt::from(units.mem)
        + price(&params.price_steps) * BigInt::from(units.steps);

    to_coin(total.ceil().to_integer())
}

/// Fee for `size` bytes of reference scripts
///
/// The price per byte starts at `fee_per_byte` and is multiplied by
/// `growth_factor` for every full `growth_increment` bytes. The sum is
/// rounded down.
pub fn calc_ref_scripts_fee(
    size: u64,
    fee_per_byte: Coin,
    growth_increment: u64,
    growth_factor: &RationalNumber,
) -> Result<Coin, Error> {
    let factor = growth_factor.to_rational().unwrap_or_else(BigRational::one);
    let increment = BigRational::from_integer(growth_increment.into());

    let mut acc = BigRational::zero();
    let mut price = BigRational::from_integer(fee_per_byte.into());
    let mut remaining = size;

    while growth_increment > 0 && remaining >= growth_increment {
        acc += &price * &increment;
        price *= &factor;
        remaining -= growth_increment;
    }

    acc += price * BigInt::from(remaining);

    to_coin(acc.floor().to_integer())
}

/// [calc_ref_scripts_fee] with the curve of `params`
pub fn calc_ref_scripts_fee_with(size: u64, params: &NetworkParams) -> Result<Coin, Error> {
    calc_ref_scripts_fee(
        size,
        params.ref_script_fee_per_byte,
        params.ref_script_growth_increment,
        &params.ref_script_growth_factor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const ONE_AND_A_HALF: RationalNumber = RationalNumber::new(3, 2);

    #[test_case(0 => 0 ; "nothing")]
    #[test_case(100 => 1500 ; "within the first tier")]
    #[test_case(25600 => 384000 ; "one full tier")]
    #[test_case(25601 => 384022 ; "first byte of the second tier")]
    #[test_case(2 * 25600 => 960000 ; "two full tiers")]
    fn ref_scripts_fee_tiers(size: u64) -> Coin {
        calc_ref_scripts_fee(size, 15, 25600, &ONE_AND_A_HALF).unwrap()
    }

    #[test]
    fn ref_scripts_fee_without_growth() {
        assert_eq!(
            calc_ref_scripts_fee(1000, 15, 0, &ONE_AND_A_HALF).unwrap(),
            15000
        );
    }

    #[test]
    fn linear_fee() {
        let params = NetworkParams::default();
        assert_eq!(calc_linear_fee(200, &params).unwrap(), 155381 + 44 * 200);
    }

    #[test]
    fn fees_past_a_coin_are_errors() {
        let params = NetworkParams {
            fee_per_byte: Coin::MAX,
            ..Default::default()
        };
        assert!(matches!(
            calc_linear_fee(2, &params),
            Err(Error::CoinOutOfRange(_))
        ));

        let params = NetworkParams {
            price_mem: RationalNumber::new(2, 1),
            ..Default::default()
        };
        let units = ExUnits {
            mem: u64::MAX,
            steps: 0,
        };
        assert!(matches!(
            calc_ex_fee(&units, &params),
            Err(Error::CoinOutOfRange(_))
        ));

        assert!(matches!(
            calc_ref_scripts_fee(u64::MAX, Coin::MAX, 0, &ONE_AND_A_HALF),
            Err(Error::CoinOutOfRange(_))
        ));
    }

    #[test]
    fn ex_fee_rounds_up() {
        let params = NetworkParams::default();

        // 0.0577 + 0.0000721
        assert_eq!(calc_ex_fee(&ExUnits { mem: 1, steps: 1 }, &params).unwrap(), 1);

        // 577 + 721
        let units = ExUnits {
            mem: 10000,
            steps: 10000000,
        };
        assert_eq!(calc_ex_fee(&units, &params).unwrap(), 1298);
        assert_eq!(calc_ex_fee(&ExUnits::ZERO, &params).unwrap(), 0);
    }
}
