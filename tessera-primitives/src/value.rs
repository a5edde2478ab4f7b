use crate::{
    assets::{lovelace_entry, AssetOrder, Assets},
    hashes::MintingPolicyHash,
    Coin, Error,
};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use tessera_codec::{
    minicbor::{self, data::Type},
    plutus::{self, FromPlutusData, PlutusData, PlutusDataError},
    utils::unexpected_type,
};

/// An amount of lovelace together with native tokens
///
/// Arithmetic is pointwise. Negative amounts are fine as intermediate results
/// but [`Value::assert_all_positive`] rejects them before they end up in an
/// output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Value {
    lovelace: BigInt,
    assets: Assets,
}

impl Value {
    pub fn new(lovelace: impl Into<BigInt>, assets: Assets) -> Self {
        Self {
            lovelace: lovelace.into(),
            assets,
        }
    }

    pub fn lovelace(amount: impl Into<BigInt>) -> Self {
        Self::new(amount, Assets::new())
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn amount(&self) -> &BigInt {
        &self.lovelace
    }

    /// The lovelace amount as a coin, failing if negative or too large
    pub fn coin(&self) -> Result<Coin, Error> {
        self.lovelace
            .to_u64()
            .ok_or_else(|| Error::CoinOutOfRange(self.lovelace.to_string()))
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub(crate) fn set_lovelace(&mut self, amount: impl Into<BigInt>) {
        self.lovelace = amount.into();
    }

    pub fn is_zero(&self) -> bool {
        self.lovelace.is_zero() && self.assets.is_zero()
    }

    pub fn add(&self, other: &Value) -> Value {
        Value {
            lovelace: &self.lovelace + &other.lovelace,
            assets: self.assets.add(&other.assets),
        }
    }

    pub fn subtract(&self, other: &Value) -> Value {
        Value {
            lovelace: &self.lovelace - &other.lovelace,
            assets: self.assets.subtract(&other.assets),
        }
    }

    pub fn multiply(&self, factor: impl Into<BigInt>) -> Value {
        let factor = factor.into();

        Value {
            lovelace: &self.lovelace * &factor,
            assets: self.assets.multiply(factor),
        }
    }

    pub fn is_equal(&self, other: &Value) -> bool {
        self.lovelace == other.lovelace && self.assets.is_equal(&other.assets)
    }

    pub fn is_greater_or_equal(&self, other: &Value) -> bool {
        self.lovelace >= other.lovelace && self.assets.is_greater_or_equal(&other.assets)
    }

    pub fn is_greater_than(&self, other: &Value) -> bool {
        if self.assets.is_zero() && other.assets.is_zero() {
            return self.lovelace > other.lovelace;
        }

        self.lovelace > other.lovelace && self.assets.is_greater_than(&other.assets)
    }

    /// Fails if the lovelace amount is negative or any token quantity is not
    /// strictly positive
    pub fn assert_all_positive(&self) -> Result<(), Error> {
        if self.lovelace.is_negative() {
            return Err(Error::NonPositiveQuantity {
                asset: "lovelace".into(),
                quantity: self.lovelace.to_string(),
            });
        }

        self.assets.assert_all_positive()
    }

    /// On-chain form, a `Map policy (Map name integer)` in lexicographic
    /// order with lovelace under the empty policy.
    ///
    /// Outside a script context a zero lovelace amount is left out. Inside one
    /// the lovelace entry is always present.
    pub fn to_plutus_data(&self, in_script_context: bool) -> PlutusData {
        let mut entries = self.assets.plutus_entries(AssetOrder::Lexicographic);

        if in_script_context || !self.lovelace.is_zero() {
            entries.insert(0, lovelace_entry(&self.lovelace));
        }

        PlutusData::map(entries)
    }
}

impl From<Coin> for Value {
    fn from(amount: Coin) -> Self {
        Value::lovelace(amount)
    }
}

impl FromPlutusData for Value {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        let mut lovelace = BigInt::zero();
        let mut rest = vec![];

        for (policy, tokens) in data.as_map()? {
            if MintingPolicyHash::from_plutus_data(policy)?.is_ada() {
                for (_, amount) in tokens.as_map()? {
                    lovelace += amount.as_integer()?;
                }
            } else {
                rest.push((policy.clone(), tokens.clone()));
            }
        }

        let assets = Assets::from_plutus_data(&PlutusData::map(rest))?;

        Ok(Value { lovelace, assets })
    }
}

/* Cbor ******************************************************************** */

// `coin` when there are no tokens, `[coin, multiasset]` otherwise
impl<C> minicbor::Encode<C> for Value {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let coin = plutus::BigInt::from_num(&self.lovelace);

        if self.assets.is_empty() {
            e.encode_with(coin, ctx)?;
        } else {
            e.array(2)?;
            e.encode_with(coin, ctx)?;
            e.encode_with(&self.assets, ctx)?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Value {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();

        match d.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 | Type::Tag => {
                let coin: plutus::BigInt = d.decode_with(ctx)?;
                Ok(Value::lovelace(coin.to_num()))
            }
            Type::Array => {
                tessera_codec::utils::expect_array(d, "multi-asset value", 2)?;
                let coin: plutus::BigInt = d.decode_with(ctx)?;
                let assets = d.decode_with(ctx)?;

                Ok(Value::new(coin.to_num(), assets))
            }
            other => Err(unexpected_type("coin or [coin, multiasset]", other, position)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetClass;
    use proptest::prelude::*;

    fn token(p: u8, name: &str) -> AssetClass {
        AssetClass::new(MintingPolicyHash::new([p; 28]), name)
    }

    fn any_value() -> impl Strategy<Value = Value> {
        let entry = (0u8..3, "[xy]{1,2}", -100i64..100);

        (
            -1_000_000i64..1_000_000,
            prop::collection::vec(entry, 0..6),
        )
            .prop_map(|(lovelace, entries)| {
                let assets =
                    Assets::from_pairs(entries.into_iter().map(|(p, n, q)| (token(p, &n), q)));

                Value::new(lovelace, assets)
            })
    }

    proptest! {
        #[test]
        fn add_then_subtract_restores(a in any_value(), b in any_value()) {
            prop_assert!(a.add(&b).subtract(&b).is_equal(&a));
        }

        #[test]
        fn greater_or_equal_to_itself(v in any_value()) {
            prop_assert!(v.is_greater_or_equal(&v));
        }

        #[test]
        fn cbor_round_trip(v in any_value()) {
            let mut v = Value::new(v.lovelace.abs(), v.assets);
            v.assets.normalize();

            let bytes = minicbor::to_vec(&v).unwrap();
            let back: Value = minicbor::decode(&bytes).unwrap();

            prop_assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
            prop_assert!(back.is_equal(&v));
        }
    }

    #[test]
    fn zero_comparisons() {
        let zero = Value::zero();
        let some = Value::lovelace(1);

        assert!(zero.is_greater_or_equal(&zero));
        assert!(!zero.is_greater_or_equal(&some));
        assert!(some.is_greater_than(&zero));
    }

    #[test]
    fn coin_only_value_is_a_plain_uint() {
        let bytes = minicbor::to_vec(Value::lovelace(10_000_000u64)).unwrap();

        assert_eq!(hex::encode(&bytes), "1a00989680");
    }

    #[test]
    fn negative_lovelace_is_rejected() {
        let value = Value::lovelace(5).subtract(&Value::lovelace(7));

        assert!(value.assert_all_positive().is_err());
        assert!(Value::lovelace(0).assert_all_positive().is_ok());
    }

    #[test]
    fn script_context_keeps_zero_lovelace() {
        let value = Value::new(0, Assets::from_pairs([(token(1, "x"), 1)]));

        assert_eq!(value.to_plutus_data(false).as_map().unwrap().len(), 1);
        assert_eq!(value.to_plutus_data(true).as_map().unwrap().len(), 2);

        let back = Value::from_plutus_data(&value.to_plutus_data(true)).unwrap();
        assert!(back.is_equal(&value));
    }
}
