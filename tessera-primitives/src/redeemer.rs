use serde::{Deserialize, Serialize};
use std::ops::{Add, Deref};
use tessera_codec::{
    minicbor::{self, data::Type, Decode, Encode},
    plutus::PlutusData,
    utils::{decode_list, encode_list, expect_array, unexpected_type, KeyValuePairs, ListEncoding},
};

/// Memory and cpu budget of a script execution
#[derive(
    Serialize, Deserialize, Encode, Decode, Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
)]
pub struct ExUnits {
    #[n(0)]
    pub mem: u64,
    #[n(1)]
    pub steps: u64,
}

impl ExUnits {
    pub const ZERO: Self = Self { mem: 0, steps: 0 };

    pub fn checked_add(&self, other: &ExUnits) -> Option<ExUnits> {
        Some(ExUnits {
            mem: self.mem.checked_add(other.mem)?,
            steps: self.steps.checked_add(other.steps)?,
        })
    }

    /// Both dimensions are within `limit`
    pub fn fits_within(&self, limit: &ExUnits) -> bool {
        self.mem <= limit.mem && self.steps <= limit.steps
    }
}

impl Add for ExUnits {
    type Output = ExUnits;

    fn add(self, rhs: Self) -> Self::Output {
        ExUnits {
            mem: self.mem.saturating_add(rhs.mem),
            steps: self.steps.saturating_add(rhs.steps),
        }
    }
}

impl std::iter::Sum for ExUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ExUnits::ZERO, Add::add)
    }
}

/// What a redeemer unlocks, pointing into the sorted lists of the body
///
/// The derived order matches the ledger's `(tag, index)` order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RedeemerPurpose {
    Spending(u32),
    Minting(u32),
    Certifying(u32),
    Rewarding(u32),
}

impl RedeemerPurpose {
    /// Tag used in the ledger encoding: spend 0, mint 1, cert 2, reward 3
    pub fn wire_tag(&self) -> u8 {
        match self {
            RedeemerPurpose::Spending(_) => 0,
            RedeemerPurpose::Minting(_) => 1,
            RedeemerPurpose::Certifying(_) => 2,
            RedeemerPurpose::Rewarding(_) => 3,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            RedeemerPurpose::Spending(x)
            | RedeemerPurpose::Minting(x)
            | RedeemerPurpose::Certifying(x)
            | RedeemerPurpose::Rewarding(x) => *x,
        }
    }

    fn from_wire(tag: u8, index: u32, position: usize) -> Result<Self, minicbor::decode::Error> {
        match tag {
            0 => Ok(RedeemerPurpose::Spending(index)),
            1 => Ok(RedeemerPurpose::Minting(index)),
            2 => Ok(RedeemerPurpose::Certifying(index)),
            3 => Ok(RedeemerPurpose::Rewarding(index)),
            x => Err(minicbor::decode::Error::message(format!(
                "unsupported redeemer tag {x} at offset {position}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRedeemer {
    pub purpose: RedeemerPurpose,
    pub data: PlutusData,
    pub cost: ExUnits,
}

impl TxRedeemer {
    pub fn new(purpose: RedeemerPurpose, data: PlutusData, cost: ExUnits) -> Self {
        Self {
            purpose,
            data,
            cost,
        }
    }
}

// legacy list element: [tag, index, data, ex_units]
impl<C> minicbor::Encode<C> for TxRedeemer {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(4)?;
        e.u8(self.purpose.wire_tag())?;
        e.u32(self.purpose.index())?;
        e.encode_with(&self.data, ctx)?;
        e.encode_with(self.cost, ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TxRedeemer {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        expect_array(d, "redeemer", 4)?;

        let position = d.position();
        let tag = d.u8()?;
        let index = d.u32()?;

        Ok(TxRedeemer {
            purpose: RedeemerPurpose::from_wire(tag, index, position)?,
            data: d.decode_with(ctx)?,
            cost: d.decode_with(ctx)?,
        })
    }
}

#[derive(Encode, Decode, Debug, Clone)]
struct RedeemersKey {
    #[n(0)]
    tag: u8,
    #[n(1)]
    index: u32,
}

#[derive(Encode, Decode, Debug, Clone)]
struct RedeemersValue {
    #[n(0)]
    data: PlutusData,
    #[n(1)]
    cost: ExUnits,
}

/// Wire shape of the redeemers of a witness set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedeemersFormat {
    /// `[[tag, index, data, ex_units]]`, as used before Conway
    List(ListEncoding),
    /// `{[tag, index] => [data, ex_units]}`
    #[default]
    Map,
    IndefMap,
}

/// The redeemers of a transaction, remembering the shape they were decoded
/// from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redeemers {
    items: Vec<TxRedeemer>,
    format: RedeemersFormat,
}

impl Redeemers {
    pub fn new(items: Vec<TxRedeemer>, format: RedeemersFormat) -> Self {
        Self { items, format }
    }

    pub fn format(&self) -> RedeemersFormat {
        self.format
    }

    pub fn push(&mut self, redeemer: TxRedeemer) {
        self.items.push(redeemer);
    }

    pub fn find(&self, purpose: &RedeemerPurpose) -> Option<&TxRedeemer> {
        self.items.iter().find(|x| &x.purpose == purpose)
    }

    pub fn total_cost(&self) -> ExUnits {
        self.items.iter().map(|x| x.cost).sum()
    }

    /// Sorts by `(tag, index)`
    pub fn sort(&mut self) {
        self.items.sort_by_key(|x| x.purpose);
    }

    pub fn to_vec(self) -> Vec<TxRedeemer> {
        self.items
    }
}

impl Deref for Redeemers {
    type Target = [TxRedeemer];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl From<Vec<TxRedeemer>> for Redeemers {
    fn from(items: Vec<TxRedeemer>) -> Self {
        Self::new(items, RedeemersFormat::default())
    }
}

impl<C> minicbor::Encode<C> for Redeemers {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let entries = || {
            self.items
                .iter()
                .map(|x| {
                    (
                        RedeemersKey {
                            tag: x.purpose.wire_tag(),
                            index: x.purpose.index(),
                        },
                        RedeemersValue {
                            data: x.data.clone(),
                            cost: x.cost,
                        },
                    )
                })
                .collect::<Vec<_>>()
        };

        match self.format {
            RedeemersFormat::List(encoding) => encode_list(e, &self.items, encoding, ctx),
            RedeemersFormat::Map => e.encode_with(KeyValuePairs::Def(entries()), ctx)?.ok(),
            RedeemersFormat::IndefMap => {
                e.encode_with(KeyValuePairs::Indef(entries()), ctx)?.ok()
            }
        }
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Redeemers {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();

        match d.datatype()? {
            Type::Map | Type::MapIndef => {
                let pairs: KeyValuePairs<RedeemersKey, RedeemersValue> = d.decode_with(ctx)?;

                let format = if pairs.is_indef() {
                    RedeemersFormat::IndefMap
                } else {
                    RedeemersFormat::Map
                };

                let items = pairs
                    .to_vec()
                    .into_iter()
                    .map(|(k, v)| {
                        Ok(TxRedeemer {
                            purpose: RedeemerPurpose::from_wire(k.tag, k.index, position)?,
                            data: v.data,
                            cost: v.cost,
                        })
                    })
                    .collect::<Result<_, minicbor::decode::Error>>()?;

                Ok(Redeemers { items, format })
            }
            Type::Array | Type::ArrayIndef | Type::Tag => {
                let (items, encoding) = decode_list(d, ctx)?;

                Ok(Redeemers {
                    items,
                    format: RedeemersFormat::List(encoding),
                })
            }
            other => Err(unexpected_type("redeemers list or map", other, position)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample() -> Vec<TxRedeemer> {
        vec![
            TxRedeemer::new(
                RedeemerPurpose::Minting(0),
                PlutusData::integer(1),
                ExUnits { mem: 10, steps: 20 },
            ),
            TxRedeemer::new(
                RedeemerPurpose::Spending(1),
                PlutusData::constr(0, vec![]),
                ExUnits { mem: 5, steps: 7 },
            ),
        ]
    }

    #[test_case(RedeemersFormat::Map, "a2" ; "definite map")]
    #[test_case(RedeemersFormat::IndefMap, "bf" ; "indefinite map")]
    #[test_case(RedeemersFormat::List(ListEncoding::Definite), "82" ; "legacy list")]
    fn keeps_its_shape(format: RedeemersFormat, head: &str) {
        let redeemers = Redeemers::new(sample(), format);

        let bytes = minicbor::to_vec(&redeemers).unwrap();
        assert!(hex::encode(&bytes).starts_with(head));

        let back: Redeemers = minicbor::decode(&bytes).unwrap();
        assert_eq!(back, redeemers);
        assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
    }

    #[test]
    fn wire_tags_and_order() {
        assert_eq!(RedeemerPurpose::Spending(0).wire_tag(), 0);
        assert_eq!(RedeemerPurpose::Minting(0).wire_tag(), 1);
        assert_eq!(RedeemerPurpose::Certifying(0).wire_tag(), 2);
        assert_eq!(RedeemerPurpose::Rewarding(0).wire_tag(), 3);

        let mut redeemers = Redeemers::from(sample());
        redeemers.sort();

        assert_eq!(redeemers[0].purpose, RedeemerPurpose::Spending(1));
        assert_eq!(redeemers.total_cost(), ExUnits { mem: 15, steps: 27 });
    }

    #[test]
    fn unknown_tag_is_rejected() {
        // {[4, 0]: [0, [0, 0]]}
        let bytes = hex::decode("a1820400820082 0000".replace(' ', "")).unwrap();

        let err = minicbor::decode::<Redeemers>(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported redeemer tag 4"));
    }

    #[test]
    fn budget_helpers() {
        let a = ExUnits { mem: 1, steps: u64::MAX };

        assert_eq!(a.checked_add(&ExUnits { mem: 0, steps: 1 }), None);
        assert!(a.fits_within(&ExUnits { mem: 1, steps: u64::MAX }));
        assert!(!a.fits_within(&ExUnits { mem: 0, steps: u64::MAX }));
    }
}
