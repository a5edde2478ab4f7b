use crate::{
    hashes::{DatumHash, TxId},
    params::NetworkParams,
    script::ScriptRef,
    value::Value,
    Coin, Error,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tessera_addresses::Address;
use tessera_codec::{
    minicbor::{self, data::Type, Decode, Encode},
    plutus::{FromPlutusData, PlutusData, PlutusDataError, ToPlutusData},
    utils::{expect_array, unexpected_type, CborWrap},
    Fragment,
};

/// Points at an output of a previous transaction
#[derive(Encode, Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxOutputId {
    #[n(0)]
    pub tx_id: TxId,

    #[n(1)]
    pub index: u64,
}

impl TxOutputId {
    pub fn new(tx_id: TxId, index: u64) -> Self {
        Self { tx_id, index }
    }

    /// `TxOutRef` of PlutusV1 and V2, `Constr 0 [Constr 0 [id], index]`
    pub fn to_plutus_data_v2(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![self.tx_id.to_plutus_data_v2(), self.index.to_plutus_data()],
        )
    }

    pub fn from_plutus_data_v2(data: &PlutusData) -> Result<Self, PlutusDataError> {
        let fields = data.expect_constr(0, 2)?;

        Ok(Self {
            tx_id: TxId::from_plutus_data_v2(&fields[0])?,
            index: u64::from_plutus_data(&fields[1])?,
        })
    }

    /// `TxOutRef` of PlutusV3, `Constr 0 [id, index]`
    pub fn to_plutus_data_v3(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![self.tx_id.to_plutus_data_v3(), self.index.to_plutus_data()],
        )
    }

    pub fn from_plutus_data_v3(data: &PlutusData) -> Result<Self, PlutusDataError> {
        let fields = data.expect_constr(0, 2)?;

        Ok(Self {
            tx_id: TxId::from_plutus_data_v3(&fields[0])?,
            index: u64::from_plutus_data(&fields[1])?,
        })
    }
}

impl fmt::Display for TxOutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

impl FromStr for TxOutputId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidOutputId(s.to_string());

        let (id, index) = s.split_once('#').ok_or_else(invalid)?;

        Ok(Self {
            tx_id: id.parse().map_err(|_| invalid())?,
            index: index.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for TxOutputId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxOutputId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The datum attached to an output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutputDatum {
    /// Only the hash goes on chain. The data itself, when known, travels in
    /// the witness set of the spending transaction.
    Hashed {
        hash: DatumHash,
        data: Option<PlutusData>,
    },
    Inline(PlutusData),
}

impl TxOutputDatum {
    pub fn hashed(data: PlutusData) -> Self {
        TxOutputDatum::Hashed {
            hash: DatumHash::of(&data),
            data: Some(data),
        }
    }

    pub fn hash(&self) -> DatumHash {
        match self {
            TxOutputDatum::Hashed { hash, .. } => *hash,
            TxOutputDatum::Inline(data) => DatumHash::of(data),
        }
    }

    pub fn data(&self) -> Option<&PlutusData> {
        match self {
            TxOutputDatum::Hashed { data, .. } => data.as_ref(),
            TxOutputDatum::Inline(data) => Some(data),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, TxOutputDatum::Inline(_))
    }

    /// `OutputDatum` of PlutusV2 and V3: `NoOutputDatum`, `OutputDatumHash`
    /// or `OutputDatum`
    pub fn to_plutus_data(datum: Option<&TxOutputDatum>) -> PlutusData {
        match datum {
            None => PlutusData::constr(0, vec![]),
            Some(TxOutputDatum::Hashed { hash, .. }) => {
                PlutusData::constr(1, vec![hash.to_plutus_data()])
            }
            Some(TxOutputDatum::Inline(data)) => PlutusData::constr(2, vec![data.clone()]),
        }
    }
}

// [0, hash] | [1, #6.24(bytes .cbor data)]
impl<C> minicbor::Encode<C> for TxOutputDatum {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?;

        match self {
            TxOutputDatum::Hashed { hash, .. } => {
                e.u8(0)?;
                e.encode_with(hash, ctx)?;
            }
            TxOutputDatum::Inline(data) => {
                e.u8(1)?;
                e.encode_with(CborWrap(data), ctx)?;
            }
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TxOutputDatum {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        expect_array(d, "datum option", 2)?;

        let position = d.position();

        match d.u8()? {
            0 => Ok(TxOutputDatum::Hashed {
                hash: d.decode_with(ctx)?,
                data: None,
            }),
            1 => {
                let CborWrap(data) = d.decode_with(ctx)?;
                Ok(TxOutputDatum::Inline(data))
            }
            x => Err(minicbor::decode::Error::message(format!(
                "unknown datum option {x} at offset {position}"
            ))),
        }
    }
}

/// Wire shape of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxOutputEncoding {
    /// `[address, value, ? datum_hash]`, only possible without inline datum
    /// or reference script
    Legacy,
    #[default]
    PostAlonzo,
    PostAlonzoIndef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: Address,
    pub value: Value,
    pub datum: Option<TxOutputDatum>,
    pub script_ref: Option<ScriptRef>,
    pub encoding: TxOutputEncoding,
    /// Map keys in decoded order, empty when they came in ascending order
    key_order: Vec<u8>,
}

/// Lovelace-per-byte overhead the ledger adds to every output for the
/// entry it takes in the UTxO map
const UTXO_ENTRY_OVERHEAD: u64 = 160;

impl TxOutput {
    pub fn new(address: Address, value: Value) -> Self {
        Self {
            address,
            value,
            datum: None,
            script_ref: None,
            encoding: TxOutputEncoding::default(),
            key_order: vec![],
        }
    }

    pub fn with_datum(mut self, datum: TxOutputDatum) -> Self {
        self.datum = Some(datum);
        self
    }

    pub fn with_script_ref(mut self, script: impl Into<crate::script::Script>) -> Self {
        self.script_ref = Some(CborWrap(script.into()));
        self
    }

    /// The shape this output is actually written with
    pub fn effective_encoding(&self) -> TxOutputEncoding {
        let legacy_possible = self.script_ref.is_none()
            && !self.datum.as_ref().is_some_and(TxOutputDatum::is_inline);

        match self.encoding {
            TxOutputEncoding::Legacy if !legacy_possible => TxOutputEncoding::PostAlonzo,
            other => other,
        }
    }

    fn has_key(&self, key: u8) -> bool {
        match key {
            0 | 1 => true,
            2 => self.datum.is_some(),
            3 => self.script_ref.is_some(),
            _ => false,
        }
    }

    /// Map keys to write: the decoded order first, then new keys ascending
    fn keys_to_encode(&self) -> Vec<u8> {
        let mut keys: Vec<u8> = self
            .key_order
            .iter()
            .copied()
            .filter(|k| self.has_key(*k))
            .collect();

        keys.extend((0..4).filter(|k| !self.key_order.contains(k) && self.has_key(*k)));

        keys
    }

    /// Deposit the ledger asks this output to hold, given its current size
    pub fn min_lovelace(&self, params: &NetworkParams) -> Coin {
        let size = self.encode_fragment().len() as u64;
        (UTXO_ENTRY_OVERHEAD + size) * params.coins_per_utxo_byte
    }

    /// `TxOut` as seen by PlutusV2 and V3 scripts
    pub fn to_plutus_data(&self) -> Result<PlutusData, Error> {
        let script_hash = self
            .script_ref
            .as_ref()
            .map(|script| script.hash().to_plutus_data());

        Ok(PlutusData::constr(
            0,
            vec![
                self.address.to_plutus_data()?,
                self.value.to_plutus_data(true),
                TxOutputDatum::to_plutus_data(self.datum.as_ref()),
                PlutusData::option(script_hash),
            ],
        ))
    }
}

impl<C> minicbor::Encode<C> for TxOutput {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let encoding = self.effective_encoding();

        if encoding == TxOutputEncoding::Legacy {
            match &self.datum {
                Some(datum) => {
                    e.array(3)?;
                    e.encode_with(&self.address, ctx)?;
                    e.encode_with(&self.value, ctx)?;
                    e.encode_with(datum.hash(), ctx)?;
                }
                None => {
                    e.array(2)?;
                    e.encode_with(&self.address, ctx)?;
                    e.encode_with(&self.value, ctx)?;
                }
            }

            return Ok(());
        }

        let keys = self.keys_to_encode();

        if encoding == TxOutputEncoding::PostAlonzoIndef {
            e.begin_map()?;
        } else {
            e.map(keys.len() as u64)?;
        }

        for key in keys {
            e.u8(key)?;

            match key {
                0 => e.encode_with(&self.address, ctx)?,
                1 => e.encode_with(&self.value, ctx)?,
                2 => e.encode_with(&self.datum, ctx)?,
                _ => e.encode_with(&self.script_ref, ctx)?,
            };
        }

        if encoding == TxOutputEncoding::PostAlonzoIndef {
            e.end()?;
        }

        Ok(())
    }
}

fn decode_legacy<'b, C>(
    d: &mut minicbor::Decoder<'b>,
    ctx: &mut C,
) -> Result<TxOutput, minicbor::decode::Error> {
    let position = d.position();
    let len = d.array()?;

    let datum = match len {
        Some(2) => false,
        Some(3) => true,
        _ => return Err(tessera_codec::utils::unexpected_len("legacy output", 3, len, position)),
    };

    let address = d.decode_with(ctx)?;
    let value = d.decode_with(ctx)?;

    let datum = if datum {
        Some(TxOutputDatum::Hashed {
            hash: d.decode_with(ctx)?,
            data: None,
        })
    } else {
        None
    };

    Ok(TxOutput {
        address,
        value,
        datum,
        script_ref: None,
        encoding: TxOutputEncoding::Legacy,
        key_order: vec![],
    })
}

fn decode_post_alonzo<'b, C>(
    d: &mut minicbor::Decoder<'b>,
    ctx: &mut C,
) -> Result<TxOutput, minicbor::decode::Error> {
    let position = d.position();
    let len = d.map()?;

    let mut address = None;
    let mut value = None;
    let mut datum = None;
    let mut script_ref = None;

    let mut key_order = vec![];

    loop {
        match len {
            Some(n) if key_order.len() as u64 == n => break,
            None if d.datatype()? == Type::Break => {
                d.skip()?;
                break;
            }
            _ => (),
        }

        let key_position = d.position();
        let key = d.u8()?;

        match key {
            0 => address = Some(d.decode_with(ctx)?),
            1 => value = Some(d.decode_with(ctx)?),
            2 => datum = Some(d.decode_with(ctx)?),
            3 => script_ref = Some(d.decode_with(ctx)?),
            x => {
                return Err(minicbor::decode::Error::message(format!(
                    "unknown output key {x} at offset {key_position}"
                )))
            }
        }

        key_order.push(key);
    }

    if key_order.windows(2).all(|w| w[0] < w[1]) {
        key_order.clear();
    }

    let missing = |what: &str| {
        minicbor::decode::Error::message(format!("output without {what} at offset {position}"))
    };

    Ok(TxOutput {
        address: address.ok_or_else(|| missing("address"))?,
        value: value.ok_or_else(|| missing("value"))?,
        datum,
        script_ref,
        encoding: match len {
            Some(_) => TxOutputEncoding::PostAlonzo,
            None => TxOutputEncoding::PostAlonzoIndef,
        },
        key_order,
    })
}

impl<'b, C> minicbor::Decode<'b, C> for TxOutput {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();

        match d.datatype()? {
            Type::Array | Type::ArrayIndef => decode_legacy(d, ctx),
            Type::Map | Type::MapIndef => decode_post_alonzo(d, ctx),
            other => Err(unexpected_type("output array or map", other, position)),
        }
    }
}
