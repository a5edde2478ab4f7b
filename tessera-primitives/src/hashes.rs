//! Typed hashes for ledger entities that don't live in `tessera-addresses`

use crate::Error;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tessera_codec::{
    minicbor,
    plutus::{FromPlutusData, PlutusData, PlutusDataError, ToPlutusData},
};
use tessera_crypto::{
    hash::{Hash, Hasher},
    hash_kind,
};

/// Blake2b-224 digest of a script, native or Plutus, prefixed by its kind
pub type ScriptHash = Hash<28>;

hash_kind!(
    /// Blake2b-256 digest of the cbor encoding of a datum
    DatumHash,
    32
);

hash_kind!(
    /// Blake2b-256 digest of a transaction body
    TxId,
    32
);

impl DatumHash {
    pub fn of(data: &PlutusData) -> Self {
        Self(Hasher::<256>::hash_cbor(data))
    }
}

impl TxId {
    /// On-chain form seen by PlutusV1 and V2 scripts: the id wrapped in a
    /// single-field constructor
    pub fn to_plutus_data_v2(&self) -> PlutusData {
        PlutusData::constr(0, vec![self.to_plutus_data()])
    }

    pub fn from_plutus_data_v2(data: &PlutusData) -> Result<Self, PlutusDataError> {
        let fields = data.expect_constr(0, 1)?;
        Self::from_plutus_data(&fields[0])
    }

    /// On-chain form seen by PlutusV3 scripts: the bare bytes
    pub fn to_plutus_data_v3(&self) -> PlutusData {
        self.to_plutus_data()
    }

    pub fn from_plutus_data_v3(data: &PlutusData) -> Result<Self, PlutusDataError> {
        Self::from_plutus_data(data)
    }
}

/// Hash of a minting policy
///
/// Unlike other hashes this one can be empty: the empty policy stands for the
/// native currency. Empty sorts before any real policy, matching the byte
/// order of the encodings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MintingPolicyHash(Option<Hash<28>>);

impl MintingPolicyHash {
    /// The policy of the native currency
    pub const ADA: Self = Self(None);

    pub const fn new(bytes: [u8; 28]) -> Self {
        Self(Some(Hash::new(bytes)))
    }

    pub fn is_ada(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Some(x) => x.as_ref(),
            None => &[],
        }
    }

    pub fn as_hash(&self) -> Option<&Hash<28>> {
        self.0.as_ref()
    }
}

impl From<Hash<28>> for MintingPolicyHash {
    fn from(hash: Hash<28>) -> Self {
        Self(Some(hash))
    }
}

impl TryFrom<&[u8]> for MintingPolicyHash {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value.len() {
            0 => Ok(Self::ADA),
            28 => Ok(Self(Some(Hash::try_from(value)?))),
            other => Err(Error::InvalidPolicyLength(other)),
        }
    }
}

impl AsRef<[u8]> for MintingPolicyHash {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for MintingPolicyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl fmt::Debug for MintingPolicyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MintingPolicyHash")
            .field(&self.to_string())
            .finish()
    }
}

impl FromStr for MintingPolicyHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidPolicyLength(s.len() / 2))?;
        Self::try_from(bytes.as_slice())
    }
}

impl Serialize for MintingPolicyHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MintingPolicyHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl<C> minicbor::Encode<C> for MintingPolicyHash {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.bytes(self.as_bytes())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for MintingPolicyHash {
    fn decode(d: &mut minicbor::Decoder<'b>, _ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let bytes = d.bytes()?;

        Self::try_from(bytes).map_err(|err| {
            minicbor::decode::Error::message(format!("{err} at offset {position}"))
        })
    }
}

impl ToPlutusData for MintingPolicyHash {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::bytes(self.as_bytes())
    }
}

impl FromPlutusData for MintingPolicyHash {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        Self::try_from(data.as_bytes()?).map_err(|err| PlutusDataError::Invalid(err.to_string()))
    }
}
