//! Credentials: who (a key) or what (a script) controls funds and stake

use tessera_codec::{
    minicbor::{self, Decode, Encode},
    plutus::{FromPlutusData, PlutusData, PlutusDataError, ToPlutusData},
    utils::expect_array,
};
use tessera_crypto::{hash::Hash, hash_kind};

hash_kind!(
    /// Blake2b-224 hash of an ed25519 verification key
    PubKeyHash,
    28
);

hash_kind!(
    /// Hash of a script guarding a spending credential
    ValidatorHash,
    28
);

hash_kind!(
    /// Hash of a script guarding a staking credential
    StakingValidatorHash,
    28
);

/// The payment part of a Shelley address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpendingCredential {
    PubKey(PubKeyHash),
    Validator(ValidatorHash),
}

/// The delegation part of a Shelley address, and the payload of a staking
/// address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StakingCredential {
    PubKey(PubKeyHash),
    StakingValidator(StakingValidatorHash),
}

impl SpendingCredential {
    /// Get a reference to the inner hash of this credential
    pub fn as_hash(&self) -> &Hash<28> {
        match self {
            Self::PubKey(x) => x.as_hash(),
            Self::Validator(x) => x.as_hash(),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_hash().to_vec()
    }

    /// Indicates if this is the hash of a script
    pub fn is_script(&self) -> bool {
        matches!(self, Self::Validator(_))
    }

    pub fn pub_key_hash(&self) -> Option<&PubKeyHash> {
        match self {
            Self::PubKey(x) => Some(x),
            Self::Validator(_) => None,
        }
    }

    pub fn validator_hash(&self) -> Option<&ValidatorHash> {
        match self {
            Self::Validator(x) => Some(x),
            Self::PubKey(_) => None,
        }
    }
}

impl StakingCredential {
    pub fn as_hash(&self) -> &Hash<28> {
        match self {
            Self::PubKey(x) => x.as_hash(),
            Self::StakingValidator(x) => x.as_hash(),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_hash().to_vec()
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Self::StakingValidator(_))
    }

    pub fn staking_validator_hash(&self) -> Option<&StakingValidatorHash> {
        match self {
            Self::StakingValidator(x) => Some(x),
            Self::PubKey(_) => None,
        }
    }

    /// The `StakingHash` wrapper used when the credential appears inside an
    /// address or as a withdrawal key in older script contexts
    pub fn to_staking_hash_data(&self) -> PlutusData {
        PlutusData::constr(0, vec![self.to_plutus_data()])
    }

    /// Inverse of [`StakingCredential::to_staking_hash_data`]. Pointers
    /// (constructor 1) are not supported.
    pub fn from_staking_hash_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        match data.as_constr()? {
            (0, [credential]) => Self::from_plutus_data(credential),
            (1, _) => Err(PlutusDataError::Invalid(
                "staking pointers are not supported".into(),
            )),
            (alt, fields) => Err(PlutusDataError::Invalid(format!(
                "expected StakingHash, found constructor {alt} with {} fields",
                fields.len()
            ))),
        }
    }
}

/* Plutus ****************************************************************** */

// credentials share one on-chain shape: constructor 0 for keys, 1 for scripts
fn credential_parts(data: &PlutusData) -> Result<(u64, Hash<28>), PlutusDataError> {
    let (alt, fields) = data.as_constr()?;

    match (alt, fields) {
        (0 | 1, [hash]) => {
            let bytes = hash.as_bytes()?;
            let hash = Hash::<28>::try_from(bytes)
                .map_err(|err| PlutusDataError::Invalid(format!("credential: {err}")))?;
            Ok((alt, hash))
        }
        (0 | 1, fields) => Err(PlutusDataError::UnexpectedArity {
            alt,
            expected: 1,
            found: fields.len(),
        }),
        (found, _) => Err(PlutusDataError::Invalid(format!(
            "constructor {found} is not a credential"
        ))),
    }
}

impl ToPlutusData for SpendingCredential {
    fn to_plutus_data(&self) -> PlutusData {
        match self {
            Self::PubKey(x) => PlutusData::constr(0, vec![x.to_plutus_data()]),
            Self::Validator(x) => PlutusData::constr(1, vec![x.to_plutus_data()]),
        }
    }
}

impl FromPlutusData for SpendingCredential {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        match credential_parts(data)? {
            (0, hash) => Ok(Self::PubKey(hash.into())),
            (_, hash) => Ok(Self::Validator(hash.into())),
        }
    }
}

impl ToPlutusData for StakingCredential {
    fn to_plutus_data(&self) -> PlutusData {
        match self {
            Self::PubKey(x) => PlutusData::constr(0, vec![x.to_plutus_data()]),
            Self::StakingValidator(x) => PlutusData::constr(1, vec![x.to_plutus_data()]),
        }
    }
}

impl FromPlutusData for StakingCredential {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        match credential_parts(data)? {
            (0, hash) => Ok(Self::PubKey(hash.into())),
            (_, hash) => Ok(Self::StakingValidator(hash.into())),
        }
    }
}

/* Cbor ******************************************************************** */

// the ledger encodes stake credentials in certificates as [0, keyhash] or
// [1, scripthash]
impl<C> Encode<C> for StakingCredential {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?;

        match self {
            Self::PubKey(x) => {
                e.u8(0)?;
                e.encode_with(x, ctx)?;
            }
            Self::StakingValidator(x) => {
                e.u8(1)?;
                e.encode_with(x, ctx)?;
            }
        }

        Ok(())
    }
}

impl<'b, C> Decode<'b, C> for StakingCredential {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        expect_array(d, "stake credential", 2)?;

        let position = d.position();
        let variant = d.u8()?;

        match variant {
            0 => Ok(Self::PubKey(d.decode_with(ctx)?)),
            1 => Ok(Self::StakingValidator(d.decode_with(ctx)?)),
            x => Err(minicbor::decode::Error::message(format!(
                "unknown stake credential kind {x} at offset {position}"
            ))),
        }
    }
}
