use crate::{hashes::ScriptHash, native_script::NativeScript};
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_codec::{
    minicbor,
    utils::{expect_array, Bytes, CborWrap},
};
use tessera_crypto::hash::Hasher;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlutusVersion {
    V1,
    V2,
    V3,
}

impl PlutusVersion {
    /// Prefix byte used when hashing scripts of this version
    pub fn hash_tag(&self) -> u8 {
        match self {
            PlutusVersion::V1 => 1,
            PlutusVersion::V2 => 2,
            PlutusVersion::V3 => 3,
        }
    }

    /// Key of this version in cost model maps and language views
    pub fn language_id(&self) -> u8 {
        self.hash_tag() - 1
    }
}

impl fmt::Display for PlutusVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlutusVersion::V1 => f.write_str("PlutusV1"),
            PlutusVersion::V2 => f.write_str("PlutusV2"),
            PlutusVersion::V3 => f.write_str("PlutusV3"),
        }
    }
}

/// A compiled on-chain program, as it appears in witness sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlutusScript {
    pub version: PlutusVersion,
    pub bytes: Bytes,
}

impl PlutusScript {
    pub fn new(version: PlutusVersion, bytes: impl Into<Bytes>) -> Self {
        Self {
            version,
            bytes: bytes.into(),
        }
    }

    pub fn hash(&self) -> ScriptHash {
        Hasher::<224>::hash_tagged(&self.bytes, self.version.hash_tag())
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl AsRef<[u8]> for PlutusScript {
    fn as_ref(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    Native(NativeScript),
    Plutus(PlutusScript),
}

impl Script {
    pub fn hash(&self) -> ScriptHash {
        match self {
            Script::Native(x) => x.hash(),
            Script::Plutus(x) => x.hash(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Script::Native(_))
    }

    pub fn plutus_version(&self) -> Option<PlutusVersion> {
        match self {
            Script::Plutus(x) => Some(x.version),
            Script::Native(_) => None,
        }
    }

    /// Bytes counted by the reference script fee
    pub fn size(&self) -> usize {
        match self {
            Script::Native(x) => minicbor::to_vec(x).map(|b| b.len()).unwrap_or_default(),
            Script::Plutus(x) => x.size(),
        }
    }
}

impl From<NativeScript> for Script {
    fn from(script: NativeScript) -> Self {
        Script::Native(script)
    }
}

impl From<PlutusScript> for Script {
    fn from(script: PlutusScript) -> Self {
        Script::Plutus(script)
    }
}

/// A script attached to an output, `#6.24(bytes .cbor [kind, script])`
pub type ScriptRef = CborWrap<Script>;

// [0, native] | [1, v1 bytes] | [2, v2 bytes] | [3, v3 bytes]
impl<C> minicbor::Encode<C> for Script {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?;

        match self {
            Script::Native(x) => {
                e.u8(0)?;
                e.encode_with(x, ctx)?;
            }
            Script::Plutus(x) => {
                e.u8(x.version.hash_tag())?;
                e.encode_with(&x.bytes, ctx)?;
            }
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Script {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        expect_array(d, "script", 2)?;

        let position = d.position();
        let kind = d.u8()?;

        let version = match kind {
            0 => return Ok(Script::Native(d.decode_with(ctx)?)),
            1 => PlutusVersion::V1,
            2 => PlutusVersion::V2,
            3 => PlutusVersion::V3,
            x => {
                return Err(minicbor::decode::Error::message(format!(
                    "unknown script kind {x} at offset {position}"
                )))
            }
        };

        Ok(Script::Plutus(PlutusScript::new(
            version,
            d.decode_with::<C, Bytes>(ctx)?,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_addresses::PubKeyHash;

    // the "always succeeds" PlutusV2 script
    const ALWAYS_SUCCEEDS: &str = "49480100002221200101";

    #[test]
    fn plutus_hash_depends_on_version() {
        let bytes = hex::decode(ALWAYS_SUCCEEDS).unwrap();

        let v2 = PlutusScript::new(PlutusVersion::V2, bytes.clone());
        let v3 = PlutusScript::new(PlutusVersion::V3, bytes.clone());

        assert_eq!(v2.hash(), Hasher::<224>::hash_tagged(&bytes, 2));
        assert_ne!(v2.hash(), v3.hash());
    }

    #[test]
    fn script_ref_round_trip() {
        let native = Script::Native(NativeScript::Sig(PubKeyHash::new([4; 28])));
        let plutus = Script::Plutus(PlutusScript::new(
            PlutusVersion::V2,
            hex::decode(ALWAYS_SUCCEEDS).unwrap(),
        ));

        for script in [native, plutus] {
            let wrapped: ScriptRef = CborWrap(script.clone());
            let bytes = minicbor::to_vec(&wrapped).unwrap();

            // tag 24
            assert_eq!(&bytes[..2], &[0xd8, 0x18]);

            let back: ScriptRef = minicbor::decode(&bytes).unwrap();
            assert_eq!(back.0, script);
            assert_eq!(back.hash(), script.hash());
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = minicbor::decode::<Script>(&hex::decode("820440").unwrap()).unwrap_err();

        assert!(err.to_string().contains("unknown script kind 4"));
    }
}
