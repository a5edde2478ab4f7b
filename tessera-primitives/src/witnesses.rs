//! The witness set: signatures, scripts, datums and redeemers

use crate::{
    hashes::{DatumHash, ScriptHash, TxId},
    native_script::NativeScript,
    redeemer::Redeemers,
    script::{PlutusScript, PlutusVersion, Script},
};
use tessera_addresses::PubKeyHash;
use tessera_codec::{
    minicbor::{self, data::Type, Decode, Encode},
    plutus::PlutusData,
    utils::{decode_list, encode_list, unexpected_type, Bytes, ListEncoding},
};
use tessera_crypto::key::ed25519::{PublicKey, SecretKey, Signature};

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct VKeyWitness {
    #[n(0)]
    pub vkey: PublicKey,

    #[n(1)]
    pub signature: Signature,
}

impl VKeyWitness {
    pub fn new(vkey: PublicKey, signature: Signature) -> Self {
        Self { vkey, signature }
    }

    /// Signs the body hash
    pub fn create(key: &SecretKey, tx_id: &TxId) -> Self {
        Self::new(key.public_key(), key.sign(tx_id))
    }

    /// Placeholder of the right size, used to estimate fees before signing
    pub fn dummy() -> Self {
        Self::new(PublicKey::from([0; PublicKey::SIZE]), Signature::from([0; Signature::SIZE]))
    }

    pub fn key_hash(&self) -> PubKeyHash {
        PubKeyHash::from(self.vkey.hash())
    }

    pub fn verify(&self, tx_id: &TxId) -> bool {
        self.vkey.verify(tx_id, &self.signature)
    }
}

/// Framing of a decoded witness set, replayed on encode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxWitnessesEncoding {
    pub indef_map: bool,
    pub signatures: ListEncoding,
    pub native_scripts: ListEncoding,
    pub plutus_v1_scripts: ListEncoding,
    pub datums: ListEncoding,
    pub plutus_v2_scripts: ListEncoding,
    pub plutus_v3_scripts: ListEncoding,
    key_order: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxWitnesses {
    pub signatures: Vec<VKeyWitness>,
    pub native_scripts: Vec<NativeScript>,
    pub plutus_v1_scripts: Vec<PlutusScript>,
    pub datums: Vec<PlutusData>,
    pub redeemers: Option<Redeemers>,
    pub plutus_v2_scripts: Vec<PlutusScript>,
    pub plutus_v3_scripts: Vec<PlutusScript>,
    /// Scripts found on recovered outputs; never encoded
    pub ref_scripts: Vec<Script>,
    pub encoding: TxWitnessesEncoding,
}

const KNOWN_KEYS: [u8; 7] = [0, 1, 3, 4, 5, 6, 7];

impl TxWitnesses {
    /// Scripts carried by the witness set itself
    pub fn scripts(&self) -> impl Iterator<Item = Script> + '_ {
        let native = self.native_scripts.iter().cloned().map(Script::Native);

        let plutus = self
            .plutus_v1_scripts
            .iter()
            .chain(self.plutus_v2_scripts.iter())
            .chain(self.plutus_v3_scripts.iter())
            .cloned()
            .map(Script::Plutus);

        native.chain(plutus)
    }

    /// Looks in the witnessed scripts first, then in reference scripts
    pub fn find_script(&self, hash: &ScriptHash) -> Option<Script> {
        self.scripts()
            .chain(self.ref_scripts.iter().cloned())
            .find(|x| &x.hash() == hash)
    }

    pub fn find_datum(&self, hash: &DatumHash) -> Option<&PlutusData> {
        self.datums.iter().find(|x| &DatumHash::of(x) == hash)
    }

    /// Adds a vkey witness, replacing any earlier one for the same key
    pub fn add_signature(&mut self, witness: VKeyWitness) {
        self.signatures.retain(|x| x.vkey != witness.vkey);
        self.signatures.push(witness);
    }

    pub fn is_signed_by(&self, key: &PubKeyHash) -> bool {
        self.signatures.iter().any(|x| &x.key_hash() == key)
    }

    pub fn add_script(&mut self, script: impl Into<Script>) {
        match script.into() {
            Script::Native(x) => self.native_scripts.push(x),
            Script::Plutus(x) => match x.version {
                PlutusVersion::V1 => self.plutus_v1_scripts.push(x),
                PlutusVersion::V2 => self.plutus_v2_scripts.push(x),
                PlutusVersion::V3 => self.plutus_v3_scripts.push(x),
            },
        }
    }

    pub fn add_ref_script(&mut self, script: Script) {
        if !self.ref_scripts.contains(&script) {
            self.ref_scripts.push(script);
        }
    }

    fn has_key(&self, key: u8) -> bool {
        match key {
            0 => !self.signatures.is_empty(),
            1 => !self.native_scripts.is_empty(),
            3 => !self.plutus_v1_scripts.is_empty(),
            4 => !self.datums.is_empty(),
            5 => self.redeemers.is_some(),
            6 => !self.plutus_v2_scripts.is_empty(),
            7 => !self.plutus_v3_scripts.is_empty(),
            _ => false,
        }
    }

    fn keys_to_encode(&self) -> Vec<u8> {
        let decoded = &self.encoding.key_order;

        // every entry but redeemers is a list and may stay on the wire empty
        let mut keys: Vec<u8> = decoded
            .iter()
            .copied()
            .filter(|k| *k != 5 || self.has_key(5))
            .collect();

        keys.extend(
            KNOWN_KEYS
                .iter()
                .filter(|k| !decoded.contains(k) && self.has_key(**k)),
        );

        keys
    }
}

fn encode_scripts<C, W: minicbor::encode::Write>(
    e: &mut minicbor::Encoder<W>,
    scripts: &[PlutusScript],
    encoding: ListEncoding,
    ctx: &mut C,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    let bytes: Vec<&Bytes> = scripts.iter().map(|x| &x.bytes).collect();
    encode_list(e, &bytes, encoding, ctx)
}

fn decode_scripts<'b, C>(
    d: &mut minicbor::Decoder<'b>,
    version: PlutusVersion,
    ctx: &mut C,
) -> Result<(Vec<PlutusScript>, ListEncoding), minicbor::decode::Error> {
    let (bytes, encoding): (Vec<Bytes>, _) = decode_list(d, ctx)?;

    let scripts = bytes
        .into_iter()
        .map(|x| PlutusScript::new(version, x))
        .collect();

    Ok((scripts, encoding))
}

impl<C> minicbor::Encode<C> for TxWitnesses {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let keys = self.keys_to_encode();
        let encoding = &self.encoding;

        if encoding.indef_map {
            e.begin_map()?;
        } else {
            e.map(keys.len() as u64)?;
        }

        for key in keys {
            e.u8(key)?;

            match key {
                0 => encode_list(e, &self.signatures, encoding.signatures, ctx)?,
                1 => encode_list(e, &self.native_scripts, encoding.native_scripts, ctx)?,
                3 => encode_scripts(e, &self.plutus_v1_scripts, encoding.plutus_v1_scripts, ctx)?,
                4 => encode_list(e, &self.datums, encoding.datums, ctx)?,
                5 => e.encode_with(&self.redeemers, ctx)?.ok()?,
                6 => encode_scripts(e, &self.plutus_v2_scripts, encoding.plutus_v2_scripts, ctx)?,
                _ => encode_scripts(e, &self.plutus_v3_scripts, encoding.plutus_v3_scripts, ctx)?,
            }
        }

        if encoding.indef_map {
            e.end()?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TxWitnesses {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();

        let len = match d.datatype()? {
            Type::Map | Type::MapIndef => d.map()?,
            other => return Err(unexpected_type("witness set map", other, position)),
        };

        let mut out = TxWitnesses::default();
        out.encoding.indef_map = len.is_none();

        let mut seen = 0;

        loop {
            match len {
                Some(n) if seen == n => break,
                None if d.datatype()? == Type::Break => {
                    d.skip()?;
                    break;
                }
                _ => (),
            }

            let key_position = d.position();
            let key = d.u64()?;

            let key = match u8::try_from(key) {
                Ok(2) => {
                    return Err(minicbor::decode::Error::message(format!(
                        "bootstrap witnesses are not supported, found at offset {key_position}"
                    )))
                }
                Ok(x) if KNOWN_KEYS.contains(&x) => x,
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unsupported witness set key {key} at offset {key_position}"
                    )))
                }
            };

            if out.encoding.key_order.contains(&key) {
                return Err(minicbor::decode::Error::message(format!(
                    "duplicate witness set key {key} at offset {key_position}"
                )));
            }

            out.encoding.key_order.push(key);

            let encoding = &mut out.encoding;

            match key {
                0 => (out.signatures, encoding.signatures) = decode_list(d, ctx)?,
                1 => (out.native_scripts, encoding.native_scripts) = decode_list(d, ctx)?,
                3 => {
                    (out.plutus_v1_scripts, encoding.plutus_v1_scripts) =
                        decode_scripts(d, PlutusVersion::V1, ctx)?
                }
                4 => (out.datums, encoding.datums) = decode_list(d, ctx)?,
                5 => out.redeemers = Some(d.decode_with(ctx)?),
                6 => {
                    (out.plutus_v2_scripts, encoding.plutus_v2_scripts) =
                        decode_scripts(d, PlutusVersion::V2, ctx)?
                }
                _ => {
                    (out.plutus_v3_scripts, encoding.plutus_v3_scripts) =
                        decode_scripts(d, PlutusVersion::V3, ctx)?
                }
            }

            seen += 1;
        }

        Ok(out)
    }
}
