//! Whole transactions

use crate::{
    body::TxBody,
    draft::TxDraft,
    fees::{calc_ex_fee, calc_linear_fee, calc_ref_scripts_fee_with},
    hashes::TxId,
    input::TxInput,
    metadata::TxMetadata,
    native_script::NativeScriptContext,
    output::{TxOutput, TxOutputId},
    params::NetworkParams,
    script::Script,
    witnesses::{TxWitnesses, VKeyWitness},
    Coin, Error, Slot,
};
use std::collections::{BTreeSet, HashMap};
use tessera_addresses::PubKeyHash;
use tessera_codec::{
    minicbor,
    utils::{expect_array, Nullable},
    Fragment,
};
use tessera_crypto::hash::{Hash, Hasher};

/// Outcome of the last validation run over a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ValidationState {
    #[default]
    NotValidated,
    Valid,
    /// A structural rule failed
    Invalid(String),
    /// A script ran and failed, `trace` holds what it logged
    ScriptFailure { message: String, trace: Vec<String> },
}

/// The signers whose witnesses verified, and the validity interval
struct SignedContext {
    signers: BTreeSet<PubKeyHash>,
    first_valid_slot: Option<Slot>,
    last_valid_slot: Option<Slot>,
}

impl NativeScriptContext for SignedContext {
    fn is_signed_by(&self, key: &PubKeyHash) -> bool {
        self.signers.contains(key)
    }

    // an unbounded interval is never before anything
    fn is_before(&self, slot: Slot) -> bool {
        self.last_valid_slot.is_some_and(|last| last <= slot)
    }

    fn is_after(&self, slot: Slot) -> bool {
        self.first_valid_slot.is_some_and(|first| first >= slot)
    }
}

/// `[body, witnesses, script_validity, metadata | null]`
///
/// Besides its wire content a transaction tracks two local facts: which body
/// and witnesses last passed [`Tx::verify_signatures`], and the result of the
/// last validation run. Neither is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Tx {
    pub body: TxBody,
    pub witnesses: TxWitnesses,
    /// The phase-two flag carried on the wire
    pub script_validity: bool,
    pub metadata: Option<TxMetadata>,
    signed: Option<(TxId, Hash<32>)>,
    state: ValidationState,
}

impl Tx {
    pub fn new(body: TxBody, witnesses: TxWitnesses, metadata: Option<TxMetadata>) -> Self {
        Self {
            body,
            witnesses,
            script_validity: true,
            metadata,
            signed: None,
            state: ValidationState::NotValidated,
        }
    }

    pub fn id(&self) -> TxId {
        self.body.hash()
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self::decode_fragment(bytes)?)
    }

    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        let bytes = hex::decode(hex).map_err(|e| {
            Error::Decode(minicbor::decode::Error::message(format!("invalid hex: {e}")))
        })?;

        Self::from_cbor(&bytes)
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        self.encode_fragment()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_cbor())
    }

    /// Encoded size in bytes
    pub fn size(&self) -> u64 {
        self.to_cbor().len() as u64
    }

    /// True while body and witnesses are the ones whose signatures last
    /// verified. Editing either one drops the flag.
    pub fn is_valid(&self) -> bool {
        self.signed == Some(self.signed_digest())
    }

    fn signed_digest(&self) -> (TxId, Hash<32>) {
        (self.id(), Hasher::<256>::hash_cbor(&self.witnesses))
    }

    pub fn validation_state(&self) -> &ValidationState {
        &self.state
    }

    pub fn record_validation(&mut self, state: ValidationState) {
        self.state = state;
    }

    /// Checks every vkey witness against the body hash, that each required
    /// signer has one, and that every native script the body needs is
    /// satisfied. On success the transaction is marked valid and the
    /// number of verified signers is returned.
    ///
    /// Spent and collateral inputs have to be recovered, their addresses name
    /// signers too.
    pub fn verify_signatures(&mut self) -> Result<usize, Error> {
        let id = self.id();

        let mut signers = BTreeSet::new();

        for witness in self.witnesses.signatures.iter() {
            let key = witness.key_hash();

            if !witness.verify(&id) {
                return Err(Error::InvalidSignature(key));
            }

            signers.insert(key);
        }

        if let Some(missing) = self
            .body
            .required_signers()?
            .into_iter()
            .find(|x| !signers.contains(x))
        {
            return Err(Error::MissingSignature(missing));
        }

        let ctx = SignedContext {
            signers,
            first_valid_slot: self.body.first_valid_slot,
            last_valid_slot: self.body.last_valid_slot,
        };

        for (hash, _) in self.body.collect_required_scripts()? {
            if let Some(Script::Native(script)) = self.witnesses.find_script(&hash) {
                if !script.eval(&ctx) {
                    return Err(Error::NativeScriptFailed(hash));
                }
            }
        }

        self.signed = Some(self.signed_digest());

        Ok(ctx.signers.len())
    }

    /// Inputs, reference inputs and collateral
    pub fn all_inputs(&self) -> impl Iterator<Item = &TxInput> {
        self.body.all_inputs()
    }

    pub fn first_unrecovered(&self) -> Option<TxOutputId> {
        self.all_inputs()
            .find(|x| !x.is_recovered())
            .map(|x| *x.id())
    }

    /// Every `(id, output)` pair recovered so far
    pub fn recovered_inputs(&self) -> impl Iterator<Item = (&TxOutputId, &TxOutput)> {
        self.all_inputs()
            .filter_map(|x| x.output().ok().map(|out| (x.id(), out)))
    }

    /// Attaches fetched outputs to the inputs that point at them and
    /// registers the reference scripts they carry. Ids nobody points at are
    /// ignored.
    pub fn attach_outputs(&mut self, outputs: Vec<(TxOutputId, TxOutput)>) {
        let outputs: HashMap<_, _> = outputs.into_iter().collect();

        for input in self.body.all_inputs_mut() {
            if let Some(output) = outputs.get(input.id()) {
                input.recover(output.clone());
            }
        }

        let scripts: Vec<_> = self
            .body
            .inputs
            .iter()
            .chain(self.body.ref_inputs.iter())
            .filter_map(|x| x.output().ok())
            .filter_map(|x| x.script_ref.as_ref())
            .map(|x| x.0.clone())
            .collect();

        for script in scripts {
            self.witnesses.add_ref_script(script);
        }
    }

    /// Bytes of reference scripts carried by spent and referenced outputs
    pub fn ref_scripts_size(&self) -> Result<u64, Error> {
        let mut size = 0;

        for input in self.body.inputs.iter().chain(self.body.ref_inputs.iter()) {
            if let Some(script) = &input.output()?.script_ref {
                size += script.size() as u64;
            }
        }

        Ok(size)
    }

    /// Size once the signatures still missing are added
    pub fn size_with_dummy_signatures(&self) -> u64 {
        let missing = self
            .body
            .count_unique_signers()
            .saturating_sub(self.witnesses.signatures.len());

        if missing == 0 {
            return self.size();
        }

        let mut padded = self.clone();
        padded
            .witnesses
            .signatures
            .extend(std::iter::repeat(VKeyWitness::dummy()).take(missing));

        padded.size()
    }

    /// `linear fee over the signed size + execution fee + reference script fee`
    pub fn calc_min_fee(&self, params: &NetworkParams) -> Result<Coin, Error> {
        let linear = calc_linear_fee(self.size_with_dummy_signatures(), params)?;

        let ex = match &self.witnesses.redeemers {
            Some(redeemers) => calc_ex_fee(&redeemers.total_cost(), params)?,
            None => 0,
        };

        let scripts = calc_ref_scripts_fee_with(self.ref_scripts_size()?, params)?;

        [ex, scripts]
            .into_iter()
            .try_fold(linear, Coin::checked_add)
            .ok_or_else(|| Error::CoinOutOfRange(format!("{linear} + {ex} + {scripts}")))
    }

    /// Reopens the transaction for editing
    pub fn into_draft(self) -> TxDraft {
        TxDraft::from_parts(self.body, self.witnesses, self.metadata)
    }
}

impl<C> minicbor::Encode<C> for Tx {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(4)?;
        e.encode_with(&self.body, ctx)?;
        e.encode_with(&self.witnesses, ctx)?;
        e.bool(self.script_validity)?;
        e.encode_with(Nullable::from(self.metadata.clone()), ctx)?;

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Tx {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        expect_array(d, "transaction", 4)?;

        let body = d.decode_with(ctx)?;
        let witnesses = d.decode_with(ctx)?;
        let script_validity = d.bool()?;
        let metadata: Nullable<TxMetadata> = d.decode_with(ctx)?;

        Ok(Tx {
            script_validity,
            ..Tx::new(body, witnesses, metadata.into())
        })
    }
}
