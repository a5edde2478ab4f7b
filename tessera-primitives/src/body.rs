//! The economically binding part of a transaction

use crate::{
    assets::Assets,
    certificate::DCert,
    hashes::{MintingPolicyHash, ScriptHash, TxId},
    input::TxInput,
    output::TxOutput,
    params::NetworkParams,
    redeemer::RedeemerPurpose,
    value::Value,
    Coin, Error, Slot,
};
use std::collections::BTreeSet;
use tessera_addresses::{Network, PubKeyHash, SpendingCredential, StakingAddress};
use tessera_codec::{
    minicbor::{self, data::Type},
    utils::{decode_list, encode_list, unexpected_type, KeyValuePairs, ListEncoding},
};
use tessera_crypto::hash::{Hash, Hasher};

/// How a decoded body was framed on the wire
///
/// Bodies are hashed over their exact bytes, so everything that has more
/// than one legal encoding is recorded here and replayed on encode. A fresh
/// body uses definite lists, a definite map and ascending keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxBodyEncoding {
    pub indef_map: bool,
    pub inputs: ListEncoding,
    pub outputs: ListEncoding,
    pub certificates: ListEncoding,
    pub withdrawals_indef: bool,
    pub collateral: ListEncoding,
    pub signers: ListEncoding,
    pub ref_inputs: ListEncoding,
    key_order: Vec<u8>,
}

impl TxBodyEncoding {
    /// Keys in the order they were decoded
    pub fn key_order(&self) -> &[u8] {
        &self.key_order
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBody {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub fee: Coin,
    /// Upper bound of the validity interval, exclusive
    pub last_valid_slot: Option<Slot>,
    pub certificates: Vec<DCert>,
    pub withdrawals: KeyValuePairs<StakingAddress, Coin>,
    pub metadata_hash: Option<Hash<32>>,
    /// Lower bound of the validity interval, inclusive
    pub first_valid_slot: Option<Slot>,
    pub minted: Assets,
    pub script_data_hash: Option<Hash<32>>,
    pub collateral: Vec<TxInput>,
    pub signers: Vec<PubKeyHash>,
    pub network_id: Option<Network>,
    pub collateral_return: Option<TxOutput>,
    pub total_collateral: Option<Coin>,
    pub ref_inputs: Vec<TxInput>,
    pub encoding: TxBodyEncoding,
}

impl Default for TxBody {
    fn default() -> Self {
        Self {
            inputs: vec![],
            outputs: vec![],
            fee: 0,
            last_valid_slot: None,
            certificates: vec![],
            withdrawals: KeyValuePairs::Def(vec![]),
            metadata_hash: None,
            first_valid_slot: None,
            minted: Assets::new(),
            script_data_hash: None,
            collateral: vec![],
            signers: vec![],
            network_id: None,
            collateral_return: None,
            total_collateral: None,
            ref_inputs: vec![],
            encoding: TxBodyEncoding::default(),
        }
    }
}

const KNOWN_KEYS: [u8; 16] = [0, 1, 2, 3, 4, 5, 7, 8, 9, 11, 13, 14, 15, 16, 17, 18];

impl TxBody {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>, fee: Coin) -> Self {
        Self {
            inputs,
            outputs,
            fee,
            ..Default::default()
        }
    }

    /// The transaction id: `blake2b_256` of the body bytes
    pub fn hash(&self) -> TxId {
        TxId::from(Hasher::<256>::hash_cbor(self))
    }

    /// Inputs, reference inputs and collateral, in that order
    pub fn all_inputs(&self) -> impl Iterator<Item = &TxInput> {
        self.inputs
            .iter()
            .chain(self.ref_inputs.iter())
            .chain(self.collateral.iter())
    }

    pub(crate) fn all_inputs_mut(&mut self) -> impl Iterator<Item = &mut TxInput> {
        self.inputs
            .iter_mut()
            .chain(self.ref_inputs.iter_mut())
            .chain(self.collateral.iter_mut())
    }

    /// Key hashes that have to sign: declared signers plus the key
    /// credentials of recovered spent and collateral outputs
    pub fn required_signers(&self) -> Result<BTreeSet<PubKeyHash>, Error> {
        let mut out: BTreeSet<_> = self.signers.iter().copied().collect();

        for input in self.inputs.iter().chain(self.collateral.iter()) {
            if let Some(SpendingCredential::PubKey(key)) = input.address()?.spending_credential() {
                out.insert(*key);
            }
        }

        Ok(out)
    }

    /// Estimate of the distinct keys that will sign, for sizing dummy
    /// witnesses. Unrecovered inputs count as one more key each.
    pub fn count_unique_signers(&self) -> usize {
        let mut keys: BTreeSet<_> = self.signers.iter().copied().collect();
        let mut unknown = 0;

        for input in self.inputs.iter().chain(self.collateral.iter()) {
            match input.address() {
                Ok(address) => {
                    if let Some(SpendingCredential::PubKey(key)) = address.spending_credential() {
                        keys.insert(*key);
                    }
                }
                Err(_) => unknown += 1,
            }
        }

        keys.len() + unknown
    }

    pub fn sum_inputs(&self) -> Result<Value, Error> {
        sum_values(&self.inputs)
    }

    pub fn sum_outputs(&self) -> Value {
        self.outputs
            .iter()
            .fold(Value::zero(), |acc, x| acc.add(&x.value))
    }

    pub fn sum_collateral(&self) -> Result<Value, Error> {
        sum_values(&self.collateral)
    }

    /// Lovelace locked by the certificates
    pub fn deposits(&self, params: &NetworkParams) -> Coin {
        self.certificates.iter().map(|x| x.deposit(params)).sum()
    }

    /// Lovelace released by the certificates
    pub fn refunds(&self, params: &NetworkParams) -> Coin {
        self.certificates.iter().map(|x| x.refund(params)).sum()
    }

    pub fn withdrawals_total(&self) -> Coin {
        self.withdrawals.iter().map(|(_, amount)| *amount).sum()
    }

    /// Policies of the minted (or burnt) assets, in body order
    pub fn minted_policies(&self) -> Vec<MintingPolicyHash> {
        self.minted.all_policies()
    }

    /// Every script the body needs a witness for, with the purpose that
    /// needs it. Indices point into the body lists as stored.
    ///
    /// Spent inputs have to be recovered.
    pub fn collect_required_scripts(&self) -> Result<Vec<(ScriptHash, RedeemerPurpose)>, Error> {
        let mut out = vec![];

        for (index, input) in self.inputs.iter().enumerate() {
            if let Some(SpendingCredential::Validator(hash)) = input.address()?.spending_credential()
            {
                out.push((*hash.as_hash(), RedeemerPurpose::Spending(index as u32)));
            }
        }

        for (index, policy) in self.minted_policies().iter().enumerate() {
            if let Some(hash) = policy.as_hash() {
                out.push((*hash, RedeemerPurpose::Minting(index as u32)));
            }
        }

        for (index, cert) in self.certificates.iter().enumerate() {
            if let Some(hash) = cert.required_script() {
                out.push((*hash.as_hash(), RedeemerPurpose::Certifying(index as u32)));
            }
        }

        for (index, (account, _)) in self.withdrawals.iter().enumerate() {
            if let Some(hash) = account.credential().staking_validator_hash() {
                out.push((*hash.as_hash(), RedeemerPurpose::Rewarding(index as u32)));
            }
        }

        Ok(out)
    }

    fn has_key(&self, key: u8) -> bool {
        match key {
            0 | 1 | 2 => true,
            3 => self.last_valid_slot.is_some(),
            4 => !self.certificates.is_empty(),
            5 => !self.withdrawals.is_empty(),
            7 => self.metadata_hash.is_some(),
            8 => self.first_valid_slot.is_some(),
            9 => !self.minted.is_empty(),
            11 => self.script_data_hash.is_some(),
            13 => !self.collateral.is_empty(),
            14 => !self.signers.is_empty(),
            15 => self.network_id.is_some(),
            16 => self.collateral_return.is_some(),
            17 => self.total_collateral.is_some(),
            18 => !self.ref_inputs.is_empty(),
            _ => false,
        }
    }

    /// Keys to write: the decoded order first (empty entries that were on
    /// the wire stay there), then whatever is new in ascending order
    fn keys_to_encode(&self) -> Vec<u8> {
        let decoded = &self.encoding.key_order;

        let mut keys: Vec<u8> = decoded
            .iter()
            .copied()
            .filter(|k| self.has_key(*k) || key_allows_empty(*k))
            .collect();

        keys.extend(
            KNOWN_KEYS
                .iter()
                .filter(|k| !decoded.contains(k) && self.has_key(**k)),
        );

        keys
    }
}

// list-valued entries can be written empty, optional scalars cannot
fn key_allows_empty(key: u8) -> bool {
    matches!(key, 4 | 5 | 9 | 13 | 14 | 18)
}

fn sum_values(inputs: &[TxInput]) -> Result<Value, Error> {
    inputs
        .iter()
        .try_fold(Value::zero(), |acc, x| Ok(acc.add(x.value()?)))
}

impl<C> minicbor::Encode<C> for TxBody {
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
                0 => encode_list(e, &self.inputs, encoding.inputs, ctx)?,
                1 => encode_list(e, &self.outputs, encoding.outputs, ctx)?,
                2 => e.u64(self.fee)?.ok()?,
                3 => e.encode_with(self.last_valid_slot, ctx)?.ok()?,
                4 => encode_list(e, &self.certificates, encoding.certificates, ctx)?,
                5 => {
                    let pairs = self.withdrawals.iter().cloned().collect();

                    if encoding.withdrawals_indef {
                        e.encode_with(KeyValuePairs::Indef(pairs), ctx)?;
                    } else {
                        e.encode_with(KeyValuePairs::Def(pairs), ctx)?;
                    }
                }
                7 => e.encode_with(self.metadata_hash, ctx)?.ok()?,
                8 => e.encode_with(self.first_valid_slot, ctx)?.ok()?,
                9 => e.encode_with(&self.minted, ctx)?.ok()?,
                11 => e.encode_with(self.script_data_hash, ctx)?.ok()?,
                13 => encode_list(e, &self.collateral, encoding.collateral, ctx)?,
                14 => encode_list(e, &self.signers, encoding.signers, ctx)?,
                15 => e.u8(self.network_id.map(|x| x.value()).unwrap_or_default())?.ok()?,
                16 => e.encode_with(&self.collateral_return, ctx)?.ok()?,
                17 => e.encode_with(self.total_collateral, ctx)?.ok()?,
                _ => encode_list(e, &self.ref_inputs, encoding.ref_inputs, ctx)?,
            }
        }

        if encoding.indef_map {
            e.end()?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TxBody {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();

        let len = match d.datatype()? {
            Type::Map | Type::MapIndef => d.map()?,
            other => return Err(unexpected_type("transaction body map", other, position)),
        };

        let mut body = TxBody::default();
        body.encoding.indef_map = len.is_none();

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
                Ok(x) if KNOWN_KEYS.contains(&x) => x,
                _ => {
                    return Err(minicbor::decode::Error::message(format!(
                        "unsupported transaction body key {key} at offset {key_position}"
                    )))
                }
            };

            if body.encoding.key_order.contains(&key) {
                return Err(minicbor::decode::Error::message(format!(
                    "duplicate transaction body key {key} at offset {key_position}"
                )));
            }

            body.encoding.key_order.push(key);

            match key {
                0 => (body.inputs, body.encoding.inputs) = decode_list(d, ctx)?,
                1 => (body.outputs, body.encoding.outputs) = decode_list(d, ctx)?,
                2 => body.fee = d.u64()?,
                3 => body.last_valid_slot = Some(d.u64()?),
                4 => (body.certificates, body.encoding.certificates) = decode_list(d, ctx)?,
                5 => {
                    let pairs: KeyValuePairs<StakingAddress, Coin> = d.decode_with(ctx)?;
                    body.encoding.withdrawals_indef = pairs.is_indef();
                    body.withdrawals = pairs;
                }
                7 => body.metadata_hash = Some(d.decode_with(ctx)?),
                8 => body.first_valid_slot = Some(d.u64()?),
                9 => body.minted = d.decode_with(ctx)?,
                11 => body.script_data_hash = Some(d.decode_with(ctx)?),
                13 => (body.collateral, body.encoding.collateral) = decode_list(d, ctx)?,
                14 => (body.signers, body.encoding.signers) = decode_list(d, ctx)?,
                15 => body.network_id = Some(Network::from(d.u8()?)),
                16 => body.collateral_return = Some(d.decode_with(ctx)?),
                17 => body.total_collateral = Some(d.u64()?),
                _ => (body.ref_inputs, body.encoding.ref_inputs) = decode_list(d, ctx)?,
            }

            seen += 1;
        }

        for required in [0, 1, 2] {
            if !body.encoding.key_order.contains(&required) {
                return Err(minicbor::decode::Error::message(format!(
                    "transaction body without key {required} at offset {position}"
                )));
            }
        }

        Ok(body)
    }
}
