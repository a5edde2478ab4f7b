//! A mutable transaction, balanced and signed before it is frozen into a [Tx]

use crate::{
    assets::{AssetName, AssetOrder},
    body::TxBody,
    certificate::DCert,
    hashes::{MintingPolicyHash, TxId},
    input::TxInput,
    metadata::TxMetadata,
    output::{TxOutput, TxOutputDatum},
    params::NetworkParams,
    redeemer::TxRedeemer,
    script::Script,
    script_data::{script_data_hash, LanguageViews},
    tx::Tx,
    witnesses::{TxWitnesses, VKeyWitness},
    Coin, Error, Slot,
};
use num_bigint::BigInt;
use std::collections::BTreeSet;
use tessera_addresses::{PubKeyHash, StakingAddress};
use tessera_codec::{plutus::PlutusData, utils::KeyValuePairs};
use tessera_crypto::key::ed25519::SecretKey;

/// Mutable access to one output of a draft
pub struct OutputDraft<'a>(&'a mut TxOutput);

impl OutputDraft<'_> {
    pub fn lovelace(&self) -> &BigInt {
        self.0.value.amount()
    }

    pub fn set_lovelace(&mut self, amount: impl Into<BigInt>) -> &mut Self {
        self.0.value.set_lovelace(amount);
        self
    }

    pub fn set_datum(&mut self, datum: Option<TxOutputDatum>) -> &mut Self {
        self.0.datum = datum;
        self
    }
}

/// The only place where a transaction changes after it was put together
///
/// Signatures made with [TxDraft::sign_with] cover the canonical body that
/// [TxDraft::build] will produce, so signing can happen before building.
/// Redeemer indices refer to that canonical order too.
#[derive(Debug, Clone, Default)]
pub struct TxDraft {
    body: TxBody,
    witnesses: TxWitnesses,
    metadata: Option<TxMetadata>,
}

impl TxDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        body: TxBody,
        witnesses: TxWitnesses,
        metadata: Option<TxMetadata>,
    ) -> Self {
        Self {
            body,
            witnesses,
            metadata,
        }
    }

    pub fn body(&self) -> &TxBody {
        &self.body
    }

    pub fn witnesses(&self) -> &TxWitnesses {
        &self.witnesses
    }

    pub fn set_fee(&mut self, fee: Coin) -> &mut Self {
        self.body.fee = fee;
        self
    }

    pub fn set_validity(&mut self, first: Option<Slot>, last: Option<Slot>) -> &mut Self {
        self.body.first_valid_slot = first;
        self.body.last_valid_slot = last;
        self
    }

    pub fn output_mut(&mut self, index: usize) -> Result<OutputDraft<'_>, Error> {
        self.body
            .outputs
            .get_mut(index)
            .map(OutputDraft)
            .ok_or(Error::NoSuchOutput(index))
    }

    pub fn add_input(&mut self, input: impl Into<TxInput>) -> &mut Self {
        self.body.inputs.push(input.into());
        self
    }

    pub fn add_ref_input(&mut self, input: impl Into<TxInput>) -> &mut Self {
        self.body.ref_inputs.push(input.into());
        self
    }

    pub fn add_collateral(&mut self, input: impl Into<TxInput>) -> &mut Self {
        self.body.collateral.push(input.into());
        self
    }

    pub fn add_output(&mut self, output: TxOutput) -> &mut Self {
        self.body.outputs.push(output);
        self
    }

    pub fn set_collateral_return(&mut self, output: TxOutput, total: Coin) -> &mut Self {
        self.body.collateral_return = Some(output);
        self.body.total_collateral = Some(total);
        self
    }

    pub fn add_signer(&mut self, signer: PubKeyHash) -> &mut Self {
        if !self.body.signers.contains(&signer) {
            self.body.signers.push(signer);
        }
        self
    }

    /// Mints (or burns, with a negative quantity) tokens of `policy`
    pub fn mint(
        &mut self,
        policy: MintingPolicyHash,
        name: impl Into<AssetName>,
        quantity: impl Into<BigInt>,
    ) -> &mut Self {
        self.body.minted.add_component(policy, name, quantity);
        self
    }

    pub fn add_certificate(&mut self, cert: DCert) -> &mut Self {
        self.body.certificates.push(cert);
        self
    }

    pub fn add_withdrawal(&mut self, account: StakingAddress, amount: Coin) -> &mut Self {
        let mut pairs = std::mem::replace(&mut self.body.withdrawals, KeyValuePairs::Def(vec![]))
            .to_vec();

        pairs.retain(|(x, _)| *x != account);
        pairs.push((account, amount));

        self.body.withdrawals = KeyValuePairs::Def(pairs);
        self
    }

    pub fn add_script(&mut self, script: impl Into<Script>) -> &mut Self {
        self.witnesses.add_script(script);
        self
    }

    pub fn add_datum(&mut self, datum: PlutusData) -> &mut Self {
        if !self.witnesses.datums.contains(&datum) {
            self.witnesses.datums.push(datum);
        }
        self
    }

    pub fn add_redeemer(&mut self, redeemer: TxRedeemer) -> &mut Self {
        self.witnesses
            .redeemers
            .get_or_insert_with(Default::default)
            .push(redeemer);
        self
    }

    pub fn set_metadata(&mut self, metadata: Option<TxMetadata>) -> &mut Self {
        self.metadata = metadata;
        self
    }

    pub fn add_signature(&mut self, witness: VKeyWitness) -> &mut Self {
        self.witnesses.add_signature(witness);
        self
    }

    /// Id the built transaction will have, as long as nothing else changes
    pub fn id(&mut self) -> TxId {
        self.canonicalize();
        self.body.hash()
    }

    /// Signs the canonical body with `key`
    pub fn sign_with(&mut self, key: &SecretKey) -> &mut Self {
        let id = self.id();
        self.add_signature(VKeyWitness::create(key, &id))
    }

    /// Raises the lovelace of every output to its minimum deposit
    ///
    /// Raising an amount can grow the output encoding, and with it the
    /// deposit, so each output is adjusted until it settles.
    pub fn correct_lovelace(&mut self, params: &NetworkParams) -> &mut Self {
        for output in self.body.outputs.iter_mut() {
            loop {
                let wanted = BigInt::from(output.min_lovelace(params));

                if output.value.amount() >= &wanted {
                    break;
                }

                output.value.set_lovelace(wanted);
            }
        }

        self
    }

    /// Recomputes the script data hash from the redeemers, datums and the
    /// cost models of every Plutus version in play. Without redeemers there
    /// is no hash, even if datums are attached.
    pub fn update_script_data_hash(&mut self, params: &NetworkParams) -> Result<&mut Self, Error> {
        if self.witnesses.redeemers.is_none() {
            self.body.script_data_hash = None;
            return Ok(self);
        }

        let versions: BTreeSet<_> = self
            .witnesses
            .scripts()
            .chain(self.witnesses.ref_scripts.iter().cloned())
            .filter_map(|x| x.plutus_version())
            .collect();

        let views = LanguageViews::from_cost_models(&params.cost_models, &versions)?;
        self.body.script_data_hash = Some(script_data_hash(&self.witnesses, &views));
        Ok(self)
    }

    /// Sorts what the ledger wants sorted and fills in the metadata hash
    fn canonicalize(&mut self) {
        let body = &mut self.body;

        body.inputs.sort();
        body.ref_inputs.sort();
        body.collateral.sort();

        body.minted.normalize();
        body.minted.sort(AssetOrder::ShortestFirst);

        let indef = body.withdrawals.is_indef();
        let mut withdrawals =
            std::mem::replace(&mut body.withdrawals, KeyValuePairs::Def(vec![])).to_vec();
        withdrawals.sort_by_key(|(account, _)| account.to_vec());

        body.withdrawals = if indef {
            KeyValuePairs::Indef(withdrawals)
        } else {
            KeyValuePairs::Def(withdrawals)
        };

        body.metadata_hash = self.metadata.as_ref().map(TxMetadata::hash);

        if let Some(redeemers) = self.witnesses.redeemers.as_mut() {
            redeemers.sort();
        }
    }

    pub fn build(mut self) -> Tx {
        self.canonicalize();
        Tx::new(self.body, self.witnesses, self.metadata)
    }
}
