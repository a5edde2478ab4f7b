//! PlutusV3 script context
//!
//! `ScriptContext = Constr 0 [TxInfo, Redeemer, ScriptInfo]`. Governance is
//! not modeled, so votes, proposals, the treasury amount and the donation
//! are always empty.

use super::{datum_entries, resolved_redeemers, ScriptPurpose, TimeRange};
use crate::utils::ValidationError;
use itertools::Itertools;
use tessera_addresses::{PubKeyHash, StakingCredential};
use tessera_primitives::{
    AssetOrder, Assets, Coin, DCert, MintingPolicyHash, PlutusData, SlotConfig, ToPlutusData,
    Tx, TxId, TxOutputId,
};

/// Why a V3 script runs; spending scripts also get the datum of the output
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptInfo {
    Minting(MintingPolicyHash),
    Spending(TxOutputId, Option<PlutusData>),
    Rewarding(StakingCredential),
    Certifying(usize, DCert),
}

impl ScriptInfo {
    pub fn new(purpose: ScriptPurpose, datum: Option<PlutusData>) -> Self {
        match purpose {
            ScriptPurpose::Minting(x) => ScriptInfo::Minting(x),
            ScriptPurpose::Spending(x) => ScriptInfo::Spending(x, datum),
            ScriptPurpose::Rewarding(x) => ScriptInfo::Rewarding(x),
            ScriptPurpose::Certifying(index, cert) => ScriptInfo::Certifying(index, cert),
        }
    }
}

impl ToPlutusData for ScriptInfo {
    fn to_plutus_data(&self) -> PlutusData {
        match self {
            ScriptInfo::Minting(policy) => PlutusData::constr(0, vec![policy.to_plutus_data()]),
            ScriptInfo::Spending(id, datum) => PlutusData::constr(
                1,
                vec![id.to_plutus_data_v3(), PlutusData::option(datum.clone())],
            ),
            ScriptInfo::Rewarding(credential) => {
                PlutusData::constr(2, vec![credential.to_plutus_data()])
            }
            ScriptInfo::Certifying(index, cert) => PlutusData::constr(
                3,
                vec![(*index as u64).to_plutus_data(), cert.to_plutus_data_v3()],
            ),
        }
    }
}

// the redeemers map keys purposes without the spending datum
fn purpose_data(purpose: &ScriptPurpose) -> PlutusData {
    match purpose {
        ScriptPurpose::Minting(policy) => PlutusData::constr(0, vec![policy.to_plutus_data()]),
        ScriptPurpose::Spending(id) => PlutusData::constr(1, vec![id.to_plutus_data_v3()]),
        ScriptPurpose::Rewarding(credential) => {
            PlutusData::constr(2, vec![credential.to_plutus_data()])
        }
        ScriptPurpose::Certifying(index, cert) => PlutusData::constr(
            3,
            vec![(*index as u64).to_plutus_data(), cert.to_plutus_data_v3()],
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TxInfoV3 {
    pub inputs: Vec<PlutusData>,
    pub reference_inputs: Vec<PlutusData>,
    pub outputs: Vec<PlutusData>,
    pub fee: Coin,
    pub mint: Assets,
    pub certificates: Vec<DCert>,
    pub withdrawals: Vec<(StakingCredential, Coin)>,
    pub valid_range: TimeRange,
    pub signatories: Vec<PubKeyHash>,
    pub redeemers: Vec<(ScriptPurpose, PlutusData)>,
    pub data: Vec<(PlutusData, PlutusData)>,
    pub id: TxId,
}

impl TxInfoV3 {
    pub fn from_tx(tx: &Tx, slot_config: &SlotConfig) -> Result<Self, ValidationError> {
        let body = &tx.body;

        let inputs = body
            .inputs
            .iter()
            .sorted()
            .map(|x| x.to_plutus_data_v3())
            .collect::<Result<_, _>>()?;

        let reference_inputs = body
            .ref_inputs
            .iter()
            .sorted()
            .map(|x| x.to_plutus_data_v3())
            .collect::<Result<_, _>>()?;

        let outputs = body
            .outputs
            .iter()
            .map(|x| x.to_plutus_data())
            .collect::<Result<_, _>>()?;

        let redeemers = resolved_redeemers(tx)?
            .into_iter()
            .map(|(purpose, redeemer)| (purpose, redeemer.data.clone()))
            .collect();

        Ok(Self {
            inputs,
            reference_inputs,
            outputs,
            fee: body.fee,
            mint: body.minted.clone(),
            certificates: body.certificates.clone(),
            withdrawals: body
                .withdrawals
                .iter()
                .map(|(account, amount)| (*account.credential(), *amount))
                .collect(),
            valid_range: TimeRange::from_slots(
                body.first_valid_slot,
                body.last_valid_slot,
                slot_config,
            ),
            signatories: body.signers.iter().copied().sorted().collect(),
            redeemers,
            data: datum_entries(tx),
            id: tx.id(),
        })
    }
}

impl ToPlutusData for TxInfoV3 {
    fn to_plutus_data(&self) -> PlutusData {
        let withdrawals = self
            .withdrawals
            .iter()
            .map(|(credential, amount)| (credential.to_plutus_data(), amount.to_plutus_data()))
            .collect();

        let redeemers = self
            .redeemers
            .iter()
            .map(|(purpose, data)| (purpose_data(purpose), data.clone()))
            .collect();

        let nothing = || PlutusData::option(None);

        PlutusData::constr(
            0,
            vec![
                PlutusData::list(self.inputs.clone()),
                PlutusData::list(self.reference_inputs.clone()),
                PlutusData::list(self.outputs.clone()),
                self.fee.to_plutus_data(),
                self.mint.to_plutus_data(AssetOrder::Lexicographic, false),
                PlutusData::list(
                    self.certificates
                        .iter()
                        .map(DCert::to_plutus_data_v3)
                        .collect(),
                ),
                PlutusData::map(withdrawals),
                self.valid_range.to_plutus_data(),
                self.signatories.to_plutus_data(),
                PlutusData::map(redeemers),
                PlutusData::map(self.data.clone()),
                self.id.to_plutus_data_v3(),
                // votes, proposals, treasury, donation
                PlutusData::map(vec![]),
                PlutusData::list(vec![]),
                nothing(),
                nothing(),
            ],
        )
    }
}

pub struct ScriptContextV3<'a> {
    pub tx_info: &'a TxInfoV3,
    pub redeemer: PlutusData,
    pub script_info: ScriptInfo,
}

impl ToPlutusData for ScriptContextV3<'_> {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                self.tx_info.to_plutus_data(),
                self.redeemer.clone(),
                self.script_info.to_plutus_data(),
            ],
        )
    }
}
