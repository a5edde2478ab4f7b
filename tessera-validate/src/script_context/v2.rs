//! PlutusV2 script context
//!
//! `ScriptContext = Constr 0 [TxInfo, ScriptPurpose]`

use super::{datum_entries, resolved_redeemers, ScriptPurpose, TimeRange};
use crate::utils::ValidationError;
use itertools::Itertools;
use tessera_addresses::{PubKeyHash, StakingCredential};
use tessera_primitives::{
    AssetOrder, Assets, Coin, DCert, PlutusData, SlotConfig, ToPlutusData, Tx, TxId, Value,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TxInfoV2 {
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

impl TxInfoV2 {
    /// Every input, spent or referenced, has to be recovered
    pub fn from_tx(tx: &Tx, slot_config: &SlotConfig) -> Result<Self, ValidationError> {
        let body = &tx.body;

        let inputs = body
            .inputs
            .iter()
            .sorted()
            .map(|x| x.to_plutus_data_v2())
            .collect::<Result<_, _>>()?;

        let reference_inputs = body
            .ref_inputs
            .iter()
            .sorted()
            .map(|x| x.to_plutus_data_v2())
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

fn purpose_data(purpose: &ScriptPurpose) -> PlutusData {
    match purpose {
        ScriptPurpose::Minting(policy) => PlutusData::constr(0, vec![policy.to_plutus_data()]),
        ScriptPurpose::Spending(id) => PlutusData::constr(1, vec![id.to_plutus_data_v2()]),
        ScriptPurpose::Rewarding(credential) => {
            PlutusData::constr(2, vec![credential.to_staking_hash_data()])
        }
        ScriptPurpose::Certifying(_, cert) => {
            PlutusData::constr(3, vec![cert.to_plutus_data_v2()])
        }
    }
}

impl ToPlutusData for TxInfoV2 {
    fn to_plutus_data(&self) -> PlutusData {
        let withdrawals = self
            .withdrawals
            .iter()
            .map(|(credential, amount)| {
                (credential.to_staking_hash_data(), amount.to_plutus_data())
            })
            .collect();

        let redeemers = self
            .redeemers
            .iter()
            .map(|(purpose, data)| (purpose_data(purpose), data.clone()))
            .collect();

        PlutusData::constr(
            0,
            vec![
                PlutusData::list(self.inputs.clone()),
                PlutusData::list(self.reference_inputs.clone()),
                PlutusData::list(self.outputs.clone()),
                Value::lovelace(self.fee).to_plutus_data(true),
                self.mint.to_plutus_data(AssetOrder::Lexicographic, true),
                PlutusData::list(
                    self.certificates
                        .iter()
                        .map(DCert::to_plutus_data_v2)
                        .collect(),
                ),
                PlutusData::map(withdrawals),
                self.valid_range.to_plutus_data(),
                self.signatories.to_plutus_data(),
                PlutusData::map(redeemers),
                PlutusData::map(self.data.clone()),
                self.id.to_plutus_data_v2(),
            ],
        )
    }
}

pub struct ScriptContextV2<'a> {
    pub tx_info: &'a TxInfoV2,
    pub purpose: ScriptPurpose,
}

impl ToPlutusData for ScriptContextV2<'_> {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![self.tx_info.to_plutus_data(), purpose_data(&self.purpose)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_primitives::{MintingPolicyHash, TxOutputId};

    #[test]
    fn purposes_use_their_own_tags() {
        let policy = MintingPolicyHash::new([1; 28]);
        let id = TxOutputId::new(TxId::new([2; 32]), 3);

        assert_eq!(
            purpose_data(&ScriptPurpose::Minting(policy)),
            PlutusData::constr(0, vec![PlutusData::bytes(vec![1; 28])])
        );

        assert_eq!(
            purpose_data(&ScriptPurpose::Spending(id)),
            PlutusData::constr(1, vec![id.to_plutus_data_v2()])
        );
    }

    #[test]
    fn tx_info_has_twelve_fields() {
        let info = TxInfoV2 {
            inputs: vec![],
            reference_inputs: vec![],
            outputs: vec![],
            fee: 10,
            mint: Assets::new(),
            certificates: vec![],
            withdrawals: vec![],
            valid_range: TimeRange::default(),
            signatories: vec![],
            redeemers: vec![],
            data: vec![],
            id: TxId::new([0; 32]),
        };

        let data = info.to_plutus_data();
        let (alt, fields) = data.as_constr().unwrap();

        assert_eq!(alt, 0);
        assert_eq!(fields.len(), 12);

        // mint always carries a zero lovelace entry
        assert_eq!(fields[4].as_map().unwrap().len(), 1);
    }
}
