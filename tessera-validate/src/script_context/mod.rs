//! What a Plutus script gets to see of the transaction running it
//!
//! PlutusV2 and PlutusV3 disagree on too many fields to share one builder, so
//! each version has its own module. Both resolve redeemer indices against the
//! body lists as stored, which validation requires to be sorted.

pub mod v2;
pub mod v3;

pub use v2::{ScriptContextV2, TxInfoV2};
pub use v3::{ScriptContextV3, ScriptInfo, TxInfoV3};

use crate::utils::ValidationError;
use itertools::Itertools;
use tessera_addresses::StakingCredential;
use tessera_primitives::{
    DCert, DatumHash, MintingPolicyHash, PlutusData, RedeemerPurpose, Slot, SlotConfig,
    ToPlutusData, Tx, TxOutputDatum, TxOutputId, TxRedeemer,
};

/// Validity interval in POSIX milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub lower_bound: Option<u64>,
    pub upper_bound: Option<u64>,
}

impl TimeRange {
    pub fn from_slots(first: Option<Slot>, last: Option<Slot>, config: &SlotConfig) -> Self {
        Self {
            lower_bound: first.map(|x| config.slot_to_posix(x)),
            upper_bound: last.map(|x| config.slot_to_posix(x)),
        }
    }
}

// closed below, open above; a missing bound is infinite
impl ToPlutusData for TimeRange {
    fn to_plutus_data(&self) -> PlutusData {
        let closure = |closed: bool| closed.to_plutus_data();

        let lower = match self.lower_bound {
            Some(x) => PlutusData::constr(
                0,
                vec![PlutusData::constr(1, vec![x.to_plutus_data()]), closure(true)],
            ),
            None => PlutusData::constr(0, vec![PlutusData::constr(0, vec![]), closure(true)]),
        };

        let upper = match self.upper_bound {
            Some(x) => PlutusData::constr(
                0,
                vec![PlutusData::constr(1, vec![x.to_plutus_data()]), closure(false)],
            ),
            None => PlutusData::constr(0, vec![PlutusData::constr(2, vec![]), closure(true)]),
        };

        PlutusData::constr(0, vec![lower, upper])
    }
}

/// A redeemer purpose with its index resolved to the thing it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptPurpose {
    Minting(MintingPolicyHash),
    Spending(TxOutputId),
    Rewarding(StakingCredential),
    Certifying(usize, DCert),
}

impl ScriptPurpose {
    pub fn resolve(tx: &Tx, purpose: &RedeemerPurpose) -> Result<Self, ValidationError> {
        let index = purpose.index() as usize;
        let out_of_range = || ValidationError::RedeemerOutOfRange(*purpose);
        let body = &tx.body;

        match purpose {
            RedeemerPurpose::Spending(_) => body
                .inputs
                .get(index)
                .map(|x| ScriptPurpose::Spending(*x.id()))
                .ok_or_else(out_of_range),
            RedeemerPurpose::Minting(_) => body
                .minted_policies()
                .get(index)
                .map(|x| ScriptPurpose::Minting(*x))
                .ok_or_else(out_of_range),
            RedeemerPurpose::Certifying(_) => body
                .certificates
                .get(index)
                .map(|x| ScriptPurpose::Certifying(index, x.clone()))
                .ok_or_else(out_of_range),
            RedeemerPurpose::Rewarding(_) => body
                .withdrawals
                .get(index)
                .map(|(account, _)| ScriptPurpose::Rewarding(*account.credential()))
                .ok_or_else(out_of_range),
        }
    }
}

/// Redeemers in `(tag, index)` order, paired with their resolved purpose
pub(crate) fn resolved_redeemers(
    tx: &Tx,
) -> Result<Vec<(ScriptPurpose, &TxRedeemer)>, ValidationError> {
    let Some(redeemers) = tx.witnesses.redeemers.as_ref() else {
        return Ok(vec![]);
    };

    redeemers
        .iter()
        .sorted_by_key(|x| x.purpose)
        .map(|x| Ok((ScriptPurpose::resolve(tx, &x.purpose)?, x)))
        .collect()
}

/// Witnessed datums keyed by hash, in hash order
pub(crate) fn datum_entries(tx: &Tx) -> Vec<(PlutusData, PlutusData)> {
    tx.witnesses
        .datums
        .iter()
        .map(|x| (DatumHash::of(x), x))
        .sorted_by_key(|(hash, _)| *hash)
        .map(|(hash, data)| (hash.to_plutus_data(), data.clone()))
        .collect()
}

/// The datum locking the spent output `id`
///
/// A hashed datum is taken from the output when it carries the data, from
/// the witness set otherwise.
pub(crate) fn spent_datum(
    tx: &Tx,
    id: &TxOutputId,
) -> Result<Option<PlutusData>, ValidationError> {
    let input = tx
        .body
        .inputs
        .iter()
        .find(|x| x.id() == id)
        .ok_or(ValidationError::Unrecovered(*id))?;

    let datum = match input.datum()? {
        None => None,
        Some(TxOutputDatum::Inline(data)) => Some(data.clone()),
        Some(TxOutputDatum::Hashed { hash, data }) => data
            .clone()
            .or_else(|| tx.witnesses.find_datum(hash).cloned()),
    };

    Ok(datum)
}
