//! Running the Plutus scripts of a transaction

use crate::{
    evaluator::ScriptEvaluator,
    script_context::{
        spent_datum, ScriptContextV2, ScriptContextV3, ScriptInfo, ScriptPurpose, TxInfoV2,
        TxInfoV3,
    },
    utils::{required_plutus_scripts, ValidationError, ValidationResult},
    ValidateOptions,
};
use std::collections::BTreeSet;
use tessera_primitives::{
    ExUnits, NetworkParams, PlutusData, PlutusScript, PlutusVersion, SlotConfig, ToPlutusData,
    Tx, TxRedeemer,
};
use tracing::{trace, warn};

/// Builds script arguments, assembling each version's tx info at most once
pub struct ScriptArgs<'a> {
    tx: &'a Tx,
    slot_config: &'a SlotConfig,
    v2: Option<TxInfoV2>,
    v3: Option<TxInfoV3>,
}

impl<'a> ScriptArgs<'a> {
    pub fn new(tx: &'a Tx, slot_config: &'a SlotConfig) -> Self {
        Self {
            tx,
            slot_config,
            v2: None,
            v3: None,
        }
    }

    fn v2(&mut self) -> Result<&TxInfoV2, ValidationError> {
        let info = match self.v2.take() {
            Some(x) => x,
            None => TxInfoV2::from_tx(self.tx, self.slot_config)?,
        };

        Ok(self.v2.insert(info))
    }

    fn v3(&mut self) -> Result<&TxInfoV3, ValidationError> {
        let info = match self.v3.take() {
            Some(x) => x,
            None => TxInfoV3::from_tx(self.tx, self.slot_config)?,
        };

        Ok(self.v3.insert(info))
    }

    /// PlutusV2 spending scripts get `[datum, redeemer, context]`, other V2
    /// scripts `[redeemer, context]`, V3 scripts only `[context]`
    pub fn for_redeemer(
        &mut self,
        script: &PlutusScript,
        redeemer: &TxRedeemer,
    ) -> Result<Vec<PlutusData>, ValidationError> {
        let tx = self.tx;
        let purpose = ScriptPurpose::resolve(tx, &redeemer.purpose)?;

        match script.version {
            PlutusVersion::V1 => Err(ValidationError::UnsupportedScriptVersion(PlutusVersion::V1)),
            PlutusVersion::V2 => {
                let datum = match &purpose {
                    ScriptPurpose::Spending(id) => {
                        Some(spent_datum(tx, id)?.ok_or(ValidationError::MissingDatum(*id))?)
                    }
                    _ => None,
                };

                let context = ScriptContextV2 {
                    tx_info: self.v2()?,
                    purpose,
                }
                .to_plutus_data();

                Ok(datum
                    .into_iter()
                    .chain([redeemer.data.clone(), context])
                    .collect())
            }
            PlutusVersion::V3 => {
                let datum = match &purpose {
                    ScriptPurpose::Spending(id) => spent_datum(tx, id)?,
                    _ => None,
                };

                let context = ScriptContextV3 {
                    tx_info: self.v3()?,
                    redeemer: redeemer.data.clone(),
                    script_info: ScriptInfo::new(purpose, datum),
                }
                .to_plutus_data();

                Ok(vec![context])
            }
        }
    }
}

// Every Plutus script the body needs has a redeemer, and every redeemer
// points at such a script. Each script runs successfully within the budget
// its redeemer declares.
pub fn check_redeemers_budget(
    tx: &Tx,
    params: &NetworkParams,
    evaluator: &impl ScriptEvaluator,
) -> ValidationResult {
    let required = required_plutus_scripts(tx)?;
    let redeemers = tx.witnesses.redeemers.as_deref().unwrap_or_default();

    let expected: BTreeSet<_> = required.iter().map(|(_, _, purpose)| *purpose).collect();

    if let Some(extra) = redeemers.iter().find(|x| !expected.contains(&x.purpose)) {
        return Err(ValidationError::ExtraRedeemer(extra.purpose));
    }

    let mut args = ScriptArgs::new(tx, &params.slot_config);

    for (hash, script, purpose) in required.iter() {
        let redeemer = redeemers
            .iter()
            .find(|x| &x.purpose == purpose)
            .ok_or(ValidationError::MissingRedeemer(*purpose))?;

        let evaluation = evaluator.evaluate(script, &args.for_redeemer(script, redeemer)?);

        trace!(
            script = %hash,
            ?purpose,
            mem = evaluation.cost.mem,
            steps = evaluation.cost.steps,
            "script evaluated"
        );

        if let Err(failure) = evaluation.result {
            return Err(ValidationError::ScriptFailure {
                message: failure.message,
                trace: failure.trace,
            });
        }

        if !evaluation.cost.fits_within(&redeemer.cost) {
            return Err(ValidationError::BudgetExceeded {
                purpose: *purpose,
                declared: redeemer.cost,
                used: evaluation.cost,
            });
        }
    }

    Ok(())
}

// The redeemers together stay within the per-transaction budget. Outside
// strict mode an overrun only warns when some script has no diagnostic
// build, since its optimized build is what ran.
pub fn check_total_budget(
    tx: &Tx,
    params: &NetworkParams,
    evaluator: &impl ScriptEvaluator,
    options: &ValidateOptions,
) -> ValidationResult {
    let total = tx
        .witnesses
        .redeemers
        .as_ref()
        .map(|x| x.total_cost())
        .unwrap_or(ExUnits::ZERO);

    if total.fits_within(&params.max_tx_ex_units) {
        return Ok(());
    }

    let missing_diagnostics = required_plutus_scripts(tx)?
        .iter()
        .any(|(hash, _, _)| !evaluator.has_diagnostic_build(hash));

    if !options.strict && missing_diagnostics {
        warn!(
            mem = total.mem,
            steps = total.steps,
            "total execution budget exceeded, some scripts lack a diagnostic build"
        );
        return Ok(());
    }

    Err(ValidationError::TotalBudgetExceeded {
        total,
        max: params.max_tx_ex_units,
    })
}
