//! Transaction validation
//!
//! A transaction is checked in three stages. [`recovery::recover`] fetches
//! the outputs its inputs point at, [`validate`] runs the ledger battery over
//! the recovered transaction, and [`signatures::validate_signatures`] checks
//! the witnesses once the transaction has been signed.

pub mod evaluator;
pub mod phase_one;
pub mod phase_two;
pub mod recovery;
pub mod script_context;
pub mod signatures;
pub mod utils;

pub use evaluator::{EvalFailure, Evaluation, ScriptEvaluator};
pub use recovery::{recover, RecoveryError, UtxoSource};
pub use signatures::validate_signatures;
pub use utils::{ValidationError, ValidationResult};

use phase_one::*;
use phase_two::{check_redeemers_budget, check_total_budget};
use tessera_primitives::{NetworkParams, Tx, ValidationState};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Rejects what the ledger tolerates: unused scripts, assets out of
    /// canonical order, budget overruns of scripts without a diagnostic build
    pub strict: bool,
    /// Reports passing checks at info instead of debug
    pub verbose: bool,
}

fn passed(check: &str, options: &ValidateOptions) {
    match options.verbose {
        true => info!(check, "passed"),
        false => debug!(check, "passed"),
    }
}

/// Runs every ledger check over a recovered transaction, stopping at the
/// first failure
#[instrument(skip_all, fields(tx = %tx.id()))]
pub fn validate(
    tx: &Tx,
    params: &NetworkParams,
    evaluator: &impl ScriptEvaluator,
    options: ValidateOptions,
) -> ValidationResult {
    if let Some(id) = tx.first_unrecovered() {
        return Err(ValidationError::Unrecovered(id));
    }

    check_size(tx, params)?;
    passed("size", &options);

    check_fee(tx, params)?;
    passed("fee", &options);

    check_conservation(tx, params)?;
    passed("conservation", &options);

    check_collateral(tx, params)?;
    passed("collateral", &options);

    check_scripts_present(tx, &options)?;
    passed("scripts present", &options);

    check_redeemers_budget(tx, params, evaluator)?;
    passed("redeemers budget", &options);

    check_total_budget(tx, params, evaluator, &options)?;
    passed("total budget", &options);

    check_outputs(tx, params, &options)?;
    passed("outputs", &options);

    check_ordering(tx)?;
    passed("ordering", &options);

    check_metadata(tx)?;
    passed("metadata", &options);

    check_script_data_hash(tx, params)?;
    passed("script data hash", &options);

    Ok(())
}

/// Like [`validate`], but stores the outcome in the transaction instead of
/// returning it
pub fn validate_unsafe(
    tx: &mut Tx,
    params: &NetworkParams,
    evaluator: &impl ScriptEvaluator,
    options: ValidateOptions,
) {
    let state = match validate(tx, params, evaluator, options) {
        Ok(()) => ValidationState::Valid,
        Err(ValidationError::ScriptFailure { message, trace }) => {
            ValidationState::ScriptFailure { message, trace }
        }
        Err(err) => ValidationState::Invalid(err.to_string()),
    };

    tx.record_validation(state);
}
