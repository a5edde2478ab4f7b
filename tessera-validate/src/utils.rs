//! Helpers shared by the validation phases

pub mod validation;

pub use validation::*;

use itertools::Itertools;
use tessera_primitives::{PlutusScript, RedeemerPurpose, Script, ScriptHash, Tx};

/// True when every item is strictly greater than the one before it
pub fn strictly_increasing<T: Ord + Clone>(items: impl IntoIterator<Item = T>) -> bool {
    items.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Plutus scripts the body needs, each with the purpose that needs it
pub fn required_plutus_scripts(
    tx: &Tx,
) -> Result<Vec<(ScriptHash, PlutusScript, RedeemerPurpose)>, ValidationError> {
    let mut out = vec![];

    for (hash, purpose) in tx.body.collect_required_scripts()? {
        if let Some(Script::Plutus(script)) = tx.witnesses.find_script(&hash) {
            out.push((hash, script, purpose));
        }
    }

    Ok(out)
}

/// A transaction is smart when it runs at least one Plutus script
pub fn is_smart(tx: &Tx) -> Result<bool, ValidationError> {
    let has_redeemers = tx
        .witnesses
        .redeemers
        .as_ref()
        .is_some_and(|x| !x.is_empty());

    Ok(has_redeemers || !required_plutus_scripts(tx)?.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_are_not_increasing() {
        assert!(strictly_increasing([1, 2, 3]));
        assert!(strictly_increasing(Vec::<u8>::new()));
        assert!(!strictly_increasing([1, 2, 2]));
        assert!(!strictly_increasing([3, 1]));
    }
}
