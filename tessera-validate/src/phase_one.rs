//! Structural checks, the ones that need no script evaluation

use crate::{
    utils::{is_smart, strictly_increasing, ValidationError::*, ValidationResult},
    ValidateOptions,
};
use num_bigint::BigInt;
use std::collections::BTreeSet;
use tessera_primitives::{
    script_data::script_data_hash, AssetOrder, LanguageViews, NetworkParams, Tx, TxMetadata,
    Value,
};

// The encoded transaction fits the size limit.
pub fn check_size(tx: &Tx, params: &NetworkParams) -> ValidationResult {
    let size = tx.size();

    if size > params.max_tx_size {
        return Err(TxTooBig {
            size,
            max: params.max_tx_size,
        });
    }

    Ok(())
}

// The fee covers the size of the signed transaction, its execution budget
// and the reference scripts it loads.
pub fn check_fee(tx: &Tx, params: &NetworkParams) -> ValidationResult {
    let min = tx.calc_min_fee(params)?;

    if tx.body.fee < min {
        return Err(FeeTooSmall {
            fee: tx.body.fee,
            min,
        });
    }

    Ok(())
}

// Inputs, refunds, withdrawals and minted value add up to outputs, fee and
// deposits, for lovelace and every asset.
pub fn check_conservation(tx: &Tx, params: &NetworkParams) -> ValidationResult {
    let body = &tx.body;

    let released = body.refunds(params) + body.withdrawals_total();
    let consumed = body
        .sum_inputs()?
        .add(&Value::lovelace(released))
        .add(&Value::new(0, body.minted.clone()));

    let locked = body.fee + body.deposits(params);
    let produced = body.sum_outputs().add(&Value::lovelace(locked));

    let difference = consumed.subtract(&produced);

    if !difference.is_zero() {
        return Err(ValueNotConserved { difference });
    }

    Ok(())
}

// A transaction running scripts puts up enough lovelace-only collateral
// through few enough inputs. Any other transaction has none.
pub fn check_collateral(tx: &Tx, params: &NetworkParams) -> ValidationResult {
    let body = &tx.body;

    if !is_smart(tx)? {
        let has_collateral = !body.collateral.is_empty()
            || body.collateral_return.is_some()
            || body.total_collateral.is_some();

        return match has_collateral {
            true => Err(CollateralNotAllowed),
            false => Ok(()),
        };
    }

    if body.collateral.is_empty() {
        return Err(MissingCollateral);
    }

    if body.collateral.len() as u64 > params.max_collateral_inputs {
        return Err(TooManyCollateralInputs {
            count: body.collateral.len(),
            max: params.max_collateral_inputs,
        });
    }

    let collateral = body.sum_collateral()?;

    if !collateral.assets().is_zero() {
        return Err(NonLovelaceCollateral);
    }

    let required = body
        .fee
        .saturating_mul(params.collateral_percentage)
        .div_ceil(100);

    if collateral.amount() < &BigInt::from(required) {
        return Err(InsufficientCollateral {
            provided: collateral.amount().clone(),
            required,
        });
    }

    let returned = body
        .collateral_return
        .as_ref()
        .map(|x| x.value.clone())
        .unwrap_or_default();

    let net = collateral.subtract(&returned);

    if !net.assets().is_zero() {
        return Err(NonLovelaceCollateral);
    }

    if net.amount() < &BigInt::from(required) {
        return Err(InsufficientCollateral {
            provided: net.amount().clone(),
            required,
        });
    }

    if let Some(declared) = body.total_collateral {
        if &BigInt::from(declared) != net.amount() {
            return Err(IncorrectTotalCollateral {
                declared,
                actual: net.amount().clone(),
            });
        }
    }

    Ok(())
}

// Every script the body needs is witnessed, directly or by reference. No
// script is witnessed twice and, in strict mode, none is witnessed in vain.
pub fn check_scripts_present(tx: &Tx, options: &ValidateOptions) -> ValidationResult {
    let required: BTreeSet<_> = tx
        .body
        .collect_required_scripts()?
        .into_iter()
        .map(|(hash, _)| hash)
        .collect();

    if let Some(missing) = required
        .iter()
        .find(|x| tx.witnesses.find_script(x).is_none())
    {
        return Err(MissingScript(*missing));
    }

    let mut seen = BTreeSet::new();

    for script in tx.witnesses.scripts() {
        let hash = script.hash();

        if !seen.insert(hash) {
            return Err(DuplicateScript(hash));
        }

        if options.strict && !required.contains(&hash) {
            return Err(UnusedScript(hash));
        }
    }

    Ok(())
}

// Each output holds at least the deposit its size calls for, and no negative
// quantity. Strict mode also wants the assets in canonical order.
pub fn check_outputs(
    tx: &Tx,
    params: &NetworkParams,
    options: &ValidateOptions,
) -> ValidationResult {
    for (index, output) in tx.body.outputs.iter().enumerate() {
        output.value.assert_all_positive()?;

        let min = output.min_lovelace(params);

        if output.value.amount() < &BigInt::from(min) {
            return Err(OutputBelowMinimum {
                index,
                lovelace: output.value.amount().clone(),
                min,
            });
        }

        if options.strict && !output.value.assets().is_sorted(AssetOrder::ShortestFirst) {
            return Err(UnsortedOutputAssets(index));
        }
    }

    Ok(())
}

// Inputs, reference inputs, minted policies and withdrawals appear in
// strictly increasing order. Equal neighbours are duplicates and fail too.
pub fn check_ordering(tx: &Tx) -> ValidationResult {
    let body = &tx.body;

    if !strictly_increasing(body.inputs.iter()) {
        return Err(NotStrictlyOrdered("inputs"));
    }

    if !strictly_increasing(body.ref_inputs.iter()) {
        return Err(NotStrictlyOrdered("reference inputs"));
    }

    if !strictly_increasing(body.minted_policies()) {
        return Err(NotStrictlyOrdered("minting policies"));
    }

    if !strictly_increasing(body.withdrawals.iter().map(|(x, _)| x.to_vec())) {
        return Err(NotStrictlyOrdered("withdrawals"));
    }

    Ok(())
}

// Metadata and its hash in the body come together, and agree.
pub fn check_metadata(tx: &Tx) -> ValidationResult {
    match (&tx.metadata, &tx.body.metadata_hash) {
        (None, None) => Ok(()),
        (Some(_), None) => Err(MissingMetadataHash),
        (None, Some(_)) => Err(MissingMetadata),
        (Some(metadata), Some(hash)) if &TxMetadata::hash(metadata) != hash => {
            Err(MetadataHashMismatch)
        }
        _ => Ok(()),
    }
}

// The body commits to redeemers, datums and the cost models of the languages
// in play. The hash is required exactly when there are redeemers, datums
// without redeemers don't allow one.
pub fn check_script_data_hash(tx: &Tx, params: &NetworkParams) -> ValidationResult {
    let witnesses = &tx.witnesses;
    let found = tx.body.script_data_hash;

    if witnesses.redeemers.is_none() {
        return match found {
            Some(_) => Err(UnexpectedScriptDataHash),
            None => Ok(()),
        };
    }

    let versions: BTreeSet<_> = witnesses
        .scripts()
        .chain(witnesses.ref_scripts.iter().cloned())
        .filter_map(|x| x.plutus_version())
        .collect();

    let views = LanguageViews::from_cost_models(&params.cost_models, &versions)?;
    let expected = script_data_hash(witnesses, &views);

    match found {
        Some(found) if found != expected => Err(ScriptDataHashMismatch { expected, found }),
        Some(_) => Ok(()),
        None => Err(MissingScriptDataHash),
    }
}
