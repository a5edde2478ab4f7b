mod common;

use common::*;
#[macro_use]
extern crate pretty_assertions;
use tessera_addresses::{Network, PubKeyHash, StakingAddress, StakingCredential};
use tessera_codec::minicbor;
use tessera_crypto::{hash::Hash, key::ed25519::SecretKey};
use tessera_primitives::{
    script_data::script_data_hash, AssetClass, Assets, ExUnits, KeyValuePairs, LanguageViews,
    Metadatum, MintingPolicyHash, NativeScript, NetworkParams, PlutusData, PlutusScript,
    PlutusVersion, RedeemerPurpose, Script, Tx, TxDraft, TxId, TxMetadata, TxOutput, TxRedeemer,
    ValidationState, VKeyWitness, Value,
};
use tessera_validate::{
    phase_one::check_ordering, recover, script_context::ScriptPurpose,
    signatures::validate_signatures, validate, validate_unsafe, RecoveryError, ValidateOptions,
    ValidationError,
};
use test_case::test_case;

const FEE: u64 = 200_000;

/// Spends 10 ada held by `key` into a single output, with nothing signed yet
fn payment(key: &SecretKey) -> (Tx, StubSource) {
    let spent = output_id(1, 0);

    let mut draft = TxDraft::new();
    draft
        .add_input(spent)
        .add_output(TxOutput::new(
            key_address(&secret_key(99)),
            Value::lovelace(10_000_000 - FEE),
        ))
        .set_fee(FEE);

    let source = StubSource::default().with(spent, TxOutput::new(key_address(key), ada(10)));

    (draft.build(), source)
}

fn sign(tx: &mut Tx, key: &SecretKey) {
    let id = tx.id();
    tx.witnesses.add_signature(VKeyWitness::create(key, &id));
}

fn always_succeeds() -> PlutusScript {
    PlutusScript::new(PlutusVersion::V3, vec![0x46, 0x01, 0x00, 0x00, 0x22, 0x49, 0x01])
}

const DECLARED: ExUnits = ExUnits {
    mem: 10_000,
    steps: 10_000,
};

/// One of each `policies`, all named "coin"
fn tokens(policies: &[u8]) -> Assets {
    Assets::from_pairs(
        policies
            .iter()
            .map(|p| (AssetClass::new(MintingPolicyHash::new([*p; 28]), "coin"), 1)),
    )
}

/// Unlocks 10 ada from a PlutusV3 script, backed by 5 ada of collateral
fn script_spend(key: &SecretKey) -> (Tx, StubSource) {
    script_spend_with(key, always_succeeds())
}

fn script_spend_with(key: &SecretKey, script: PlutusScript) -> (Tx, StubSource) {
    let params = NetworkParams::default();
    let locked = output_id(2, 0);
    let collateral = output_id(3, 0);

    let mut draft = TxDraft::new();
    draft
        .add_input(locked)
        .add_collateral(collateral)
        .add_output(TxOutput::new(
            key_address(key),
            Value::lovelace(10_000_000 - 300_000),
        ))
        .set_fee(300_000)
        .add_script(script.clone())
        .add_redeemer(TxRedeemer::new(
            RedeemerPurpose::Spending(0),
            PlutusData::integer(42),
            DECLARED,
        ));
    draft.update_script_data_hash(&params).unwrap();

    let source = StubSource::default()
        .with(
            locked,
            TxOutput::new(script_address(script.hash()), ada(10)),
        )
        .with(collateral, TxOutput::new(key_address(key), ada(5)));

    (draft.build(), source)
}

async fn recovered(parts: (Tx, StubSource)) -> Tx {
    let (mut tx, source) = parts;
    recover(&mut tx, &source).await.unwrap();
    tx
}

fn run(tx: &Tx) -> Result<(), ValidationError> {
    let evaluator = StubEvaluator::succeeding(ExUnits { mem: 500, steps: 500 });
    validate(tx, &NetworkParams::default(), &evaluator, ValidateOptions::default())
}

fn run_strict(tx: &Tx) -> Result<(), ValidationError> {
    let evaluator = StubEvaluator::succeeding(ExUnits { mem: 500, steps: 500 });
    let options = ValidateOptions {
        strict: true,
        verbose: false,
    };

    validate(tx, &NetworkParams::default(), &evaluator, options)
}

#[tokio::test]
async fn unsigned_payment_becomes_valid_once_recovered_and_signed() {
    init_tracing();

    let key = secret_key(1);
    let (mut tx, source) = payment(&key);

    assert!(validate_signatures(&mut tx).is_err());
    assert!(!tx.is_valid());

    recover(&mut tx, &source).await.unwrap();
    assert_eq!(tx.first_unrecovered(), None);

    assert_eq!(
        validate_signatures(&mut tx),
        Err(ValidationError::MissingSignature(key_hash(&key)))
    );

    sign(&mut tx, &key);

    assert_eq!(run(&tx), Ok(()));
    assert_eq!(validate_signatures(&mut tx), Ok(()));
    assert!(tx.is_valid());

    tx.body.fee += 1;
    assert!(!tx.is_valid());
}

#[tokio::test]
async fn failed_recovery_leaves_the_tx_untouched() {
    let key = secret_key(1);
    let (mut tx, _) = payment(&key);
    let before = tx.clone();

    let err = recover(&mut tx, &StubSource::default()).await.unwrap_err();

    assert!(matches!(err, RecoveryError::NotFound(id) if id == output_id(1, 0)));
    assert_eq!(tx, before);
}

#[tokio::test]
async fn recovery_registers_reference_scripts() {
    let key = secret_key(1);
    let script = Script::from(always_succeeds());
    let reference = output_id(7, 1);

    let (mut tx, source) = payment(&key);
    tx.body.ref_inputs.push(reference.into());

    let source = source.with(
        reference,
        TxOutput::new(key_address(&key), ada(2)).with_script_ref(script.clone()),
    );

    recover(&mut tx, &source).await.unwrap();

    assert_eq!(tx.witnesses.ref_scripts, vec![script]);
}

#[test]
fn unrecovered_inputs_stop_validation() {
    let (tx, _) = payment(&secret_key(1));

    assert_eq!(run(&tx), Err(ValidationError::Unrecovered(output_id(1, 0))));
}

#[tokio::test]
async fn oversized_tx_is_rejected() {
    let tx = recovered(payment(&secret_key(1))).await;

    let params = NetworkParams {
        max_tx_size: 100,
        ..Default::default()
    };

    let result = validate(
        &tx,
        &params,
        &StubEvaluator::succeeding(ExUnits::ZERO),
        ValidateOptions::default(),
    );

    assert!(matches!(
        result,
        Err(ValidationError::TxTooBig { max: 100, .. })
    ));
}

#[tokio::test]
async fn low_fee_is_rejected() {
    let mut tx = recovered(payment(&secret_key(1))).await;
    tx.body.fee = 1_000;
    tx.body.outputs[0].value = Value::lovelace(10_000_000 - 1_000);

    assert!(matches!(
        run(&tx),
        Err(ValidationError::FeeTooSmall { fee: 1_000, .. })
    ));
}

#[tokio::test]
async fn value_must_be_conserved() {
    let mut tx = recovered(payment(&secret_key(1))).await;
    tx.body.outputs[0].value = Value::lovelace(10_000_000 - FEE + 100_000);

    assert_eq!(
        run(&tx),
        Err(ValidationError::ValueNotConserved {
            difference: Value::lovelace(-100_000),
        })
    );
}

#[tokio::test]
async fn outputs_hold_their_minimum() {
    let mut tx = recovered(payment(&secret_key(1))).await;
    let address = tx.body.outputs[0].address.clone();

    tx.body.outputs[0].value = Value::lovelace(10_000_000 - FEE - 1_000);
    tx.body
        .outputs
        .push(TxOutput::new(address, Value::lovelace(1_000)));

    assert!(matches!(
        run(&tx),
        Err(ValidationError::OutputBelowMinimum { index: 1, .. })
    ));
}

#[tokio::test]
async fn inputs_must_be_strictly_ordered() {
    let key = secret_key(1);
    let second = output_id(0, 3);

    let (mut tx, source) = payment(&key);
    tx.body.inputs.push(second.into());
    tx.body.outputs[0].value = Value::lovelace(20_000_000 - FEE);

    let source = source.with(second, TxOutput::new(key_address(&key), ada(10)));
    recover(&mut tx, &source).await.unwrap();

    assert_eq!(
        run(&tx),
        Err(ValidationError::NotStrictlyOrdered("inputs"))
    );

    tx.body.inputs.sort();
    assert_eq!(run(&tx), Ok(()));
}

#[tokio::test]
async fn collateral_needs_scripts() {
    let key = secret_key(1);
    let collateral = output_id(3, 0);

    let (mut tx, source) = payment(&key);
    tx.body.collateral.push(collateral.into());

    let source = source.with(collateral, TxOutput::new(key_address(&key), ada(5)));
    recover(&mut tx, &source).await.unwrap();

    assert_eq!(run(&tx), Err(ValidationError::CollateralNotAllowed));
}

#[tokio::test]
async fn metadata_and_its_hash_agree() {
    let key = secret_key(1);
    let (tx, source) = payment(&key);

    let mut draft = tx.into_draft();
    draft.set_metadata(Some(TxMetadata::new(vec![(674, Metadatum::from("hello"))])));

    let mut tx = recovered((draft.build(), source)).await;
    assert_eq!(run(&tx), Ok(()));

    tx.metadata = Some(TxMetadata::new(vec![(674, Metadatum::from("bye"))]));
    assert_eq!(run(&tx), Err(ValidationError::MetadataHashMismatch));

    tx.metadata = None;
    assert_eq!(run(&tx), Err(ValidationError::MissingMetadata));
}

#[tokio::test]
async fn script_data_hash_needs_redeemers() {
    let mut tx = recovered(payment(&secret_key(1))).await;
    tx.body.script_data_hash = Some(Hash::new([0; 32]));

    assert_eq!(run(&tx), Err(ValidationError::UnexpectedScriptDataHash));

    // datums alone don't allow one, even a correct one
    tx.witnesses.datums.push(PlutusData::integer(42));
    tx.body.script_data_hash = Some(script_data_hash(&tx.witnesses, &LanguageViews::default()));

    assert_eq!(run(&tx), Err(ValidationError::UnexpectedScriptDataHash));

    tx.body.script_data_hash = None;
    assert_eq!(run(&tx), Ok(()));
}

#[tokio::test]
async fn script_spend_runs_the_script() {
    init_tracing();

    let key = secret_key(4);
    let tx = recovered(script_spend(&key)).await;

    let evaluator = StubEvaluator::succeeding(ExUnits { mem: 500, steps: 500 });
    let options = ValidateOptions {
        strict: true,
        verbose: true,
    };

    assert_eq!(
        validate(&tx, &NetworkParams::default(), &evaluator, options),
        Ok(())
    );

    // a V3 script only gets the context: [tx info, redeemer, script info]
    let args = evaluator.last_args.lock().unwrap().clone();
    assert_eq!(args.len(), 1);

    let (alt, fields) = args[0].as_constr().unwrap();
    assert_eq!(alt, 0);
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1], PlutusData::integer(42));
}

#[tokio::test]
async fn tampered_script_data_hash_is_caught() {
    let mut tx = recovered(script_spend(&secret_key(4))).await;
    tx.body.script_data_hash = Some(Hash::new([0; 32]));

    assert!(matches!(
        run(&tx),
        Err(ValidationError::ScriptDataHashMismatch { .. })
    ));

    tx.body.script_data_hash = None;
    assert_eq!(run(&tx), Err(ValidationError::MissingScriptDataHash));
}

#[tokio::test]
async fn script_spend_needs_collateral() {
    let mut tx = recovered(script_spend(&secret_key(4))).await;
    tx.body.collateral.clear();

    assert_eq!(run(&tx), Err(ValidationError::MissingCollateral));
}

#[tokio::test]
async fn every_script_needs_its_redeemer() {
    let mut tx = recovered(script_spend(&secret_key(4))).await;
    tx.witnesses.redeemers = None;

    assert_eq!(
        run(&tx),
        Err(ValidationError::MissingRedeemer(RedeemerPurpose::Spending(0)))
    );
}

#[tokio::test]
async fn scripts_stay_within_their_declared_budget() {
    let tx = recovered(script_spend(&secret_key(4))).await;

    let used = ExUnits {
        mem: 20_000,
        steps: 1,
    };

    assert_eq!(
        validate(
            &tx,
            &NetworkParams::default(),
            &StubEvaluator::succeeding(used),
            ValidateOptions::default(),
        ),
        Err(ValidationError::BudgetExceeded {
            purpose: RedeemerPurpose::Spending(0),
            declared: DECLARED,
            used,
        })
    );
}

#[test_case(false, false => true ; "lenient without diagnostic build warns")]
#[test_case(false, true => false ; "lenient with diagnostic build fails")]
#[test_case(true, false => false ; "strict fails")]
fn total_budget_overrun(strict: bool, diagnostic: bool) -> bool {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let tx = rt.block_on(recovered(script_spend(&secret_key(4))));

    let params = NetworkParams {
        max_tx_ex_units: ExUnits {
            mem: 1_000,
            steps: 1_000,
        },
        ..Default::default()
    };

    let mut evaluator = StubEvaluator::succeeding(ExUnits { mem: 500, steps: 500 });
    evaluator.diagnostic = diagnostic;

    let options = ValidateOptions {
        strict,
        verbose: false,
    };

    match validate(&tx, &params, &evaluator, options) {
        Ok(()) => true,
        Err(ValidationError::TotalBudgetExceeded { .. }) => false,
        Err(other) => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn validate_unsafe_records_the_outcome() {
    let key = secret_key(4);
    let params = NetworkParams::default();

    let mut tx = recovered(script_spend(&key)).await;
    assert_eq!(tx.validation_state(), &ValidationState::NotValidated);

    validate_unsafe(
        &mut tx,
        &params,
        &StubEvaluator::succeeding(ExUnits { mem: 500, steps: 500 }),
        ValidateOptions::default(),
    );
    assert_eq!(tx.validation_state(), &ValidationState::Valid);

    validate_unsafe(
        &mut tx,
        &params,
        &StubEvaluator::failing("validation failed", &["expected 42", "got 41"]),
        ValidateOptions::default(),
    );
    assert_eq!(
        tx.validation_state(),
        &ValidationState::ScriptFailure {
            message: "validation failed".into(),
            trace: vec!["expected 42".into(), "got 41".into()],
        }
    );

    tx.body.fee = 1;
    validate_unsafe(
        &mut tx,
        &params,
        &StubEvaluator::succeeding(ExUnits::ZERO),
        ValidateOptions::default(),
    );
    assert!(matches!(
        tx.validation_state(),
        ValidationState::Invalid(message) if message.contains("minimum fee")
    ));
}

#[tokio::test]
async fn native_scripts_need_their_signers() {
    let key = secret_key(5);
    let script = NativeScript::Sig(key_hash(&key));
    let locked = output_id(6, 0);

    let mut draft = TxDraft::new();
    draft
        .add_input(locked)
        .add_output(TxOutput::new(key_address(&key), Value::lovelace(10_000_000 - FEE)))
        .set_fee(FEE)
        .add_script(script.clone());

    let source = StubSource::default().with(
        locked,
        TxOutput::new(script_address(script.hash()), ada(10)),
    );

    let mut tx = recovered((draft.build(), source)).await;

    assert_eq!(run(&tx), Ok(()));
    assert_eq!(
        validate_signatures(&mut tx),
        Err(ValidationError::NativeScriptFailed(script.hash()))
    );

    sign(&mut tx, &key);
    assert_eq!(validate_signatures(&mut tx), Ok(()));
    assert!(tx.is_valid());
}

#[tokio::test]
async fn signatures_must_cover_the_body() {
    let key = secret_key(1);
    let mut tx = recovered(payment(&key)).await;

    tx.witnesses
        .add_signature(VKeyWitness::create(&key, &TxId::new([0; 32])));

    assert_eq!(
        validate_signatures(&mut tx),
        Err(ValidationError::InvalidSignature(key_hash(&key)))
    );
    assert!(!tx.is_valid());
}

#[tokio::test]
async fn collateral_must_cover_the_fee() {
    let key = secret_key(4);

    // 150% of the 0.3 ada fee
    let (tx, source) = script_spend(&key);
    let source = source.with(
        output_id(3, 0),
        TxOutput::new(key_address(&key), Value::lovelace(400_000)),
    );
    let tx = recovered((tx, source)).await;

    assert!(matches!(
        run(&tx),
        Err(ValidationError::InsufficientCollateral { provided, required: 450_000 })
            if provided == 400_000.into()
    ));

    // what comes back through the return output doesn't count
    let mut tx = recovered(script_spend(&key)).await;
    tx.body.collateral_return = Some(TxOutput::new(
        key_address(&key),
        Value::lovelace(4_700_000),
    ));

    assert!(matches!(
        run(&tx),
        Err(ValidationError::InsufficientCollateral { provided, required: 450_000 })
            if provided == 300_000.into()
    ));
}

#[tokio::test]
async fn collateral_is_lovelace_only() {
    let key = secret_key(4);

    let (tx, source) = script_spend(&key);
    let source = source.with(
        output_id(3, 0),
        TxOutput::new(key_address(&key), Value::new(5_000_000, tokens(&[1]))),
    );
    let tx = recovered((tx, source)).await;

    assert_eq!(run(&tx), Err(ValidationError::NonLovelaceCollateral));
}

#[tokio::test]
async fn collateral_inputs_are_capped() {
    let tx = recovered(script_spend(&secret_key(4))).await;

    let params = NetworkParams {
        max_collateral_inputs: 0,
        ..Default::default()
    };

    assert_eq!(
        validate(
            &tx,
            &params,
            &StubEvaluator::succeeding(ExUnits { mem: 500, steps: 500 }),
            ValidateOptions::default(),
        ),
        Err(ValidationError::TooManyCollateralInputs { count: 1, max: 0 })
    );
}

#[tokio::test]
async fn declared_total_collateral_must_match() {
    let mut tx = recovered(script_spend(&secret_key(4))).await;
    tx.body.total_collateral = Some(1_000_000);

    assert!(matches!(
        run(&tx),
        Err(ValidationError::IncorrectTotalCollateral { declared: 1_000_000, actual })
            if actual == 5_000_000.into()
    ));

    tx.body.total_collateral = Some(5_000_000);
    assert_eq!(run(&tx), Ok(()));
}

#[tokio::test]
async fn scripts_are_witnessed_once() {
    let mut tx = recovered(script_spend(&secret_key(4))).await;
    tx.witnesses.add_script(always_succeeds());

    assert_eq!(
        run(&tx),
        Err(ValidationError::DuplicateScript(always_succeeds().hash()))
    );
}

#[tokio::test]
async fn strict_mode_rejects_unused_scripts() {
    let mut tx = recovered(script_spend(&secret_key(4))).await;

    let unused = NativeScript::After(1);
    tx.witnesses.add_script(unused.clone());

    assert_eq!(run(&tx), Ok(()));
    assert_eq!(
        run_strict(&tx),
        Err(ValidationError::UnusedScript(unused.hash()))
    );
}

#[tokio::test]
async fn redeemers_point_at_scripts() {
    let mut tx = recovered(script_spend(&secret_key(4))).await;

    let stray = RedeemerPurpose::Spending(5);
    tx.witnesses
        .redeemers
        .as_mut()
        .unwrap()
        .push(TxRedeemer::new(stray, PlutusData::integer(0), DECLARED));

    assert_eq!(run(&tx), Err(ValidationError::ExtraRedeemer(stray)));

    for purpose in [stray, RedeemerPurpose::Minting(0)] {
        assert!(matches!(
            ScriptPurpose::resolve(&tx, &purpose),
            Err(ValidationError::RedeemerOutOfRange(x)) if x == purpose
        ));
    }
}

#[tokio::test]
async fn v2_spends_need_a_datum() {
    let script = PlutusScript::new(PlutusVersion::V2, always_succeeds().bytes);
    let tx = recovered(script_spend_with(&secret_key(4), script)).await;

    assert_eq!(run(&tx), Err(ValidationError::MissingDatum(output_id(2, 0))));
}

#[tokio::test]
async fn strict_mode_wants_sorted_output_assets() {
    let key = secret_key(1);
    let spent = output_id(1, 0);

    let mut draft = TxDraft::new();
    draft
        .add_input(spent)
        .add_output(TxOutput::new(
            key_address(&secret_key(99)),
            Value::new(10_000_000 - FEE, tokens(&[2, 1])),
        ))
        .set_fee(FEE);

    let source = StubSource::default().with(
        spent,
        TxOutput::new(key_address(&key), Value::new(10_000_000, tokens(&[1, 2]))),
    );

    let mut tx = recovered((draft.build(), source)).await;

    assert_eq!(run(&tx), Ok(()));
    assert_eq!(
        run_strict(&tx),
        Err(ValidationError::UnsortedOutputAssets(0))
    );

    tx.body.outputs[0].value = Value::new(10_000_000 - FEE, tokens(&[1, 2]));
    assert_eq!(run_strict(&tx), Ok(()));
}

#[tokio::test]
async fn minting_policies_must_be_strictly_ordered() {
    let mut tx = recovered(payment(&secret_key(1))).await;

    tx.body.minted = tokens(&[2, 1]);
    assert_eq!(
        check_ordering(&tx),
        Err(ValidationError::NotStrictlyOrdered("minting policies"))
    );

    // {p1: {"a": 1}, p1: {"b": 1}}, the same policy twice is a tie
    let mut bytes = vec![0xa2];
    for name in [b'a', b'b'] {
        bytes.extend([0x58, 0x1c]);
        bytes.extend([1; 28]);
        bytes.extend([0xa1, 0x41, name, 0x01]);
    }

    tx.body.minted = minicbor::decode(&bytes).unwrap();
    assert_eq!(
        check_ordering(&tx),
        Err(ValidationError::NotStrictlyOrdered("minting policies"))
    );

    tx.body.minted = tokens(&[1, 2]);
    assert_eq!(check_ordering(&tx), Ok(()));
}

#[tokio::test]
async fn withdrawals_must_be_strictly_ordered() {
    let mut tx = recovered(payment(&secret_key(1))).await;

    let account = |b| {
        StakingAddress::from_credential(
            Network::Testnet,
            StakingCredential::PubKey(PubKeyHash::new([b; 28])),
        )
    };

    tx.body.withdrawals = KeyValuePairs::Def(vec![(account(2), 0), (account(1), 0)]);
    assert_eq!(
        check_ordering(&tx),
        Err(ValidationError::NotStrictlyOrdered("withdrawals"))
    );

    tx.body.withdrawals = KeyValuePairs::Def(vec![(account(1), 0), (account(1), 0)]);
    assert_eq!(
        check_ordering(&tx),
        Err(ValidationError::NotStrictlyOrdered("withdrawals"))
    );

    tx.body.withdrawals = KeyValuePairs::Def(vec![(account(1), 0), (account(2), 0)]);
    assert_eq!(check_ordering(&tx), Ok(()));
}
