#![allow(dead_code)]

use std::{
    collections::HashMap,
    future::{ready, Future},
};
use tessera_addresses::{Address, Network, PubKeyHash, ShelleyAddress, SpendingCredential};
use tessera_crypto::key::ed25519::SecretKey;
use tessera_primitives::{
    ExUnits, PlutusData, PlutusScript, ScriptHash, TxId, TxOutput, TxOutputId, Value,
};
use tessera_validate::{EvalFailure, Evaluation, RecoveryError, ScriptEvaluator, UtxoSource};

pub fn secret_key(seed: u8) -> SecretKey {
    SecretKey::from([seed; SecretKey::SIZE])
}

pub fn key_hash(key: &SecretKey) -> PubKeyHash {
    PubKeyHash::from(key.public_key().hash())
}

pub fn key_address(key: &SecretKey) -> Address {
    Address::Shelley(ShelleyAddress::new(
        Network::Testnet,
        SpendingCredential::PubKey(key_hash(key)),
        None,
    ))
}

pub fn script_address(hash: ScriptHash) -> Address {
    Address::Shelley(ShelleyAddress::new(
        Network::Testnet,
        SpendingCredential::Validator(hash.into()),
        None,
    ))
}

pub fn output_id(seed: u8, index: u64) -> TxOutputId {
    TxOutputId::new(TxId::new([seed; 32]), index)
}

pub fn ada(amount: u64) -> Value {
    Value::lovelace(amount * 1_000_000)
}

/// A UTxO set held in memory
#[derive(Default)]
pub struct StubSource(pub HashMap<TxOutputId, TxOutput>);

impl StubSource {
    pub fn with(mut self, id: TxOutputId, output: TxOutput) -> Self {
        self.0.insert(id, output);
        self
    }
}

impl UtxoSource for StubSource {
    fn get_utxo(
        &self,
        id: &TxOutputId,
    ) -> impl Future<Output = Result<TxOutput, RecoveryError>> {
        ready(self.0.get(id).cloned().ok_or(RecoveryError::NotFound(*id)))
    }
}

/// Answers every script with the same cost and outcome, and keeps the
/// arguments of the last call
pub struct StubEvaluator {
    pub cost: ExUnits,
    pub failure: Option<EvalFailure>,
    pub diagnostic: bool,
    pub last_args: std::sync::Mutex<Vec<PlutusData>>,
}

impl StubEvaluator {
    pub fn succeeding(cost: ExUnits) -> Self {
        Self {
            cost,
            failure: None,
            diagnostic: false,
            last_args: Default::default(),
        }
    }

    pub fn failing(message: &str, trace: &[&str]) -> Self {
        Self {
            cost: ExUnits { mem: 1, steps: 1 },
            failure: Some(EvalFailure {
                message: message.to_string(),
                trace: trace.iter().map(|x| x.to_string()).collect(),
            }),
            diagnostic: false,
            last_args: Default::default(),
        }
    }
}

impl ScriptEvaluator for StubEvaluator {
    fn evaluate(&self, _script: &PlutusScript, args: &[PlutusData]) -> Evaluation {
        if let Ok(mut last) = self.last_args.lock() {
            *last = args.to_vec();
        }

        Evaluation {
            cost: self.cost,
            result: match &self.failure {
                Some(failure) => Err(failure.clone()),
                None => Ok(PlutusData::constr(0, vec![])),
            },
        }
    }

    fn has_diagnostic_build(&self, _script: &ScriptHash) -> bool {
        self.diagnostic
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
