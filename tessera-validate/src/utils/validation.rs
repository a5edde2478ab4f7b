//! Errors raised while validating a transaction

use num_bigint::BigInt;
use tessera_addresses::PubKeyHash;
use tessera_codec::plutus::PlutusDataError;
use tessera_crypto::hash::Hash;
use tessera_primitives::{
    Coin, ExUnits, PlutusVersion, RedeemerPurpose, ScriptHash, TxOutputId, Value,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("input {0} has not been recovered")]
    Unrecovered(TxOutputId),

    #[error("transaction size {size} exceeds the maximum of {max} bytes")]
    TxTooBig { size: u64, max: u64 },

    #[error("fee {fee} is below the minimum fee of {min}")]
    FeeTooSmall { fee: Coin, min: Coin },

    #[error("value not conserved, consumed minus produced is {difference:?}")]
    ValueNotConserved { difference: Value },

    #[error("collateral is only allowed on transactions that run scripts")]
    CollateralNotAllowed,

    #[error("transaction runs scripts but has no collateral")]
    MissingCollateral,

    #[error("{count} collateral inputs, at most {max} allowed")]
    TooManyCollateralInputs { count: usize, max: u64 },

    #[error("collateral holds assets other than lovelace")]
    NonLovelaceCollateral,

    #[error("collateral of {provided} lovelace, at least {required} required")]
    InsufficientCollateral { provided: BigInt, required: Coin },

    #[error("declared total collateral {declared} differs from the actual {actual}")]
    IncorrectTotalCollateral { declared: Coin, actual: BigInt },

    #[error("missing script {0}")]
    MissingScript(ScriptHash),

    #[error("script {0} is witnessed more than once")]
    DuplicateScript(ScriptHash),

    #[error("script {0} is witnessed but never used")]
    UnusedScript(ScriptHash),

    #[error("no redeemer for {0:?}")]
    MissingRedeemer(RedeemerPurpose),

    #[error("redeemer {0:?} does not point at a script")]
    ExtraRedeemer(RedeemerPurpose),

    #[error("redeemer index of {0:?} is out of range")]
    RedeemerOutOfRange(RedeemerPurpose),

    #[error("no datum for the script locked output {0}")]
    MissingDatum(TxOutputId),

    #[error("evaluating {0} scripts is not supported")]
    UnsupportedScriptVersion(PlutusVersion),

    #[error("no cost model for {0}")]
    MissingCostModel(PlutusVersion),

    #[error("script failed: {message}")]
    ScriptFailure { message: String, trace: Vec<String> },

    #[error("{purpose:?} used {used:?}, more than the {declared:?} its redeemer declares")]
    BudgetExceeded {
        purpose: RedeemerPurpose,
        declared: ExUnits,
        used: ExUnits,
    },

    #[error("total execution budget {total:?} exceeds the maximum of {max:?}")]
    TotalBudgetExceeded { total: ExUnits, max: ExUnits },

    #[error("output {index} holds {lovelace} lovelace, below its minimum of {min}")]
    OutputBelowMinimum {
        index: usize,
        lovelace: BigInt,
        min: Coin,
    },

    #[error("assets of output {0} are not in canonical order")]
    UnsortedOutputAssets(usize),

    #[error("{0} are not in strictly increasing order")]
    NotStrictlyOrdered(&'static str),

    #[error("metadata hash does not match the metadata")]
    MetadataHashMismatch,

    #[error("metadata present without a metadata hash")]
    MissingMetadataHash,

    #[error("metadata hash present without metadata")]
    MissingMetadata,

    #[error("script data hash {found} differs from the computed {expected}")]
    ScriptDataHashMismatch {
        expected: Hash<32>,
        found: Hash<32>,
    },

    #[error("redeemers present without a script data hash")]
    MissingScriptDataHash,

    #[error("script data hash present without redeemers")]
    UnexpectedScriptDataHash,

    #[error("no signature from required signer {0}")]
    MissingSignature(PubKeyHash),

    #[error("invalid signature from {0}")]
    InvalidSignature(PubKeyHash),

    #[error("native script {0} is not satisfied")]
    NativeScriptFailed(ScriptHash),

    #[error("{0}")]
    Ledger(String),
}

impl From<tessera_primitives::Error> for ValidationError {
    fn from(error: tessera_primitives::Error) -> Self {
        match error {
            tessera_primitives::Error::Unrecovered(id) => ValidationError::Unrecovered(id),
            tessera_primitives::Error::MissingCostModel(v) => ValidationError::MissingCostModel(v),
            tessera_primitives::Error::InvalidSignature(x) => ValidationError::InvalidSignature(x),
            tessera_primitives::Error::MissingSignature(x) => ValidationError::MissingSignature(x),
            tessera_primitives::Error::NativeScriptFailed(x) => {
                ValidationError::NativeScriptFailed(x)
            }
            other => ValidationError::Ledger(other.to_string()),
        }
    }
}

impl From<PlutusDataError> for ValidationError {
    fn from(error: PlutusDataError) -> Self {
        ValidationError::Ledger(error.to_string())
    }
}

impl From<tessera_addresses::Error> for ValidationError {
    fn from(error: tessera_addresses::Error) -> Self {
        ValidationError::Ledger(error.to_string())
    }
}

pub type ValidationResult = Result<(), ValidationError>;
