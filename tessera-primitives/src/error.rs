use crate::{hashes::ScriptHash, output::TxOutputId, script::PlutusVersion};
use tessera_addresses::PubKeyHash;
use tessera_codec::{minicbor, plutus::PlutusDataError};
use tessera_crypto::hash::HashSizeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("at-least script requires {n} of {len} scripts, n must be between 1 and {len}")]
    InvalidAtLeast { n: u64, len: usize },

    #[error("input {0} has not been recovered")]
    Unrecovered(TxOutputId),

    #[error("non-positive quantity {quantity} for {asset}")]
    NonPositiveQuantity { asset: String, quantity: String },

    #[error("invalid output id {0:?}, expected <txid>#<index>")]
    InvalidOutputId(String),

    #[error("invalid minting policy hash length {0}, expected 0 or 28")]
    InvalidPolicyLength(usize),

    #[error("output index {0} out of range")]
    NoSuchOutput(usize),

    #[error("amount {0} does not fit a coin")]
    CoinOutOfRange(String),

    #[error("no cost model for {0}")]
    MissingCostModel(PlutusVersion),

    #[error("invalid signature from {0}")]
    InvalidSignature(PubKeyHash),

    #[error("no signature from required signer {0}")]
    MissingSignature(PubKeyHash),

    #[error("native script {0} is not satisfied")]
    NativeScriptFailed(ScriptHash),

    #[error(transparent)]
    HashSize(#[from] HashSizeError),

    #[error(transparent)]
    Address(#[from] tessera_addresses::Error),

    #[error(transparent)]
    PlutusData(#[from] PlutusDataError),

    #[error("cbor decoding failed: {0}")]
    Decode(#[from] minicbor::decode::Error),

    #[error("invalid network params: {0}")]
    Params(#[from] serde_json::Error),
}
