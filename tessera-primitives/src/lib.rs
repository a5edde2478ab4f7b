//! Transaction data model and ledger cbor codec
//!
//! Every entity here round-trips through the ledger wire format byte for byte
//! (transactions are hashed over their exact bytes) and, where scripts can
//! observe it, converts into the on-chain data tree.

mod error;

pub mod assets;
pub mod body;
pub mod certificate;
pub mod draft;
pub mod fees;
pub mod hashes;
pub mod input;
pub mod metadata;
pub mod native_script;
pub mod output;
pub mod params;
pub mod redeemer;
pub mod script;
pub mod script_data;
pub mod tx;
pub mod value;
pub mod witnesses;

pub use error::Error;

pub use assets::{AssetClass, AssetName, AssetOrder, Assets};
pub use body::{TxBody, TxBodyEncoding};
pub use certificate::{DCert, PoolKeyHash, PoolMetadata, PoolParameters, Relay, VrfKeyHash};
pub use draft::TxDraft;
pub use hashes::{DatumHash, MintingPolicyHash, ScriptHash, TxId};
pub use input::TxInput;
pub use metadata::{Metadata, Metadatum, MetadatumLabel, TxMetadata};
pub use native_script::{NativeScript, NativeScriptContext};
pub use output::{TxOutput, TxOutputDatum, TxOutputEncoding, TxOutputId};
pub use params::{CostModels, NetworkParams, RationalNumber, SlotConfig};
pub use redeemer::{ExUnits, RedeemerPurpose, Redeemers, RedeemersFormat, TxRedeemer};
pub use script::{PlutusScript, PlutusVersion, Script, ScriptRef};
pub use script_data::LanguageViews;
pub use tx::{Tx, ValidationState};
pub use value::Value;
pub use witnesses::{TxWitnesses, VKeyWitness};

pub use tessera_codec::plutus::{FromPlutusData, PlutusData, PlutusDataError, ToPlutusData};
pub use tessera_codec::utils::{Bytes, Int, KeyValuePairs, ListEncoding, Nullable, Set};
pub use tessera_crypto::hash::Hash;

/// Amount of lovelace in a fee, deposit or withdrawal
pub type Coin = u64;

pub type Epoch = u64;

pub type Slot = u64;
