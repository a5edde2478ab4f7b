//! Auxiliary data: transaction metadata and the scripts that may travel with it

use crate::native_script::NativeScript;
use serde::{Deserialize, Serialize};
use tessera_codec::{
    codec_by_datatype,
    minicbor::{self, Decode, Encode},
    utils::{Bytes, Int, KeyValuePairs, MaybeIndefArray},
};
use tessera_crypto::hash::{Hash, Hasher};

pub type MetadatumLabel = u64;

pub type Metadata = KeyValuePairs<MetadatumLabel, Metadatum>;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum Metadatum {
    Int(Int),
    Bytes(Bytes),
    Text(String),
    Array(MaybeIndefArray<Metadatum>),
    Map(KeyValuePairs<Metadatum, Metadatum>),
}

codec_by_datatype! {
    Metadatum,
    U8 | U16 | U32 | U64 | I8 | I16 | I32 | I64 | Int => Int,
    Bytes => Bytes,
    String => Text,
    Array | ArrayIndef => Array,
    Map | MapIndef => Map
}

impl From<i64> for Metadatum {
    fn from(value: i64) -> Self {
        Metadatum::Int(value.into())
    }
}

impl From<&str> for Metadatum {
    fn from(value: &str) -> Self {
        Metadatum::Text(value.to_string())
    }
}

impl From<String> for Metadatum {
    fn from(value: String) -> Self {
        Metadatum::Text(value)
    }
}

impl From<Vec<u8>> for Metadatum {
    fn from(value: Vec<u8>) -> Self {
        Metadatum::Bytes(value.into())
    }
}

impl From<Vec<Metadatum>> for Metadatum {
    fn from(value: Vec<Metadatum>) -> Self {
        Metadatum::Array(MaybeIndefArray::Def(value))
    }
}

#[derive(Encode, Decode, Debug, PartialEq, Clone)]
pub struct ShelleyMaAuxiliaryData {
    #[n(0)]
    pub metadata: Metadata,

    #[n(1)]
    pub native_scripts: Vec<NativeScript>,
}

#[derive(Encode, Decode, Debug, PartialEq, Clone, Default)]
#[cbor(map, tag(259))]
pub struct PostAlonzoAuxiliaryData {
    #[n(0)]
    pub metadata: Option<Metadata>,

    #[n(1)]
    pub native_scripts: Option<Vec<NativeScript>>,

    #[n(2)]
    pub plutus_v1_scripts: Option<Vec<Bytes>>,

    #[n(3)]
    pub plutus_v2_scripts: Option<Vec<Bytes>>,

    #[n(4)]
    pub plutus_v3_scripts: Option<Vec<Bytes>>,
}

/// The auxiliary data of a transaction, in any of its historical shapes
#[derive(Debug, PartialEq, Clone)]
pub enum TxMetadata {
    Shelley(Metadata),
    ShelleyMa(ShelleyMaAuxiliaryData),
    PostAlonzo(PostAlonzoAuxiliaryData),
}

codec_by_datatype! {
    TxMetadata,
    Map | MapIndef => Shelley,
    Array | ArrayIndef => ShelleyMa,
    Tag => PostAlonzo
}

impl TxMetadata {
    /// Plain metadata, in the original Shelley shape
    pub fn new(entries: Vec<(MetadatumLabel, Metadatum)>) -> Self {
        TxMetadata::Shelley(KeyValuePairs::Def(entries))
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            TxMetadata::Shelley(x) => Some(x),
            TxMetadata::ShelleyMa(x) => Some(&x.metadata),
            TxMetadata::PostAlonzo(x) => x.metadata.as_ref(),
        }
    }

    pub fn get(&self, label: MetadatumLabel) -> Option<&Metadatum> {
        self.metadata()?
            .iter()
            .find(|(key, _)| *key == label)
            .map(|(_, value)| value)
    }

    pub fn native_scripts(&self) -> &[NativeScript] {
        match self {
            TxMetadata::Shelley(_) => &[],
            TxMetadata::ShelleyMa(x) => &x.native_scripts,
            TxMetadata::PostAlonzo(x) => x.native_scripts.as_deref().unwrap_or_default(),
        }
    }

    /// The hash committed to by the body, over the exact encoding
    pub fn hash(&self) -> Hash<32> {
        Hasher::<256>::hash_cbor(self)
    }
}
