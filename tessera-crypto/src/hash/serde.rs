use std::fmt;
use std::str::FromStr;

use serde::de::{Error, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::Hash;

impl<const BYTES: usize> Serialize for Hash<BYTES> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct HashVisitor<const BYTES: usize> {}

impl<'de, const BYTES: usize> Visitor<'de> for HashVisitor<BYTES> {
    type Value = Hash<BYTES>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a hex string representing {BYTES} bytes")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        match Hash::<BYTES>::from_str(s) {
            Ok(x) => Ok(x),
            Err(_) => Err(Error::invalid_value(Unexpected::Str(s), &self)),
        }
    }
}

impl<'de, const BYTES: usize> Deserialize<'de> for Hash<BYTES> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(HashVisitor::<BYTES> {})
    }
}

#[cfg(test)]
mod tests {
    use serde_test::{assert_de_tokens_error, assert_tokens, Token};

    use super::*;
    use crate::hash::Hasher;

    crate::hash_kind!(PolicyDigest, 28);

    /// A minted asset as an indexer would store it
    #[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
    struct MintRecord {
        policy: PolicyDigest,
        tx: Hash<32>,
    }

    #[test]
    fn digests_serialize_as_hex() {
        let record = MintRecord {
            policy: Hasher::<224>::hash(b"my key").into(),
            tx: Hasher::<256>::hash(b"tx body"),
        };

        let tx = record.tx.to_string();

        assert_tokens(
            &record,
            &[
                Token::Struct {
                    name: "MintRecord",
                    len: 2,
                },
                Token::Str("policy"),
                Token::Str("276fd18711931e2c0e21430192dbeac0e458093cd9d1fcd7210f64b3"),
                Token::Str("tx"),
                Token::Str(Box::leak(tx.into_boxed_str())),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn kinds_reject_digests_of_another_size() {
        let tx_id = Hasher::<256>::hash(b"tx body").to_string();

        assert_de_tokens_error::<MintRecord>(
            &[
                Token::Map { len: Some(2) },
                Token::Str("policy"),
                Token::Str(Box::leak(tx_id.clone().into_boxed_str())),
            ],
            &format!(
                "invalid value: string \"{tx_id}\", expected a hex string representing 28 bytes"
            ),
        );
    }
}
