/// Declares a newtype over a [`Hash`](crate::hash::Hash) of a fixed size so
/// hashes of different things (keys, scripts, datums, transactions) can't be
/// mixed up.
///
/// The newtype encodes to cbor as a plain bytestring, to json as a hex
/// string and to on-chain data as a bytearray.
///
/// ```
/// tessera_crypto::hash_kind!(
///     /// Hash of a verification key
///     KeyHash, 28
/// );
///
/// let hash: KeyHash = "276fd18711931e2c0e21430192dbeac0e458093cd9d1fcd7210f64b3"
///     .parse()
///     .unwrap();
///
/// assert_eq!(hash.as_ref().len(), 28);
/// ```
#[macro_export]
macro_rules! hash_kind {
    ($(#[$meta:meta])* $name:ident, $size:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub $crate::hash::Hash<$size>);

        impl $name {
            pub const SIZE: usize = $size;

            pub const fn new(bytes: [u8; $size]) -> Self {
                Self($crate::hash::Hash::new(bytes))
            }

            pub fn as_hash(&self) -> &$crate::hash::Hash<$size> {
                &self.0
            }
        }

        impl From<$crate::hash::Hash<$size>> for $name {
            fn from(hash: $crate::hash::Hash<$size>) -> Self {
                Self(hash)
            }
        }

        impl From<$name> for $crate::hash::Hash<$size> {
            fn from(kind: $name) -> Self {
                kind.0
            }
        }

        impl<'a> TryFrom<&'a [u8]> for $name {
            type Error = $crate::hash::HashSizeError;

            fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
                $crate::hash::Hash::<$size>::try_from(value).map(Self)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.0.as_ref()
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::hash::Hash<$size>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&self.0.to_string())
                    .finish()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = <$crate::hash::Hash<$size> as std::str::FromStr>::Err;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl<C> $crate::__private::minicbor::Encode<C> for $name {
            fn encode<W: $crate::__private::minicbor::encode::Write>(
                &self,
                e: &mut $crate::__private::minicbor::Encoder<W>,
                ctx: &mut C,
            ) -> Result<(), $crate::__private::minicbor::encode::Error<W::Error>> {
                e.encode_with(&self.0, ctx)?;
                Ok(())
            }
        }

        impl<'b, C> $crate::__private::minicbor::Decode<'b, C> for $name {
            fn decode(
                d: &mut $crate::__private::minicbor::Decoder<'b>,
                ctx: &mut C,
            ) -> Result<Self, $crate::__private::minicbor::decode::Error> {
                d.decode_with(ctx).map(Self)
            }
        }

        impl $crate::__private::plutus::ToPlutusData for $name {
            fn to_plutus_data(&self) -> $crate::__private::plutus::PlutusData {
                $crate::__private::plutus::PlutusData::bytes(self.0.to_vec())
            }
        }

        impl $crate::__private::plutus::FromPlutusData for $name {
            fn from_plutus_data(
                data: &$crate::__private::plutus::PlutusData,
            ) -> Result<Self, $crate::__private::plutus::PlutusDataError> {
                let bytes = data.as_bytes()?;

                Self::try_from(bytes).map_err(|err| {
                    $crate::__private::plutus::PlutusDataError::Invalid(format!(
                        "{}: {err}",
                        stringify!($name)
                    ))
                })
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                $crate::__private::serde::Serialize::serialize(&self.0, serializer)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                <$crate::hash::Hash<$size> as $crate::__private::serde::Deserialize>::deserialize(
                    deserializer,
                )
                .map(Self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::hash::{Hash, HashSizeError, Hasher};

    crate::hash_kind!(
        /// hash used by the tests below
        ScriptDigest,
        28
    );

    #[test]
    fn kind_wraps_hash() {
        let inner = Hasher::<224>::hash(b"always succeeds");
        let kind = ScriptDigest::from(inner);

        assert_eq!(kind.to_string(), inner.to_string());
        assert_eq!(Hash::<28>::from(kind), inner);
        assert_eq!(format!("{kind:?}"), format!("ScriptDigest(\"{inner}\")"));
    }

    #[test]
    fn kind_rejects_bad_size() {
        assert_eq!(
            ScriptDigest::try_from(&[0u8; 32][..]),
            Err(HashSizeError {
                expected: 28,
                found: 32
            })
        );
    }

    #[test]
    fn kind_serializes_like_hash() {
        let kind = ScriptDigest::new([7; 28]);
        let json = serde_json::to_string(&kind).unwrap();

        assert_eq!(json, format!("\"{}\"", hex::encode([7u8; 28])));

        let back: ScriptDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);

        let cbor = tessera_codec::minicbor::to_vec(kind).unwrap();
        let back: ScriptDigest = tessera_codec::minicbor::decode(&cbor).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn kind_is_a_bytearray_on_chain() {
        use tessera_codec::plutus::{FromPlutusData, PlutusData, ToPlutusData};

        let kind = ScriptDigest::new([1; 28]);
        let data = kind.to_plutus_data();

        assert_eq!(data, PlutusData::bytes(vec![1; 28]));
        assert_eq!(ScriptDigest::from_plutus_data(&data), Ok(kind));
        assert!(ScriptDigest::from_plutus_data(&PlutusData::bytes(vec![1; 3])).is_err());
    }
}
