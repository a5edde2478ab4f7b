use tessera_codec::{
    minicbor,
    plutus::{FromPlutusData, PlutusData, PlutusDataError, ToPlutusData},
};
use std::{fmt, ops::Deref, str::FromStr};
use thiserror::Error;

/// data that is a cryptographic [`struct@Hash`] of `BYTES` long.
///
/// Transaction ids and datum hashes are 32 bytes long. Key and script
/// hashes, as used in credentials, are 28 bytes long.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash<const BYTES: usize>([u8; BYTES]);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid hash size, expected {expected} bytes, found {found}")]
pub struct HashSizeError {
    pub expected: usize,
    pub found: usize,
}

impl<const BYTES: usize> Hash<BYTES> {
    #[inline]
    pub const fn new(bytes: [u8; BYTES]) -> Self {
        Self(bytes)
    }
}

impl<const BYTES: usize> From<[u8; BYTES]> for Hash<BYTES> {
    #[inline]
    fn from(bytes: [u8; BYTES]) -> Self {
        Self::new(bytes)
    }
}

impl<'a, const BYTES: usize> TryFrom<&'a [u8]> for Hash<BYTES> {
    type Error = HashSizeError;

    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; BYTES] = value.try_into().map_err(|_| HashSizeError {
            expected: BYTES,
            found: value.len(),
        })?;

        Ok(Self::new(bytes))
    }
}

impl<const BYTES: usize> AsRef<[u8]> for Hash<BYTES> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const BYTES: usize> Deref for Hash<BYTES> {
    type Target = [u8; BYTES];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const BYTES: usize> PartialEq<[u8]> for Hash<BYTES> {
    fn eq(&self, other: &[u8]) -> bool {
        self.0.eq(other)
    }
}

impl<const BYTES: usize> fmt::Debug for Hash<BYTES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&format!("Hash<{size}>", size = BYTES))
            .field(&hex::encode(self))
            .finish()
    }
}

impl<const BYTES: usize> fmt::Display for Hash<BYTES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self))
    }
}

impl<const BYTES: usize> FromStr for Hash<BYTES> {
    type Err = hex::FromHexError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; BYTES];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self::new(bytes))
    }
}

impl<C, const BYTES: usize> minicbor::Encode<C> for Hash<BYTES> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?.ok()
    }
}

impl<'a, C, const BYTES: usize> minicbor::Decode<'a, C> for Hash<BYTES> {
    fn decode(d: &mut minicbor::Decoder<'a>, _ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let bytes = d.bytes()?;

        Self::try_from(bytes).map_err(|err| {
            minicbor::decode::Error::message(format!("{err} at offset {position}"))
        })
    }
}

// on chain a hash is its raw bytes
impl<const BYTES: usize> ToPlutusData for Hash<BYTES> {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::bytes(self.0.to_vec())
    }
}

impl<const BYTES: usize> FromPlutusData for Hash<BYTES> {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        Self::try_from(data.as_bytes()?).map_err(|err| PlutusDataError::Invalid(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str() {
        let _digest: Hash<28> = "276fd18711931e2c0e21430192dbeac0e458093cd9d1fcd7210f64b3"
            .parse()
            .unwrap();

        let _digest: Hash<32> = "0d8d00cdd4657ac84d82f0a56067634a7adfdf43da41cb534bcaa45060973d21"
            .parse()
            .unwrap();
    }

    #[test]
    #[should_panic]
    fn from_str_fail_1() {
        let _digest: Hash<28> = "27".parse().unwrap();
    }

    #[test]
    fn try_from_slice_checks_size() {
        let short = [0u8; 27];

        assert_eq!(
            Hash::<28>::try_from(&short[..]),
            Err(HashSizeError {
                expected: 28,
                found: 27
            })
        );
        assert!(Hash::<28>::try_from(&[1u8; 28][..]).is_ok());
    }

    #[test]
    fn cbor_rejects_wrong_size() {
        // 29 bytes where 28 are expected
        let mut cbor = vec![0x58, 0x1d];
        cbor.extend([0u8; 29]);

        let err = minicbor::decode::<Hash<28>>(&cbor).unwrap_err();
        assert!(err.to_string().contains("expected 28 bytes"));
    }
}
