//! The UPLC data tree
//!
//! On-chain scripts receive their arguments as values of a small tagged tree:
//! constructors with fields, maps, lists, integers and bytestrings. This
//! module holds that tree, its cbor codec (which keeps the definite /
//! indefinite framing it was decoded with) and the traits used by ledger
//! entities to convert themselves to and from it.

use crate::utils::{unexpected_type, KeyValuePairs, MaybeIndefArray};
use minicbor::{
    data::{IanaTag, Tag, Type},
    Encode,
};
use num_bigint::Sign;
use num_traits::{One, Signed, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum PlutusData {
    Constr(Constr<PlutusData>),
    Map(KeyValuePairs<PlutusData, PlutusData>),
    BigInt(BigInt),
    BoundedBytes(BoundedBytes),
    Array(MaybeIndefArray<PlutusData>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlutusDataError {
    #[error("expected {expected} data, found {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected constructor {expected}, found constructor {found}")]
    UnexpectedConstr { expected: u64, found: u64 },

    #[error("constructor {alt} expects {expected} fields, found {found}")]
    UnexpectedArity {
        alt: u64,
        expected: usize,
        found: usize,
    },

    #[error("integer {0} is out of range")]
    OutOfRange(String),

    #[error("{0}")]
    Invalid(String),
}

/// Conversion of a ledger entity into its on-chain representation
pub trait ToPlutusData {
    fn to_plutus_data(&self) -> PlutusData;
}

/// Recovery of a ledger entity from its on-chain representation
pub trait FromPlutusData: Sized {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError>;
}

/// Maps a constructor alternative to the cbor tag used to encode it
fn constr_tag(alt: u64) -> (u64, Option<u64>) {
    match alt {
        0..=6 => (121 + alt, None),
        7..=127 => (1280 + alt - 7, None),
        _ => (102, Some(alt)),
    }
}

impl PlutusData {
    /// Builds a constructor using the canonical framing: indefinite for
    /// non-empty field lists, definite for empty ones
    pub fn constr(alt: u64, fields: Vec<PlutusData>) -> Self {
        let (tag, any_constructor) = constr_tag(alt);

        PlutusData::Constr(Constr {
            tag,
            any_constructor,
            fields: if fields.is_empty() {
                MaybeIndefArray::Def(fields)
            } else {
                MaybeIndefArray::Indef(fields)
            },
        })
    }

    pub fn integer(value: impl Into<num_bigint::BigInt>) -> Self {
        PlutusData::BigInt(BigInt::from_num(&value.into()))
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        PlutusData::BoundedBytes(BoundedBytes::from(value.into()))
    }

    pub fn list(items: Vec<PlutusData>) -> Self {
        if items.is_empty() {
            PlutusData::Array(MaybeIndefArray::Def(items))
        } else {
            PlutusData::Array(MaybeIndefArray::Indef(items))
        }
    }

    pub fn map(pairs: Vec<(PlutusData, PlutusData)>) -> Self {
        PlutusData::Map(KeyValuePairs::Def(pairs))
    }

    /// The `Maybe` encoding: `Just x` is constructor 0, `Nothing` is
    /// constructor 1
    pub fn option(value: Option<PlutusData>) -> Self {
        match value {
            Some(x) => PlutusData::constr(0, vec![x]),
            None => PlutusData::constr(1, vec![]),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PlutusData::Constr(_) => "constr",
            PlutusData::Map(_) => "map",
            PlutusData::BigInt(_) => "integer",
            PlutusData::BoundedBytes(_) => "bytes",
            PlutusData::Array(_) => "list",
        }
    }

    fn unexpected(&self, expected: &'static str) -> PlutusDataError {
        PlutusDataError::UnexpectedKind {
            expected,
            found: self.kind_name(),
        }
    }

    pub fn as_constr(&self) -> Result<(u64, &[PlutusData]), PlutusDataError> {
        match self {
            PlutusData::Constr(x) => Ok((x.alternative(), x.fields.as_slice())),
            other => Err(other.unexpected("constr")),
        }
    }

    /// Unwraps a constructor with a known alternative and number of fields
    pub fn expect_constr(&self, alt: u64, arity: usize) -> Result<&[PlutusData], PlutusDataError> {
        let (found, fields) = self.as_constr()?;

        if found != alt {
            return Err(PlutusDataError::UnexpectedConstr {
                expected: alt,
                found,
            });
        }

        if fields.len() != arity {
            return Err(PlutusDataError::UnexpectedArity {
                alt,
                expected: arity,
                found: fields.len(),
            });
        }

        Ok(fields)
    }

    pub fn as_integer(&self) -> Result<num_bigint::BigInt, PlutusDataError> {
        match self {
            PlutusData::BigInt(x) => Ok(x.to_num()),
            other => Err(other.unexpected("integer")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], PlutusDataError> {
        match self {
            PlutusData::BoundedBytes(x) => Ok(x.as_slice()),
            other => Err(other.unexpected("bytes")),
        }
    }

    pub fn as_list(&self) -> Result<&[PlutusData], PlutusDataError> {
        match self {
            PlutusData::Array(x) => Ok(x.as_slice()),
            other => Err(other.unexpected("list")),
        }
    }

    pub fn as_map(&self) -> Result<&[(PlutusData, PlutusData)], PlutusDataError> {
        match self {
            PlutusData::Map(x) => Ok(x.as_slice()),
            other => Err(other.unexpected("map")),
        }
    }

    pub fn as_option(&self) -> Result<Option<&PlutusData>, PlutusDataError> {
        match self.as_constr()? {
            (0, [x]) => Ok(Some(x)),
            (1, []) => Ok(None),
            (alt, fields) => Err(PlutusDataError::Invalid(format!(
                "expected Maybe constructor, found constructor {alt} with {} fields",
                fields.len()
            ))),
        }
    }
}

impl<'b, C> minicbor::decode::Decode<'b, C> for PlutusData {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let type_ = d.datatype()?;

        match type_ {
            Type::Tag => {
                let mut probe = d.probe();
                let tag = probe.tag()?;

                if tag == IanaTag::PosBignum.tag() || tag == IanaTag::NegBignum.tag() {
                    Ok(Self::BigInt(d.decode_with(ctx)?))
                } else {
                    match tag.as_u64() {
                        (121..=127) | (1280..=1400) | 102 => Ok(Self::Constr(d.decode_with(ctx)?)),
                        other => Err(minicbor::decode::Error::message(format!(
                            "unknown tag {other} for plutus data at offset {position}"
                        ))),
                    }
                }
            }
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64
            | Type::Int => Ok(Self::BigInt(d.decode_with(ctx)?)),
            Type::Map | Type::MapIndef => Ok(Self::Map(d.decode_with(ctx)?)),
            Type::Bytes | Type::BytesIndef => Ok(Self::BoundedBytes(d.decode_with(ctx)?)),
            Type::Array | Type::ArrayIndef => Ok(Self::Array(d.decode_with(ctx)?)),
            any => Err(unexpected_type("plutus data", any, position)),
        }
    }
}

impl<C> minicbor::encode::Encode<C> for PlutusData {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            Self::Constr(a) => {
                e.encode_with(a, ctx)?;
            }
            Self::Map(a) => {
                e.encode_with(a, ctx)?;
            }
            Self::BigInt(a) => {
                e.encode_with(a, ctx)?;
            }
            Self::BoundedBytes(a) => {
                e.encode_with(a, ctx)?;
            }
            Self::Array(a) => {
                e.encode_with(a, ctx)?;
            }
        };

        Ok(())
    }
}

/*
big_int = int / big_uint / big_nint
big_uint = #6.2(bounded_bytes)
big_nint = #6.3(bounded_bytes)
 */

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum BigInt {
    Int(i128),
    BigUInt(BoundedBytes),
    BigNInt(BoundedBytes),
}

impl BigInt {
    /// Picks the smallest representation able to hold the value exactly
    pub fn from_num(value: &num_bigint::BigInt) -> Self {
        if let Some(x) = value.to_i128() {
            if minicbor::data::Int::try_from(x).is_ok() {
                return BigInt::Int(x);
            }
        }

        if value.is_negative() {
            let magnitude: num_bigint::BigInt = -value - num_bigint::BigInt::one();
            let (_, bytes) = magnitude.to_bytes_be();
            BigInt::BigNInt(BoundedBytes::from(bytes))
        } else {
            let (_, bytes) = value.to_bytes_be();
            BigInt::BigUInt(BoundedBytes::from(bytes))
        }
    }

    pub fn to_num(&self) -> num_bigint::BigInt {
        match self {
            BigInt::Int(x) => num_bigint::BigInt::from(*x),
            BigInt::BigUInt(bytes) => num_bigint::BigInt::from_bytes_be(Sign::Plus, bytes),
            BigInt::BigNInt(bytes) => {
                let magnitude = num_bigint::BigInt::from_bytes_be(Sign::Plus, bytes);
                -magnitude - num_bigint::BigInt::one()
            }
        }
    }
}

impl<'b, C> minicbor::decode::Decode<'b, C> for BigInt {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let datatype = d.datatype()?;

        match datatype {
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64
            | Type::Int => {
                let x = d.int()?;
                Ok(Self::Int(i128::from(x)))
            }
            Type::Tag => {
                let tag = d.tag()?;
                if tag == IanaTag::PosBignum.tag() {
                    Ok(Self::BigUInt(d.decode_with(ctx)?))
                } else if tag == IanaTag::NegBignum.tag() {
                    Ok(Self::BigNInt(d.decode_with(ctx)?))
                } else {
                    Err(minicbor::decode::Error::message(format!(
                        "invalid cbor tag {} for big int at offset {position}",
                        tag.as_u64()
                    )))
                }
            }
            other => Err(unexpected_type("integer", other, position)),
        }
    }
}

impl<C> minicbor::encode::Encode<C> for BigInt {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            BigInt::Int(x) => {
                let x = minicbor::data::Int::try_from(*x).map_err(|_| {
                    minicbor::encode::Error::message("integer doesn't fit a cbor int")
                })?;
                e.int(x)?;
            }
            BigInt::BigUInt(x) => {
                e.tag(IanaTag::PosBignum)?;
                e.encode_with(x, ctx)?;
            }
            BigInt::BigNInt(x) => {
                e.tag(IanaTag::NegBignum)?;
                e.encode_with(x, ctx)?;
            }
        };

        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct Constr<A> {
    pub tag: u64,
    pub any_constructor: Option<u64>,
    pub fields: MaybeIndefArray<A>,
}

impl<A> Constr<A> {
    /// The constructor alternative, independent of how the tag encodes it
    pub fn alternative(&self) -> u64 {
        match self.tag {
            121..=127 => self.tag - 121,
            1280..=1400 => self.tag - 1280 + 7,
            _ => self.any_constructor.unwrap_or_default(),
        }
    }
}

impl<'b, C, A> minicbor::decode::Decode<'b, C> for Constr<A>
where
    A: minicbor::decode::Decode<'b, C>,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let tag = d.tag()?;
        let x = tag.as_u64();

        match x {
            121..=127 | 1280..=1400 => Ok(Constr {
                tag: x,
                fields: d.decode_with(ctx)?,
                any_constructor: None,
            }),
            102 => {
                crate::utils::expect_array(d, "general constructor", 2)?;

                Ok(Constr {
                    tag: x,
                    any_constructor: Some(d.decode_with(ctx)?),
                    fields: d.decode_with(ctx)?,
                })
            }
            _ => Err(minicbor::decode::Error::message(format!(
                "bad tag code {x} for plutus data constructor at offset {position}"
            ))),
        }
    }
}

impl<C, A> minicbor::encode::Encode<C> for Constr<A>
where
    A: minicbor::encode::Encode<C>,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.tag(Tag::new(self.tag))?;

        match self.tag {
            102 => {
                e.array(2)?;
                e.u64(self.any_constructor.unwrap_or_default())?;
                e.encode_with(&self.fields, ctx)?;
                Ok(())
            }
            _ => {
                e.encode_with(&self.fields, ctx)?;
                Ok(())
            }
        }
    }
}

/// Defined to encode PlutusData bytestring as it is done in the canonical
/// plutus implementation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "String")]
#[serde(try_from = "String")]
pub struct BoundedBytes(Vec<u8>);

impl From<Vec<u8>> for BoundedBytes {
    fn from(xs: Vec<u8>) -> Self {
        BoundedBytes(xs)
    }
}

impl From<BoundedBytes> for Vec<u8> {
    fn from(b: BoundedBytes) -> Self {
        b.0
    }
}

impl Deref for BoundedBytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<String> for BoundedBytes {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let v = hex::decode(value)?;
        Ok(BoundedBytes(v))
    }
}

impl From<BoundedBytes> for String {
    fn from(b: BoundedBytes) -> Self {
        hex::encode(b.deref())
    }
}

impl fmt::Display for BoundedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl<C> Encode<C> for BoundedBytes {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        // bytestrings longer than 64 bytes go out as indefinite chunks of 64
        const CHUNK_SIZE: usize = 64;
        let bs: &Vec<u8> = self.deref();
        if bs.len() <= CHUNK_SIZE {
            e.bytes(bs)?;
        } else {
            e.begin_bytes()?;
            for b in bs.chunks(CHUNK_SIZE) {
                e.bytes(b)?;
            }
            e.end()?;
        }
        Ok(())
    }
}

impl<'b, C> minicbor::decode::Decode<'b, C> for BoundedBytes {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let mut res = Vec::new();
        for chunk in d.bytes_iter()? {
            let bs = chunk?;
            res.extend_from_slice(bs);
        }
        Ok(BoundedBytes::from(res))
    }
}

impl ToPlutusData for PlutusData {
    fn to_plutus_data(&self) -> PlutusData {
        self.clone()
    }
}

impl FromPlutusData for PlutusData {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        Ok(data.clone())
    }
}

impl ToPlutusData for num_bigint::BigInt {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::BigInt(BigInt::from_num(self))
    }
}

impl FromPlutusData for num_bigint::BigInt {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        data.as_integer()
    }
}

impl ToPlutusData for u64 {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::integer(*self)
    }
}

impl FromPlutusData for u64 {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        let x = data.as_integer()?;
        x.to_u64()
            .ok_or_else(|| PlutusDataError::OutOfRange(x.to_string()))
    }
}

impl ToPlutusData for i64 {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::integer(*self)
    }
}

impl FromPlutusData for i64 {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        let x = data.as_integer()?;
        x.to_i64()
            .ok_or_else(|| PlutusDataError::OutOfRange(x.to_string()))
    }
}

impl ToPlutusData for bool {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(u64::from(*self), vec![])
    }
}

impl FromPlutusData for bool {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        match data.as_constr()? {
            (0, []) => Ok(false),
            (1, []) => Ok(true),
            (alt, _) => Err(PlutusDataError::Invalid(format!(
                "constructor {alt} is not a bool"
            ))),
        }
    }
}

impl<T: ToPlutusData> ToPlutusData for Vec<T> {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::list(self.iter().map(ToPlutusData::to_plutus_data).collect())
    }
}

impl<T: FromPlutusData> FromPlutusData for Vec<T> {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        data.as_list()?.iter().map(T::from_plutus_data).collect()
    }
}

impl<T: ToPlutusData> ToPlutusData for Option<T> {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::option(self.as_ref().map(ToPlutusData::to_plutus_data))
    }
}

impl<T: FromPlutusData> FromPlutusData for Option<T> {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        data.as_option()?.map(T::from_plutus_data).transpose()
    }
}
