use minicbor::{
    data::{Tag, Type},
    decode, Decode, Encode,
};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};

/// The cbor tag that marks an array as a mathematical set
pub const SET_TAG: u64 = 258;

/// Builds a decode error that names what was expected and what was found
pub fn unexpected_type(expected: &str, found: Type, position: usize) -> decode::Error {
    decode::Error::message(format!(
        "expected {expected}, found {found:?} at offset {position}"
    ))
}

/// Builds a decode error for a definite length that doesn't match
pub fn unexpected_len(what: &str, expected: u64, found: Option<u64>, position: usize) -> decode::Error {
    let found = match found {
        Some(x) => x.to_string(),
        None => "indefinite".to_string(),
    };

    decode::Error::message(format!(
        "expected {what} of length {expected}, found {found} at offset {position}"
    ))
}

/// Reads the header of a definite array and checks its length
pub fn expect_array(d: &mut minicbor::Decoder<'_>, what: &str, len: u64) -> Result<(), decode::Error> {
    let position = d.position();

    match d.datatype()? {
        Type::Array => {
            let found = d.array()?;
            if found == Some(len) {
                Ok(())
            } else {
                Err(unexpected_len(what, len, found, position))
            }
        }
        other => Err(unexpected_type(what, other, position)),
    }
}

/// Custom collection to ensure ordered pairs of values
///
/// Since the ordering of the entries requires a particular order to maintain
/// canonicalization for isomorphic decoding / encoding operators, we use a Vec
/// as the underlaying struct for storage of the items (as opposed to a BTreeMap
/// or HashMap).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "Vec::<(K, V)>", into = "Vec::<(K, V)>")]
pub enum KeyValuePairs<K, V>
where
    K: Clone,
    V: Clone,
{
    Def(Vec<(K, V)>),
    Indef(Vec<(K, V)>),
}

impl<K, V> KeyValuePairs<K, V>
where
    K: Clone,
    V: Clone,
{
    pub fn to_vec(self) -> Vec<(K, V)> {
        self.into()
    }

    pub fn is_indef(&self) -> bool {
        matches!(self, KeyValuePairs::Indef(_))
    }
}

impl<K, V> From<KeyValuePairs<K, V>> for Vec<(K, V)>
where
    K: Clone,
    V: Clone,
{
    fn from(other: KeyValuePairs<K, V>) -> Self {
        match other {
            KeyValuePairs::Def(x) => x,
            KeyValuePairs::Indef(x) => x,
        }
    }
}

impl<K, V> From<Vec<(K, V)>> for KeyValuePairs<K, V>
where
    K: Clone,
    V: Clone,
{
    fn from(other: Vec<(K, V)>) -> Self {
        KeyValuePairs::Def(other)
    }
}

impl<K, V> Deref for KeyValuePairs<K, V>
where
    K: Clone,
    V: Clone,
{
    type Target = Vec<(K, V)>;

    fn deref(&self) -> &Self::Target {
        match self {
            KeyValuePairs::Def(x) => x,
            KeyValuePairs::Indef(x) => x,
        }
    }
}

impl<'b, C, K, V> minicbor::decode::Decode<'b, C> for KeyValuePairs<K, V>
where
    K: Decode<'b, C> + Clone,
    V: Decode<'b, C> + Clone,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let datatype = d.datatype()?;

        if !matches!(datatype, Type::Map | Type::MapIndef) {
            return Err(unexpected_type("map", datatype, position));
        }

        let items: Result<Vec<_>, _> = d.map_iter_with::<C, K, V>(ctx)?.collect();
        let items = items?;

        match datatype {
            Type::MapIndef => Ok(KeyValuePairs::Indef(items)),
            _ => Ok(KeyValuePairs::Def(items)),
        }
    }
}

impl<C, K, V> minicbor::encode::Encode<C> for KeyValuePairs<K, V>
where
    K: Encode<C> + Clone,
    V: Encode<C> + Clone,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            KeyValuePairs::Def(x) => {
                e.map(x.len() as u64)?;

                for (k, v) in x.iter() {
                    k.encode(e, ctx)?;
                    v.encode(e, ctx)?;
                }
            }
            KeyValuePairs::Indef(x) => {
                e.begin_map()?;

                for (k, v) in x.iter() {
                    k.encode(e, ctx)?;
                    v.encode(e, ctx)?;
                }

                e.end()?;
            }
        }

        Ok(())
    }
}

/// A struct that maintains a reference to whether a cbor array was indef or not
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum MaybeIndefArray<A> {
    Def(Vec<A>),
    Indef(Vec<A>),
}

impl<A> MaybeIndefArray<A> {
    pub fn to_vec(self) -> Vec<A> {
        self.into()
    }

    pub fn is_indef(&self) -> bool {
        matches!(self, MaybeIndefArray::Indef(_))
    }
}

impl<A> Deref for MaybeIndefArray<A> {
    type Target = Vec<A>;

    fn deref(&self) -> &Self::Target {
        match self {
            MaybeIndefArray::Def(x) => x,
            MaybeIndefArray::Indef(x) => x,
        }
    }
}

impl<A> From<MaybeIndefArray<A>> for Vec<A> {
    fn from(other: MaybeIndefArray<A>) -> Self {
        match other {
            MaybeIndefArray::Def(x) => x,
            MaybeIndefArray::Indef(x) => x,
        }
    }
}

impl<A> From<Vec<A>> for MaybeIndefArray<A> {
    fn from(other: Vec<A>) -> Self {
        MaybeIndefArray::Def(other)
    }
}

impl<'b, C, A> minicbor::decode::Decode<'b, C> for MaybeIndefArray<A>
where
    A: minicbor::decode::Decode<'b, C>,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();

        match d.datatype()? {
            Type::Array => Ok(Self::Def(d.decode_with(ctx)?)),
            Type::ArrayIndef => Ok(Self::Indef(d.decode_with(ctx)?)),
            other => Err(unexpected_type("array", other, position)),
        }
    }
}

impl<C, A> minicbor::encode::Encode<C> for MaybeIndefArray<A>
where
    A: minicbor::encode::Encode<C>,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            MaybeIndefArray::Def(x) => {
                e.encode_with(x, ctx)?;
            }
            MaybeIndefArray::Indef(x) => {
                e.begin_array()?;

                for v in x.iter() {
                    e.encode_with(v, ctx)?;
                }

                e.end()?;
            }
        };

        Ok(())
    }
}

/// How a collection was framed on the wire
///
/// Several ledger fields accept either a plain array or an array under tag
/// 258. Transactions are hashed over their exact bytes, so the choice made by
/// whoever built the transaction has to survive a decode / encode cycle.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListEncoding {
    #[default]
    Definite,
    Indefinite,
    TaggedSet,
    /// Tag 258 over an indefinite array
    IndefiniteSet,
}

impl ListEncoding {
    pub fn is_set(&self) -> bool {
        matches!(self, ListEncoding::TaggedSet | ListEncoding::IndefiniteSet)
    }
}

/// Decodes an array, or a tag 258 set, and reports which framing was used
pub fn decode_list<'b, C, T>(
    d: &mut minicbor::Decoder<'b>,
    ctx: &mut C,
) -> Result<(Vec<T>, ListEncoding), decode::Error>
where
    T: Decode<'b, C>,
{
    let position = d.position();

    match d.datatype()? {
        Type::Tag => {
            let tag = d.tag()?;
            if tag.as_u64() != SET_TAG {
                return Err(decode::Error::message(format!(
                    "expected set tag {SET_TAG}, found tag {} at offset {position}",
                    tag.as_u64()
                )));
            }

            let items: MaybeIndefArray<T> = d.decode_with(ctx)?;
            let encoding = match items.is_indef() {
                true => ListEncoding::IndefiniteSet,
                false => ListEncoding::TaggedSet,
            };

            Ok((items.to_vec(), encoding))
        }
        Type::Array => Ok((d.decode_with(ctx)?, ListEncoding::Definite)),
        Type::ArrayIndef => {
            let items: MaybeIndefArray<T> = d.decode_with(ctx)?;
            Ok((items.to_vec(), ListEncoding::Indefinite))
        }
        other => Err(unexpected_type("array or set", other, position)),
    }
}

/// Encodes items using the framing previously reported by [decode_list]
pub fn encode_list<C, T, W>(
    e: &mut minicbor::Encoder<W>,
    items: &[T],
    encoding: ListEncoding,
    ctx: &mut C,
) -> Result<(), minicbor::encode::Error<W::Error>>
where
    T: Encode<C>,
    W: minicbor::encode::Write,
{
    match encoding {
        ListEncoding::Definite => {
            e.array(items.len() as u64)?;
        }
        ListEncoding::Indefinite => {
            e.begin_array()?;
        }
        ListEncoding::TaggedSet => {
            e.tag(Tag::new(SET_TAG))?;
            e.array(items.len() as u64)?;
        }
        ListEncoding::IndefiniteSet => {
            e.tag(Tag::new(SET_TAG))?;
            e.begin_array()?;
        }
    }

    for item in items {
        e.encode_with(item, ctx)?;
    }

    if matches!(
        encoding,
        ListEncoding::Indefinite | ListEncoding::IndefiniteSet
    ) {
        e.end()?;
    }

    Ok(())
}

/// A collection that remembers its own wire framing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Set<T> {
    items: Vec<T>,
    #[serde(skip)]
    encoding: ListEncoding,
}

impl<T> Set<T> {
    pub fn new(items: Vec<T>, encoding: ListEncoding) -> Self {
        Self { items, encoding }
    }

    pub fn encoding(&self) -> ListEncoding {
        self.encoding
    }

    pub fn to_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Self {
            items: vec![],
            encoding: ListEncoding::default(),
        }
    }
}

impl<T> From<Vec<T>> for Set<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items, ListEncoding::default())
    }
}

impl<T> Deref for Set<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<'b, C, T> minicbor::Decode<'b, C> for Set<T>
where
    T: minicbor::Decode<'b, C>,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let (items, encoding) = decode_list(d, ctx)?;
        Ok(Self { items, encoding })
    }
}

impl<C, T> minicbor::Encode<C> for Set<T>
where
    T: minicbor::Encode<C>,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        encode_list(e, &self.items, self.encoding, ctx)
    }
}

/// Wraps a struct so that it is encoded/decoded as a cbor bytes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Hash)]
#[serde(transparent)]
pub struct CborWrap<T>(pub T);

impl<'b, C, T> minicbor::Decode<'b, C> for CborWrap<T>
where
    T: minicbor::Decode<'b, C>,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let tag = d.tag()?;

        if tag.as_u64() != 24 {
            return Err(decode::Error::message(format!(
                "expected nested cbor tag 24, found tag {} at offset {position}",
                tag.as_u64()
            )));
        }

        let cbor = d.bytes()?;
        let wrapped = minicbor::decode_with(cbor, ctx)?;

        Ok(CborWrap(wrapped))
    }
}

impl<C, T> minicbor::Encode<C> for CborWrap<T>
where
    T: minicbor::Encode<C>,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let buf = minicbor::to_vec_with(&self.0, ctx).map_err(|_| {
            minicbor::encode::Error::message("error encoding cbor-wrapped structure")
        })?;

        e.tag(Tag::new(24))?;
        e.bytes(&buf)?;

        Ok(())
    }
}

impl<T> Deref for CborWrap<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "Option::<T>", into = "Option::<T>")]
pub enum Nullable<T>
where
    T: std::clone::Clone,
{
    Some(T),
    Null,
    Undefined,
}

impl<T> Nullable<T>
where
    T: std::clone::Clone,
{
    pub fn map<F, O>(self, f: F) -> Nullable<O>
    where
        O: std::clone::Clone,
        F: Fn(T) -> O,
    {
        match self {
            Nullable::Some(x) => Nullable::Some(f(x)),
            Nullable::Null => Nullable::Null,
            Nullable::Undefined => Nullable::Undefined,
        }
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Nullable::Some(x) => Some(x),
            _ => None,
        }
    }
}

impl<'b, C, T> minicbor::Decode<'b, C> for Nullable<T>
where
    T: minicbor::Decode<'b, C> + std::clone::Clone,
{
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        match d.datatype()? {
            Type::Null => {
                d.null()?;
                Ok(Self::Null)
            }
            Type::Undefined => {
                d.undefined()?;
                Ok(Self::Undefined)
            }
            _ => {
                let x = d.decode_with(ctx)?;
                Ok(Self::Some(x))
            }
        }
    }
}

impl<C, T> minicbor::Encode<C> for Nullable<T>
where
    T: minicbor::Encode<C> + std::clone::Clone,
{
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            Nullable::Some(x) => {
                e.encode_with(x, ctx)?;
                Ok(())
            }
            Nullable::Null => {
                e.null()?;
                Ok(())
            }
            Nullable::Undefined => {
                e.undefined()?;
                Ok(())
            }
        }
    }
}

impl<T> From<Option<T>> for Nullable<T>
where
    T: std::clone::Clone,
{
    fn from(x: Option<T>) -> Self {
        match x {
            Some(x) => Nullable::Some(x),
            None => Nullable::Null,
        }
    }
}

impl<T> From<Nullable<T>> for Option<T>
where
    T: std::clone::Clone,
{
    fn from(other: Nullable<T>) -> Self {
        match other {
            Nullable::Some(x) => Some(x),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Encode, Decode, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cbor(transparent)]
#[serde(into = "String")]
#[serde(try_from = "String")]
pub struct Bytes(#[n(0)] minicbor::bytes::ByteVec);

impl From<Vec<u8>> for Bytes {
    fn from(xs: Vec<u8>) -> Self {
        Bytes(minicbor::bytes::ByteVec::from(xs))
    }
}

impl From<&[u8]> for Bytes {
    fn from(xs: &[u8]) -> Self {
        Bytes(minicbor::bytes::ByteVec::from(xs.to_vec()))
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(b: Bytes) -> Self {
        b.0.into()
    }
}

impl Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl TryFrom<String> for Bytes {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let v = hex::decode(value)?;
        Ok(Bytes(minicbor::bytes::ByteVec::from(v)))
    }
}

impl From<Bytes> for String {
    fn from(b: Bytes) -> Self {
        hex::encode(b.deref())
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.deref()))
    }
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Encode, Decode, Debug, PartialEq, Eq, PartialOrd, Ord,
)]
#[cbor(transparent)]
#[serde(into = "i128")]
#[serde(try_from = "i128")]
pub struct Int(#[n(0)] pub minicbor::data::Int);

impl Deref for Int {
    type Target = minicbor::data::Int;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Int> for i128 {
    fn from(value: Int) -> Self {
        i128::from(value.0)
    }
}

impl From<i64> for Int {
    fn from(x: i64) -> Self {
        let inner = minicbor::data::Int::from(x);
        Self(inner)
    }
}

impl From<u64> for Int {
    fn from(x: u64) -> Self {
        let inner = minicbor::data::Int::from(x);
        Self(inner)
    }
}

impl TryFrom<i128> for Int {
    type Error = minicbor::data::TryFromIntError;

    fn try_from(value: i128) -> Result<Self, Self::Error> {
        let inner = minicbor::data::Int::try_from(value)?;
        Ok(Self(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("83010203", ListEncoding::Definite; "definite array")]
    #[test_case("9f010203ff", ListEncoding::Indefinite; "indefinite array")]
    #[test_case("d9010283010203", ListEncoding::TaggedSet; "tagged set")]
    #[test_case("d901029f010203ff", ListEncoding::IndefiniteSet; "tagged indefinite set")]
    fn set_keeps_framing(hex_cbor: &str, expected: ListEncoding) {
        let bytes = hex::decode(hex_cbor).unwrap();
        let set: Set<u8> = minicbor::decode(&bytes).unwrap();

        assert_eq!(set.encoding(), expected);
        assert_eq!(set.as_slice(), &[1, 2, 3]);
        assert_eq!(minicbor::to_vec(&set).unwrap(), bytes);
    }

    #[test]
    fn set_rejects_foreign_tag() {
        let bytes = hex::decode("d9010383010203").unwrap();
        let err = minicbor::decode::<Set<u8>>(&bytes).unwrap_err();

        assert!(err.to_string().contains("259"));
    }

    #[test]
    fn maps_keep_indefinite_framing() {
        let bytes = hex::decode("bf0102ff").unwrap();
        let kvs: KeyValuePairs<u8, u8> = minicbor::decode(&bytes).unwrap();

        assert!(kvs.is_indef());
        assert_eq!(minicbor::to_vec(&kvs).unwrap(), bytes);
    }

    #[test]
    fn type_mismatch_names_offset() {
        let bytes = hex::decode("820143010203").unwrap();
        let mut d = minicbor::Decoder::new(&bytes);
        d.array().unwrap();
        d.u8().unwrap();

        let err = MaybeIndefArray::<u8>::decode(&mut d, &mut ()).unwrap_err();

        assert!(err.to_string().contains("expected array"));
        assert!(err.to_string().contains("offset 2"));
    }

    #[test]
    fn cbor_wrap_roundtrip() {
        let wrapped = CborWrap(42u32);
        let bytes = minicbor::to_vec(&wrapped).unwrap();

        assert_eq!(hex::encode(&bytes), "d81842182a");

        let back: CborWrap<u32> = minicbor::decode(&bytes).unwrap();
        assert_eq!(back.0, 42);
    }
}
