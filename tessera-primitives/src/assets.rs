//! Multi-asset quantities
//!
//! [`Assets`] is an ordered association `policy -> (token name -> quantity)`.
//! The ledger knows two canonical orders for its entries (see [`AssetOrder`])
//! and which one applies depends on where the assets end up: the wire
//! encoding of a transaction built here uses shortest-first, the data handed
//! to scripts uses plain lexicographic order. Every operation that sorts takes
//! the order as an explicit argument.

use crate::{hashes::MintingPolicyHash, Error};
use itertools::Itertools;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, ops::Deref};
use tessera_codec::{
    minicbor,
    plutus::{self, FromPlutusData, PlutusData, PlutusDataError, ToPlutusData},
    utils::KeyValuePairs,
};
use tessera_crypto::hash::Hasher;

/// Token names can't be longer than this
pub const MAX_ASSET_NAME_LEN: usize = 32;

const FINGERPRINT_HRP: &str = "asset";

/// The two canonical orders over policies and token names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetOrder {
    /// Shorter byte strings first, ties broken lexicographically. This is the
    /// order hardware wallets expect when they re-serialize a transaction.
    ShortestFirst,

    /// Plain byte-wise order, the one scripts observe in their context
    Lexicographic,
}

impl AssetOrder {
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            AssetOrder::ShortestFirst => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            AssetOrder::Lexicographic => a.cmp(b),
        }
    }
}

/// Name of a token under a minting policy
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub const EMPTY: AssetName = AssetName(Vec::new());

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for AssetName {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for AssetName {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for AssetName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl Deref for AssetName {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for AssetName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) if text.chars().all(|c| !c.is_control()) => {
                f.debug_tuple("AssetName").field(&text).finish()
            }
            _ => f.debug_tuple("AssetName").field(&self.to_string()).finish(),
        }
    }
}

impl Serialize for AssetName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map(Self).map_err(serde::de::Error::custom)
    }
}

impl<C> minicbor::Encode<C> for AssetName {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for AssetName {
    fn decode(d: &mut minicbor::Decoder<'b>, _ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let bytes = d.bytes()?;

        if bytes.len() > MAX_ASSET_NAME_LEN {
            return Err(minicbor::decode::Error::message(format!(
                "asset name of {} bytes exceeds {MAX_ASSET_NAME_LEN} at offset {position}",
                bytes.len()
            )));
        }

        Ok(Self(bytes.to_vec()))
    }
}

impl ToPlutusData for AssetName {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::bytes(self.0.clone())
    }
}

impl FromPlutusData for AssetName {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        Ok(Self(data.as_bytes()?.to_vec()))
    }
}

/// A `(policy, token name)` pair identifying one kind of asset
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct AssetClass {
    pub policy: MintingPolicyHash,
    pub name: AssetName,
}

impl AssetClass {
    /// The native currency: empty policy, empty name
    pub const ADA: AssetClass = AssetClass {
        policy: MintingPolicyHash::ADA,
        name: AssetName::EMPTY,
    };

    pub fn new(policy: MintingPolicyHash, name: impl Into<AssetName>) -> Self {
        Self {
            policy,
            name: name.into(),
        }
    }

    pub fn is_ada(&self) -> bool {
        self.policy.is_ada() && self.name.is_empty()
    }

    /// The CIP-14 user-facing fingerprint, `bech32("asset", blake2b_160(policy ++ name))`
    ///
    /// It's a one-way digest, the policy and name can't be recovered from it.
    pub fn fingerprint(&self) -> Result<String, bech32::Error> {
        use bech32::ToBase32;

        let mut hasher = Hasher::<160>::new();
        hasher.input(self.policy.as_bytes());
        hasher.input(&self.name);
        let digest = hasher.finalize();

        bech32::encode(FINGERPRINT_HRP, digest.to_base32(), bech32::Variant::Bech32)
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ada() {
            f.write_str("lovelace")
        } else {
            write!(f, "{}.{}", self.policy, self.name)
        }
    }
}

impl ToPlutusData for AssetClass {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![self.policy.to_plutus_data(), self.name.to_plutus_data()],
        )
    }
}

impl FromPlutusData for AssetClass {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        let fields = data.expect_constr(0, 2)?;

        Ok(Self {
            policy: MintingPolicyHash::from_plutus_data(&fields[0])?,
            name: AssetName::from_plutus_data(&fields[1])?,
        })
    }
}

type Tokens = Vec<(AssetName, BigInt)>;

/// Quantities of native tokens grouped by policy
///
/// Entries keep the order they were inserted or decoded in. Quantities may be
/// negative (a burn, or an intermediate result of [`Assets::subtract`]).
#[derive(Clone, Debug, Default)]
pub struct Assets(Vec<(MintingPolicyHash, Tokens)>, AssetsEncoding);

/// Map framing seen on decode, replayed on encode
#[derive(Clone, Debug, Default)]
struct AssetsEncoding {
    indef: bool,
    indef_policies: Vec<MintingPolicyHash>,
}

// the framing is a wire detail and doesn't take part in equality
impl PartialEq for Assets {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Assets {}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups the pairs by policy in first-seen order. Repeated pairs are kept
    /// as separate entries until [`Assets::normalize`] merges them.
    pub fn from_pairs<Q>(pairs: impl IntoIterator<Item = (AssetClass, Q)>) -> Self
    where
        Q: Into<BigInt>,
    {
        let mut out = Self::new();

        for (class, quantity) in pairs {
            let quantity = quantity.into();

            match out.0.iter_mut().find(|(p, _)| *p == class.policy) {
                Some((_, tokens)) => tokens.push((class.name, quantity)),
                None => out.0.push((class.policy, vec![(class.name, quantity)])),
            }
        }

        out
    }

    /// Adds `quantity` to the entry for `(policy, name)`, creating it if
    /// missing
    pub fn add_component(
        &mut self,
        policy: MintingPolicyHash,
        name: impl Into<AssetName>,
        quantity: impl Into<BigInt>,
    ) {
        let name = name.into();
        let quantity = quantity.into();

        let tokens = match self.0.iter().position(|(p, _)| *p == policy) {
            Some(i) => &mut self.0[i].1,
            None => {
                self.0.push((policy, vec![]));
                // just pushed
                let last = self.0.len() - 1;
                &mut self.0[last].1
            }
        };

        match tokens.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing += quantity,
            None => tokens.push((name, quantity)),
        }
    }

    /// Total quantity held for `(policy, name)`, zero if absent
    pub fn get(&self, policy: &MintingPolicyHash, name: &[u8]) -> BigInt {
        self.iter()
            .filter(|(p, n, _)| *p == policy && n.as_slice() == name)
            .map(|(_, _, q)| q.clone())
            .sum()
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, _, q)| q.is_zero())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flat view over every `(policy, name, quantity)` entry
    pub fn iter(&self) -> impl Iterator<Item = (&MintingPolicyHash, &AssetName, &BigInt)> {
        self.0
            .iter()
            .flat_map(|(p, tokens)| tokens.iter().map(move |(n, q)| (p, n, q)))
    }

    pub fn policies(&self) -> impl Iterator<Item = (&MintingPolicyHash, &[(AssetName, BigInt)])> {
        self.0.iter().map(|(p, tokens)| (p, tokens.as_slice()))
    }

    /// Merges repeated `(policy, name)` entries by addition and drops zero
    /// quantities and empty policies. Otherwise first-seen order is kept.
    pub fn normalize(&mut self) {
        let mut merged: Vec<(MintingPolicyHash, Tokens)> = Vec::with_capacity(self.0.len());

        for (policy, tokens) in self.0.drain(..) {
            let slot = match merged.iter().position(|(p, _)| *p == policy) {
                Some(i) => i,
                None => {
                    merged.push((policy, vec![]));
                    merged.len() - 1
                }
            };

            for (name, quantity) in tokens {
                let into = &mut merged[slot].1;

                match into.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, existing)) => *existing += quantity,
                    None => into.push((name, quantity)),
                }
            }
        }

        for (_, tokens) in merged.iter_mut() {
            tokens.retain(|(_, q)| !q.is_zero());
        }

        merged.retain(|(_, tokens)| !tokens.is_empty());

        self.0 = merged;
    }

    /// Sorts policies, then the names within each policy
    pub fn sort(&mut self, order: AssetOrder) {
        self.0
            .sort_by(|(a, _), (b, _)| order.compare(a.as_bytes(), b.as_bytes()));

        for (_, tokens) in self.0.iter_mut() {
            tokens.sort_by(|(a, _), (b, _)| order.compare(a, b));
        }
    }

    /// Checks that policies and names are strictly increasing under `order`
    pub fn is_sorted(&self, order: AssetOrder) -> bool {
        let policies_sorted = self
            .0
            .iter()
            .tuple_windows()
            .all(|((a, _), (b, _))| order.compare(a.as_bytes(), b.as_bytes()) == Ordering::Less);

        policies_sorted
            && self.0.iter().all(|(_, tokens)| {
                tokens
                    .iter()
                    .tuple_windows()
                    .all(|((a, _), (b, _))| order.compare(a, b) == Ordering::Less)
            })
    }

    // every (policy, name) present in either side, self's entries first
    fn union_keys(&self, other: &Assets) -> Vec<(MintingPolicyHash, AssetName)> {
        self.iter()
            .chain(other.iter())
            .map(|(p, n, _)| (*p, n.clone()))
            .unique()
            .collect()
    }

    fn zip_with(&self, other: &Assets, op: impl Fn(BigInt, BigInt) -> BigInt) -> Assets {
        let mut out = Assets::new();

        for (policy, name) in self.union_keys(other) {
            let quantity = op(self.get(&policy, &name), other.get(&policy, &name));
            out.add_component(policy, name, quantity);
        }

        out.normalize();
        out
    }

    pub fn add(&self, other: &Assets) -> Assets {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn subtract(&self, other: &Assets) -> Assets {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn multiply(&self, factor: impl Into<BigInt>) -> Assets {
        let factor = factor.into();
        self.zip_with(&Assets::new(), |a, _| a * &factor)
    }

    /// Same quantity for every asset, regardless of entry order
    pub fn is_equal(&self, other: &Assets) -> bool {
        self.union_keys(other)
            .iter()
            .all(|(p, n)| self.get(p, n) == other.get(p, n))
    }

    fn compare_all(&self, other: &Assets, cmp: impl Fn(&BigInt, &BigInt) -> bool) -> bool {
        if self.is_zero() {
            return other.is_zero();
        }

        self.union_keys(other)
            .iter()
            .all(|(p, n)| cmp(&self.get(p, n), &other.get(p, n)))
    }

    /// Every asset of `other` is matched by at least as much in `self`, and
    /// `self` holds no unmatched negative quantity. An all-zero `self` is only
    /// greater or equal to another all-zero value.
    pub fn is_greater_or_equal(&self, other: &Assets) -> bool {
        self.compare_all(other, |a, b| a >= b)
    }

    pub fn is_greater_than(&self, other: &Assets) -> bool {
        !self.is_zero() && self.compare_all(other, |a, b| a > b)
    }

    /// Fails on the first quantity that isn't strictly positive
    pub fn assert_all_positive(&self) -> Result<(), Error> {
        match self.iter().find(|(_, _, q)| !q.is_positive()) {
            Some((policy, name, quantity)) => Err(Error::NonPositiveQuantity {
                asset: AssetClass::new(*policy, name.clone()).to_string(),
                quantity: quantity.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Policies as stored, a policy listed twice shows up twice
    pub fn all_policies(&self) -> Vec<MintingPolicyHash> {
        self.0.iter().map(|(p, _)| *p).collect()
    }

    pub fn count_tokens(&self) -> usize {
        self.0.iter().map(|(_, tokens)| tokens.len()).sum()
    }

    /// On-chain form: `Map policy (Map name integer)`, sorted under `order`.
    ///
    /// With `in_script_context` an explicit zero-lovelace entry is put in
    /// front even though no lovelace is held. Script contexts built by the
    /// ledger carry that entry and scripts may rely on it.
    pub fn to_plutus_data(&self, order: AssetOrder, in_script_context: bool) -> PlutusData {
        let mut entries = Vec::with_capacity(self.0.len() + 1);

        if in_script_context {
            entries.push(lovelace_entry(&BigInt::zero()));
        }

        entries.extend(self.plutus_entries(order));

        PlutusData::map(entries)
    }

    pub(crate) fn plutus_entries(&self, order: AssetOrder) -> Vec<(PlutusData, PlutusData)> {
        let mut sorted = self.clone();
        sorted.sort(order);

        sorted
            .0
            .iter()
            .map(|(policy, tokens)| {
                let tokens = tokens
                    .iter()
                    .map(|(n, q)| (n.to_plutus_data(), PlutusData::integer(q.clone())))
                    .collect();

                (policy.to_plutus_data(), PlutusData::map(tokens))
            })
            .collect()
    }
}

pub(crate) fn lovelace_entry(amount: &BigInt) -> (PlutusData, PlutusData) {
    (
        MintingPolicyHash::ADA.to_plutus_data(),
        PlutusData::map(vec![(
            AssetName::EMPTY.to_plutus_data(),
            PlutusData::integer(amount.clone()),
        )]),
    )
}

impl FromPlutusData for Assets {
    fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusDataError> {
        let mut out = Assets::new();

        for (policy, tokens) in data.as_map()? {
            let policy = MintingPolicyHash::from_plutus_data(policy)?;

            for (name, quantity) in tokens.as_map()? {
                let name = AssetName::from_plutus_data(name)?;
                out.add_component(policy, name, quantity.as_integer()?);
            }
        }

        out.normalize();
        Ok(out)
    }
}

/* Cbor ******************************************************************** */

// quantities are encoded as plain ints when they fit and as tag 2/3 bignums
// otherwise, so nothing is ever truncated
type WireTokens = KeyValuePairs<AssetName, plutus::BigInt>;

impl<C> minicbor::Encode<C> for Assets {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let encoding = &self.1;

        match encoding.indef {
            true => e.begin_map()?,
            false => e.map(self.0.len() as u64)?,
        };

        for (policy, tokens) in self.0.iter() {
            e.encode_with(policy, ctx)?;

            let indef = encoding.indef_policies.contains(policy);

            match indef {
                true => e.begin_map()?,
                false => e.map(tokens.len() as u64)?,
            };

            for (name, quantity) in tokens {
                e.encode_with(name, ctx)?;
                e.encode_with(plutus::BigInt::from_num(quantity), ctx)?;
            }

            if indef {
                e.end()?;
            }
        }

        if encoding.indef {
            e.end()?;
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Assets {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let entries: KeyValuePairs<MintingPolicyHash, WireTokens> = d.decode_with(ctx)?;

        let mut encoding = AssetsEncoding {
            indef: entries.is_indef(),
            indef_policies: vec![],
        };

        let policies = entries
            .to_vec()
            .into_iter()
            .map(|(policy, tokens)| {
                if tokens.is_indef() {
                    encoding.indef_policies.push(policy);
                }

                let tokens = tokens
                    .to_vec()
                    .into_iter()
                    .map(|(name, quantity)| (name, quantity.to_num()))
                    .collect();

                (policy, tokens)
            })
            .collect();

        Ok(Assets(policies, encoding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(byte: u8) -> MintingPolicyHash {
        MintingPolicyHash::new([byte; 28])
    }

    fn class(p: u8, name: &str) -> AssetClass {
        AssetClass::new(policy(p), name)
    }

    fn any_assets() -> impl Strategy<Value = Assets> {
        let entry = (0u8..4, "[a-c]{0,3}", -5i64..5);

        prop::collection::vec(entry, 0..12).prop_map(|entries| {
            Assets::from_pairs(entries.into_iter().map(|(p, n, q)| (class(p, &n), q)))
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(assets in any_assets()) {
            let mut once = assets.clone();
            once.normalize();

            let mut twice = once.clone();
            twice.normalize();

            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalize_keeps_totals(assets in any_assets()) {
            let mut normal = assets.clone();
            normal.normalize();

            for (p, n, _) in assets.iter() {
                prop_assert_eq!(assets.get(p, n), normal.get(p, n));
            }
        }

        #[test]
        fn sort_yields_strict_order(assets in any_assets()) {
            for order in [AssetOrder::ShortestFirst, AssetOrder::Lexicographic] {
                let mut sorted = assets.clone();
                sorted.normalize();
                sorted.sort(order);

                prop_assert!(sorted.is_sorted(order));
            }
        }

        #[test]
        fn add_then_subtract_is_identity(a in any_assets(), b in any_assets()) {
            prop_assert!(a.add(&b).subtract(&b).is_equal(&a));
        }

        #[test]
        fn greater_or_equal_is_reflexive(a in any_assets()) {
            prop_assert!(a.is_greater_or_equal(&a));
        }
    }

    #[test]
    fn orders_diverge_on_name_length() {
        // "a" / "bb" agree under both orders, "ab" / "b" don't
        let mut agree = Assets::from_pairs([(class(1, "bb"), 1), (class(1, "a"), 1)]);
        agree.sort(AssetOrder::Lexicographic);
        assert!(agree.is_sorted(AssetOrder::ShortestFirst));

        let mut assets = Assets::from_pairs([(class(1, "ab"), 1), (class(1, "b"), 1)]);
        assets.sort(AssetOrder::Lexicographic);
        assert!(assets.is_sorted(AssetOrder::Lexicographic));
        assert!(!assets.is_sorted(AssetOrder::ShortestFirst));

        assets.sort(AssetOrder::ShortestFirst);
        assert!(assets.is_sorted(AssetOrder::ShortestFirst));
        assert!(!assets.is_sorted(AssetOrder::Lexicographic));

        let names: Vec<_> = assets.iter().map(|(_, n, _)| n.clone()).collect();
        assert_eq!(names, vec![AssetName::from("b"), AssetName::from("ab")]);
    }

    #[test]
    fn duplicate_names_are_not_sorted() {
        let assets = Assets::from_pairs([(class(1, "a"), 1), (class(1, "a"), 2)]);

        assert!(!assets.is_sorted(AssetOrder::Lexicographic));
    }

    #[test]
    fn zero_is_only_greater_or_equal_to_zero() {
        let zero = Assets::new();
        let some = Assets::from_pairs([(class(1, "a"), 3)]);
        let debt = Assets::from_pairs([(class(1, "a"), -3)]);

        assert!(zero.is_greater_or_equal(&zero));
        assert!(!zero.is_greater_or_equal(&some));
        assert!(!zero.is_greater_or_equal(&debt));
        assert!(some.is_greater_or_equal(&zero));
        assert!(!debt.is_greater_or_equal(&zero));
    }

    #[test]
    fn greater_than_is_strict() {
        let small = Assets::from_pairs([(class(1, "a"), 1), (class(2, "b"), 5)]);
        let large = Assets::from_pairs([(class(1, "a"), 2), (class(2, "b"), 6)]);
        let mixed = Assets::from_pairs([(class(1, "a"), 2), (class(2, "b"), 5)]);

        assert!(large.is_greater_than(&small));
        assert!(!mixed.is_greater_than(&small));
        assert!(mixed.is_greater_or_equal(&small));
    }

    #[test]
    fn positive_check_names_offender() {
        let assets = Assets::from_pairs([(class(1, "a"), 1), (class(1, "b"), -1)]);

        match assets.assert_all_positive() {
            Err(Error::NonPositiveQuantity { quantity, .. }) => assert_eq!(quantity, "-1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn multiply_scales_everything() {
        let assets = Assets::from_pairs([(class(1, "a"), 2), (class(2, "b"), -3)]);
        let scaled = assets.multiply(4);

        assert_eq!(scaled.get(&policy(1), b"a"), BigInt::from(8));
        assert_eq!(scaled.get(&policy(2), b"b"), BigInt::from(-12));
        assert!(assets.multiply(0).is_empty());
    }

    #[test]
    fn cbor_keeps_decoded_order() {
        // {policy2: {"b": 1}, policy1: {"a": 1}}, deliberately not sorted
        let mut assets = Assets::new();
        assets.add_component(policy(2), "b", 1);
        assets.add_component(policy(1), "a", 1);

        let bytes = minicbor::to_vec(&assets).unwrap();
        let back: Assets = minicbor::decode(&bytes).unwrap();

        assert_eq!(back, assets);
        assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
    }

    #[test]
    fn huge_quantities_survive_cbor() {
        let huge: BigInt = BigInt::from(u64::MAX) * 1000;
        let assets = Assets::from_pairs([(class(1, "a"), huge.clone())]);

        let bytes = minicbor::to_vec(&assets).unwrap();
        let back: Assets = minicbor::decode(&bytes).unwrap();

        assert_eq!(back.get(&policy(1), b"a"), huge);
    }

    #[test]
    fn indefinite_maps_keep_their_framing() {
        let p1 = "01".repeat(28);

        for hex_cbor in [
            format!("bf581c{p1}a1416101ff"),
            format!("a1581c{p1}bf416101ff"),
            format!("bf581c{p1}bf416101ffff"),
        ] {
            let bytes = hex::decode(&hex_cbor).unwrap();
            let assets: Assets = minicbor::decode(&bytes).unwrap();

            assert_eq!(minicbor::to_vec(&assets).unwrap(), bytes, "{hex_cbor}");
            assert_eq!(assets, Assets::from_pairs([(class(1, "a"), 1)]));
        }
    }

    #[test]
    fn repeated_policies_are_listed_twice() {
        let p1 = "01".repeat(28);
        let bytes = hex::decode(format!("a2581c{p1}a1416101581c{p1}a1416201")).unwrap();
        let assets: Assets = minicbor::decode(&bytes).unwrap();

        assert_eq!(assets.all_policies(), vec![policy(1), policy(1)]);
        assert_eq!(minicbor::to_vec(&assets).unwrap(), bytes);
    }

    #[test]
    fn script_context_form_has_zero_lovelace_entry() {
        let assets = Assets::from_pairs([(class(1, "a"), 1)]);

        let plain = assets.to_plutus_data(AssetOrder::Lexicographic, false);
        let in_context = assets.to_plutus_data(AssetOrder::Lexicographic, true);

        assert_eq!(plain.as_map().unwrap().len(), 1);

        let entries = in_context.as_map().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], lovelace_entry(&BigInt::zero()));

        assert!(Assets::from_plutus_data(&in_context).unwrap().is_equal(&assets));
    }

    #[test]
    fn fingerprint_matches_cip14_vectors() {
        let policy: MintingPolicyHash = "7eae28af2208be856f7a119668ae52a49b73725e326dc16579dcc373"
            .parse()
            .unwrap();
        assert_eq!(
            AssetClass::new(policy, AssetName::EMPTY)
                .fingerprint()
                .unwrap(),
            "asset1rjklcrnsdzqp65wjgrg55sy9723kw09mlgvlc3"
        );

        let policy: MintingPolicyHash = "1e349c9bdea19fd6c147626a5260bc44b71635f398b67c59881df209"
            .parse()
            .unwrap();
        assert_eq!(
            AssetClass::new(policy, hex::decode("504154415445").unwrap())
                .fingerprint()
                .unwrap(),
            "asset1hv4p5tv2a837mzqrst04d0dcptdjmluqvdx9k3"
        );
    }
}
