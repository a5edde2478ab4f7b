//! Interact with ledger addresses
//!
//! This crate decodes / encodes addresses from / to their raw bytes, bech32
//! and (for legacy Byron addresses) base58 forms. The entry point is the
//! [Address] enum, which holds either a Byron or a Shelley address. Reward
//! accounts are a separate type, [StakingAddress], since they never hold
//! funds as outputs.
//!
//! The first byte of every address is a header: the high nibble selects the
//! kind of address, the low nibble carries the network tag. See
//! [CIP-19](https://cips.cardano.org/cips/cip19/) for the full table.

pub mod credential;

use std::{fmt, str::FromStr};

use tessera_codec::{
    minicbor::{self, Decode, Encode},
    plutus::{PlutusData, PlutusDataError, ToPlutusData},
};
use thiserror::Error;

pub use credential::{
    PubKeyHash, SpendingCredential, StakingCredential, StakingValidatorHash, ValidatorHash,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("error converting from/to bech32 {0}")]
    BadBech32(bech32::Error),

    #[error("error decoding base58 address")]
    BadBase58,

    #[error("error decoding hex address {0}")]
    BadHex(hex::FromHexError),

    #[error("address header not found")]
    MissingHeader,

    #[error("address header is invalid {0:08b}")]
    InvalidHeader(u8),

    #[error("pointer addresses are not supported, header {0:08b}")]
    UnsupportedPointer(u8),

    #[error("invalid operation for Byron address")]
    InvalidForByron,

    #[error("unknown hrp for network {0:08b}")]
    UnknownNetworkHrp(u8),

    #[error("unexpected bech32 hrp {0}")]
    UnexpectedHrp(String),

    #[error("invalid hash size {0}")]
    InvalidHashSize(usize),
}

/// The network tag of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Network {
    Testnet,
    Mainnet,
    Other(u8),
}

impl Network {
    /// Any tag other than zero counts as a production network
    pub fn is_mainnet(&self) -> bool {
        self.value() != 0
    }

    pub fn value(&self) -> u8 {
        match self {
            Network::Testnet => 0,
            Network::Mainnet => 1,
            Network::Other(x) => *x,
        }
    }
}

impl From<u8> for Network {
    fn from(nibble: u8) -> Self {
        match nibble & 0b0000_1111 {
            0 => Network::Testnet,
            1 => Network::Mainnet,
            x => Network::Other(x),
        }
    }
}

/// A decoded Shelley address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShelleyAddress {
    network: Network,
    spending: SpendingCredential,
    staking: Option<StakingCredential>,
}

/// Newtype representing a Byron address. The payload is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByronAddress(Vec<u8>);

/// A decoded address of any era
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Address {
    Byron(ByronAddress),
    Shelley(ShelleyAddress),
}

/// A reward account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StakingAddress {
    network: Network,
    credential: StakingCredential,
}

fn encode_bech32(addr: &[u8], hrp: &str) -> Result<String, Error> {
    let base32 = bech32::ToBase32::to_base32(&addr);
    bech32::encode(hrp, base32, bech32::Variant::Bech32).map_err(Error::BadBech32)
}

fn decode_bech32(bech32: &str) -> Result<(String, Vec<u8>), Error> {
    let (hrp, addr, _) = bech32::decode(bech32).map_err(Error::BadBech32)?;
    let base10 = bech32::FromBase32::from_base32(&addr).map_err(Error::BadBech32)?;
    Ok((hrp, base10))
}

fn exact_size(payload: &[u8], size: usize) -> Result<(), Error> {
    if payload.len() == size {
        Ok(())
    } else {
        Err(Error::InvalidHashSize(payload.len()))
    }
}

fn slice_to_hash<T>(slice: &[u8]) -> Result<T, Error>
where
    T: for<'a> TryFrom<&'a [u8]>,
{
    T::try_from(slice).map_err(|_| Error::InvalidHashSize(slice.len()))
}

macro_rules! parse_shelley_fn {
    ($name:tt, $spending:tt, $staking:tt) => {
        fn $name(header: u8, payload: &[u8]) -> Result<Address, Error> {
            exact_size(payload, 56)?;

            let addr = ShelleyAddress {
                network: Network::from(header),
                spending: SpendingCredential::$spending(slice_to_hash(&payload[..28])?),
                staking: Some(StakingCredential::$staking(slice_to_hash(&payload[28..])?)),
            };

            Ok(addr.into())
        }
    };
    ($name:tt, $spending:tt) => {
        fn $name(header: u8, payload: &[u8]) -> Result<Address, Error> {
            exact_size(payload, 28)?;

            let addr = ShelleyAddress {
                network: Network::from(header),
                spending: SpendingCredential::$spending(slice_to_hash(payload)?),
                staking: None,
            };

            Ok(addr.into())
        }
    };
}

// types 0-7 are Shelley addresses, 4 and 5 carry stake pointers
parse_shelley_fn!(parse_type_0, PubKey, PubKey);
parse_shelley_fn!(parse_type_1, Validator, PubKey);
parse_shelley_fn!(parse_type_2, PubKey, StakingValidator);
parse_shelley_fn!(parse_type_3, Validator, StakingValidator);
parse_shelley_fn!(parse_type_6, PubKey);
parse_shelley_fn!(parse_type_7, Validator);

// type 8 (1000) are Byron addresses
fn parse_type_8(header: u8, payload: &[u8]) -> Result<Address, Error> {
    let vec = [&[header], payload].concat();
    Ok(Address::Byron(ByronAddress(vec)))
}

fn bytes_to_address(bytes: &[u8]) -> Result<Address, Error> {
    let header = *bytes.first().ok_or(Error::MissingHeader)?;
    let payload = &bytes[1..];

    match header & 0b1111_0000 {
        0b0000_0000 => parse_type_0(header, payload),
        0b0001_0000 => parse_type_1(header, payload),
        0b0010_0000 => parse_type_2(header, payload),
        0b0011_0000 => parse_type_3(header, payload),
        0b0100_0000 | 0b0101_0000 => Err(Error::UnsupportedPointer(header)),
        0b0110_0000 => parse_type_6(header, payload),
        0b0111_0000 => parse_type_7(header, payload),
        0b1000_0000 => parse_type_8(header, payload),
        _ => Err(Error::InvalidHeader(header)),
    }
}

fn bytes_to_staking_address(bytes: &[u8]) -> Result<StakingAddress, Error> {
    let header = *bytes.first().ok_or(Error::MissingHeader)?;
    let payload = &bytes[1..];

    let credential = match header & 0b1111_0000 {
        0b1110_0000 => StakingCredential::PubKey(slice_to_hash(payload)?),
        0b1111_0000 => StakingCredential::StakingValidator(slice_to_hash(payload)?),
        _ => return Err(Error::InvalidHeader(header)),
    };

    Ok(StakingAddress {
        network: Network::from(header),
        credential,
    })
}

impl ByronAddress {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        match Address::from_bytes(bytes)? {
            Address::Byron(x) => Ok(x),
            Address::Shelley(x) => Err(Error::InvalidHeader(x.header())),
        }
    }

    pub fn from_base58(value: &str) -> Result<Self, Error> {
        let bytes = base58::FromBase58::from_base58(value).map_err(|_| Error::BadBase58)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_base58(&self) -> String {
        base58::ToBase58::to_base58(self.0.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Gets a numeric id describing the type of the address
    pub fn typeid(&self) -> u8 {
        0b1000
    }
}

impl ShelleyAddress {
    pub fn new(
        network: Network,
        spending: SpendingCredential,
        staking: Option<StakingCredential>,
    ) -> Self {
        Self {
            network,
            spending,
            staking,
        }
    }

    /// Gets the network associated with this address
    pub fn network(&self) -> Network {
        self.network
    }

    pub fn is_mainnet(&self) -> bool {
        self.network.is_mainnet()
    }

    pub fn spending_credential(&self) -> &SpendingCredential {
        &self.spending
    }

    pub fn staking_credential(&self) -> Option<&StakingCredential> {
        self.staking.as_ref()
    }

    /// Gets a numeric id describing the type of the address
    pub fn typeid(&self) -> u8 {
        use SpendingCredential as P;
        use StakingCredential as S;

        match (&self.spending, &self.staking) {
            (P::PubKey(_), Some(S::PubKey(_))) => 0b0000,
            (P::Validator(_), Some(S::PubKey(_))) => 0b0001,
            (P::PubKey(_), Some(S::StakingValidator(_))) => 0b0010,
            (P::Validator(_), Some(S::StakingValidator(_))) => 0b0011,
            (P::PubKey(_), None) => 0b0110,
            (P::Validator(_), None) => 0b0111,
        }
    }

    pub fn header(&self) -> u8 {
        (self.typeid() << 4) | self.network.value()
    }

    /// Gets the bech32 human-readable-part for this address
    pub fn hrp(&self) -> Result<&'static str, Error> {
        match &self.network {
            Network::Testnet => Ok("addr_test"),
            Network::Mainnet => Ok("addr"),
            Network::Other(x) => Err(Error::UnknownNetworkHrp(*x)),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(57);
        out.push(self.header());
        out.extend_from_slice(self.spending.as_hash().as_ref());

        if let Some(staking) = &self.staking {
            out.extend_from_slice(staking.as_hash().as_ref());
        }

        out
    }

    /// Indicates if either the spending or staking part is a script
    pub fn has_script(&self) -> bool {
        self.spending.is_script() || self.staking.map(|x| x.is_script()).unwrap_or(false)
    }

    /// Rebuilds an address from its on-chain form. The on-chain form has no
    /// network tag, so the caller provides it.
    pub fn from_plutus_data(network: Network, data: &PlutusData) -> Result<Self, PlutusDataError> {
        use tessera_codec::plutus::FromPlutusData;

        let fields = data.expect_constr(0, 2)?;
        let spending = SpendingCredential::from_plutus_data(&fields[0])?;
        let staking = fields[1]
            .as_option()?
            .map(StakingCredential::from_staking_hash_data)
            .transpose()?;

        Ok(Self::new(network, spending, staking))
    }
}

impl ToPlutusData for ShelleyAddress {
    fn to_plutus_data(&self) -> PlutusData {
        // `Maybe StakingCredential`, Nothing is constructor 1
        let staking = PlutusData::option(
            self.staking
                .as_ref()
                .map(StakingCredential::to_staking_hash_data),
        );

        PlutusData::constr(0, vec![self.spending.to_plutus_data(), staking])
    }
}

impl StakingAddress {
    pub fn from_credential(network: Network, credential: StakingCredential) -> Self {
        Self {
            network,
            credential,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        bytes_to_staking_address(bytes)
    }

    pub fn from_bech32(value: &str) -> Result<Self, Error> {
        let (hrp, bytes) = decode_bech32(value)?;
        let addr = Self::from_bytes(&bytes)?;

        match addr.hrp() {
            Ok(expected) if expected == hrp => Ok(addr),
            _ => Err(Error::UnexpectedHrp(hrp)),
        }
    }

    pub fn to_bech32(&self) -> Result<String, Error> {
        encode_bech32(&self.to_vec(), self.hrp()?)
    }

    /// Gets the network associated with this address
    pub fn network(&self) -> Network {
        self.network
    }

    pub fn is_mainnet(&self) -> bool {
        self.network.is_mainnet()
    }

    pub fn credential(&self) -> &StakingCredential {
        &self.credential
    }

    /// Gets a numeric id describing the type of the address
    pub fn typeid(&self) -> u8 {
        match &self.credential {
            StakingCredential::PubKey(_) => 0b1110,
            StakingCredential::StakingValidator(_) => 0b1111,
        }
    }

    pub fn header(&self) -> u8 {
        (self.typeid() << 4) | self.network.value()
    }

    /// Gets the bech32 human-readable-part for this address
    pub fn hrp(&self) -> Result<&'static str, Error> {
        match &self.network {
            Network::Testnet => Ok("stake_test"),
            Network::Mainnet => Ok("stake"),
            Network::Other(x) => Err(Error::UnknownNetworkHrp(*x)),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        [&[self.header()], self.credential.as_hash().as_ref()].concat()
    }

    pub fn is_script(&self) -> bool {
        self.credential.is_script()
    }
}

impl Address {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        bytes_to_address(bytes)
    }

    pub fn from_hex(value: &str) -> Result<Self, Error> {
        let bytes = hex::decode(value).map_err(Error::BadHex)?;
        bytes_to_address(&bytes)
    }

    /// Tries to parse a bech32 address into an Address
    pub fn from_bech32(value: &str) -> Result<Self, Error> {
        let (hrp, bytes) = decode_bech32(value)?;
        let addr = bytes_to_address(&bytes)?;

        match addr.hrp() {
            Ok(expected) if expected == hrp => Ok(addr),
            _ => Err(Error::UnexpectedHrp(hrp)),
        }
    }

    /// Tries to encode an Address into a bech32 string
    pub fn to_bech32(&self) -> Result<String, Error> {
        match self {
            Address::Byron(_) => Err(Error::InvalidForByron),
            Address::Shelley(x) => encode_bech32(&x.to_vec(), x.hrp()?),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            Address::Byron(x) => x.0.clone(),
            Address::Shelley(x) => x.to_vec(),
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_vec())
    }

    pub fn header(&self) -> u8 {
        match self {
            Address::Byron(x) => x.0.first().copied().unwrap_or_default(),
            Address::Shelley(x) => x.header(),
        }
    }

    /// Gets the network associated with this address
    pub fn network(&self) -> Option<Network> {
        match self {
            Address::Byron(_) => None,
            Address::Shelley(x) => Some(x.network()),
        }
    }

    pub fn is_mainnet(&self) -> Option<bool> {
        self.network().map(|x| x.is_mainnet())
    }

    /// Gets a numeric id describing the type of the address
    pub fn typeid(&self) -> u8 {
        match self {
            Address::Byron(x) => x.typeid(),
            Address::Shelley(x) => x.typeid(),
        }
    }

    /// Gets the bech32 human-readable-part for this address
    pub fn hrp(&self) -> Result<&'static str, Error> {
        match self {
            Address::Byron(_) => Err(Error::InvalidForByron),
            Address::Shelley(x) => x.hrp(),
        }
    }

    pub fn spending_credential(&self) -> Option<&SpendingCredential> {
        match self {
            Address::Byron(_) => None,
            Address::Shelley(x) => Some(x.spending_credential()),
        }
    }

    pub fn staking_credential(&self) -> Option<&StakingCredential> {
        match self {
            Address::Byron(_) => None,
            Address::Shelley(x) => x.staking_credential(),
        }
    }

    /// Indicates if this is address includes a script hash
    pub fn has_script(&self) -> bool {
        match self {
            Address::Byron(_) => false,
            Address::Shelley(x) => x.has_script(),
        }
    }

    /// Indicates if this is an enterprise address
    pub fn is_enterprise(&self) -> bool {
        match self {
            Address::Shelley(x) => x.staking.is_none(),
            _ => false,
        }
    }

    /// The on-chain form of the address. Byron addresses have none.
    pub fn to_plutus_data(&self) -> Result<PlutusData, Error> {
        match self {
            Address::Byron(_) => Err(Error::InvalidForByron),
            Address::Shelley(x) => Ok(x.to_plutus_data()),
        }
    }
}

impl From<ByronAddress> for Address {
    fn from(addr: ByronAddress) -> Self {
        Address::Byron(addr)
    }
}

impl From<ShelleyAddress> for Address {
    fn from(addr: ShelleyAddress) -> Self {
        Address::Shelley(addr)
    }
}

/* Text forms ************************************************************** */

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Byron(x) => f.write_str(&x.to_base58()),
            Address::Shelley(_) => match self.to_bech32() {
                Ok(text) => f.write_str(&text),
                Err(_) => f.write_str(&self.to_hex()),
            },
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Address::from_bech32(s) {
            Ok(x) => Ok(x),
            Err(Error::BadBech32(_)) => ByronAddress::from_base58(s).map(Address::Byron),
            Err(err) => Err(err),
        }
    }
}

impl fmt::Display for StakingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str(&hex::encode(self.to_vec())),
        }
    }
}

impl FromStr for StakingAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StakingAddress::from_bech32(s)
    }
}

/* Cbor ******************************************************************** */

macro_rules! impl_bytes_cbor {
    ($Type:ty, $parse:path) => {
        impl<C> Encode<C> for $Type {
            fn encode<W: minicbor::encode::Write>(
                &self,
                e: &mut minicbor::Encoder<W>,
                _ctx: &mut C,
            ) -> Result<(), minicbor::encode::Error<W::Error>> {
                e.bytes(&self.to_vec())?.ok()
            }
        }

        impl<'b, C> Decode<'b, C> for $Type {
            fn decode(
                d: &mut minicbor::Decoder<'b>,
                _ctx: &mut C,
            ) -> Result<Self, minicbor::decode::Error> {
                let position = d.position();
                let bytes = d.bytes()?;

                $parse(bytes).map_err(|err| {
                    minicbor::decode::Error::message(format!("{err} at offset {position}"))
                })
            }
        }
    };
}

impl_bytes_cbor!(Address, Address::from_bytes);
impl_bytes_cbor!(StakingAddress, StakingAddress::from_bytes);

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_crypto::hash::Hasher;
    use test_case::test_case;

    const MAINNET_TEST_VECTORS: &[(&str, u8)] = &[
        ("addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgse35a3x", 00u8),
        ("addr1z8phkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gten0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgs9yc0hh", 01u8),
        ("addr1yx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzerkr0vd4msrxnuwnccdxlhdjar77j6lg0wypcc9uar5d2shs2z78ve", 02u8),
        ("addr1x8phkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gt7r0vd4msrxnuwnccdxlhdjar77j6lg0wypcc9uar5d2shskhj42g", 03u8),
        ("addr1vx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzers66hrl8", 06u8),
        ("addr1w8phkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gtcyjy7wx", 07u8),
    ];

    const POINTER_VECTORS: &[&str] = &[
        "addr1gx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer5pnz75xxcrzqf96k",
        "addr128phkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gtupnz75xxcrtw79hu",
    ];

    const STAKE_VECTORS: &[(&str, u8)] = &[
        ("stake1uyehkck0lajq8gr28t9uxnuvgcqrc6070x3k9r8048z8y5gh6ffgw", 14u8),
        ("stake178phkx6acpnf78fuvxn0mkew3l0fd058hzquvz7w36x4gtcccycj5", 15u8),
    ];

    const PAYMENT_PUBLIC_KEY: &str =
        "addr_vk1w0l2sr2zgfm26ztc6nl9xy8ghsk5sh6ldwemlpmp9xylzy4dtf7st80zhd";
    const STAKE_PUBLIC_KEY: &str =
        "stake_vk1px4j0r2fk7ux5p23shz8f3y5y2qam7s954rgf3lg5merqcj6aetsft99wu";
    const SCRIPT_HASH: &str = "script1cda3khwqv60360rp5m7akt50m6ttapacs8rqhn5w342z7r35m37";

    fn hash_vector_key(key: &str) -> PubKeyHash {
        let (_, x) = decode_bech32(key).unwrap();
        Hasher::<224>::hash(&x).into()
    }

    fn script_vector() -> [u8; 28] {
        let (_, x) = decode_bech32(SCRIPT_HASH).unwrap();
        x.try_into().unwrap()
    }

    #[test]
    fn roundtrip_bech32() {
        for (original, typeid) in MAINNET_TEST_VECTORS {
            let addr = Address::from_bech32(original).unwrap();
            assert_eq!(addr.to_bech32().unwrap(), *original);
            assert_eq!(addr.typeid(), *typeid);
            assert_eq!(addr.network(), Some(Network::Mainnet));
        }

        for (original, typeid) in STAKE_VECTORS {
            let addr = StakingAddress::from_bech32(original).unwrap();
            assert_eq!(addr.to_bech32().unwrap(), *original);
            assert_eq!(addr.typeid(), *typeid);
        }
    }

    #[test]
    fn payload_matches() {
        for (original, _) in MAINNET_TEST_VECTORS {
            let Address::Shelley(x) = Address::from_bech32(original).unwrap() else {
                unreachable!()
            };

            match x.spending_credential() {
                SpendingCredential::PubKey(hash) => {
                    assert_eq!(*hash, hash_vector_key(PAYMENT_PUBLIC_KEY))
                }
                SpendingCredential::Validator(hash) => {
                    assert_eq!(*hash, ValidatorHash::new(script_vector()))
                }
            }

            match x.staking_credential() {
                Some(StakingCredential::PubKey(hash)) => {
                    assert_eq!(*hash, hash_vector_key(STAKE_PUBLIC_KEY))
                }
                Some(StakingCredential::StakingValidator(hash)) => {
                    assert_eq!(*hash, StakingValidatorHash::new(script_vector()))
                }
                None => assert!(x.typeid() >= 6),
            }
        }
    }

    #[test]
    fn pointers_are_rejected() {
        for original in POINTER_VECTORS {
            let err = Address::from_bech32(original).unwrap_err();
            assert!(matches!(err, Error::UnsupportedPointer(h) if h >> 4 == 4 || h >> 4 == 5));
        }
    }

    #[test]
    fn stake_header_is_not_an_address() {
        let (_, bytes) = decode_bech32(STAKE_VECTORS[0].0).unwrap();

        assert!(matches!(
            Address::from_bytes(&bytes),
            Err(Error::InvalidHeader(0xe1))
        ));
    }

    #[test_case(0x00; "key key testnet")]
    #[test_case(0x01; "key key mainnet")]
    #[test_case(0x10; "script key testnet")]
    #[test_case(0x11; "script key mainnet")]
    #[test_case(0x20; "key script testnet")]
    #[test_case(0x21; "key script mainnet")]
    #[test_case(0x30; "script script testnet")]
    #[test_case(0x31; "script script mainnet")]
    #[test_case(0x60; "key enterprise testnet")]
    #[test_case(0x61; "key enterprise mainnet")]
    #[test_case(0x70; "script enterprise testnet")]
    #[test_case(0x71; "script enterprise mainnet")]
    fn header_roundtrip(header: u8) {
        let mut bytes = vec![header];
        bytes.extend([0x11; 28]);

        if header >> 4 < 4 {
            bytes.extend([0x22; 28]);
        }

        let addr = Address::from_bytes(&bytes).unwrap();

        assert_eq!(addr.to_vec(), bytes);
        assert_eq!(addr.header(), header);
        assert_eq!(addr.is_mainnet(), Some(header & 0x0f == 1));

        let cbor = minicbor::to_vec(&addr).unwrap();
        let back: Address = minicbor::decode(&cbor).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn testnet_key_key_keeps_hashes() {
        let spending = PubKeyHash::new([0xaa; 28]);
        let staking = PubKeyHash::new([0xbb; 28]);

        let addr = ShelleyAddress::new(
            Network::Testnet,
            SpendingCredential::PubKey(spending),
            Some(StakingCredential::PubKey(staking)),
        );

        assert_eq!(addr.header(), 0x00);

        let Address::Shelley(back) = Address::from_bytes(&addr.to_vec()).unwrap() else {
            unreachable!()
        };

        assert_eq!(back.spending_credential().pub_key_hash(), Some(&spending));
        assert_eq!(
            back.staking_credential(),
            Some(&StakingCredential::PubKey(staking))
        );
        assert!(Address::Shelley(back)
            .to_string()
            .starts_with("addr_test1"));
    }

    #[test]
    fn other_network_counts_as_mainnet() {
        let mut bytes = vec![0x63];
        bytes.extend([0x11; 28]);

        let addr = Address::from_bytes(&bytes).unwrap();

        assert_eq!(addr.network(), Some(Network::Other(3)));
        assert_eq!(addr.is_mainnet(), Some(true));
        assert!(matches!(addr.to_bech32(), Err(Error::UnknownNetworkHrp(3))));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut bytes = vec![0x01];
        bytes.extend([0x11; 40]);

        assert!(matches!(
            Address::from_bytes(&bytes),
            Err(Error::InvalidHashSize(40))
        ));
        assert!(matches!(Address::from_bytes(&[]), Err(Error::MissingHeader)));
    }

    #[test]
    fn enterprise_staking_is_nothing_on_chain() {
        let addr = ShelleyAddress::new(
            Network::Mainnet,
            SpendingCredential::PubKey(PubKeyHash::new([1; 28])),
            None,
        );

        let data = addr.to_plutus_data();
        let fields = data.expect_constr(0, 2).unwrap();

        assert_eq!(fields[1], PlutusData::constr(1, vec![]));
        assert_eq!(
            ShelleyAddress::from_plutus_data(Network::Mainnet, &data).unwrap(),
            addr
        );
    }

    #[test]
    fn base_address_staking_is_just_staking_hash() {
        let staking = StakingCredential::PubKey(PubKeyHash::new([2; 28]));
        let addr = ShelleyAddress::new(
            Network::Testnet,
            SpendingCredential::Validator(ValidatorHash::new([1; 28])),
            Some(staking),
        );

        let data = addr.to_plutus_data();
        let fields = data.expect_constr(0, 2).unwrap();

        assert_eq!(
            fields[1],
            PlutusData::constr(0, vec![staking.to_staking_hash_data()])
        );
        assert_eq!(
            ShelleyAddress::from_plutus_data(Network::Testnet, &data).unwrap(),
            addr
        );
    }

    #[test]
    fn byron_roundtrips_base58() {
        let text = "Ae2tdPwUPEZ4YjgvykNpoFeYUxoyhNj2kg8KfKWN2FizsSpLUPv68MpTVDo";
        let addr: Address = text.parse().unwrap();

        assert_eq!(addr.typeid(), 8);
        assert_eq!(addr.to_string(), text);
        assert!(matches!(addr.to_plutus_data(), Err(Error::InvalidForByron)));
    }
}
