//! Stake registration, delegation and pool certificates

use crate::{params::RationalNumber, Coin, Epoch, NetworkParams};
use serde::{Deserialize, Serialize};
use tessera_addresses::{PubKeyHash, StakingAddress, StakingCredential, StakingValidatorHash};
use tessera_codec::{
    minicbor::{self, Decode, Encode},
    plutus::{PlutusData, ToPlutusData},
    utils::{unexpected_len, Bytes, Nullable, Set},
};
use tessera_crypto::{hash::Hash, hash_kind};

hash_kind!(
    /// Blake2b-224 hash of a pool operator's cold key
    PoolKeyHash,
    28
);

hash_kind!(
    /// Blake2b-256 hash of a pool's VRF verification key
    VrfKeyHash,
    32
);

pub type Port = u32;
pub type IPv4 = Bytes;
pub type IPv6 = Bytes;
pub type DnsName = String;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Relay {
    SingleHostAddr(Nullable<Port>, Nullable<IPv4>, Nullable<IPv6>),
    SingleHostName(Nullable<Port>, DnsName),
    MultiHostName(DnsName),
}

impl<'b, C> minicbor::decode::Decode<'b, C> for Relay {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let len = d.array()?;
        let variant = d.u16()?;

        let expected = match variant {
            0 => 4,
            1 => 3,
            2 => 2,
            x => {
                return Err(minicbor::decode::Error::message(format!(
                    "invalid relay kind {x} at offset {position}"
                )))
            }
        };

        if len != Some(expected) {
            return Err(unexpected_len("relay", expected, len, position));
        }

        match variant {
            0 => Ok(Relay::SingleHostAddr(
                d.decode_with(ctx)?,
                d.decode_with(ctx)?,
                d.decode_with(ctx)?,
            )),
            1 => Ok(Relay::SingleHostName(
                d.decode_with(ctx)?,
                d.decode_with(ctx)?,
            )),
            _ => Ok(Relay::MultiHostName(d.decode_with(ctx)?)),
        }
    }
}

impl<C> minicbor::encode::Encode<C> for Relay {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            Relay::SingleHostAddr(a, b, c) => {
                e.array(4)?;
                e.encode_with(0, ctx)?;
                e.encode_with(a, ctx)?;
                e.encode_with(b, ctx)?;
                e.encode_with(c, ctx)?;

                Ok(())
            }
            Relay::SingleHostName(a, b) => {
                e.array(3)?;
                e.encode_with(1, ctx)?;
                e.encode_with(a, ctx)?;
                e.encode_with(b, ctx)?;

                Ok(())
            }
            Relay::MultiHostName(a) => {
                e.array(2)?;
                e.encode_with(2, ctx)?;
                e.encode_with(a, ctx)?;

                Ok(())
            }
        }
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Debug, PartialEq, Eq, Clone)]
pub struct PoolMetadata {
    #[n(0)]
    pub url: String,

    #[n(1)]
    pub hash: Hash<32>,
}

/// Everything a pool registration commits to
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PoolParameters {
    pub operator: PoolKeyHash,
    pub vrf_keyhash: VrfKeyHash,
    pub pledge: Coin,
    pub cost: Coin,
    pub margin: RationalNumber,
    pub reward_account: StakingAddress,
    pub owners: Set<PubKeyHash>,
    pub relays: Vec<Relay>,
    pub metadata: Nullable<PoolMetadata>,
}

/// A delegation certificate
///
/// The variant tags (0 to 4) are shared by the ledger encoding and the
/// on-chain data of PlutusV2 contexts.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DCert {
    Registration(StakingCredential),
    Deregistration(StakingCredential),
    Delegation(StakingCredential, PoolKeyHash),
    RegisterPool(Box<PoolParameters>),
    RetirePool(PoolKeyHash, Epoch),
}

impl DCert {
    pub fn tag(&self) -> u8 {
        match self {
            DCert::Registration(_) => 0,
            DCert::Deregistration(_) => 1,
            DCert::Delegation(..) => 2,
            DCert::RegisterPool(_) => 3,
            DCert::RetirePool(..) => 4,
        }
    }

    /// Lovelace locked by this certificate
    pub fn deposit(&self, params: &NetworkParams) -> Coin {
        match self {
            DCert::Registration(_) => params.stake_address_deposit,
            DCert::RegisterPool(_) => params.pool_deposit,
            _ => 0,
        }
    }

    /// Lovelace released back into the transaction by this certificate
    ///
    /// Pool deposits are returned to the reward account at the epoch
    /// boundary, not to the retiring transaction.
    pub fn refund(&self, params: &NetworkParams) -> Coin {
        match self {
            DCert::Deregistration(_) => params.stake_address_deposit,
            _ => 0,
        }
    }

    /// The script that must witness this certificate, if its credential is
    /// script-controlled
    pub fn required_script(&self) -> Option<&StakingValidatorHash> {
        match self {
            DCert::Deregistration(credential) | DCert::Delegation(credential, _) => {
                credential.staking_validator_hash()
            }
            _ => None,
        }
    }

    pub fn staking_credential(&self) -> Option<&StakingCredential> {
        match self {
            DCert::Registration(x) | DCert::Deregistration(x) | DCert::Delegation(x, _) => Some(x),
            _ => None,
        }
    }

    /// `DCert` as seen by PlutusV1 and V2 scripts, credentials wrapped as
    /// `StakingHash`
    pub fn to_plutus_data_v2(&self) -> PlutusData {
        match self {
            DCert::Registration(credential) => {
                PlutusData::constr(0, vec![credential.to_staking_hash_data()])
            }
            DCert::Deregistration(credential) => {
                PlutusData::constr(1, vec![credential.to_staking_hash_data()])
            }
            DCert::Delegation(credential, pool) => PlutusData::constr(
                2,
                vec![credential.to_staking_hash_data(), pool.to_plutus_data()],
            ),
            DCert::RegisterPool(params) => PlutusData::constr(
                3,
                vec![
                    params.operator.to_plutus_data(),
                    params.vrf_keyhash.to_plutus_data(),
                ],
            ),
            DCert::RetirePool(pool, epoch) => {
                PlutusData::constr(4, vec![pool.to_plutus_data(), epoch.to_plutus_data()])
            }
        }
    }

    /// `TxCert` as seen by PlutusV3 scripts
    ///
    /// Deposits are not recorded on pre-Conway certificates, so the
    /// optional deposit field is always `Nothing`.
    pub fn to_plutus_data_v3(&self) -> PlutusData {
        let nothing = || PlutusData::option(None);

        match self {
            DCert::Registration(credential) => {
                PlutusData::constr(0, vec![credential.to_plutus_data(), nothing()])
            }
            DCert::Deregistration(credential) => {
                PlutusData::constr(1, vec![credential.to_plutus_data(), nothing()])
            }
            DCert::Delegation(credential, pool) => PlutusData::constr(
                2,
                vec![
                    credential.to_plutus_data(),
                    PlutusData::constr(0, vec![pool.to_plutus_data()]),
                ],
            ),
            DCert::RegisterPool(params) => PlutusData::constr(
                7,
                vec![
                    params.operator.to_plutus_data(),
                    params.vrf_keyhash.to_plutus_data(),
                ],
            ),
            DCert::RetirePool(pool, epoch) => {
                PlutusData::constr(8, vec![pool.to_plutus_data(), epoch.to_plutus_data()])
            }
        }
    }
}

impl<C> minicbor::Encode<C> for DCert {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            DCert::Registration(credential) | DCert::Deregistration(credential) => {
                e.array(2)?;
                e.u8(self.tag())?;
                e.encode_with(credential, ctx)?;
            }
            DCert::Delegation(credential, pool) => {
                e.array(3)?;
                e.u8(2)?;
                e.encode_with(credential, ctx)?;
                e.encode_with(pool, ctx)?;
            }
            DCert::RegisterPool(params) => {
                e.array(10)?;
                e.u8(3)?;
                e.encode_with(params.operator, ctx)?;
                e.encode_with(params.vrf_keyhash, ctx)?;
                e.u64(params.pledge)?;
                e.u64(params.cost)?;
                e.encode_with(params.margin, ctx)?;
                e.encode_with(params.reward_account, ctx)?;
                e.encode_with(&params.owners, ctx)?;
                e.encode_with(&params.relays, ctx)?;
                e.encode_with(&params.metadata, ctx)?;
            }
            DCert::RetirePool(pool, epoch) => {
                e.array(3)?;
                e.u8(4)?;
                e.encode_with(pool, ctx)?;
                e.u64(*epoch)?;
            }
        }

        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for DCert {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let len = d.array()?;
        let variant = d.u8()?;

        let expected = match variant {
            0 | 1 => 2,
            2 | 4 => 3,
            3 => 10,
            x => {
                return Err(minicbor::decode::Error::message(format!(
                    "unsupported certificate kind {x} at offset {position}"
                )))
            }
        };

        if len != Some(expected) {
            return Err(unexpected_len("certificate", expected, len, position));
        }

        match variant {
            0 => Ok(DCert::Registration(d.decode_with(ctx)?)),
            1 => Ok(DCert::Deregistration(d.decode_with(ctx)?)),
            2 => Ok(DCert::Delegation(d.decode_with(ctx)?, d.decode_with(ctx)?)),
            3 => Ok(DCert::RegisterPool(Box::new(PoolParameters {
                operator: d.decode_with(ctx)?,
                vrf_keyhash: d.decode_with(ctx)?,
                pledge: d.u64()?,
                cost: d.u64()?,
                margin: d.decode_with(ctx)?,
                reward_account: d.decode_with(ctx)?,
                owners: d.decode_with(ctx)?,
                relays: d.decode_with(ctx)?,
                metadata: d.decode_with(ctx)?,
            }))),
            _ => Ok(DCert::RetirePool(d.decode_with(ctx)?, d.u64()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_addresses::Network;
    use tessera_codec::utils::ListEncoding;

    fn script_credential() -> StakingCredential {
        StakingCredential::StakingValidator(StakingValidatorHash::new([5; 28]))
    }

    fn pool_params() -> PoolParameters {
        PoolParameters {
            operator: PoolKeyHash::new([1; 28]),
            vrf_keyhash: VrfKeyHash::new([2; 32]),
            pledge: 1_000_000,
            cost: 340_000_000,
            margin: RationalNumber::new(1, 100),
            reward_account: StakingAddress::from_credential(
                Network::Mainnet,
                StakingCredential::PubKey(PubKeyHash::new([3; 28])),
            ),
            owners: Set::new(vec![PubKeyHash::new([3; 28])], ListEncoding::TaggedSet),
            relays: vec![
                Relay::SingleHostAddr(
                    Nullable::Some(3001),
                    Nullable::Some(vec![127, 0, 0, 1].into()),
                    Nullable::Null,
                ),
                Relay::MultiHostName("relays.example.com".into()),
            ],
            metadata: Nullable::Some(PoolMetadata {
                url: "https://example.com/pool.json".into(),
                hash: Hash::new([4; 32]),
            }),
        }
    }

    #[test]
    fn all_kinds_round_trip() {
        let certs = vec![
            DCert::Registration(script_credential()),
            DCert::Deregistration(script_credential()),
            DCert::Delegation(script_credential(), PoolKeyHash::new([1; 28])),
            DCert::RegisterPool(Box::new(pool_params())),
            DCert::RetirePool(PoolKeyHash::new([1; 28]), 300),
        ];

        for cert in certs {
            let bytes = minicbor::to_vec(&cert).unwrap();
            assert_eq!(bytes[1], cert.tag());

            let back: DCert = minicbor::decode(&bytes).unwrap();
            assert_eq!(back, cert);
            assert_eq!(minicbor::to_vec(&back).unwrap(), bytes);
        }
    }

    #[test]
    fn governance_certificates_are_rejected() {
        // [7, [0, h'..'], 0]: a Conway registration with deposit
        let mut bytes = hex::decode("83078200581c").unwrap();
        bytes.extend([0; 28]);
        bytes.push(0);

        let err = minicbor::decode::<DCert>(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported certificate kind 7"));
    }

    #[test]
    fn deposits_and_refunds() {
        let params = NetworkParams::default();

        let register = DCert::Registration(script_credential());
        let deregister = DCert::Deregistration(script_credential());
        let pool = DCert::RegisterPool(Box::new(pool_params()));

        assert_eq!(register.deposit(&params), 2_000_000);
        assert_eq!(register.refund(&params), 0);
        assert_eq!(deregister.refund(&params), 2_000_000);
        assert_eq!(pool.deposit(&params), 500_000_000);
    }

    #[test]
    fn only_withdrawing_certificates_need_scripts() {
        assert_eq!(DCert::Registration(script_credential()).required_script(), None);
        assert_eq!(
            DCert::Deregistration(script_credential()).required_script(),
            Some(&StakingValidatorHash::new([5; 28]))
        );

        let key = StakingCredential::PubKey(PubKeyHash::new([9; 28]));
        assert_eq!(
            DCert::Delegation(key, PoolKeyHash::new([0; 28])).required_script(),
            None
        );
    }

    #[test]
    fn on_chain_forms_differ_by_version() {
        let cert = DCert::Delegation(script_credential(), PoolKeyHash::new([1; 28]));

        let v2 = cert.to_plutus_data_v2();
        let (alt, fields) = v2.as_constr().unwrap();
        assert_eq!(alt, 2);
        assert_eq!(fields[0], script_credential().to_staking_hash_data());

        let v3 = cert.to_plutus_data_v3();
        let (alt, fields) = v3.as_constr().unwrap();
        assert_eq!(alt, 2);
        assert_eq!(fields[0], script_credential().to_plutus_data());
        assert_eq!(
            fields[1],
            PlutusData::constr(0, vec![PlutusData::bytes(vec![1; 28])])
        );

        let pool = DCert::RegisterPool(Box::new(pool_params()));
        assert_eq!(pool.to_plutus_data_v2().as_constr().unwrap().0, 3);
        assert_eq!(pool.to_plutus_data_v3().as_constr().unwrap().0, 7);
    }
}
