//! Network parameters consumed by fee, deposit and validation rules

use crate::{redeemer::ExUnits, script::PlutusVersion, Coin, Error, Slot};
use num_bigint::BigInt;
use num_rational::BigRational;
use serde::{Deserialize, Serialize};
use tessera_codec::minicbor::{self, data::Tag};

/// A non-negative fraction, `#6.30([numerator, denominator])` on the wire
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RationalNumber {
    pub numerator: u64,
    pub denominator: u64,
}

impl RationalNumber {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Exact value, `None` for a zero denominator
    pub fn to_rational(&self) -> Option<BigRational> {
        if self.denominator == 0 {
            return None;
        }

        Some(BigRational::new(
            BigInt::from(self.numerator),
            BigInt::from(self.denominator),
        ))
    }
}

impl<'b, C> minicbor::decode::Decode<'b, C> for RationalNumber {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let position = d.position();
        let tag = d.tag()?;

        if tag.as_u64() != 30 {
            return Err(minicbor::decode::Error::message(format!(
                "expected rational tag 30, found tag {} at offset {position}",
                tag.as_u64()
            )));
        }

        tessera_codec::utils::expect_array(d, "rational number", 2)?;

        Ok(RationalNumber {
            numerator: d.decode_with(ctx)?,
            denominator: d.decode_with(ctx)?,
        })
    }
}

impl<C> minicbor::encode::Encode<C> for RationalNumber {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.tag(Tag::new(30))?;
        e.array(2)?;
        e.encode_with(self.numerator, ctx)?;
        e.encode_with(self.denominator, ctx)?;
        Ok(())
    }
}

pub type CostModel = Vec<i64>;

/// Cost model parameters for each Plutus version the network accepts
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CostModels {
    #[serde(rename = "PlutusV1", default, skip_serializing_if = "Option::is_none")]
    pub plutus_v1: Option<CostModel>,

    #[serde(rename = "PlutusV2", default, skip_serializing_if = "Option::is_none")]
    pub plutus_v2: Option<CostModel>,

    #[serde(rename = "PlutusV3", default, skip_serializing_if = "Option::is_none")]
    pub plutus_v3: Option<CostModel>,
}

impl CostModels {
    pub fn get(&self, version: PlutusVersion) -> Option<&CostModel> {
        match version {
            PlutusVersion::V1 => self.plutus_v1.as_ref(),
            PlutusVersion::V2 => self.plutus_v2.as_ref(),
            PlutusVersion::V3 => self.plutus_v3.as_ref(),
        }
    }

    pub fn mainnet() -> Self {
        Self {
            plutus_v1: Some(COST_MODEL_PLUTUS_V1.to_vec()),
            plutus_v2: Some(COST_MODEL_PLUTUS_V2.to_vec()),
            plutus_v3: Some(COST_MODEL_PLUTUS_V3.to_vec()),
        }
    }
}

/// Maps slots to POSIX milliseconds
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotConfig {
    /// Milliseconds per slot
    pub slot_length: u64,
    pub zero_slot: Slot,
    /// POSIX time of `zero_slot`, in milliseconds
    pub zero_time: u64,
}

impl SlotConfig {
    /// Slots before `zero_slot` all map to `zero_time`
    pub fn slot_to_posix(&self, slot: Slot) -> u64 {
        self.zero_time + slot.saturating_sub(self.zero_slot) * self.slot_length
    }

    /// The slot containing the given POSIX time (milliseconds)
    pub fn posix_to_slot(&self, time: u64) -> Slot {
        self.zero_slot + time.saturating_sub(self.zero_time) / self.slot_length.max(1)
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            slot_length: 1000,
            zero_slot: 4492800,
            zero_time: 1596059091000,
        }
    }
}

/// Protocol parameters relevant to building and validating a single
/// transaction
///
/// The JSON form uses camelCase keys. Missing keys take their mainnet value,
/// so a partial document only needs to list what differs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkParams {
    pub fee_fixed: Coin,
    pub fee_per_byte: Coin,
    pub price_mem: RationalNumber,
    pub price_steps: RationalNumber,
    pub ref_script_fee_per_byte: Coin,
    pub ref_script_growth_increment: u64,
    pub ref_script_growth_factor: RationalNumber,
    pub max_tx_size: u64,
    pub max_tx_ex_units: ExUnits,
    pub collateral_percentage: u64,
    pub max_collateral_inputs: u64,
    pub coins_per_utxo_byte: Coin,
    pub stake_address_deposit: Coin,
    pub pool_deposit: Coin,
    pub cost_models: CostModels,
    pub slot_config: SlotConfig,
}

impl NetworkParams {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            fee_fixed: 155381,
            fee_per_byte: 44,
            price_mem: RationalNumber::new(577, 10000),
            price_steps: RationalNumber::new(721, 10000000),
            ref_script_fee_per_byte: 15,
            ref_script_growth_increment: 25600,
            ref_script_growth_factor: RationalNumber::new(12, 10),
            max_tx_size: 16384,
            max_tx_ex_units: ExUnits {
                mem: 14000000,
                steps: 10000000000,
            },
            collateral_percentage: 150,
            max_collateral_inputs: 3,
            coins_per_utxo_byte: 4310,
            stake_address_deposit: 2000000,
            pool_deposit: 500000000,
            cost_models: CostModels::mainnet(),
            slot_config: SlotConfig::default(),
        }
    }
}

pub const COST_MODEL_PLUTUS_V1: &[i64] = &[
    100788, 420, 1, 1, 1000, 173, 0, 1, 1000, 59957, 4, 1, 11183, 32, 201305, 8356, 4, 16000, 100,
    16000, 100, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 100, 100, 16000, 100, 94375, 32,
    132994, 32, 61462, 4, 72010, 178, 0, 1, 22151, 32, 91189, 769, 4, 2, 85848, 228465, 122, 0, 1,
    1, 1000, 42921, 4, 2, 24548, 29498, 38, 1, 898148, 27279, 1, 51775, 558, 1, 39184, 1000, 60594,
    1, 141895, 32, 83150, 32, 15299, 32, 76049, 1, 13169, 4, 22100, 10, 28999, 74, 1, 28999, 74, 1,
    43285, 552, 1, 44749, 541, 1, 33852, 32, 68246, 32, 72362, 32, 7243, 32, 7391, 32, 11546, 32,
    85848, 228465, 122, 0, 1, 1, 90434, 519, 0, 1, 74433, 32, 85848, 228465, 122, 0, 1, 1, 85848,
    228465, 122, 0, 1, 1, 270652, 22588, 4, 1457325, 64566, 4, 20467, 1, 4, 0, 141992, 32, 100788,
    420, 1, 1, 81663, 32, 59498, 32, 20142, 32, 24588, 32, 20744, 32, 25933, 32, 24623, 32,
    53384111, 14333, 10,
];

pub const COST_MODEL_PLUTUS_V2: &[i64] = &[
    100788, 420, 1, 1, 1000, 173, 0, 1, 1000, 59957, 4, 1, 11183, 32, 201305, 8356, 4, 16000, 100,
    16000, 100, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 100, 100, 16000, 100, 94375, 32,
    132994, 32, 61462, 4, 72010, 178, 0, 1, 22151, 32, 91189, 769, 4, 2, 85848, 228465, 122, 0, 1,
    1, 1000, 42921, 4, 2, 24548, 29498, 38, 1, 898148, 27279, 1, 51775, 558, 1, 39184, 1000, 60594,
    1, 141895, 32, 83150, 32, 15299, 32, 76049, 1, 13169, 4, 22100, 10, 28999, 74, 1, 28999, 74, 1,
    43285, 552, 1, 44749, 541, 1, 33852, 32, 68246, 32, 72362, 32, 7243, 32, 7391, 32, 11546, 32,
    85848, 228465, 122, 0, 1, 1, 90434, 519, 0, 1, 74433, 32, 85848, 228465, 122, 0, 1, 1, 85848,
    228465, 122, 0, 1, 1, 955506, 213312, 0, 2, 270652, 22588, 4, 1457325, 64566, 4, 20467, 1, 4,
    0, 141992, 32, 100788, 420, 1, 1, 81663, 32, 59498, 32, 20142, 32, 24588, 32, 20744, 32, 25933,
    32, 24623, 32, 43053543, 10, 53384111, 14333, 10, 43574283, 26308, 10,
];

pub const COST_MODEL_PLUTUS_V3: &[i64] = &[
    100788, 420, 1, 1, 1000, 173, 0, 1, 1000, 59957, 4, 1, 11183, 32, 201305, 8356, 4, 16000, 100,
    16000, 100, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 100, 100, 16000, 100, 94375, 32,
    132994, 32, 61462, 4, 72010, 178, 0, 1, 22151, 32, 91189, 769, 4, 2, 85848, 123203, 7305, -900,
    1716, 549, 57, 85848, 0, 1, 1, 1000, 42921, 4, 2, 24548, 29498, 38, 1, 898148, 27279, 1, 51775,
    558, 1, 39184, 1000, 60594, 1, 141895, 32, 83150, 32, 15299, 32, 76049, 1, 13169, 4, 22100, 10,
    28999, 74, 1, 28999, 74, 1, 43285, 552, 1, 44749, 541, 1, 33852, 32, 68246, 32, 72362, 32,
    7243, 32, 7391, 32, 11546, 32, 85848, 123203, 7305, -900, 1716, 549, 57, 85848, 0, 1, 90434,
    519, 0, 1, 74433, 32, 85848, 123203, 7305, -900, 1716, 549, 57, 85848, 0, 1, 1, 85848, 123203,
    7305, -900, 1716, 549, 57, 85848, 0, 1, 955506, 213312, 0, 2, 270652, 22588, 4, 1457325, 64566,
    4, 20467, 1, 4, 0, 141992, 32, 100788, 420, 1, 1, 81663, 32, 59498, 32, 20142, 32, 24588, 32,
    20744, 32, 25933, 32, 24623, 32, 43053543, 10, 53384111, 14333, 10, 43574283, 26308, 10, 16000,
    100, 16000, 100, 962335, 18, 2780678, 6, 442008, 1, 52538055, 3756, 18, 267929, 18, 76433006,
    8868, 18, 52948122, 18, 1995836, 36, 3227919, 12, 901022, 1, 166917843, 4307, 36, 284546, 36,
    158221314, 26549, 36, 74698472, 36, 333849714, 1, 254006273, 72, 2174038, 72, 2261318, 64571,
    4, 207616, 8310, 4, 1293828, 28716, 63, 0, 1, 1006041, 43623, 251, 0, 1, 100181, 726, 719, 0,
    1, 100181, 726, 719, 0, 1, 100181, 726, 719, 0, 1, 107878, 680, 0, 1, 95336, 1, 281145, 18848,
    0, 1, 180194, 159, 1, 1, 158519, 8942, 0, 1, 159378, 8813, 0, 1, 107490, 3298, 1, 106057, 655,
    1, 1964219, 24520, 3,
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_falls_back_to_mainnet() {
        let json = r#"{
            "feeFixed": 1000,
            "priceMem": { "numerator": 1, "denominator": 2 },
            "maxTxExUnits": { "mem": 10, "steps": 20 },
            "slotConfig": { "slotLength": 1000, "zeroSlot": 0, "zeroTime": 0 }
        }"#;

        let params = NetworkParams::from_json(json).unwrap();

        assert_eq!(params.fee_fixed, 1000);
        assert_eq!(params.price_mem, RationalNumber::new(1, 2));
        assert_eq!(params.max_tx_ex_units, ExUnits { mem: 10, steps: 20 });
        assert_eq!(params.slot_config.slot_to_posix(7), 7000);
        assert_eq!(params.fee_per_byte, 44);
        assert_eq!(params.cost_models, CostModels::mainnet());
    }

    #[test]
    fn bad_json_is_reported() {
        let err = NetworkParams::from_json(r#"{"feeFixed": "lots"}"#).unwrap_err();

        assert!(matches!(err, Error::Params(_)));
    }

    #[test]
    fn rational_cbor_requires_tag_30() {
        let r = RationalNumber::new(3, 4);
        let bytes = minicbor::to_vec(r).unwrap();

        assert_eq!(hex::encode(&bytes), "d81e820304");
        assert_eq!(minicbor::decode::<RationalNumber>(&bytes).unwrap(), r);

        let untagged = hex::decode("d81f820304").unwrap();
        assert!(minicbor::decode::<RationalNumber>(&untagged).is_err());
    }

    #[test]
    fn slot_conversion_round_trips() {
        let config = SlotConfig::default();

        let time = config.slot_to_posix(100_000_000);
        assert_eq!(config.posix_to_slot(time), 100_000_000);
        assert_eq!(config.slot_to_posix(0), config.zero_time);
    }

    #[test]
    fn cost_model_sizes() {
        assert_eq!(COST_MODEL_PLUTUS_V1.len(), 166);
        assert_eq!(COST_MODEL_PLUTUS_V2.len(), 175);
        assert_eq!(COST_MODEL_PLUTUS_V3.len(), 297);
    }
}
