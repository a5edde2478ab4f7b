use crate::{
    output::{TxOutput, TxOutputDatum, TxOutputId},
    value::Value,
    Error,
};
use std::cmp::Ordering;
use tessera_addresses::Address;
use tessera_codec::{minicbor, plutus::PlutusData};

/// A reference to an output being spent (or read, or pledged as collateral)
///
/// Only the id travels on the wire. The output it points at has to be
/// recovered from a UTxO source before its address, value or datum can be
/// looked at; until then the accessors fail with [`Error::Unrecovered`].
///
/// Equality and ordering only look at the id.
#[derive(Debug, Clone)]
pub struct TxInput {
    id: TxOutputId,
    output: Option<TxOutput>,
}

impl TxInput {
    pub fn new(id: TxOutputId) -> Self {
        Self { id, output: None }
    }

    /// An input whose output is already known
    pub fn recovered(id: TxOutputId, output: TxOutput) -> Self {
        Self {
            id,
            output: Some(output),
        }
    }

    pub fn id(&self) -> &TxOutputId {
        &self.id
    }

    pub fn is_recovered(&self) -> bool {
        self.output.is_some()
    }

    pub fn recover(&mut self, output: TxOutput) {
        self.output = Some(output);
    }

    pub fn output(&self) -> Result<&TxOutput, Error> {
        self.output.as_ref().ok_or(Error::Unrecovered(self.id))
    }

    pub fn address(&self) -> Result<&Address, Error> {
        Ok(&self.output()?.address)
    }

    pub fn value(&self) -> Result<&Value, Error> {
        Ok(&self.output()?.value)
    }

    pub fn datum(&self) -> Result<Option<&TxOutputDatum>, Error> {
        Ok(self.output()?.datum.as_ref())
    }

    /// `TxInInfo` of PlutusV2, `Constr 0 [outRef, txOut]`
    pub fn to_plutus_data_v2(&self) -> Result<PlutusData, Error> {
        Ok(PlutusData::constr(
            0,
            vec![self.id.to_plutus_data_v2(), self.output()?.to_plutus_data()?],
        ))
    }

    /// `TxInInfo` of PlutusV3
    pub fn to_plutus_data_v3(&self) -> Result<PlutusData, Error> {
        Ok(PlutusData::constr(
            0,
            vec![self.id.to_plutus_data_v3(), self.output()?.to_plutus_data()?],
        ))
    }
}

impl From<TxOutputId> for TxInput {
    fn from(id: TxOutputId) -> Self {
        Self::new(id)
    }
}

impl PartialEq for TxInput {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TxInput {}

impl PartialOrd for TxInput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TxInput {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<C> minicbor::Encode<C> for TxInput {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.encode_with(self.id, ctx)?;
        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TxInput {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(Self::new(d.decode_with(ctx)?))
    }
}
