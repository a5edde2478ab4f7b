//! The script integrity hash a body commits to when scripts run

use crate::{
    params::{CostModel, CostModels},
    script::PlutusVersion,
    witnesses::TxWitnesses,
    Error,
};
use std::collections::BTreeSet;
use tessera_codec::{minicbor, utils::encode_list};
use tessera_crypto::hash::{Hash, Hasher};

/// Cost models of the languages a transaction runs, in their hashed form
///
/// Keys are sorted canonically (shorter encodings first), which puts V2 and
/// V3 before V1. PlutusV1 keeps the encoding of its first era: the key is the
/// serialized language id wrapped in a bytestring and the value is the
/// serialized indefinite list of parameters, again wrapped in a bytestring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageViews(Vec<(PlutusVersion, CostModel)>);

// position in the canonical key order
fn view_rank(version: PlutusVersion) -> u8 {
    match version {
        PlutusVersion::V2 => 0,
        PlutusVersion::V3 => 1,
        PlutusVersion::V1 => 2,
    }
}

impl LanguageViews {
    pub fn new(mut views: Vec<(PlutusVersion, CostModel)>) -> Self {
        views.sort_by_key(|(version, _)| view_rank(*version));
        views.dedup_by_key(|(version, _)| *version);
        Self(views)
    }

    /// Views for `versions`, failing when the params lack one of them
    pub fn from_cost_models(
        models: &CostModels,
        versions: &BTreeSet<PlutusVersion>,
    ) -> Result<Self, Error> {
        let views = versions
            .iter()
            .map(|v| {
                models
                    .get(*v)
                    .map(|model| (*v, model.clone()))
                    .ok_or(Error::MissingCostModel(*v))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self::new(views))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn versions(&self) -> impl Iterator<Item = PlutusVersion> + '_ {
        self.0.iter().map(|(v, _)| *v)
    }
}

fn legacy_params<E>(model: &CostModel) -> Result<Vec<u8>, minicbor::encode::Error<E>> {
    let mut buf = Vec::new();
    let mut inner = minicbor::Encoder::new(&mut buf);

    let fail = |_| minicbor::encode::Error::message("cost model encoding failed");

    inner.begin_array().map_err(fail)?;
    for param in model {
        inner.i64(*param).map_err(fail)?;
    }
    inner.end().map_err(fail)?;

    Ok(buf)
}

impl<C> minicbor::Encode<C> for LanguageViews {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.map(self.0.len() as u64)?;

        for (version, model) in self.0.iter() {
            match version {
                PlutusVersion::V1 => {
                    e.bytes(&[version.language_id()])?;
                    e.bytes(&legacy_params(model)?)?;
                }
                _ => {
                    e.u8(version.language_id())?;
                    e.array(model.len() as u64)?;
                    for param in model {
                        e.i64(*param)?;
                    }
                }
            }
        }

        Ok(())
    }
}

// the concatenation that gets hashed, not a single cbor item
struct ScriptData<'a> {
    witnesses: &'a TxWitnesses,
    views: &'a LanguageViews,
}

impl<C> minicbor::Encode<C> for ScriptData<'_> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let witnesses = self.witnesses;

        match &witnesses.redeemers {
            Some(redeemers) => e.encode_with(redeemers, ctx)?,
            None => e.map(0)?,
        };

        if !witnesses.datums.is_empty() {
            encode_list(e, &witnesses.datums, witnesses.encoding.datums, ctx)?;
        }

        match &witnesses.redeemers {
            Some(_) => e.encode_with(self.views, ctx)?,
            None => e.map(0)?,
        };

        Ok(())
    }
}

/// `blake2b_256(redeemers ++ datums ++ language views)`
///
/// Redeemers and datums are hashed in the exact framing of the witness set.
/// Without redeemers both the redeemers and the views are an empty map.
pub fn script_data_hash(witnesses: &TxWitnesses, views: &LanguageViews) -> Hash<32> {
    Hasher::<256>::hash_cbor(&ScriptData { witnesses, views })
}
