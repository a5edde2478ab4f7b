//! Fetching the outputs a transaction spends
//!
//! The wire format only carries output ids. Before a transaction can be
//! validated, every input, reference input and collateral has to be paired
//! with the output it points at. Lookups run concurrently, but nothing is
//! attached until all of them have come back.

use futures::future::try_join_all;
use std::{collections::BTreeSet, future::Future};
use tessera_primitives::{Tx, TxOutput, TxOutputId};
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("output {0} not found")]
    NotFound(TxOutputId),

    #[error("utxo source failed: {0}")]
    Source(String),
}

/// Somewhere to look up unspent outputs, a node client or an indexer
pub trait UtxoSource {
    fn get_utxo(&self, id: &TxOutputId)
        -> impl Future<Output = Result<TxOutput, RecoveryError>>;
}

async fn fetch(
    source: &impl UtxoSource,
    id: TxOutputId,
) -> Result<(TxOutputId, TxOutput), RecoveryError> {
    match source.get_utxo(&id).await {
        Ok(output) => {
            debug!(%id, lovelace = %output.value.amount(), "recovered output");
            Ok((id, output))
        }
        Err(err) => {
            warn!(%id, %err, "output recovery failed");
            Err(err)
        }
    }
}

/// Recovers every unrecovered input of `tx`. On failure the transaction is
/// left as it was.
#[instrument(skip_all, fields(tx = %tx.id()))]
pub async fn recover(tx: &mut Tx, source: &impl UtxoSource) -> Result<(), RecoveryError> {
    let ids: BTreeSet<_> = tx
        .all_inputs()
        .filter(|x| !x.is_recovered())
        .map(|x| *x.id())
        .collect();

    let outputs = try_join_all(ids.into_iter().map(|id| fetch(source, id))).await?;

    tx.attach_outputs(outputs);

    Ok(())
}
