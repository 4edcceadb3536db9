//! Batch resolution: cumulative issued and remaining stock per receipt batch.

use serde::{Deserialize, Serialize};

use stockbook_core::Cutoff;
use stockbook_store::{ImportRecord, SaleRecord};

/// Reconciled stock position of one receipt batch as of a cutoff.
///
/// `remaining` is deliberately **not** clamped at zero: a negative
/// remainder means the batch was oversold historically (e.g. through a
/// manual data edit) and callers decide whether to surface or exclude it.
/// `value` is `remaining × import_price` — valuation always uses the
/// batch's acquisition cost, never the sale price, because inventory
/// capital value measures money tied up, not potential revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStock {
    pub batch: ImportRecord,
    pub issued: i64,
    pub remaining: i64,
    pub value: i64,
}

impl BatchStock {
    /// Oversold: cumulative issues exceed the received quantity.
    pub fn is_anomalous(&self) -> bool {
        self.remaining < 0
    }
}

/// Resolve one batch against the sale history as of `cutoff`.
///
/// Returns `None` when the batch itself was received after the cutoff:
/// such a batch is not part of the snapshot at all. Sales dated after the
/// cutoff are ignored, so `issued + remaining == batch.quantity` holds for
/// every returned value.
pub fn resolve_batch(
    batch: &ImportRecord,
    sales: &[SaleRecord],
    cutoff: &Cutoff,
) -> Option<BatchStock> {
    if !cutoff.visible_as_of(batch.date) {
        return None;
    }
    let issued: i64 = sales
        .iter()
        .filter(|s| s.import_record_id == batch.id && cutoff.visible_as_of(s.date))
        .map(|s| s.quantity)
        .sum();
    Some(reconcile(batch, issued))
}

/// Resolve a batch against the full (live) history.
pub fn resolve_live(batch: &ImportRecord, sales: &[SaleRecord]) -> BatchStock {
    let issued: i64 = sales
        .iter()
        .filter(|s| s.import_record_id == batch.id)
        .map(|s| s.quantity)
        .sum();
    reconcile(batch, issued)
}

fn reconcile(batch: &ImportRecord, issued: i64) -> BatchStock {
    let remaining = batch.quantity - issued;
    BatchStock {
        batch: batch.clone(),
        issued,
        remaining,
        value: remaining * batch.import_price,
    }
}
