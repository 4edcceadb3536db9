//! Transactional records: stock receipts (imports) and stock issues (sales).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{ImportId, ProductId, SaleId};

/// One receipt batch: `quantity` units of a SKU received at
/// `import_price` acquisition cost, intended to sell at `selling_price`.
///
/// This is the unit of FIFO cost attribution — every sale references
/// exactly one batch. `date` is the authoritative timestamp for
/// point-in-time filtering; `year` is the batch label shown alongside the
/// product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: ImportId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub import_price: i64,
    pub selling_price: i64,
    pub year: i32,
    pub invoice_number: String,
    pub invoice_image: Option<String>,
    pub date: DateTime<Utc>,
}

/// One issue event drawing `quantity` units from a specific batch at an
/// actual sale `price` (which may differ from the batch's selling price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub product_id: ProductId,
    pub import_record_id: ImportId,
    pub quantity: i64,
    pub price: i64,
    pub date: DateTime<Utc>,
}
