//! Sale admission: the last-line guard against overselling a batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockbook_store::{ImportRecord, SaleRecord};

use crate::resolve::resolve_live;

/// Remaining quantity at or below which a batch is flagged as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 20;

/// Why a proposed sale was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionError {
    /// The requested quantity is not positive.
    #[error("requested quantity must be positive (got {requested})")]
    InvalidQuantity { requested: i64 },

    /// The requested quantity exceeds the batch's live remaining stock.
    #[error("insufficient stock: requested {requested}, remaining {remaining}")]
    InsufficientStock { requested: i64, remaining: i64 },
}

/// UI-facing stock level of a batch. A flag, never a rejection: `Low`
/// batches still sell, and `Out` is exactly zero remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockFlag {
    InStock,
    Low,
    Out,
}

impl StockFlag {
    pub fn for_remaining(remaining: i64) -> Self {
        if remaining <= 0 {
            StockFlag::Out
        } else if remaining <= LOW_STOCK_THRESHOLD {
            StockFlag::Low
        } else {
            StockFlag::InStock
        }
    }
}

/// Validate a proposed issue of `requested` units against a batch's
/// **live** remaining stock (cutoff = now).
///
/// On `Ok` the caller constructs the sale record at the current timestamp
/// and hands it to the entity store; this check does not persist anything.
/// Consumer-facing listings already hide exhausted batches, but this check
/// remains the authoritative guard before a sale is accepted.
pub fn admit(
    batch: &ImportRecord,
    sales: &[SaleRecord],
    requested: i64,
) -> Result<(), AdmissionError> {
    if requested <= 0 {
        return Err(AdmissionError::InvalidQuantity { requested });
    }
    let remaining = resolve_live(batch, sales).remaining;
    if requested > remaining {
        return Err(AdmissionError::InsufficientStock {
            requested,
            remaining,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use stockbook_core::{ImportId, ProductId, SaleId};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn batch(quantity: i64) -> ImportRecord {
        ImportRecord {
            id: ImportId::new(),
            product_id: ProductId::new(),
            quantity,
            import_price: 10_000,
            selling_price: 12_000,
            year: 2024,
            invoice_number: "INV-200".to_string(),
            invoice_image: None,
            date: ts("2024-01-01T08:00:00Z"),
        }
    }

    fn sale_against(batch: &ImportRecord, quantity: i64) -> SaleRecord {
        SaleRecord {
            id: SaleId::new(),
            product_id: batch.product_id,
            import_record_id: batch.id,
            quantity,
            price: batch.selling_price,
            date: ts("2024-01-02T08:00:00Z"),
        }
    }

    #[test]
    fn rejects_request_exceeding_remaining() {
        let batch = batch(10);
        let sales = vec![sale_against(&batch, 5)];

        let err = admit(&batch, &sales, 6).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::InsufficientStock {
                requested: 6,
                remaining: 5
            }
        );
    }

    #[test]
    fn rejects_non_positive_quantity_before_stock_check() {
        let batch = batch(10);

        assert_eq!(
            admit(&batch, &[], 0).unwrap_err(),
            AdmissionError::InvalidQuantity { requested: 0 }
        );
        assert_eq!(
            admit(&batch, &[], -3).unwrap_err(),
            AdmissionError::InvalidQuantity { requested: -3 }
        );
    }

    #[test]
    fn admits_exactly_the_remaining_quantity() {
        let batch = batch(10);
        let mut sales = vec![sale_against(&batch, 5)];

        admit(&batch, &sales, 5).unwrap();
        sales.push(sale_against(&batch, 5));

        assert_eq!(resolve_live(&batch, &sales).remaining, 0);
        assert_eq!(
            admit(&batch, &sales, 1).unwrap_err(),
            AdmissionError::InsufficientStock {
                requested: 1,
                remaining: 0
            }
        );
    }

    #[test]
    fn admitted_sales_flow_through_the_store() {
        use stockbook_store::{EntityStore, RecordImport, RecordSale, TemplateSpec};

        let store = EntityStore::new();
        let store = store.create_category("Electrical").unwrap();
        let store = store.create_unit("Piece").unwrap();
        let category_id = store.categories()[0].id;
        let store = store.create_manufacturer("Volta", category_id).unwrap();
        let store = store
            .create_template(TemplateSpec {
                name: "Circuit Breaker 20A".to_string(),
                category_id,
                manufacturer_id: store.manufacturers()[0].id,
                unit_id: store.units()[0].id,
            })
            .unwrap();
        let store = store
            .create_product("CB-20", store.product_templates()[0].id)
            .unwrap();
        let product_id = store.products()[0].id;
        let store = store
            .record_import(RecordImport {
                product_id,
                quantity: 8,
                import_price: 10_000,
                selling_price: 12_000,
                year: 2024,
                invoice_number: "INV-300".to_string(),
                invoice_image: None,
                date: ts("2024-01-01T08:00:00Z"),
            })
            .unwrap();
        let batch_id = store.imports()[0].id;

        // Admit, then hand the record to the store.
        admit(store.import(batch_id).unwrap(), store.sales(), 8).unwrap();
        let store = store
            .record_sale(RecordSale {
                product_id,
                import_record_id: batch_id,
                quantity: 8,
                price: 12_000,
                date: ts("2024-01-05T09:00:00Z"),
            })
            .unwrap();

        // The batch is now exhausted; the guard holds on the next attempt.
        let err = admit(store.import(batch_id).unwrap(), store.sales(), 1).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::InsufficientStock {
                requested: 1,
                remaining: 0
            }
        );
    }

    #[test]
    fn stock_flag_thresholds() {
        assert_eq!(StockFlag::for_remaining(21), StockFlag::InStock);
        assert_eq!(StockFlag::for_remaining(20), StockFlag::Low);
        assert_eq!(StockFlag::for_remaining(1), StockFlag::Low);
        assert_eq!(StockFlag::for_remaining(0), StockFlag::Out);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: after any sequence of admitted sales, remaining
            /// stock is never negative.
            #[test]
            fn admitted_sales_never_oversell(
                quantity in 1i64..200,
                requests in proptest::collection::vec(-5i64..50, 0..30),
            ) {
                let batch = batch(quantity);
                let mut sales: Vec<SaleRecord> = Vec::new();

                for requested in requests {
                    if admit(&batch, &sales, requested).is_ok() {
                        sales.push(sale_against(&batch, requested));
                    }
                    let remaining = resolve_live(&batch, &sales).remaining;
                    prop_assert!(remaining >= 0);
                }
            }
        }
    }
}
