//! `stockbook-inventory` — the valuation and reconciliation engine.
//!
//! Given an entity store snapshot, a cutoff, and a filter, computes the
//! per-batch, per-product, and per-category inventory views and guards
//! sale admission against batch-level stock. Everything is recomputed
//! from the full transaction history on every query: history can be
//! edited retroactively, so no derived aggregate is ever cached.

pub mod admission;
pub mod report;
pub mod resolve;

pub use admission::{AdmissionError, LOW_STOCK_THRESHOLD, StockFlag, admit};
pub use report::{
    BatchRow, CategoryRollup, InventoryReport, ProductRollup, ReportFilter, UNKNOWN_LABEL,
    inventory_report, sellable_batches,
};
pub use resolve::{BatchStock, resolve_batch, resolve_live};
