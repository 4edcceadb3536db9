//! `stockbook-store` — the entity store and master-data catalog.
//!
//! Holds every ledger collection as one immutable snapshot with a
//! copy-on-write mutation API. The valuation engine reads snapshots; it
//! never mutates them.

pub mod catalog;
pub mod records;
pub mod store;

pub use catalog::{Category, Manufacturer, ProductDefinition, ProductTemplate, Unit};
pub use records::{ImportRecord, SaleRecord};
pub use store::{EntityStore, RecordImport, RecordSale, TemplateSpec};
