//! `stockbook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod cutoff;
pub mod error;
pub mod id;

pub use cutoff::Cutoff;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ImportId, ManufacturerId, ProductId, SaleId, TemplateId, UnitId};
