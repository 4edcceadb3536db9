//! Master-data entities: categories, units, manufacturers, templates, SKUs.

use serde::{Deserialize, Serialize};

use stockbook_core::{CategoryId, ManufacturerId, ProductId, TemplateId, UnitId};

/// Top-level classification (e.g. "Electrical", "Plumbing").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Unit of measure label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
}

/// Manufacturer, scoped to the one category it supplies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
    pub category_id: CategoryId,
}

/// Generic product definition from which concrete SKUs are issued.
///
/// The `*_name` fields are denormalized display copies, cached at
/// create/edit time and rewritten by master-data renames. They are not
/// live joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTemplate {
    pub id: TemplateId,
    pub name: String,
    pub category_id: CategoryId,
    pub manufacturer_id: ManufacturerId,
    pub unit_id: UnitId,
    pub category_name: String,
    pub manufacturer_name: String,
    pub unit_name: String,
}

/// A sellable SKU issued from a template.
///
/// `code` is the business identifier (case-normalized to uppercase,
/// unique across the store), distinct from `id`. Descriptive fields are
/// denormalized copies taken from the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDefinition {
    pub id: ProductId,
    pub code: String,
    pub template_id: TemplateId,
    pub name: String,
    pub category: String,
    pub manufacturer: String,
    pub unit: String,
}

/// Normalize a SKU code for storage and comparison.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
