//! The three inventory views: batch detail, product rollup, category rollup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use stockbook_core::{Cutoff, ImportId, ProductId};
use stockbook_store::{EntityStore, ProductDefinition};

use crate::admission::StockFlag;
use crate::resolve::{BatchStock, resolve_batch, resolve_live};

/// Label under which records with broken product links are grouped, so
/// the rollups still partition the batch detail exactly.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Consumer-supplied filter applied identically to all report views.
///
/// Search text matches case-insensitively as a substring of SKU code or
/// product name; category and manufacturer are exact matches against the
/// denormalized names. Empty/absent parts apply no constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportFilter {
    pub search: String,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
}

impl ReportFilter {
    /// No constraints.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, product: Option<&ProductDefinition>) -> bool {
        let needle = self.search.trim().to_lowercase();
        let search_ok = needle.is_empty()
            || product.is_some_and(|p| {
                p.code.to_lowercase().contains(&needle) || p.name.to_lowercase().contains(&needle)
            });
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|want| product.is_some_and(|p| p.category == want));
        let manufacturer_ok = self
            .manufacturer
            .as_deref()
            .is_none_or(|want| product.is_some_and(|p| p.manufacturer == want));
        search_ok && category_ok && manufacturer_ok
    }
}

/// One row of the FIFO-traceable batch detail: a single receipt event
/// annotated with its reconciled stock position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRow {
    pub import_id: ImportId,
    pub product_id: ProductId,
    pub code: String,
    pub name: String,
    pub category: String,
    pub manufacturer: String,
    pub unit: String,
    pub year: i32,
    /// Quantity originally received.
    pub opening: i64,
    pub issued: i64,
    pub remaining: i64,
    /// Acquisition cost per unit.
    pub unit_cost: i64,
    /// `remaining × unit_cost`.
    pub value: i64,
}

impl BatchRow {
    fn from_stock(stock: &BatchStock, product: Option<&ProductDefinition>) -> Self {
        let (code, name, category, manufacturer, unit) = match product {
            Some(p) => (
                p.code.clone(),
                p.name.clone(),
                p.category.clone(),
                p.manufacturer.clone(),
                p.unit.clone(),
            ),
            // Broken product link: degrade to a recognizable placeholder
            // instead of dropping the batch from the report.
            None => (
                String::new(),
                UNKNOWN_LABEL.to_string(),
                UNKNOWN_LABEL.to_string(),
                String::new(),
                String::new(),
            ),
        };
        Self {
            import_id: stock.batch.id,
            product_id: stock.batch.product_id,
            code,
            name,
            category,
            manufacturer,
            unit,
            year: stock.batch.year,
            opening: stock.batch.quantity,
            issued: stock.issued,
            remaining: stock.remaining,
            unit_cost: stock.batch.import_price,
            value: stock.value,
        }
    }

    pub fn flag(&self) -> StockFlag {
        StockFlag::for_remaining(self.remaining)
    }
}

/// Per-category rollup of the batch detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRollup {
    pub name: String,
    /// Distinct batches contributing to this group.
    pub batches: usize,
    pub quantity: i64,
    pub value: i64,
    /// Rounded percentage of the report's total value (0 when the total
    /// is 0).
    pub share: u32,
}

/// Rollup over "the same named product from the same manufacturer",
/// merging batches across receipt years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRollup {
    pub name: String,
    pub category: String,
    pub manufacturer: String,
    pub unit: String,
    pub quantity: i64,
    pub value: i64,
}

/// The full inventory valuation for one cutoff and filter.
///
/// All three views derive from the same filtered row set: a batch
/// excluded by the filter is absent from all of them, and the rollups
/// partition the detail (no value lost or double-counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub rows: Vec<BatchRow>,
    pub categories: Vec<CategoryRollup>,
    pub products: Vec<ProductRollup>,
    pub total_quantity: i64,
    pub total_value: i64,
    /// Batches matching the filter that resolved to a negative remainder
    /// (oversold historically) and were excluded from the views.
    pub anomalies: usize,
    /// Rows whose product link no longer resolves; kept in the views
    /// under the placeholder label.
    pub referential_gaps: usize,
}

/// Compute the inventory valuation as of `cutoff`, recomputed in full
/// from the transaction history on every call.
pub fn inventory_report(
    store: &EntityStore,
    cutoff: &Cutoff,
    filter: &ReportFilter,
) -> InventoryReport {
    let mut rows = Vec::new();
    let mut anomalies = 0usize;
    let mut referential_gaps = 0usize;

    for batch in store.imports() {
        let Some(stock) = resolve_batch(batch, store.sales(), cutoff) else {
            continue;
        };
        let product = store.product(batch.product_id);
        if !filter.matches(product) {
            continue;
        }
        if stock.is_anomalous() {
            warn!(
                import_id = %batch.id,
                remaining = stock.remaining,
                "batch oversold; excluded from inventory views"
            );
            anomalies += 1;
            continue;
        }
        if product.is_none() {
            referential_gaps += 1;
        }
        rows.push(BatchRow::from_stock(&stock, product));
    }

    let total_quantity: i64 = rows.iter().map(|r| r.remaining).sum();
    let total_value: i64 = rows.iter().map(|r| r.value).sum();

    InventoryReport {
        categories: category_rollup(&rows, total_value),
        products: product_rollup(&rows),
        total_quantity,
        total_value,
        anomalies,
        referential_gaps,
        rows,
    }
}

/// The consumer-facing sale listing: batches with strictly positive live
/// stock. Batches whose product no longer resolves are not offered for
/// sale.
pub fn sellable_batches(store: &EntityStore, filter: &ReportFilter) -> Vec<BatchRow> {
    store
        .imports()
        .iter()
        .filter_map(|batch| {
            let product = store.product(batch.product_id)?;
            if !filter.matches(Some(product)) {
                return None;
            }
            let stock = resolve_live(batch, store.sales());
            if stock.remaining <= 0 {
                return None;
            }
            Some(BatchRow::from_stock(&stock, Some(product)))
        })
        .collect()
}

fn category_rollup(rows: &[BatchRow], total_value: i64) -> Vec<CategoryRollup> {
    let mut groups: HashMap<&str, CategoryRollup> = HashMap::new();
    for row in rows {
        let entry = groups
            .entry(row.category.as_str())
            .or_insert_with(|| CategoryRollup {
                name: row.category.clone(),
                batches: 0,
                quantity: 0,
                value: 0,
                share: 0,
            });
        entry.batches += 1;
        entry.quantity += row.remaining;
        entry.value += row.value;
    }

    let mut rollup: Vec<CategoryRollup> = groups.into_values().collect();
    for group in &mut rollup {
        group.share = value_share(group.value, total_value);
    }
    rollup.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    rollup
}

fn product_rollup(rows: &[BatchRow]) -> Vec<ProductRollup> {
    let mut groups: HashMap<(&str, &str, &str), ProductRollup> = HashMap::new();
    for row in rows {
        let key = (
            row.name.as_str(),
            row.category.as_str(),
            row.manufacturer.as_str(),
        );
        let entry = groups.entry(key).or_insert_with(|| ProductRollup {
            name: row.name.clone(),
            category: row.category.clone(),
            manufacturer: row.manufacturer.clone(),
            unit: row.unit.clone(),
            quantity: 0,
            value: 0,
        });
        entry.quantity += row.remaining;
        entry.value += row.value;
    }

    let mut rollup: Vec<ProductRollup> = groups.into_values().collect();
    rollup.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    rollup
}

/// Rounded percentage share, total 0 yielding 0 rather than a division
/// fault.
fn value_share(value: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    ((value as f64 / total as f64) * 100.0).round() as u32
}
