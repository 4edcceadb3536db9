//! Sales/business reporting: revenue, profit, and stock alerts per period.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockbook_core::{Cutoff, ImportId, ProductId};
use stockbook_store::{EntityStore, SaleRecord};

use stockbook_inventory::{LOW_STOCK_THRESHOLD, ReportFilter, StockFlag, UNKNOWN_LABEL, resolve_live};

/// How many products the top-seller list carries.
pub const TOP_SELLER_LIMIT: usize = 5;

/// Headline figures for the selected period.
///
/// `stock_capital` is the live capital tied up in stock for the filtered
/// products; it deliberately ignores the period cutoff, since money on the
/// shelf is a point-in-now figure regardless of the reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub revenue: i64,
    /// Cost of goods sold, valued at each sale's batch acquisition price.
    pub cogs: i64,
    pub profit: i64,
    pub stock_capital: i64,
    pub sale_count: usize,
}

/// One time bucket of the revenue/profit series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBucket {
    /// Sortable key: `HH:00` for a day cutoff, `YYYY-MM-DD` for a month
    /// or range cutoff, `YYYY-MM` otherwise.
    pub key: String,
    pub revenue: i64,
    pub profit: i64,
}

/// Per-product sales ranking entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSeller {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub revenue: i64,
}

/// Revenue grouped by (denormalized) category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    pub name: String,
    pub revenue: i64,
}

/// A batch at or below the low-stock threshold (live resolution).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub import_id: ImportId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub remaining: i64,
    pub flag: StockFlag,
}

/// The full sales report for one cutoff and filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub summary: SalesSummary,
    pub buckets: Vec<RevenueBucket>,
    pub top_sellers: Vec<TopSeller>,
    pub category_revenue: Vec<CategoryRevenue>,
    pub low_stock_alerts: Vec<LowStockAlert>,
}

/// Compute the sales report, recomputed in full from the transaction
/// history on every call. The cutoff selects sales by calendar
/// *membership* (a month cutoff means "sales during that month"), unlike
/// the inventory snapshot which accumulates everything up to the cutoff.
pub fn sales_report(store: &EntityStore, cutoff: &Cutoff, filter: &ReportFilter) -> SalesReport {
    let sales: Vec<&SaleRecord> = store
        .sales()
        .iter()
        .filter(|s| cutoff.contains(s.date) && filter.matches(store.product(s.product_id)))
        .collect();

    let revenue: i64 = sales.iter().map(|s| s.quantity * s.price).sum();
    let cogs: i64 = sales.iter().map(|s| cost_of_sale(store, s)).sum();

    let stock_capital: i64 = store
        .imports()
        .iter()
        .filter(|batch| filter.matches(store.product(batch.product_id)))
        .map(|batch| resolve_live(batch, store.sales()).value)
        .sum();

    SalesReport {
        summary: SalesSummary {
            revenue,
            cogs,
            profit: revenue - cogs,
            stock_capital,
            sale_count: sales.len(),
        },
        buckets: revenue_buckets(store, &sales, cutoff),
        top_sellers: top_sellers(store, &sales),
        category_revenue: category_revenue(store, &sales),
        low_stock_alerts: low_stock_alerts(store, filter),
    }
}

/// Acquisition cost of one sale, 0 when the batch link no longer
/// resolves (degrade, don't fail).
fn cost_of_sale(store: &EntityStore, sale: &SaleRecord) -> i64 {
    store
        .import(sale.import_record_id)
        .map(|batch| sale.quantity * batch.import_price)
        .unwrap_or(0)
}

fn revenue_buckets(
    store: &EntityStore,
    sales: &[&SaleRecord],
    cutoff: &Cutoff,
) -> Vec<RevenueBucket> {
    let pattern = match cutoff {
        Cutoff::Day(_) => "%H:00",
        Cutoff::Month { .. } | Cutoff::Range { .. } => "%Y-%m-%d",
        Cutoff::All | Cutoff::Year(_) => "%Y-%m",
    };

    let mut buckets: HashMap<String, RevenueBucket> = HashMap::new();
    for sale in sales {
        let key = sale.date.format(pattern).to_string();
        let entry = buckets.entry(key.clone()).or_insert_with(|| RevenueBucket {
            key,
            revenue: 0,
            profit: 0,
        });
        let revenue = sale.quantity * sale.price;
        entry.revenue += revenue;
        entry.profit += revenue - cost_of_sale(store, sale);
    }

    let mut buckets: Vec<RevenueBucket> = buckets.into_values().collect();
    buckets.sort_by(|a, b| a.key.cmp(&b.key));
    buckets
}

fn top_sellers(store: &EntityStore, sales: &[&SaleRecord]) -> Vec<TopSeller> {
    let mut sellers: HashMap<ProductId, TopSeller> = HashMap::new();
    for sale in sales {
        // Ranking is per resolvable product; orphaned sales still count in
        // the summary figures above.
        let Some(product) = store.product(sale.product_id) else {
            continue;
        };
        let entry = sellers.entry(product.id).or_insert_with(|| TopSeller {
            product_id: product.id,
            name: product.name.clone(),
            quantity: 0,
            revenue: 0,
        });
        entry.quantity += sale.quantity;
        entry.revenue += sale.quantity * sale.price;
    }

    let mut sellers: Vec<TopSeller> = sellers.into_values().collect();
    sellers.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    sellers.truncate(TOP_SELLER_LIMIT);
    sellers
}

fn category_revenue(store: &EntityStore, sales: &[&SaleRecord]) -> Vec<CategoryRevenue> {
    let mut groups: HashMap<String, i64> = HashMap::new();
    for sale in sales {
        let name = store
            .product(sale.product_id)
            .map(|p| p.category.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        *groups.entry(name).or_insert(0) += sale.quantity * sale.price;
    }

    let mut groups: Vec<CategoryRevenue> = groups
        .into_iter()
        .map(|(name, revenue)| CategoryRevenue { name, revenue })
        .collect();
    groups.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    groups
}

fn low_stock_alerts(store: &EntityStore, filter: &ReportFilter) -> Vec<LowStockAlert> {
    let mut alerts: Vec<LowStockAlert> = store
        .imports()
        .iter()
        .filter_map(|batch| {
            let product = store.product(batch.product_id);
            if !filter.matches(product) {
                return None;
            }
            let remaining = resolve_live(batch, store.sales()).remaining;
            if remaining > LOW_STOCK_THRESHOLD {
                return None;
            }
            let (code, name, unit) = match product {
                Some(p) => (p.code.clone(), p.name.clone(), p.unit.clone()),
                None => (String::new(), UNKNOWN_LABEL.to_string(), String::new()),
            };
            Some(LowStockAlert {
                import_id: batch.id,
                code,
                name,
                unit,
                remaining,
                flag: StockFlag::for_remaining(remaining),
            })
        })
        .collect();
    alerts.sort_by(|a, b| a.remaining.cmp(&b.remaining).then_with(|| a.name.cmp(&b.name)));
    alerts
}
