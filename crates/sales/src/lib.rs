//! `stockbook-sales` — period sales reporting over the entity store.
//!
//! Revenue, cost of goods sold, profit, stock capital, revenue time
//! series, top sellers, category revenue distribution, and low-stock
//! alerts — recomputed from the full transaction history on every query.

pub mod report;

pub use report::{
    CategoryRevenue, LowStockAlert, RevenueBucket, SalesReport, SalesSummary, TOP_SELLER_LIMIT,
    TopSeller, sales_report,
};
