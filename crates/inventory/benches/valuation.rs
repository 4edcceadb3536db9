//! Full-history valuation benchmark: recompute-always over a populated store.

use chrono::{DateTime, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use stockbook_core::Cutoff;
use stockbook_inventory::{ReportFilter, inventory_report};
use stockbook_store::{EntityStore, RecordImport, RecordSale, TemplateSpec};

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn populated_store(products: usize, batches_per_product: usize) -> EntityStore {
    let mut store = EntityStore::new()
        .create_category("Electrical")
        .unwrap()
        .create_unit("Piece")
        .unwrap();
    let category_id = store.categories()[0].id;
    store = store.create_manufacturer("Volta", category_id).unwrap();
    let manufacturer_id = store.manufacturers()[0].id;
    let unit_id = store.units()[0].id;

    for p in 0..products {
        store = store
            .create_template(TemplateSpec {
                name: format!("Breaker {p}"),
                category_id,
                manufacturer_id,
                unit_id,
            })
            .unwrap();
        let template_id = store.product_templates()[p].id;
        store = store
            .create_product(&format!("CB-{p:04}"), template_id)
            .unwrap();
        let product_id = store.products()[p].id;

        for b in 0..batches_per_product {
            store = store
                .record_import(RecordImport {
                    product_id,
                    quantity: 100,
                    import_price: 10_000 + (b as i64) * 500,
                    selling_price: 15_000,
                    year: 2020 + (b as i32),
                    invoice_number: format!("INV-{p}-{b}"),
                    invoice_image: None,
                    date: ts("2024-01-01T08:00:00Z"),
                })
                .unwrap();
            let batch_id = store.imports().last().unwrap().id;
            store = store
                .record_sale(RecordSale {
                    product_id,
                    import_record_id: batch_id,
                    quantity: 40,
                    price: 15_000,
                    date: ts("2024-06-01T10:00:00Z"),
                })
                .unwrap();
        }
    }
    store
}

fn bench_inventory_report(c: &mut Criterion) {
    let store = populated_store(50, 8);
    let filter = ReportFilter::all();

    c.bench_function("inventory_report/full_history", |b| {
        b.iter(|| inventory_report(black_box(&store), &Cutoff::All, &filter))
    });

    c.bench_function("inventory_report/month_cutoff", |b| {
        let cutoff = Cutoff::Month { year: 2024, month: 3 };
        b.iter(|| inventory_report(black_box(&store), &cutoff, &filter))
    });
}

criterion_group!(benches, bench_inventory_report);
criterion_main!(benches);
