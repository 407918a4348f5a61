use criterion::{Criterion, criterion_group, criterion_main};
use ledger::{InMemoryLedger, InventoryLedger, LedgerExt, ProductId};

fn bench_restock_new_product(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger/restock_new_product", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = InMemoryLedger::new();
                ledger.restock(&ProductId::new("SKU-001"), 10).await.unwrap();
            });
        });
    });
}

fn bench_deduct_hot_product(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = rt
        .block_on(InMemoryLedger::with_stock([("SKU-001", i64::MAX / 2)]))
        .unwrap();
    let product_id = ProductId::new("SKU-001");

    c.bench_function("ledger/deduct_hot_product", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.deduct(&product_id, 1).await.unwrap();
            });
        });
    });
}

fn bench_get_quantity_1000_products(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = rt
        .block_on(InMemoryLedger::with_stock(
            (0..1000).map(|i| (format!("SKU-{i:04}"), 100)),
        ))
        .unwrap();
    let product_id = ProductId::new("SKU-0500");

    c.bench_function("ledger/get_quantity_1000_products", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.get_quantity(&product_id).await.unwrap();
            });
        });
    });
}

fn bench_parallel_deducts_distinct_products(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = rt
        .block_on(InMemoryLedger::with_stock(
            (0..8).map(|i| (format!("SKU-{i}"), i64::MAX / 2)),
        ))
        .unwrap();

    c.bench_function("ledger/parallel_deducts_8_products", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut handles = Vec::with_capacity(8);
                for i in 0..8 {
                    let ledger = ledger.clone();
                    handles.push(tokio::spawn(async move {
                        ledger.deduct(&ProductId::new(format!("SKU-{i}")), 1).await
                    }));
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_restock_new_product,
    bench_deduct_hot_product,
    bench_get_quantity_1000_products,
    bench_parallel_deducts_distinct_products,
);
criterion_main!(benches);
