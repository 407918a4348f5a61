use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Money, NewOrder, OrderEvent, OrderId, OrderItem, UserId};

fn make_items(count: usize) -> Vec<OrderItem> {
    (0..count)
        .map(|i| OrderItem::new(format!("SKU-{i:03}"), 2, Money::from_cents(1000 + i as i64)))
        .collect()
}

fn bench_new_order_10_items(c: &mut Criterion) {
    let items = make_items(10);

    c.bench_function("domain/new_order_10_items", |b| {
        b.iter(|| NewOrder::new(UserId::new("user-1"), items.clone()).unwrap());
    });
}

fn bench_new_order_100_items(c: &mut Criterion) {
    let items = make_items(100);

    c.bench_function("domain/new_order_100_items", |b| {
        b.iter(|| NewOrder::new(UserId::new("user-1"), items.clone()).unwrap());
    });
}

fn bench_encode_order_created(c: &mut Criterion) {
    let order = NewOrder::new(UserId::new("user-1"), make_items(10))
        .unwrap()
        .into_order(OrderId::new());
    let event = OrderEvent::order_created(&order);

    c.bench_function("domain/encode_order_created", |b| {
        b.iter(|| event.to_bytes().unwrap());
    });
}

fn bench_decode_order_created(c: &mut Criterion) {
    let order = NewOrder::new(UserId::new("user-1"), make_items(10))
        .unwrap()
        .into_order(OrderId::new());
    let bytes = OrderEvent::order_created(&order).to_bytes().unwrap();

    c.bench_function("domain/decode_order_created", |b| {
        b.iter(|| OrderEvent::from_bytes(&bytes).unwrap());
    });
}

criterion_group!(
    benches,
    bench_new_order_10_items,
    bench_new_order_100_items,
    bench_encode_order_created,
    bench_decode_order_created,
);
criterion_main!(benches);
