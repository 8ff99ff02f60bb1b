use checkout::{Cart, CartLine, Customer, OrderPlacer};
use common::{Money, ProductId, SizeToken};
use criterion::{Criterion, criterion_group, criterion_main};
use store::{InMemoryStore, NewCollection, NewProduct, ProductStatus, Stock};

async fn seeded_store(stock_per_size: u32) -> (InMemoryStore, Vec<ProductId>) {
    let store = InMemoryStore::new();
    let collection = store
        .add_collection(NewCollection {
            name: "Bench".to_string(),
            slug: "bench".to_string(),
            description: None,
            is_active: true,
        })
        .await;

    let mut products = Vec::new();
    for n in 0..3 {
        let product = store
            .add_product(NewProduct {
                collection_id: collection.id,
                name: format!("Bench item {n}"),
                slug: format!("bench-item-{n}"),
                product_type: None,
                description: None,
                base_price: Money::from_minor(100_000),
                status: ProductStatus::Available,
                stock: Stock::with(SizeToken::ALL.map(|size| (size, stock_per_size))),
                images: Vec::new(),
            })
            .await
            .unwrap();
        products.push(product.id);
    }
    (store, products)
}

fn bench_cart(products: &[ProductId]) -> Cart {
    products.iter().fold(
        Cart::new(Customer::new("Bench", "bench@example.com"), "Kyiv"),
        |cart, product| cart.with_line(CartLine::new(*product, "M", 1, Money::from_minor(100_000))),
    )
}

fn bench_place_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, products) = rt.block_on(seeded_store(u32::MAX));
    let placer = OrderPlacer::new(store);
    let cart = bench_cart(&products[..1]);

    c.bench_function("checkout/place_single_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                placer.place_order(cart.clone()).await.unwrap();
            });
        });
    });
}

fn bench_place_three_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, products) = rt.block_on(seeded_store(u32::MAX));
    let placer = OrderPlacer::new(store);
    let cart = bench_cart(&products);

    c.bench_function("checkout/place_three_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                placer.place_order(cart.clone()).await.unwrap();
            });
        });
    });
}

fn bench_rejected_placement(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, products) = rt.block_on(seeded_store(0));
    let placer = OrderPlacer::new(store);
    let cart = bench_cart(&products);

    c.bench_function("checkout/rejected_out_of_stock", |b| {
        b.iter(|| {
            rt.block_on(async {
                placer.place_order(cart.clone()).await.unwrap_err();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_place_single_line,
    bench_place_three_lines,
    bench_rejected_placement
);
criterion_main!(benches);
