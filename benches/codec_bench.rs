use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ethers::signers::{LocalWallet, Signer};
use relay_client::order::{self, Address, Order, OrderTerms, Uint256};
use relay_client::stream::OrderbookMirror;

const TEST_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

fn make_order(salt: u64) -> Order {
    let wallet: LocalWallet = TEST_KEY.parse().unwrap();
    let terms = OrderTerms {
        maker: Address::from_bytes(wallet.address().0),
        maker_token: Address::from_bytes([0xe4; 20]),
        taker_token: Address::from_bytes([0x29; 20]),
        maker_amount: Uint256::from_u64(1_000_000),
        taker_amount: Uint256::from_u64(2_500_000),
        expiration_timestamp: Uint256::from_u64(1_900_000_000),
        salt: Uint256::from_u64(salt),
        ..Default::default()
    };
    let signature = order::sign_order_hash(&wallet, &terms.hash()).unwrap();
    Order::new(terms, signature, Uint256::ZERO, Uint256::ZERO)
}

fn bench_encode(c: &mut Criterion) {
    c.bench_function("order_encode", |b| {
        let order = make_order(1);
        b.iter(|| {
            black_box(order::encode(black_box(&order)));
        });
    });
}

fn bench_decode(c: &mut Criterion) {
    c.bench_function("order_decode", |b| {
        let bytes = order::encode(&make_order(1));
        b.iter(|| {
            black_box(order::decode(black_box(&bytes)).unwrap());
        });
    });
}

fn bench_order_hash(c: &mut Criterion) {
    c.bench_function("order_hash", |b| {
        let order = make_order(1);
        let terms = *order.terms();
        b.iter(|| {
            black_box(order::order_hash(black_box(&terms)));
        });
    });
}

fn bench_verify_signature(c: &mut Criterion) {
    c.bench_function("verify_signature", |b| {
        let order = make_order(1);
        b.iter(|| {
            black_box(black_box(&order).is_signed_by_maker());
        });
    });
}

fn bench_json_decode(c: &mut Criterion) {
    c.bench_function("order_json_decode", |b| {
        let json = serde_json::to_string(&make_order(1)).unwrap();
        b.iter(|| {
            black_box(serde_json::from_str::<Order>(black_box(&json)).unwrap());
        });
    });
}

fn bench_mirror_updates_100(c: &mut Criterion) {
    c.bench_function("mirror_updates_100", |b| {
        let base = Address::from_bytes([0xe4; 20]);
        let orders: Vec<Order> = (0..100).map(make_order).collect();
        b.iter(|| {
            let mut mirror = OrderbookMirror::new();
            for o in &orders {
                black_box(mirror.apply_update(o.clone(), &base));
            }
            black_box(mirror.len());
        });
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_order_hash,
    bench_verify_signature,
    bench_json_decode,
    bench_mirror_updates_100
);
criterion_main!(benches);
