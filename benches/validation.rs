use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::sync::Arc;
use storefront_forms::application::forms;
use storefront_forms::{
    detect_card_brand, detect_xss, format_card_number, format_currency, format_phone,
    is_valid_cpf, is_valid_credit_card, sanitize_html, MemoryStore, RateLimitConfig,
    RateLimiter,
};

/// Benchmark per-keystroke masks and field validators
fn bench_field_functions(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_functions");

    group.bench_function("format_phone", |b| {
        b.iter(|| format_phone(black_box("11999999999")))
    });
    group.bench_function("format_card_number", |b| {
        b.iter(|| format_card_number(black_box("4532 0151 1283 0366")))
    });
    group.bench_function("format_currency", |b| {
        b.iter(|| format_currency(black_box(&1234567.891), "pt-BR", "BRL"))
    });
    group.bench_function("is_valid_cpf", |b| {
        b.iter(|| is_valid_cpf(black_box("529.982.247-25")))
    });
    group.bench_function("luhn", |b| {
        b.iter(|| is_valid_credit_card(black_box("4532015112830366")))
    });
    group.bench_function("detect_card_brand", |b| {
        b.iter(|| detect_card_brand(black_box("6362970000457013")))
    });

    group.finish();
}

/// Benchmark injection screening over growing free-text input
fn bench_text_guards(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_guards");

    for size in [64usize, 1024, 16 * 1024] {
        let text: String = "Please deliver <b>after</b> 6pm. "
            .chars()
            .cycle()
            .take(size)
            .collect();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("detect_xss", size), &text, |b, text| {
            b.iter(|| detect_xss(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("sanitize_html", size), &text, |b, text| {
            b.iter(|| sanitize_html(black_box(text), true))
        });
    }

    group.finish();
}

/// Benchmark full schema evaluation
fn bench_schemas(c: &mut Criterion) {
    let mut group = c.benchmark_group("schemas");
    let today = NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date");

    let payment = json!({
        "cardNumber": "4532 0151 1283 0366",
        "cardName": "Joao Silva",
        "expiry": "12/27",
        "cvv": "123"
    });
    let address = json!({
        "cep": "01310-100",
        "street": "Avenida Paulista",
        "number": "1578",
        "neighborhood": "Bela Vista",
        "city": "São Paulo",
        "state": "SP"
    });

    group.bench_function("payment_valid", |b| {
        b.iter(|| forms::payment().validate_at(black_box(&payment), today))
    });
    group.bench_function("address_valid", |b| {
        b.iter(|| forms::address().validate_at(black_box(&address), today))
    });
    group.bench_function("address_empty", |b| {
        b.iter(|| forms::address().validate_at(black_box(&json!({})), today))
    });

    group.finish();
}

/// Benchmark limiter round-trips through the in-memory store
fn bench_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("limiter");
    let store = Arc::new(MemoryStore::new());

    group.bench_function("check", |b| {
        let limiter =
            RateLimiter::new("bench_check", RateLimitConfig::login(), store.clone()).unwrap();
        limiter.attempt();
        b.iter(|| black_box(limiter.check()))
    });

    group.bench_function("attempt_saturated", |b| {
        let limiter =
            RateLimiter::new("bench_attempt", RateLimitConfig::login(), store.clone()).unwrap();
        for _ in 0..5 {
            limiter.attempt();
        }
        b.iter(|| black_box(limiter.attempt()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_field_functions,
    bench_text_guards,
    bench_schemas,
    bench_limiter
);
criterion_main!(benches);
