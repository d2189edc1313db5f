//! Performance benchmarks for the Professional Tax hook.
//!
//! This benchmark suite covers:
//! - Formula parse and evaluate in isolation
//! - A single salary slip event through the hook
//! - A single salary slip event through the HTTP router
//! - Batches of 100 and 1000 slip events
//! - Scaling with the number of deduction rows on a slip
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use professional_tax::api::{AppState, create_router};
use professional_tax::calculation::ProfessionalTaxHook;
use professional_tax::config::ConfigLoader;
use professional_tax::formula::{EvalContext, Formula};
use professional_tax::models::SalarySlip;

use axum::{body::Body, http::Request};
use tower::ServiceExt;

const SAMPLE_DIR: &str = "./config/sample";

const MAHARASHTRA_SLAB: &str =
    "300 if start_date.month == 2 else (200 if gross_pay > 10000 else (175 if gross_pay > 7500 else 0))";

fn create_test_state() -> AppState {
    let config = ConfigLoader::load(SAMPLE_DIR).expect("Failed to load config");
    AppState::new(config)
}

/// Builds a slip for one of the sample employees with `extra_deductions`
/// unrelated deduction rows ahead of the computed one.
fn create_slip_json(index: usize, extra_deductions: usize) -> serde_json::Value {
    let employees = ["HR-EMP-00001", "HR-EMP-00002", "HR-EMP-00005"];
    let deductions: Vec<serde_json::Value> = (0..extra_deductions)
        .map(|i| {
            serde_json::json!({
                "salary_component": format!("Loan Recovery {}", i),
                "amount": "100"
            })
        })
        .collect();

    serde_json::json!({
        "name": format!("Sal Slip/bench/{:04}", index),
        "employee": employees[index % employees.len()],
        "start_date": "2026-05-01",
        "end_date": "2026-05-31",
        "earnings": [
            { "salary_component": "Basic", "amount": 20000 + (index % 10) * 1000 },
            { "salary_component": "House Rent Allowance", "amount": 8000 }
        ],
        "deductions": deductions
    })
}

fn create_event_body(index: usize) -> String {
    serde_json::json!({
        "event": "validate",
        "salary_slip": create_slip_json(index, 1)
    })
    .to_string()
}

fn event_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/salary-slip/events")
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Benchmark: Formula parse and evaluate.
fn bench_formula(c: &mut Criterion) {
    let mut context = EvalContext::new();
    context.set("gross_pay", Decimal::new(28000, 0));
    context.set(
        "start_date",
        chrono::NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
    );
    let formula = Formula::parse(MAHARASHTRA_SLAB).unwrap();

    let mut group = c.benchmark_group("formula");
    group.bench_function("parse", |b| {
        b.iter(|| black_box(Formula::parse(black_box(MAHARASHTRA_SLAB)).unwrap()))
    });
    group.bench_function("evaluate", |b| {
        b.iter(|| black_box(formula.evaluate_amount(black_box(&context)).unwrap()))
    });
    group.finish();
}

/// Benchmark: Single slip through the hook, without HTTP.
fn bench_single_slip_direct(c: &mut Criterion) {
    let (store, settings) = ConfigLoader::load(SAMPLE_DIR)
        .expect("Failed to load config")
        .into_parts();
    let hook = ProfessionalTaxHook::new(store, settings);
    let slip: SalarySlip = serde_json::from_value(create_slip_json(0, 1)).unwrap();

    c.bench_function("single_slip_direct", |b| {
        b.iter(|| {
            let mut doc = slip.clone();
            black_box(hook.apply(&mut doc).unwrap())
        })
    });
}

/// Benchmark: Single slip event through the router.
fn bench_single_slip_http(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(create_test_state());
    let body = create_event_body(0);

    c.bench_function("single_slip_http", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router.oneshot(event_request(body.clone())).await.unwrap();
            black_box(response)
        })
    });
}

fn bench_batch(c: &mut Criterion, group_name: &str, size: usize) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let state = create_test_state();
    let requests: Vec<String> = (0..size).map(create_event_body).collect();

    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(size as u64));
    if size >= 1000 {
        group.sample_size(10);
    }

    group.bench_function(format!("batch_{}", size), |b| {
        b.to_async(&rt).iter(|| async {
            let mut results = Vec::with_capacity(size);
            for body in &requests {
                let router = create_router(state.clone());
                let response = router.oneshot(event_request(body.clone())).await.unwrap();
                results.push(response);
            }
            black_box(results)
        })
    });

    group.finish();
}

/// Benchmark: Batch of 100 slip events.
fn bench_batch_100(c: &mut Criterion) {
    bench_batch(c, "batch_processing", 100);
}

/// Benchmark: Batch of 1000 slip events.
fn bench_batch_1000(c: &mut Criterion) {
    bench_batch(c, "large_batch_processing", 1000);
}

/// Benchmark: Reconciliation cost as the deduction list grows.
fn bench_scaling(c: &mut Criterion) {
    let (store, settings) = ConfigLoader::load(SAMPLE_DIR)
        .expect("Failed to load config")
        .into_parts();
    let hook = ProfessionalTaxHook::new(store, settings);

    let mut group = c.benchmark_group("scaling");

    for rows in [0usize, 4, 16, 64].iter() {
        let slip: SalarySlip = serde_json::from_value(create_slip_json(0, *rows)).unwrap();

        group.throughput(Throughput::Elements(*rows as u64 + 1));
        group.bench_with_input(BenchmarkId::new("deduction_rows", rows), rows, |b, _| {
            b.iter(|| {
                let mut doc = slip.clone();
                black_box(hook.apply(&mut doc).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_formula,
    bench_single_slip_direct,
    bench_single_slip_http,
    bench_batch_100,
    bench_batch_1000,
    bench_scaling,
);
criterion_main!(benches);
