//! Benchmarks for debug SQL rendering.

#![allow(missing_docs, clippy::unwrap_used)]

use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use mssql_helper::{
    CommandKind, DebugSqlRenderer, MaskingValueFormatter, ParameterDescriptor, SqlDbType,
};
use rust_decimal::Decimal;

fn parameters() -> Vec<ParameterDescriptor> {
    let placed = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_milli_opt(14, 5, 59, 120)
        .unwrap();
    vec![
        ParameterDescriptor::new("@customer_id", 42i32).unwrap(),
        ParameterDescriptor::with_type("@name", SqlDbType::NVarChar)
            .unwrap()
            .with_size(100)
            .with_value("O'Reilly Media"),
        ParameterDescriptor::new("@total", Decimal::new(1_234_567, 2)).unwrap(),
        ParameterDescriptor::new("@placed_at", placed).unwrap(),
        ParameterDescriptor::with_type("@rush", SqlDbType::Bit)
            .unwrap()
            .with_value(true),
        ParameterDescriptor::with_type("@notes", SqlDbType::NText).unwrap(),
    ]
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("debug_sql");
    let params = parameters();
    let renderer = DebugSqlRenderer::new();

    group.bench_function("stored_procedure", |b| {
        b.iter(|| {
            let sql = renderer.render(
                black_box("dbo.AddOrder"),
                CommandKind::StoredProcedure,
                &params,
            );
            black_box(sql)
        })
    });

    let query = "insert into orders (customer_id, name, total, placed_at, rush, notes) \
                 values (@customer_id, @name, @total, @placed_at, @rush, @notes)";
    group.bench_function("query", |b| {
        b.iter(|| {
            let sql = renderer.render(black_box(query), CommandKind::Query, &params);
            black_box(sql)
        })
    });

    let masked = DebugSqlRenderer::new().with_value_formatter(MaskingValueFormatter::new(["name"]));
    group.bench_function("query_masked", |b| {
        b.iter(|| {
            let sql = masked.render(black_box(query), CommandKind::Query, &params);
            black_box(sql)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
