#![allow(missing_docs)]

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use farmtrack_core::id::{CropId, ExpenseId, FarmId, IncomeId};
use farmtrack_core::{
    AreaUnit, Crop, CropStatus, DateValue, Expense, Farm, Income, aggregate, serialize,
};

struct Fixture {
    farms: Vec<Farm>,
    crops: Vec<Crop>,
    expenses: Vec<Expense>,
    income: Vec<Income>,
}

fn build_fixture(groups: u64, records: u64) -> Fixture {
    let farms = (0..groups)
        .map(|id| Farm {
            id: FarmId(id),
            name: format!("farm-{id}"),
            location: String::new(),
            total_area: 10.0,
            unit: AreaUnit::Acres,
            notes: None,
            created_at: DateValue::Absent,
        })
        .collect();
    let crops = (0..groups)
        .map(|id| Crop {
            id: CropId(id),
            farm_id: Some(FarmId(id)),
            crop_name: format!("crop-{id}"),
            variety: "bench".into(),
            planting_date: DateValue::text("2024-03-01"),
            expected_harvest_date: DateValue::Absent,
            area_planted: 1.0,
            status: CropStatus::Growing,
            notes: None,
        })
        .collect();
    let expenses = (0..records)
        .map(|id| Expense {
            id: ExpenseId(id),
            date: DateValue::text("2024-06-01"),
            category: format!("category-{}", id % 8),
            amount: Some(1.5),
            description: "bench".into(),
            farm_id: Some(FarmId(id % groups.max(1))),
        })
        .collect();
    let income = (0..records)
        .map(|id| Income {
            id: IncomeId(id),
            date: DateValue::text("2024-06-02"),
            crop_id: Some(CropId(id % groups.max(1))),
            farm_id: None,
            quantity: Some(3.0),
            price_per_unit: Some(2.0),
            buyer: "bench".into(),
        })
        .collect();
    Fixture {
        farms,
        crops,
        expenses,
        income,
    }
}

fn aggregate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("financial_aggregate");
    for &groups in &[1u64, 16, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(groups), &groups, |b, &groups| {
            b.iter_batched(
                || build_fixture(groups, 10_000),
                |fixture| {
                    black_box(aggregate(
                        &fixture.expenses,
                        &fixture.income,
                        &fixture.farms,
                        &fixture.crops,
                    ));
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn export_benchmark(c: &mut Criterion) {
    let fixture = build_fixture(64, 10_000);
    c.bench_function("export_serialize", |b| {
        b.iter(|| {
            black_box(serialize(
                &fixture.expenses,
                &fixture.income,
                &fixture.farms,
                &fixture.crops,
            ))
        });
    });
}

criterion_group!(benches, aggregate_benchmark, export_benchmark);
criterion_main!(benches);
