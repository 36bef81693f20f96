//! Benchmarks for the integrity checker.
//!
//! `IntegrityChecker::evaluate` is pure, so these run against generated
//! materials and movements without a database.
//!
//! ```sh
//! cargo bench --bench integrity_bench
//!
//! # Compare against a saved baseline
//! cargo bench --bench integrity_bench -- --save-baseline main
//! cargo bench --bench integrity_bench -- --baseline main
//! ```

use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use packhouse_core::{MaterialStatus, MovementType};
use packhouse_storage::{IntegrityChecker, Material, Movement};
use std::hint::black_box;

fn dataset(materials: usize, movements_per_material: usize) -> (Vec<Material>, Vec<Movement>) {
    let start = Utc.with_ymd_and_hms(2026, 2, 12, 8, 0, 0).unwrap();

    let materials: Vec<Material> = (0..materials)
        .map(|i| Material {
            id: i as i64 + 1,
            name: format!("Material {i}"),
            quantity: (movements_per_material as i64) * 5,
            unit: "unidade".to_string(),
            min_stock: 20,
            status: MaterialStatus::Normal,
            created_at: start,
            updated_at: start,
        })
        .collect();

    let mut movements = Vec::with_capacity(materials.len() * movements_per_material);
    for material in &materials {
        for j in 0..movements_per_material {
            // every third movement is an exit, and every 50th is orphaned
            let kind = if j % 3 == 2 {
                MovementType::Out
            } else {
                MovementType::In
            };
            let material_id = if j % 50 == 49 { None } else { Some(material.id) };
            movements.push(Movement {
                id: movements.len() as i64 + 1,
                material_id,
                material_name: material.name.clone(),
                kind,
                quantity: 10,
                unit: "unidade".to_string(),
                date: start + Duration::minutes(j as i64),
                description: None,
                created_at: start,
            });
        }
    }

    (materials, movements)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrity_evaluate");
    let checker = IntegrityChecker::new();

    for (materials, per_material) in [(4, 10), (50, 100), (200, 500)] {
        let (materials, movements) = dataset(materials, per_material);
        group.throughput(Throughput::Elements(movements.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("movements", movements.len()),
            &(materials, movements),
            |b, (materials, movements)| {
                b.iter(|| black_box(checker.evaluate(black_box(materials), black_box(movements))));
            },
        );
    }

    group.finish();
}

fn bench_mismatch_free(c: &mut Criterion) {
    let (materials, movements) = dataset(50, 49);
    // no orphans at 49 per material, and the tolerance hides every mismatch
    let checker = IntegrityChecker::with_tolerance(i64::MAX / 2);

    c.bench_function("integrity_evaluate/mismatch_free", |b| {
        b.iter(|| black_box(checker.evaluate(black_box(&materials), black_box(&movements))));
    });
}

criterion_group!(benches, bench_evaluate, bench_mismatch_free);
criterion_main!(benches);
