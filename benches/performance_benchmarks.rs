use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rayon::prelude::*;
use caltrak::export::csv::write_results;
use caltrak::import::CsvInputImporter;
use caltrak::{compute, ActivityLevel, Gender, Goal, UnitSystem, UserInputs};

/// Performance benchmarks for the calculation engine
///
/// Single calculations, sequential versus parallel batches, and the CSV
/// import/export path used by `caltrak batch`.

fn create_input_dataset(size: usize) -> Vec<UserInputs> {
    let activities = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Heavy,
        ActivityLevel::ExtraActive,
    ];
    let goals = [Goal::Cut, Goal::Recomp, Goal::Bulk];

    (0..size)
        .map(|i| {
            let units = if i % 2 == 0 { UnitSystem::Metric } else { UnitSystem::Imperial };
            let gender = if i % 3 == 0 { Gender::Female } else { Gender::Male };
            let weight = units.weight_from_kg(55.0 + (i % 60) as f64);
            let mut inputs = UserInputs::new(
                units,
                gender,
                weight,
                10.0 + (i % 30) as f64,
                activities[i % activities.len()],
                goals[i % goals.len()],
            );
            if i % 4 != 0 {
                inputs = inputs.with_age_and_height(20 + (i % 50) as u32, 170.0);
            }
            inputs
        })
        .collect()
}

fn bench_single_calculation(c: &mut Criterion) {
    let inputs = UserInputs::new(
        UnitSystem::Metric,
        Gender::Male,
        90.0,
        20.0,
        ActivityLevel::Moderate,
        Goal::Cut,
    )
    .with_age_and_height(30, 180.0);

    c.bench_function("compute_single", |b| b.iter(|| compute(black_box(&inputs))));
}

fn bench_batch_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch Calculation");

    for &size in &[10, 100, 1000, 10000] {
        let dataset = create_input_dataset(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("sequential", size), &dataset, |b, dataset| {
            b.iter(|| dataset.iter().map(compute).collect::<Vec<_>>());
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &dataset, |b, dataset| {
            b.iter(|| dataset.par_iter().map(compute).collect::<Vec<_>>());
        });
    }

    group.finish();
}

fn bench_csv_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("CSV Batch");

    for &size in &[100, 1000] {
        let mut data = String::from("gender,weight,body_fat,activity_level,goal,age,height\n");
        for inputs in create_input_dataset(size) {
            let metric_weight = inputs.unit_system.weight_to_kg(inputs.weight);
            data.push_str(&format!(
                "{},{:.1},{},{},{},{},{}\n",
                inputs.gender,
                metric_weight,
                inputs.body_fat,
                inputs.activity_level,
                inputs.goal,
                inputs.age.unwrap_or_default(),
                inputs.height.unwrap_or_default(),
            ));
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("import_compute_export", size), &data, |b, data| {
            let importer = CsvInputImporter::default();
            b.iter(|| {
                let rows: Vec<_> = importer
                    .import_reader(data.as_bytes())
                    .unwrap()
                    .into_iter()
                    .filter_map(|row| row.inputs.ok().map(|inputs| (row.row, inputs)))
                    .map(|(row, inputs)| {
                        let results = compute(&inputs);
                        (row, inputs, results)
                    })
                    .collect();
                let mut buffer = Vec::with_capacity(size * 256);
                write_results(&rows, &mut buffer).unwrap();
                buffer
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_calculation,
    bench_batch_calculation,
    bench_csv_round_trip
);
criterion_main!(benches);
