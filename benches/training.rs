use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use spending_tuner::anomaly::OneClassSvm;
use spending_tuner::anomaly::AnomalyDetector;
use spending_tuner::training::{Criterion as SplitCriterion, ModelSelector};

fn create_spending_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 2.0 - 1.0);
    // Target as sum of features plus noise, shifted away from zero
    let y = x.sum_axis(ndarray::Axis(1)).mapv(|v| v + 20.0 + rng.gen::<f64>() * 0.1);
    (x, y)
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 5000].iter() {
        let (x, y) = create_spending_data(*n_rows, 9);
        let split = n_rows * 3 / 4;
        let x_train = x.slice(ndarray::s![..split, ..]).to_owned();
        let y_train = y.slice(ndarray::s![..split]).to_owned();
        let x_test = x.slice(ndarray::s![split.., ..]).to_owned();
        let y_test = y.slice(ndarray::s![split..]).to_owned();

        let selector = ModelSelector::with_defaults(20, SplitCriterion::SquaredError, 2, 42);

        group.bench_with_input(BenchmarkId::new("select", n_rows), n_rows, |b, _| {
            b.iter(|| {
                let selection = selector
                    .select(black_box(&x_train), black_box(&y_train), &x_test, &y_test)
                    .unwrap();
                black_box(selection.mape)
            });
        });
    }

    group.finish();
}

fn bench_one_class_svm(c: &mut Criterion) {
    let mut group = c.benchmark_group("one_class_svm");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let (x, _) = create_spending_data(*n_rows, 9);

        group.bench_with_input(BenchmarkId::new("fit_predict", n_rows), n_rows, |b, _| {
            b.iter(|| {
                let mut svm = OneClassSvm::default();
                black_box(svm.fit_predict(black_box(&x)).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_selection, bench_one_class_svm);
criterion_main!(benches);
