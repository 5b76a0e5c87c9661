use copod::{Copod, Matrix};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::time::Instant;

/// Gaussian inliers with a block of shifted rows appended at the end.
fn synthetic(rng: &mut StdRng, inliers: usize, outliers: usize, dims: usize) -> Matrix {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let shifted = Normal::new(6.0, 1.0).unwrap();

    let mut rows = Vec::with_capacity(inliers + outliers);
    for _ in 0..inliers {
        rows.push((0..dims).map(|_| normal.sample(rng)).collect::<Vec<f64>>());
    }
    for _ in 0..outliers {
        rows.push((0..dims).map(|_| shifted.sample(rng)).collect::<Vec<f64>>());
    }
    Matrix::from_rows(&rows).unwrap()
}

fn main() {
    println!("=== COPOD Batch Benchmark ===");
    println!("Gaussian inliers, shifted outliers appended after the inliers.\n");

    let mut rng = StdRng::seed_from_u64(7);
    let contamination = 0.05;

    println!(
        "{:<8} | {:<6} | {:<10} | {:<10} | {:<10} | {:<10}",
        "Rows", "Dims", "Fit (ms)", "Precision", "Recall", "Parallel"
    );
    println!("{}", "-".repeat(70));

    for &(rows, dims) in &[(1_000, 5), (10_000, 10), (50_000, 20)] {
        for parallel in [false, true] {
            let outliers = (rows as f64 * contamination) as usize;
            let table = synthetic(&mut rng, rows - outliers, outliers, dims);

            let mut copod = Copod::new(contamination).unwrap().with_parallel(parallel);
            let start = Instant::now();
            copod.fit(&table).unwrap();
            let elapsed = start.elapsed();

            let labels = copod.labels();
            let flagged = labels.iter().filter(|&&l| l == 1).count();
            let hits = labels[rows - outliers..].iter().filter(|&&l| l == 1).count();
            let precision = hits as f64 / flagged.max(1) as f64;
            let recall = hits as f64 / outliers.max(1) as f64;

            println!(
                "{:<8} | {:<6} | {:<10.2} | {:<10.3} | {:<10.3} | {:<10}",
                rows,
                dims,
                elapsed.as_secs_f64() * 1000.0,
                precision,
                recall,
                parallel
            );
        }
    }

    // Scoring new rows jointly with the fitted reference
    let train = synthetic(&mut rng, 5_000, 0, 8);
    let query = synthetic(&mut rng, 95, 5, 8);
    let mut copod = Copod::new(contamination).unwrap();
    copod.fit(&train).unwrap();

    let start = Instant::now();
    let scores = copod.score(&query).unwrap();
    println!(
        "\nScored {} new rows against {} training rows in {:.2?}",
        scores.len(),
        train.rows(),
        start.elapsed()
    );

    let worst = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    println!("Most anomalous query row: {}", worst);
    print!("{}", copod.explain(train.rows() + worst, None).unwrap());
}
