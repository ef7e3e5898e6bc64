//! Deterministic sample datasets for demos and tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use ac_types::{AcResult, Column, Dataset};

/// Name of the target column in every sample dataset.
pub const SAMPLE_TARGET: &str = "target";

const CLASS_MEANS: [[f64; 4]; 3] = [
    [5.0, 3.4, 1.5, 0.25],
    [5.9, 2.8, 4.3, 1.3],
    [6.6, 3.0, 5.5, 2.0],
];
const CLASS_STDS: [[f64; 4]; 3] = [
    [0.35, 0.38, 0.17, 0.1],
    [0.5, 0.3, 0.47, 0.2],
    [0.63, 0.32, 0.55, 0.27],
];
const FLOWER_FEATURES: [&str; 4] = ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// 150 rows, four numeric measurements, integer target with classes {0, 1, 2}.
pub fn flowers(seed: u64) -> AcResult<Dataset> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features: Vec<Vec<f64>> = vec![Vec::with_capacity(150); 4];
    let mut target = Vec::with_capacity(150);

    for class in 0..3 {
        for _ in 0..50 {
            for (j, column) in features.iter_mut().enumerate() {
                let value = CLASS_MEANS[class][j] + CLASS_STDS[class][j] * standard_normal(&mut rng);
                column.push((value.max(0.1) * 10.0).round() / 10.0);
            }
            target.push(class as f64);
        }
    }

    let mut columns: Vec<Column> = FLOWER_FEATURES
        .iter()
        .zip(features)
        .map(|(name, values)| Column::numeric(*name, values))
        .collect();
    columns.push(Column::numeric(SAMPLE_TARGET, target));

    Dataset::new(columns)
}

/// `rows` housing records with a text `region` column and a price target
/// formatted with thousands separators (e.g. `"231,400"`).
pub fn housing(rows: usize, seed: u64) -> AcResult<Dataset> {
    const REGIONS: [(&str, f64); 4] = [
        ("north", 15_000.0),
        ("south", -5_000.0),
        ("east", 0.0),
        ("west", 25_000.0),
    ];

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rooms = Vec::with_capacity(rows);
    let mut area = Vec::with_capacity(rows);
    let mut region = Vec::with_capacity(rows);
    let mut price = Vec::with_capacity(rows);

    for _ in 0..rows {
        let r = rng.random_range(1..=8) as f64;
        let a = (rng.random_range(30.0..200.0_f64) * 10.0).round() / 10.0;
        let (name, effect) = REGIONS[rng.random_range(0..REGIONS.len())];
        let noise = 4_000.0 * standard_normal(&mut rng);
        let value = 50_000.0 + 1_200.0 * a + 8_000.0 * r + effect + noise;

        rooms.push(r);
        area.push(a);
        region.push(Some(name.to_string()));
        price.push(Some(with_thousands(value.round() as i64)));
    }

    Dataset::new(vec![
        Column::numeric("rooms", rooms),
        Column::numeric("area", area),
        Column::text("region", region),
        Column::text(SAMPLE_TARGET, price),
    ])
}

fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // Box-Muller; 1 - u keeps the log argument in (0, 1].
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn with_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
