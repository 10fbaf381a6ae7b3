use std::time::Instant;

use all_pairs_cosine::data_source::{DataSource, MemoryDataSource};
use all_pairs_cosine::{FeatureId, SimpleJoiner, StreamingJoiner};

use rand::distributions::Distribution;

const TRIALS: usize = 1;
const SCALES: [usize; 4] = [1_000, 10_000, 100_000, 1_000_000];
const THRESHOLDS: [f64; 4] = [0.5, 0.7, 0.8, 0.9];
const MAX_FEATURE_ID: FeatureId = 100_000;
const MAX_RECORD_LEN: usize = 64;

// Fractions of the total postings allowed in memory.
const RAM_RATIOS: [f64; 3] = [1.0, 0.5, 0.1];

fn main() {
    main_exponent(1.0);
    main_exponent(1.2);
}

fn main_exponent(exponent: f64) {
    let max_records = *SCALES.last().unwrap();
    let records = generate_records(max_records, exponent);

    for &num_records in &SCALES[..] {
        let data = MemoryDataSource::from_unsorted(records[..num_records].iter().cloned());
        let total_features: usize = data.records().iter().map(|r| r.len()).sum();
        for &threshold in &THRESHOLDS[..] {
            for &ratio in &RAM_RATIOS[..] {
                let max_features_in_ram =
                    ((total_features as f64 * ratio) as usize).max(MAX_RECORD_LEN);
                let mut data = data.clone();
                let mut num_results = 0;
                let mut num_passes = 0;
                let elapsed_sec = measure(TRIALS, || {
                    data.rewind(0).unwrap();
                    let mut joiner =
                        StreamingJoiner::new(threshold, MAX_FEATURE_ID, max_features_in_ram)
                            .unwrap();
                    num_results += joiner.similar_pairs(&mut data).unwrap().len();
                    num_passes = joiner.num_passes();
                });
                num_results /= TRIALS;
                println!(
                    "[exponent={exponent},method=streaming_join,num_records={num_records},threshold={threshold},max_features_in_ram={max_features_in_ram},num_passes={num_passes},num_results={num_results}] {elapsed_sec} sec",
                );
            }
        }
        if num_records > 10_000 {
            continue;
        }
        let mut joiner = SimpleJoiner::new();
        for record in data.records() {
            joiner.add(record.iter().cloned()).unwrap();
        }
        for &threshold in &THRESHOLDS[..1] {
            let mut num_results = 0;
            let elapsed_sec = measure(TRIALS, || {
                num_results += joiner.similar_pairs(threshold).unwrap().len();
            });
            num_results /= TRIALS;
            println!(
                "[exponent={exponent},method=simple_join,num_records={num_records},threshold={threshold},num_results={num_results}] {elapsed_sec} sec",
            );
        }
    }
}

fn generate_records(num_records: usize, exponent: f64) -> Vec<Vec<FeatureId>> {
    let mut rng = rand::thread_rng();
    let features = zipf::ZipfDistribution::new(MAX_FEATURE_ID as usize, exponent).unwrap();
    let lengths = zipf::ZipfDistribution::new(MAX_RECORD_LEN, 1.0).unwrap();
    (0..num_records)
        .map(|_| {
            let len = lengths.sample(&mut rng);
            (0..len)
                .map(|_| features.sample(&mut rng) as FeatureId)
                .collect()
        })
        .collect()
}

fn measure<F>(num_trials: usize, mut func: F) -> f64
where
    F: FnMut(),
{
    // Measure
    let start = Instant::now();
    for _ in 0..num_trials {
        func();
    }
    let duration = start.elapsed();
    duration.as_secs_f64() / num_trials as f64
}
