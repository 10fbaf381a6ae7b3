use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use all_pairs_cosine::budget::DEFAULT_MAX_FEATURE_ID;
use all_pairs_cosine::edge_list::NeighborhoodRecords;
use all_pairs_cosine::FeatureId;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "edges2bin",
    about = "A program to convert an undirected edge list into records of neighbors in the binary format."
)]
struct Args {
    /// File path to an edge list with one edge "u v" per line.
    /// Lines starting with '#' are ignored.
    #[clap(short = 'i', long)]
    input_path: PathBuf,

    /// File path to write the binary records.
    #[clap(short = 'o', long)]
    output_path: PathBuf,

    /// Upper bound of feature ids configured for the search,
    /// to warn when the converted records exceed it.
    #[clap(short = 'F', long, default_value_t = DEFAULT_MAX_FEATURE_ID)]
    max_feature_id: FeatureId,
}

fn main() -> Result<()> {
    let args = Args::parse();

    eprintln!("Reading edges...");
    let start = Instant::now();
    let file = File::open(&args.input_path)
        .with_context(|| format!("Could not open {}", args.input_path.display()))?;
    let records = NeighborhoodRecords::from_reader(BufReader::new(file))?;
    let num_features: usize = records.records().iter().map(|(_, f)| f.len()).sum();
    eprintln!(
        "Produced {} records with {num_features} features in {} sec",
        records.len(),
        start.elapsed().as_secs_f64()
    );

    eprintln!("Writing records...");
    let start = Instant::now();
    let file = File::create(&args.output_path)
        .with_context(|| format!("Could not create {}", args.output_path.display()))?;
    records.write_binary(BufWriter::new(file))?;
    eprintln!("Done in {} sec", start.elapsed().as_secs_f64());

    let max_feature_id = records.max_feature_id();
    println!("Maximum feature ID in output: {max_feature_id}");
    if max_feature_id > args.max_feature_id {
        eprintln!(
            "WARNING: The maximum feature ID exceeds the configured max_feature_id ({}). Run allpairs with --max-feature-id {max_feature_id} or more.",
            args.max_feature_id
        );
    }

    Ok(())
}
