use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::time::Instant;

use all_pairs_cosine::budget::{MemoryBudget, DEFAULT_MAX_FEATURE_ID, DEFAULT_MEMORY_BYTES};
use all_pairs_cosine::data_source::{BinaryDataSource, DataSource, TextDataSource};
use all_pairs_cosine::errors::AllPairsError;
use all_pairs_cosine::{FeatureId, StreamingJoiner};

use clap::{ErrorKind, Parser};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Binary,
    Text,
}

impl FromStr for Format {
    type Err = &'static str;
    fn from_str(f: &str) -> Result<Self, Self::Err> {
        match f {
            "binary" => Ok(Self::Binary),
            "text" => Ok(Self::Text),
            _ => Err("Could not parse a format value"),
        }
    }
}

impl Format {
    fn from_extension(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext == "txt" => Self::Text,
            _ => Self::Binary,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "allpairs",
    about = "A program to find all pairs of binary vectors whose cosine similarity reaches a threshold."
)]
struct Args {
    /// Similarity threshold in the range of (0,1].
    /// A value that cannot be parsed is out of the range.
    #[clap(allow_hyphen_values = true)]
    threshold: String,

    /// File path to a dataset of records sorted by length.
    dataset_path: PathBuf,

    /// Format of the dataset.
    /// "binary" is a sequence of little-endian u32 values: stored id, length, and features.
    /// "text" is one record per line with whitespace-separated features.
    /// If None, "text" is chosen for the extension ".txt" and "binary" otherwise.
    #[clap(short = 'f', long)]
    format: Option<Format>,

    /// Memory budget in bytes from which the maximum number of postings in memory is derived.
    #[clap(short = 'm', long, default_value_t = DEFAULT_MEMORY_BYTES)]
    memory_bytes: u64,

    /// Upper bound of feature ids.
    #[clap(short = 'F', long, default_value_t = DEFAULT_MAX_FEATURE_ID)]
    max_feature_id: FeatureId,

    /// Maximum number of postings in memory, overriding the value derived from the memory budget.
    #[clap(short = 'r', long)]
    max_features_in_ram: Option<usize>,

    /// Prints the ids stored in the binary dataset instead of record ids.
    /// The dataset is read once more in advance to collect them.
    #[clap(short = 's', long)]
    stored_ids: bool,

    /// Shows the progress of the search.
    #[clap(short = 'p', long)]
    progress: bool,
}

fn main() {
    let start = Instant::now();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let threshold = match parse_threshold(&args.threshold) {
        Some(threshold) => threshold,
        None => {
            eprintln!(
                "ERROR: The first argument should be a similarity threshold with range (0.0-1.0]"
            );
            process::exit(2);
        }
    };
    eprintln!("; User specified similarity threshold: {threshold}");

    let max_feature_id = args.max_feature_id;
    let max_features_in_ram = match args.max_features_in_ram {
        Some(n) => n,
        None => match MemoryBudget::new(args.memory_bytes, max_feature_id).max_features_in_ram() {
            Ok(n) => n,
            Err(e) => exit_with(e, 1),
        },
    };
    let mut joiner = match StreamingJoiner::new(threshold, max_feature_id, max_features_in_ram) {
        Ok(joiner) => joiner.shows_progress(args.progress),
        Err(e) => exit_with(e, 1),
    };

    let format = args
        .format
        .unwrap_or_else(|| Format::from_extension(&args.dataset_path));
    if args.stored_ids && format != Format::Binary {
        eprintln!("ERROR: --stored-ids requires the binary format");
        process::exit(1);
    }
    let (mut data, stored_ids): (Box<dyn DataSource>, Option<Vec<u32>>) = match format {
        Format::Binary => {
            let mut data = match BinaryDataSource::open(&args.dataset_path) {
                Ok(data) => data,
                Err(e) => exit_with(e, 3),
            };
            let stored_ids = if args.stored_ids {
                match data.stored_ids() {
                    Ok(ids) => Some(ids),
                    Err(e) => exit_with(e, 4),
                }
            } else {
                None
            };
            let data: Box<dyn DataSource> = Box::new(data);
            (data, stored_ids)
        }
        Format::Text => {
            let data: Box<dyn DataSource> = match TextDataSource::open(&args.dataset_path) {
                Ok(data) => Box::new(data),
                Err(e) => exit_with(e, 3),
            };
            (data, None)
        }
    };

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = joiner.run(&mut *data, |x, y| match &stored_ids {
        Some(ids) => writeln!(out, "{} {}", ids[x as usize], ids[y as usize]),
        None => writeln!(out, "{x} {y}"),
    });
    if let Err(e) = result.and_then(|_| out.flush().map_err(AllPairsError::Output)) {
        exit_with(e, 4);
    }

    let stats = joiner.stats();
    eprintln!("; Found {} similar pairs.", stats.similar_pairs);
    eprintln!("; Candidates considered: {}", stats.candidates_considered);
    eprintln!(
        "; Vector intersections performed: {}",
        stats.intersections_performed
    );
    eprintln!(
        "; Total running time: {} seconds",
        start.elapsed().as_secs_f64()
    );
}

// Follows strtod, where a value that cannot be parsed is zero and thus out of the range.
fn parse_threshold(arg: &str) -> Option<f64> {
    let threshold = arg.trim().parse::<f64>().unwrap_or(0.);
    if threshold > 0. && threshold <= 1. {
        Some(threshold)
    } else {
        None
    }
}

fn exit_with(e: AllPairsError, code: i32) -> ! {
    eprintln!("ERROR: {e}");
    process::exit(code);
}
