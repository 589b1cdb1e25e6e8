use clap::Parser;
use lib::{EtlConfig, SimpleLogger, SourceFormat, run};
use log::{debug, warn};
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

/// Sources processed when no inputs are given on the command line.
const DEFAULT_SOURCES: [(&str, SourceFormat); 3] = [
    ("used_car_prices1.csv", SourceFormat::Csv),
    ("used_car_prices1.json", SourceFormat::Json),
    ("used_car_prices1.xml", SourceFormat::Xml),
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input files (.csv, .json or .xml). Defaults to the used_car_prices1 sample set.
    inputs: Vec<PathBuf>,

    /// Force one extractor for every input instead of choosing by file extension
    #[arg(short, long)]
    format: Option<SourceFormat>,

    /// Audit log file; entries are appended, never truncated
    #[arg(short, long, default_value = "log_file.txt")]
    log_file: PathBuf,

    /// Output CSV file, overwritten by every run
    #[arg(short, long, default_value = "transformed_data.csv")]
    output: PathBuf,

    /// Print debug diagnostics to stderr
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() {
    let total_start = Instant::now();
    if let Err(err) = log::set_logger(&LOGGER) {
        eprintln!("Logger already installed: {err}");
    }

    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    let config = EtlConfig {
        log_target: args.log_file,
        output_path: args.output,
    };
    debug!(
        "Audit log: {} | Output: {}",
        config.log_target.display(),
        config.output_path.display()
    );

    let sources: Vec<(PathBuf, SourceFormat)> = if args.inputs.is_empty() {
        DEFAULT_SOURCES
            .iter()
            .map(|(path, format)| (PathBuf::from(path), *format))
            .collect()
    } else {
        args.inputs
            .into_iter()
            .filter_map(|path| match args.format.or_else(|| SourceFormat::from_path(&path)) {
                Some(format) => Some((path, format)),
                None => {
                    warn!(
                        "Skipping {}: unknown extension, pass --format to choose an extractor",
                        path.display()
                    );
                    None
                }
            })
            .collect()
    };

    for (path, format) in &sources {
        println!("Running ETL for {} file: {}", format.name(), path.display());
        let run_start = Instant::now();
        run(path, format.extractor(), &config);
        debug!("{} took {:.2?}", path.display(), run_start.elapsed());
        println!("Done ETL for {}\n", format.name());
    }

    debug!(
        "Processed {} sources in {:.2?}",
        sources.len(),
        total_start.elapsed()
    );
}
