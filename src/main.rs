use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::error;

use next_higher_peak::app::{RunConfig, run};
use next_higher_peak::report::{OutputFormat, write_report};
use next_higher_peak::settings::Settings;
use next_higher_peak::SkylineError;

#[derive(Parser, Debug)]
#[command(name = "next-higher-peak")]
#[command(about = "List the ever higher peaks walking outward from each selected place", long_about = None)]
struct Args {
    /// Feature libraries with places and peaks (.parquet, .json, .geojson, .csv)
    #[arg(required = true)]
    libraries: Vec<PathBuf>,

    /// Query selecting the start points, e.g. "n[place=city][name][population>=1000000]"
    #[arg(short, long)]
    query: Option<String>,

    /// Query selecting the candidate peaks, e.g. "n[natural=peak,volcano,hill][ele]"
    #[arg(long)]
    peaks: Option<String>,

    /// JSON settings file (name keys, unnamed label, default queries)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker threads (default: available parallelism)
    #[arg(long)]
    threads: Option<usize>,

    /// Log every stage of the run
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            let code = err.downcast_ref::<SkylineError>().map_or(1, |e| e.exit_code());
            ExitCode::from(code)
        }
    }
}

fn execute(args: Args) -> Result<()> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(query) = args.query {
        settings.start_query = query;
    }
    if let Some(query) = args.peaks {
        settings.peak_query = query;
    }

    let results = run(&RunConfig::new(args.libraries, settings))?;

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_report(&results, args.format, BufWriter::new(file))
        }
        None => write_report(&results, args.format, io::stdout().lock()),
    }
}
