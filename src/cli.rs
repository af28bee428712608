use crate::typer::calls::DEFAULT_SCHEME;
use crate::utils::Result;
use chrono::Datelike;
use clap::{ArgAction, Parser};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
    thread,
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

pub const DEFAULT_MLST_MIN_IDENTITY: f64 = 95.0;
pub const DEFAULT_MLST_MIN_COVERAGE: f64 = 95.0;
pub const DEFAULT_SERO_MIN_IDENTITY: f64 = 85.0;
pub const DEFAULT_SERO_MIN_COVERAGE: f64 = 60.0;

#[derive(Parser, Debug)]
#[command(name="ecotyper",
          author="ecotyper developers",
          version=&**FULL_VERSION,
          about="MLST, O/H serotype and Clermont phylogroup typing of E. coli genome assemblies",
          long_about = None,
          after_help = format!("Copyright (C) 2022-{}     ecotyper developers
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{author}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[clap(short = 'i')]
    #[clap(long = "inputs")]
    #[clap(help = "Genome assemblies in FASTA format; paths or glob patterns")]
    #[clap(value_name = "FASTA")]
    #[clap(num_args = 1..)]
    #[clap(required_unless_present = "check")]
    pub inputs: Vec<String>,

    #[clap(short = 'o')]
    #[clap(long = "outdir")]
    #[clap(help = "Output directory, created if missing")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = "ecotyper_results")]
    pub outdir: PathBuf,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of samples typed in parallel")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value_t = default_num_threads())]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(short = 'd')]
    #[clap(long = "db")]
    #[clap(help = "Reference database directory")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = "db")]
    pub db_dir: PathBuf,

    #[clap(long = "scheme")]
    #[clap(help = "MLST scheme name")]
    #[clap(value_name = "SCHEME")]
    #[clap(default_value = DEFAULT_SCHEME)]
    pub scheme: String,

    #[clap(help_heading("Thresholds"))]
    #[clap(long = "mlst-min-identity")]
    #[clap(value_name = "PERCENT")]
    #[clap(help = "Minimum percent identity of an MLST allele hit")]
    #[clap(default_value_t = DEFAULT_MLST_MIN_IDENTITY)]
    #[arg(value_parser = ensure_percent)]
    pub mlst_min_identity: f64,

    #[clap(help_heading("Thresholds"))]
    #[clap(long = "mlst-min-coverage")]
    #[clap(value_name = "PERCENT")]
    #[clap(help = "Minimum percent coverage of an MLST allele hit")]
    #[clap(default_value_t = DEFAULT_MLST_MIN_COVERAGE)]
    #[arg(value_parser = ensure_percent)]
    pub mlst_min_coverage: f64,

    #[clap(help_heading("Thresholds"))]
    #[clap(long = "sero-min-identity")]
    #[clap(value_name = "PERCENT")]
    #[clap(help = "Minimum percent identity of an O/H antigen gene hit")]
    #[clap(default_value_t = DEFAULT_SERO_MIN_IDENTITY)]
    #[arg(value_parser = ensure_percent)]
    pub sero_min_identity: f64,

    #[clap(help_heading("Thresholds"))]
    #[clap(long = "sero-min-coverage")]
    #[clap(value_name = "PERCENT")]
    #[clap(help = "Minimum percent coverage of an O/H antigen gene hit")]
    #[clap(default_value_t = DEFAULT_SERO_MIN_COVERAGE)]
    #[arg(value_parser = ensure_percent)]
    pub sero_min_coverage: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "hits")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Read precomputed hit tables from DIR instead of running blastn and ezclermont")]
    #[arg(value_parser = check_dir_exists)]
    pub hits_dir: Option<PathBuf>,

    #[clap(long = "check")]
    #[clap(help = "Check external tools and database files, then exit")]
    pub check: bool,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn default_num_threads() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_dir_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_percent(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=100.0).contains(&value) {
        Err(format!(
            "The value must be between 0 and 100, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}
