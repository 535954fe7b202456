use std::path::PathBuf;
use std::process;

use anyhow::{Result, anyhow};
use clap::Parser;

use shecc_bench::collector::ChildrenUsage;
use shecc_bench::config::{self, RawConfig};
use shecc_bench::driver::{DEFAULT_MAKE, MakeDriver};
use shecc_bench::report;
use shecc_bench::runner::TrialRunner;

#[derive(Parser)]
#[command(name = "shecc-bench", version, about = "Run benchmarks for shecc")]
struct Cli {
    /// Host C compiler (cc, gcc, clang)
    #[arg(long, default_value = "gcc")]
    hostcc: String,

    /// Target architecture (arm, riscv)
    #[arg(long, default_value = "arm")]
    arch: String,

    /// Enable dynamic linking (default: static linking)
    #[arg(long)]
    dynlink: bool,

    /// Output JSON file name
    #[arg(long, default_value = "out/benchmark.json")]
    output_json: PathBuf,

    /// Number of runs
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    runs: i64,

    /// Build tool program
    #[arg(long, env = "MAKE", default_value = DEFAULT_MAKE)]
    make: String,

    /// Directory to run the build tool in
    #[arg(short = 'C', long, default_value = ".")]
    directory: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = config::resolve(RawConfig {
        hostcc: cli.hostcc,
        arch: cli.arch,
        dynlink: cli.dynlink,
        runs: cli.runs,
        output_path: cli.output_json,
    })?;

    print!("{}", report::format_header(&config));

    let driver = MakeDriver::new(cli.make, cli.directory);
    log::debug!(
        "build tool `{}` in {}",
        driver.program(),
        driver.directory().display()
    );
    let mut runner = TrialRunner::new(driver, ChildrenUsage::new()?);
    let aggregate = runner.run(&config, |i, n| {
        println!("{}", report::format_progress(i, n))
    })?;

    report::write_report(&aggregate, &config.output_path)?;
    log::info!("wrote {}", config.output_path.display());

    print!("{}", report::format_summary(&aggregate, &config.output_path));
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
