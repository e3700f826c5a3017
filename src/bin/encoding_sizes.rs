use clap::Parser;
use encoding_size_benchmark_rs::codec::external::ExternalCodec;
use encoding_size_benchmark_rs::config::Args;
use encoding_size_benchmark_rs::measure::run_benchmark;
use encoding_size_benchmark_rs::report::print_report;
use std::process;
use tracing_subscriber::EnvFilter;

/// Exit status when the report was printed but some rows failed (`--isolate`).
const PARTIAL_FAILURE: i32 = 2;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let (config, tools) = args.to_configs()?;
    let codec = ExternalCodec::new(tools);

    let rows = run_benchmark(&config, &codec)?;
    print_report(&rows, args.format)?;

    if rows.iter().any(|row| row.is_failed()) {
        process::exit(PARTIAL_FAILURE);
    }
    Ok(())
}

fn setup_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_writer(std::io::stderr)
            .init();
    }
}
