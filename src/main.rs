use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tunesort::cli::{SortRequest, run_sort};
use tunesort::output::OutputFormatter;

/// Sort audio files into genre folders by filename keywords
#[derive(Parser, Debug)]
#[command(name = "tunesort", version, about, long_about = None)]
struct Cli {
    /// Directory to scan for audio files
    source: PathBuf,

    /// Output directory (defaults to SORTED_MUSIC inside the source)
    output: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Classify and report without copying anything
    #[arg(long)]
    dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long)]
    trace: bool,

    /// Suppress banners and the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let request = SortRequest {
        source: cli.source,
        output: cli.output,
        config_path: cli.config,
        dry_run: cli.dry_run,
        json: cli.json,
        quiet: cli.quiet,
    };

    match run_sort(&request) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
