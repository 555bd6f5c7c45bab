use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use trellis::cli::{execute, Args};
use trellis::Settings;

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut settings = match Settings::from_env() {
        Ok(s) => s,
        Err(err) => {
            eprintln!("trellis: {err}");
            process::exit(1);
        }
    };
    args.apply_overrides(&mut settings);

    let stdout = std::io::stdout();
    if let Err(err) = execute(&args, &settings, &mut stdout.lock()) {
        eprintln!("trellis: {err}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trellis={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
