//! Command-line driver: reads a Datalog source file, runs it through the
//! full compile pipeline, and prints either the lowered RAM program's
//! canonical text dump or the accumulated diagnostics.
//!
//! ```bash
//! flowlog-compile path/to/program.dl
//! flowlog-compile --config config.toml path/to/program.dl
//! ```

use flowlog_core::config::GlobalConfig;
use flowlog_core::ir::dump;
use flowlog_core::pipeline::compile;
use std::process::ExitCode;

fn init_logging(config: &GlobalConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn parse_args() -> (Option<String>, Option<String>) {
    let mut config_path = None;
    let mut source_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = args.next();
        } else {
            source_path = Some(arg);
        }
    }
    (config_path, source_path)
}

fn main() -> ExitCode {
    let (config_path, source_path) = parse_args();

    let config = match &config_path {
        Some(path) => GlobalConfig::from_file(path),
        None => GlobalConfig::load(),
    }
    .unwrap_or_default();

    init_logging(&config);

    let Some(source_path) = source_path else {
        eprintln!("usage: flowlog-compile [--config <path>] <source.dl>");
        return ExitCode::FAILURE;
    };

    let source = match std::fs::read_to_string(&source_path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("{source_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(source = %source_path, "compiling");
    let outcome = compile(&source, &config);

    for diagnostic in outcome.errors.diagnostics() {
        eprintln!("{diagnostic}");
    }

    if let Some(path) = &config.debug_report {
        let mut report = String::new();
        for (title, body) in outcome.debug_report.sections() {
            report.push_str(&format!("=== {title} ===\n{body}\n\n"));
        }
        if let Err(err) = std::fs::write(path, report) {
            eprintln!("failed to write debug report to {path}: {err}");
        }
    }

    match outcome.ram {
        Some(ram) => {
            println!("{}", dump::dump(&ram));
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}
