#[macro_use]
extern crate log;
extern crate simplelog;

mod config_file;
mod scan;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gotex::config::GotexConfig;
use gotex::reporter;
use simplelog::{ColorChoice, CombinedLogger, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};

/// GoTeX — compiles a subset of LaTeX/TeX to a paginated PDF document.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input .tex file to compile. Omitted when using --scan.
    input: Option<PathBuf>,

    /// Output PDF file name (default: input basename + .pdf).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scan the current directory for .tex files instead of compiling.
    #[arg(short, long, default_value_t = false)]
    scan: bool,

    /// Path to a TOML config file, overriding ~/.config/gotex/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn init_logger(debug: bool) {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.debug);

    if cli.scan {
        return match scan::scan_current_dir() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("error scanning directory: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let Some(input) = &cli.input else {
        error!("requires exactly one .tex file argument (or --scan)");
        return ExitCode::FAILURE;
    };

    let has_tex_extension = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tex"));
    if !has_tex_extension {
        error!("input file must have .tex extension");
        return ExitCode::FAILURE;
    }
    if !input.exists() {
        error!("file '{}' does not exist", input.display());
        return ExitCode::FAILURE;
    }

    let output = cli.output.clone().unwrap_or_else(|| input.with_extension("pdf"));

    let config = match &cli.config {
        Some(path) => config_file::load_config_file(path).unwrap_or_else(|e| {
            warn!("failed to read config file: {e}");
            GotexConfig::load_user_config()
        }),
        None => GotexConfig::load_user_config(),
    };

    let source = match std::fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            error!("error reading file: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("compiling {}", input.display());
    match gotex::compile_to_pdf(&source, &output, &config) {
        Ok(errors) => {
            if !errors.is_empty() {
                reporter::report_errors(&errors, &source, &input.to_string_lossy());
            }
            info!("wrote {}", output.display());
            ExitCode::from(reporter::exit_code_for(&errors) as u8)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
