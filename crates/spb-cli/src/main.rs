//! spb2xml: SPB property file converter.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use spb_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use spb_cli::commands::{
    run_analyze, run_compile, run_decode_hex, run_decompile, run_encode_hex, run_roundtrip,
    run_symbols,
};
use spb_cli::config::load_config;
use spb_cli::logging::{LogConfig, LogFormat, init_logging};
use spb_cli::summary::{print_outcome, print_symbols, roundtrip_message};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Command::Decompile(args) => {
            let config = load_config(cli.config.as_deref())?;
            print_outcome(&run_decompile(args, &config)?);
            Ok(0)
        }
        Command::Compile(args) => {
            let config = load_config(cli.config.as_deref())?;
            print_outcome(&run_compile(args, &config)?);
            Ok(0)
        }
        Command::Roundtrip(args) => {
            let config = load_config(cli.config.as_deref())?;
            let report = run_roundtrip(args, &config)?;
            println!("{}: {}", args.input.display(), roundtrip_message(&report));
            Ok(if report.is_exact() { 0 } else { 1 })
        }
        Command::Symbols(args) => {
            let config = load_config(cli.config.as_deref())?;
            print_symbols(&run_symbols(args, &config)?);
            Ok(0)
        }
        Command::EncodeHex { text } => {
            println!("{}", run_encode_hex(text));
            Ok(0)
        }
        Command::DecodeHex { bytes } => {
            println!("{}", run_decode_hex(bytes)?);
            Ok(0)
        }
        Command::Analyze { input } => {
            for fragment in run_analyze(input)? {
                println!("{fragment}");
            }
            Ok(0)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
