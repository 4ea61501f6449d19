//! CLI argument definitions for spb2xml.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "spb2xml",
    version,
    about = "Convert SPB property files to XML and back",
    long_about = "Convert SPB binary property files to XML and back, bit-exact.\n\n\
                  Decompiling writes the XML tree plus a .meta side-channel next to it;\n\
                  compiling needs both. Symbol definitions are XML documents loaded\n\
                  from --defs directories, [symbols] dirs in spb2xml.toml, or SPB_DEFS_DIR."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (default: spb2xml.toml in the working directory, if present).
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode an SPB file into XML plus its .meta side-channel.
    Decompile(DecompileArgs),

    /// Encode an XML tree back into an SPB file using its .meta side-channel.
    Compile(CompileArgs),

    /// Check that an SPB file survives decode and re-encode bit-exactly.
    Roundtrip(RoundtripArgs),

    /// List the loaded symbol definitions.
    Symbols(SymbolsArgs),

    /// Print TEXT as a length-prefixed field in hex.
    EncodeHex {
        /// Text to encode.
        text: String,
    },

    /// Decode a length-prefixed field given as hex bytes ("03 00 00 00 48 69 21").
    DecodeHex {
        /// Hex bytes; may be passed as one quoted string or as separate arguments.
        #[arg(required = true, num_args = 1..)]
        bytes: Vec<String>,
    },

    /// Scan any file for length-prefixed text fragments.
    Analyze {
        /// File to scan.
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

/// Where symbol definitions and model names come from.
#[derive(Args, Clone, Default)]
pub struct SymbolArgs {
    /// Directory of symbol definition documents (repeatable).
    #[arg(long = "defs", value_name = "DIR")]
    pub defs: Vec<PathBuf>,

    /// CSV table (guid,name) used to annotate GUID values.
    #[arg(long = "models", value_name = "CSV")]
    pub models: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecompileArgs {
    /// SPB file to decode.
    #[arg(value_name = "SPB")]
    pub input: PathBuf,

    /// XML output path (default: <SPB> with .xml extension).
    #[arg(short = 'o', long = "output", value_name = "XML")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub symbols: SymbolArgs,

    /// Do not emit model-name comments after GUID values.
    #[arg(long = "no-model-comments")]
    pub no_model_comments: bool,
}

#[derive(Args)]
pub struct CompileArgs {
    /// XML file to encode.
    #[arg(value_name = "XML")]
    pub input: PathBuf,

    /// SPB output path (default: <XML> with .spb extension).
    #[arg(short = 'o', long = "output", value_name = "SPB")]
    pub output: Option<PathBuf>,

    /// Side-channel path (default: <XML> with .meta extension).
    #[arg(long = "meta", value_name = "PATH")]
    pub meta: Option<PathBuf>,

    #[command(flatten)]
    pub symbols: SymbolArgs,
}

#[derive(Args)]
pub struct RoundtripArgs {
    /// SPB file to check.
    #[arg(value_name = "SPB")]
    pub input: PathBuf,

    #[command(flatten)]
    pub symbols: SymbolArgs,
}

#[derive(Args)]
pub struct SymbolsArgs {
    #[command(flatten)]
    pub symbols: SymbolArgs,

    /// Only list symbols whose name contains this text (case-insensitive).
    #[arg(long = "filter", value_name = "TEXT")]
    pub filter: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
