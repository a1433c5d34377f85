use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use moss::process::decode::{DecodeMode, DecodeOptions};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")\nmoss library ",
    env!("MOSS_VERSION"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for inspecting and decoding MOSS readout streams",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Fail on the first malformed frame instead of dropping it.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Decode options selected by the global flags.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            mode: if self.strict {
                DecodeMode::Strict
            } else {
                DecodeMode::Resync
            },
            ..DecodeOptions::default()
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode a readout stream into packets.
    Decode(DecodeArgs),

    /// Print a summary of a readout stream.
    Info(InfoArgs),

    /// Write a synthetic readout stream.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Input readout stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file for decoded packets, stdout if omitted.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Packet output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Bytes read from the input per decode call.
    #[arg(long, value_name = "BYTES", default_value_t = 64 * 1024)]
    pub chunk_size: usize,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input readout stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Output file for the generated stream.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Number of frames to write.
    #[arg(long, default_value_t = 1000)]
    pub packets: usize,

    /// Maximum hits per frame.
    #[arg(long, default_value_t = 16)]
    pub max_hits: usize,

    /// Insert noise bytes after every N-th frame, 0 disables noise.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub noise_every: usize,

    /// Append the first N bytes of one more frame.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub tail: usize,

    /// Seed of the pseudo-random generator.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    /// One line per packet followed by its hits.
    Text,
    /// YAML list of packets.
    Yaml,
    /// Binary record file with big-endian chunks.
    Records,
}
