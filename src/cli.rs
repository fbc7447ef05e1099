use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

use crate::runner::ProbeConfig;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Ping a host through the system ping utility and explain the result",
    long_about = None
)]
pub struct Cli {
    /// Target host (IPv4, IPv6 or DNS name). Omit to start an interactive session
    pub host: Option<String>,

    /// Location of the ping binary (defaults to the platform's system ping)
    #[arg(long, value_name = "PATH")]
    pub ping_path: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Show timestamps
    #[arg(short = 'T', long)]
    pub timestamp: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    pub fn probe_config(&self) -> ProbeConfig {
        match &self.ping_path {
            Some(path) => ProbeConfig {
                ping_path: path.clone(),
            },
            None => ProbeConfig::default(),
        }
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
