use chrono::{DateTime, Local};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use crate::cli::OutputFormat;
use crate::diagnose::PingResult;

#[derive(Serialize)]
struct JsonReport<'a> {
    host: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Local>>,
    #[serde(flatten)]
    result: &'a PingResult,
}

/// Where prompts and notices go. JSON output keeps stdout machine-readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStream {
    Stdout,
    Stderr,
}

impl NoticeStream {
    pub fn for_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => NoticeStream::Stdout,
            OutputFormat::Json => NoticeStream::Stderr,
        }
    }

    fn write(self, text: &str) {
        let _ = match self {
            NoticeStream::Stdout => {
                let mut out = io::stdout();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
            NoticeStream::Stderr => {
                let mut err = io::stderr();
                err.write_all(text.as_bytes()).and_then(|_| err.flush())
            }
        };
    }
}

pub fn print_prompt(format: OutputFormat) {
    NoticeStream::for_format(format).write("Host> ");
}

pub fn print_pinging() {
    println!("Pinging...");
}

pub fn print_empty_input(format: OutputFormat) {
    NoticeStream::for_format(format).write(&format!("{}\n", "Please enter an IP address".yellow()));
}

pub fn print_session_end(format: OutputFormat) {
    NoticeStream::for_format(format).write("\n");
}

pub fn print_interrupted(format: OutputFormat) {
    NoticeStream::for_format(format).write("\nInterrupted, exiting...\n");
}

pub fn print_result(
    host: &str,
    result: &PingResult,
    format: OutputFormat,
    show_timestamp: bool,
) -> serde_json::Result<()> {
    let timestamp = show_timestamp.then(Local::now);

    match format {
        OutputFormat::Text => {
            let text = format_text(result, timestamp);
            if result.is_success() {
                println!("{}", text.green());
            } else {
                println!("{}", text.red());
            }
        }
        OutputFormat::Json => println!("{}", format_json(host, result, timestamp)?),
    }

    Ok(())
}

pub fn format_text(result: &PingResult, timestamp: Option<DateTime<Local>>) -> String {
    match timestamp {
        Some(ts) => format!("[{}] {}", ts.format("%H:%M:%S%.3f"), result.text()),
        None => result.text().to_string(),
    }
}

pub fn format_json(
    host: &str,
    result: &PingResult,
    timestamp: Option<DateTime<Local>>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        host,
        timestamp,
        result,
    })
}
