mod cli;
mod diagnose;
mod error;
mod host;
mod output;
mod prober;
mod runner;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, OutputFormat};
use output::{
    print_empty_input, print_interrupted, print_pinging, print_prompt, print_result, print_session_end,
};
use prober::{Delivered, Prober};
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let prober = Prober::new(&cli.probe_config());

    // 记录探测状态变化，便于调试
    let mut states = prober.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            debug!(state = ?*states.borrow(), "probe state changed");
        }
    });

    // Setup signal handling for graceful termination
    let (interrupt_tx, mut interrupt_rx) = mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    })?;

    match cli.host.as_deref() {
        Some(host) => {
            if !probe_once(&prober, &cli, host, &mut interrupt_rx).await? {
                process::exit(1);
            }
            Ok(())
        }
        None => run_session(&prober, &cli, &mut interrupt_rx).await,
    }
}

/// Probes a single host given on the command line. Returns whether it succeeded.
async fn probe_once(
    prober: &Prober,
    cli: &Cli,
    host: &str,
    interrupt_rx: &mut mpsc::Receiver<()>,
) -> Result<bool> {
    let host = host.trim();
    if host.is_empty() {
        print_empty_input(cli.format);
        return Ok(false);
    }

    if cli.format == OutputFormat::Text {
        print_pinging();
    }

    match ping_or_interrupt(prober, host, interrupt_rx).await? {
        Some(result) => {
            print_result(host, &result, cli.format, cli.timestamp)?;
            Ok(result.is_success())
        }
        None => {
            print_interrupted(cli.format);
            Ok(false)
        }
    }
}

/// Runs one ping unless Ctrl-C arrives first. On interrupt the worker is
/// abandoned and `None` is returned.
async fn ping_or_interrupt(
    prober: &Prober,
    host: &str,
    interrupt_rx: &mut mpsc::Receiver<()>,
) -> Result<Option<Delivered>> {
    tokio::select! {
        result = prober.probe(host) => Ok(Some(result?)),
        _ = interrupt_rx.recv() => Ok(None),
    }
}

/// Line-oriented session: each line read from stdin is one probe request.
async fn run_session(
    prober: &Prober,
    cli: &Cli,
    interrupt_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt(cli.format);

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupt_rx.recv() => break,
        };
        let Some(line) = line else {
            print_session_end(cli.format);
            return Ok(());
        };

        // 空输入不发起探测
        let host = line.trim();
        if host.is_empty() {
            print_empty_input(cli.format);
            continue;
        }

        if cli.format == OutputFormat::Text {
            print_pinging();
        }

        // Input is not read again until the result has been printed and released.
        // Dropping the request on interrupt abandons the worker; its result goes nowhere.
        match ping_or_interrupt(prober, host, interrupt_rx).await? {
            Some(result) => print_result(host, &result, cli.format, cli.timestamp)?,
            None => break,
        }
    }

    print_interrupted(cli.format);
    // A pending stdin read would otherwise hold up runtime shutdown.
    process::exit(0);
}
