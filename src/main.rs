//! pcf7931 - PCF7931 transponder command tool
//!
//! Provides both a REPL and one-shot command execution.

mod commands;
mod repl;
mod settings;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::Session;
use pcf7931_core::OperationKind;
use settings::Settings;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pcf7931")]
#[command(about = "Read, write and bruteforce PCF7931 transponders through an RF peripheral")]
#[command(version)]
struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, env = "PCF7931_CONFIG")]
    config: Option<PathBuf>,

    /// Serial port of the peripheral
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Reach the peripheral through a TCP bridge instead of a serial port
    #[arg(long)]
    tcp: Option<SocketAddr>,

    /// How long to wait for the READ acknowledgment
    #[arg(long)]
    ack_timeout_ms: Option<u64>,

    /// Print encoded packets instead of sending them
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive REPL
    Repl,

    /// Read content of a PCF7931 transponder
    Read,

    /// Write one byte on a PCF7931 transponder
    Write {
        /// Block to write [0-7]
        block: String,

        /// Index of the byte inside the block [0-15]
        byte: String,

        /// One byte of data (hex)
        data: String,
    },

    /// Bruteforce the last two bytes of a PCF7931 password
    Bruteforce {
        /// Hex password to start from (7 bytes)
        password: String,

        /// How many times to send each candidate
        tries: String,
    },

    /// Show or change the tag configuration: [r | <pwd> [delay] [offset width] [offset position]]
    Config {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

impl Commands {
    fn into_parts(self) -> Option<(OperationKind, Vec<String>)> {
        match self {
            Commands::Repl => None,
            Commands::Read => Some((OperationKind::Read, Vec::new())),
            Commands::Write { block, byte, data } => {
                Some((OperationKind::Write, vec![block, byte, data]))
            }
            Commands::Bruteforce { password, tries } => {
                Some((OperationKind::Bruteforce, vec![password, tries]))
            }
            Commands::Config { args } => Some((OperationKind::Config, args)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let settings_path = Settings::resolve_path(cli.config.as_deref());
    let mut settings = Settings::load(settings_path.as_deref()).map_err(|e| {
        eprintln!("{}: {}", "Error".red(), e);
        e
    })?;

    if let Some(port) = cli.port {
        settings.device.port = port;
    }
    if let Some(baud) = cli.baud {
        settings.device.baud_rate = baud;
    }
    if let Some(addr) = cli.tcp {
        settings.device.tcp = Some(addr);
    }
    if let Some(ms) = cli.ack_timeout_ms {
        settings.device.ack_timeout_ms = ms;
    }

    let mut session = Session::new(settings, settings_path, cli.dry_run);

    let Some((kind, args)) = cli.command.and_then(Commands::into_parts) else {
        return repl::run(session).await;
    };

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let result = session.run(kind, &args).await;
    session.close().await;

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    if let Err(e) = session.persist() {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    }

    Ok(())
}
