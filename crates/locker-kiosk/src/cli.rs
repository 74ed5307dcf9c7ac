//! Command-line interface of the `locker-kiosk` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::logging::{DEFAULT_DIRECTIVE, LogFormat};

/// Campus locker borrowing kiosk.
///
/// Runs the kiosk against emulated peripherals driven from the terminal, or
/// the host-side authorization peer it talks to.
#[derive(Parser, Debug)]
#[command(
    name = "locker-kiosk",
    about = "Campus locker borrowing kiosk",
    version,
    propagate_version = true
)]
pub struct KioskCli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "LOCKER_LOG", default_value = DEFAULT_DIRECTIVE)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the kiosk polling loop with console-driven peripherals.
    Run(RunArgs),
    /// Run the authorization peer.
    Peer(PeerArgs),
    /// Print the effective configuration as JSON.
    Config(ConfigArgs),
}

/// Which side opens the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LinkMode {
    /// Listen for the peer.
    Server,
    /// Dial the peer.
    Client,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON configuration file. Defaults apply to every missing field.
    #[arg(long, short = 'c', env = "LOCKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the link role from the configuration.
    #[arg(long, value_enum)]
    pub mode: Option<LinkMode>,

    /// Override the link address (bind address or peer address).
    #[arg(long)]
    pub addr: Option<String>,

    /// Start without the LCD, exercising the startup fault halt.
    #[arg(long)]
    pub no_lcd: bool,
}

#[derive(Args, Debug)]
pub struct PeerArgs {
    /// Kiosk address to dial (kiosk in server role).
    #[arg(long, conflicts_with = "listen")]
    pub connect: Option<String>,

    /// Address to listen on (kiosk in client role).
    #[arg(long)]
    pub listen: Option<String>,

    /// Shortest student ID allowed to borrow.
    #[arg(long)]
    pub min_id_length: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration file to merge over the defaults before printing.
    #[arg(long, short = 'c', env = "LOCKER_CONFIG")]
    pub config: Option<PathBuf>,
}
