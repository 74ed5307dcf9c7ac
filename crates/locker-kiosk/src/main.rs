//! # Locker kiosk
//!
//! Entry point for the `locker-kiosk` binary.
//!
//! - `run`    runs the kiosk on emulated peripherals driven from stdin
//! - `peer`   runs the authorization peer the kiosk talks to
//! - `config` prints the effective configuration

use anyhow::{Context, Result};
use clap::Parser;
use locker_core::constants::DEFAULT_LISTEN_ADDR;
use locker_engine::TransactionEngine;
use locker_kiosk::cli::{Commands, ConfigArgs, KioskCli, PeerArgs, RunArgs};
use locker_kiosk::{Devices, Kiosk, KioskConfig, console, halt, logging};
use locker_network::{AuthPeer, TcpLink};
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = KioskCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Run(args) => run_kiosk(args).await,
        Commands::Peer(args) => run_peer(args).await,
        Commands::Config(args) => print_config(args),
    }
}

async fn run_kiosk(args: RunArgs) -> Result<()> {
    let mut config = KioskConfig::load(args.config.as_deref())?;
    config.override_link(args.mode, args.addr);
    config.validate()?;

    tracing::info!(
        version = locker_core::VERSION,
        role = ?config.link.role,
        device = %config.link.device_name,
        tick_ms = config.tick_ms,
        "starting locker kiosk"
    );

    let (mut devices, controls) = Devices::emulated(&config, !args.no_lcd);
    let display = tokio::spawn(console::mirror_display(controls.screen.clone()));

    let (quit_tx, quit_rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = console::run_console(controls).await {
            tracing::error!("Console stopped: {:#}", e);
        }
        let _ = quit_tx.send(());
    });
    let shutdown = shutdown_signal(quit_rx);

    if let Err(e) = devices.init() {
        let reason = e.to_string();
        halt(devices.latch, devices.panel, &reason, shutdown).await;
        display.abort();
        return Err(e).context("peripheral initialization failed");
    }

    let link = TcpLink::open(config.link.clone())
        .await
        .context("failed to open link")?;
    let engine = TransactionEngine::new(config.engine.clone(), link, devices.latch, devices.panel)
        .context("invalid engine configuration")?;

    let mut kiosk = Kiosk::new(
        devices.keypad,
        devices.box_sensor,
        devices.door_sensor,
        engine,
        config.sensor_interval(),
    );
    kiosk.run(config.tick(), shutdown).await;

    display.abort();
    tracing::info!("locker kiosk stopped");
    Ok(())
}

async fn run_peer(args: PeerArgs) -> Result<()> {
    let mut peer = match args.min_id_length {
        Some(min) => AuthPeer::with_min_id_length(min),
        None => AuthPeer::new(),
    };
    let (_quit_tx, quit_rx) = oneshot::channel();

    let serve = async {
        match args.listen {
            Some(addr) => peer.listen_and_serve(&addr).await,
            None => {
                let addr = args.connect.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR);
                peer.connect_and_serve(addr).await
            }
        }
    };

    tokio::select! {
        res = serve => res.context("authorization peer failed")?,
        _ = shutdown_signal(quit_rx) => tracing::info!("authorization peer stopped"),
    }
    Ok(())
}

fn print_config(args: ConfigArgs) -> Result<()> {
    let config = KioskConfig::load(args.config.as_deref())?;
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Resolve on Ctrl+C or when the console asks to quit.
async fn shutdown_signal(quit: oneshot::Receiver<()>) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::error!("failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("received Ctrl+C");
        }
        res = quit => {
            if res.is_ok() {
                tracing::info!("console requested shutdown");
            } else {
                std::future::pending::<()>().await;
            }
        }
    }
}
