//! BFD to BGP interconnect daemon
//!
//! Main entry point for the interconnectd daemon.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use interconnectd::config::DEFAULT_CONFIG_PATH;
use interconnectd::{logging, InterconnectConfig, InterconnectError, Supervisor};

/// Enable and disable GoBGP peers following BFD session state
#[derive(Debug, Parser)]
#[command(name = "interconnectd", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("interconnectd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.check_config {
        println!(
            "{}: ok (bfd {}, gobgp {}, {} peers)",
            args.config.display(),
            config.bfd.host,
            config.gobgp.host,
            config.peers.len()
        );
        return ExitCode::SUCCESS;
    }

    let _guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("interconnectd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting server, quit using Ctrl+C");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    match Supervisor::new(&config).run(shutdown.clone()).await {
        Ok(()) if shutdown.is_cancelled() => {
            info!("Shutting down server");
            ExitCode::SUCCESS
        }
        Ok(()) => {
            // streams ended on their own, keep running until told to stop
            shutdown.cancelled().await;
            info!("Shutting down server");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "interconnectd exiting with error");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<InterconnectConfig, InterconnectError> {
    let config = InterconnectConfig::load(&args.config)?;
    config.validate()?;
    Ok(config)
}

/// Cancel `shutdown` on SIGINT or SIGTERM
async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                shutdown.cancel();
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT");
        }
    }

    shutdown.cancel();
}
