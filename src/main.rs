use bravia_denon_sync::{Config, IterationOutcome, Synchronizer};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

/// Sync a Denon receiver's volume to a Sony Bravia TV
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// TV API root, e.g. http://192.168.20.20/sony/
    #[arg(long)]
    display_url: Option<String>,

    /// TV pre-shared key
    #[arg(long)]
    psk: Option<String>,

    /// Receiver control port as host:port
    #[arg(long)]
    receiver: Option<String>,

    /// Highest volume ever sent to the receiver
    #[arg(long)]
    max_volume: Option<u8>,

    /// Run a single iteration and exit
    #[arg(long)]
    once: bool,
}

fn load_config(args: &Args) -> bravia_denon_sync::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env()?;

    if let Some(url) = &args.display_url {
        config.display.base_url = url.clone();
    }
    if let Some(psk) = &args.psk {
        config.display.psk = psk.clone();
    }
    if let Some(address) = &args.receiver {
        config.receiver.address = address.clone();
    }
    if let Some(max) = args.max_volume {
        config.sync.max_volume = max;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let sync = match Synchronizer::from_config(&config) {
        Ok(sync) => sync,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        "Syncing {} -> {} (max volume {})",
        config.display.base_url,
        config.receiver.address,
        config.sync.max_volume
    );

    if args.once {
        return match sync.run_once().await {
            Ok(IterationOutcome::Failed { .. }) => ExitCode::FAILURE,
            Ok(outcome) => {
                tracing::info!("{:?}", outcome);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let (stop_tx, stop_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupted, stopping");
                let _ = stop_tx.send(());
            }
            Err(e) => {
                // dropping stop_tx would end the loop, so hold it
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
                drop(stop_tx);
            }
        }
    });

    match sync.run(stop_rx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
