//! Main entry point for the fan control daemon

use anyhow::Context;
use clap::Parser;
use log::error;
use pwm_fanctl::{
    args::{Args, Commands},
    client,
    config::Config,
    daemon::FanControlDaemon,
    logging,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    if let Err(e) = logging::setup(args.verbose) {
        eprintln!("failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Some(Commands::Daemon) => run_daemon(&config).await,
        Some(Commands::State { desired_state }) => {
            client::run(&config, desired_state).map_err(Into::into)
        }
        None => client::run(&config, None).map_err(Into::into),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_daemon(config: &Config) -> anyhow::Result<()> {
    let daemon = FanControlDaemon::new(config).context("failed to start fan control service")?;
    daemon.run().await?;
    Ok(())
}
