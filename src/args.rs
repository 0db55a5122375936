//! Command line argument parsing for the fan control daemon

use clap::{Parser, Subcommand};

/// Thermal Cooling Device Control
///
/// Runs the closed-loop fan control daemon, or queries/sets the cooling
/// device state manually. With no subcommand, reports the current state.
#[derive(Parser)]
#[command(name = "pwm-fanctl")]
#[command(about = "Thermal cooling device control")]
#[command(version)]
pub struct Args {
    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the control loop
    Daemon,
    /// Query the cooling device, or set its state
    State {
        /// Desired cooling device state
        desired_state: Option<u32>,
    },
}
