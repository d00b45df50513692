use clap::{Parser, Subcommand};

use crate::common::{EvmeError, LogArgs};

/// Top-level command line of `sc-evme`.
#[derive(Parser, Debug)]
#[command(infer_subcommands = true, version)]
pub struct MainCmd {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Logging configuration.
    #[command(flatten)]
    pub log: LogArgs,
}

/// Subcommands of `sc-evme`.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one message through the message processors
    Run(crate::run::Cmd),
}

/// Errors reported by `sc-evme`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A command failed.
    #[error("{0}")]
    Evme(#[from] EvmeError),
}

impl MainCmd {
    /// Executes the selected subcommand.
    pub fn run(&self) -> Result<(), Error> {
        match &self.command {
            Command::Run(cmd) => cmd.run()?,
        }
        Ok(())
    }
}
