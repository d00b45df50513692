//! Command-line tool executing single messages against a fresh sidechain state.

use clap::Parser;

mod cmd;
pub use cmd::*;

mod common;
mod run;

fn main() -> Result<(), Error> {
    let cmd = MainCmd::parse();
    cmd.log.init()?;
    cmd.run().inspect_err(|e| eprintln!("{e}"))
}
