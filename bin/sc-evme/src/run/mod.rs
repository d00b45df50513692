//! The `run` command: executes one message against a genesis state built from the arguments.

mod cmd;
pub use cmd::*;

mod verifier;
pub use verifier::*;
