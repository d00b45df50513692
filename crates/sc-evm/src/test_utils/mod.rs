//! Test utilities for the sidechain execution core.

mod bytecode;
mod context;
mod evm;
mod sc2sc;

pub use bytecode::*;
pub use context::*;
pub use evm::*;
pub use sc2sc::*;
