//! Sidechain-to-sidechain messaging.
//!
//! A message sent on one sidechain is committed in a withdrawal certificate submitted to the
//! mainchain. It can then be redeemed on its receiving sidechain with a proof that it is included
//! in a commitment tree anchored by two consecutive certificates. A message can be redeemed at most
//! once.

mod codec;
pub use codec::*;

mod message;
pub use message::*;

mod processor;
pub use processor::*;

mod redeem;
pub use redeem::*;

mod redemption;
pub use redemption::*;

mod storage;
