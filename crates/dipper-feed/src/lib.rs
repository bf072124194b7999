//! Stream contracts and wire decoding.
//!
//! The engine consumes ordered, already-parsed event sequences; this
//! crate defines the source traits those sequences come through, the
//! decoders that turn the upstream's compact JSON into typed records,
//! and file-replay sources for offline and paper runs. Live network
//! transports implement the same traits elsewhere.

pub mod error;
pub mod parser;
pub mod replay;
pub mod sources;

pub use error::{FeedError, FeedResult};
pub use parser::{decode_account_event, decode_trade};
pub use replay::{ReplayAccountSource, ReplayTickSource};
pub use sources::{AccountEventSource, IdleAccountSource, TickSource, CHANNEL_CAPACITY};
