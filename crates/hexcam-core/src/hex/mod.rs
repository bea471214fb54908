//! Hex text decoding.
//!
//! A line of camera output is a whitespace-separated run of one or two digit
//! hex tokens. Tokens are split by `reader`, decoded by `parser`, and
//! malformed tokens are reported through `error`. Token limits live in
//! `layout`.
//!
//! Decoding is pure apart from `tracing` diagnostics. Whether a malformed
//! token aborts the line or is skipped is chosen by [`DecodePolicy`].

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::DecodeError;
pub use parser::{DecodeStats, DecodedLine, HexLineDecoder, decode_token};

pub use crate::config::DecodePolicy;
