//! Wire types for the slicebot line protocol
//!
//! slicebot speaks one message per line over its standard streams. Every line
//! is a verb followed by a single space and a base64-encoded payload:
//!
//! ```text
//! LOAD cGF0aC90by9ncmFwaA==
//! OK
//! CANDIDATES Zm9v
//! CANDIDATES MiwgZm9vCjEsIGJhcgo=
//! ```
//!
//! This crate holds everything about that format and nothing about how the
//! bytes move:
//!
//! - **Framing**: [`framing`] - splitting a chunked byte stream into lines
//! - **Codec**: [`codec`] - request lines and raw replies, base64 payloads
//! - **Verbs**: [`verb`] - command verbs, reply verbs, and which reply each
//!   command expects
//! - **Payloads**: [`payload`] - decoding reply payloads by shape
//! - **Error types**: [`error`] - protocol errors
//!
//! # Design Principles
//!
//! - **Zero I/O**: All types are pure data structures
//! - **Total decoding**: every payload either decodes or yields a [`ProtocolError`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod framing;
pub mod payload;
pub mod verb;

// Re-export commonly used types at crate level
pub use codec::{RawReply, Request, decode_payload, encode_payload};
pub use error::{ProtocolError, Result};
pub use framing::LineFramer;
pub use payload::{Candidate, Payload, Record, Shape, parse_candidates};
pub use verb::{ReplyVerb, Verb};
