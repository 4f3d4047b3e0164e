//! Request and reply line encoding
//!
//! Arguments and payloads travel base64-encoded (standard alphabet, padded,
//! never wrapped) so that spaces, newlines and control bytes inside them can
//! never be mistaken for framing.

use crate::error::Result;
use crate::verb::{ReplyVerb, Verb};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode a payload for the wire
pub fn encode_payload(data: &str) -> String {
    STANDARD.encode(data.as_bytes())
}

/// Decode a payload received from the wire
pub fn decode_payload(encoded: &str) -> Result<String> {
    let bytes = STANDARD.decode(encoded)?;
    Ok(String::from_utf8(bytes)?)
}

/// A command ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    verb: Verb,
    args: String,
}

impl Request {
    /// Create a request, validating the verb
    pub fn new(verb: Verb, args: impl Into<String>) -> Result<Self> {
        verb.validate()?;
        Ok(Self {
            verb,
            args: args.into(),
        })
    }

    /// Command verb
    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    /// Opaque argument string
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Serialize as `VERB SP BASE64(args) LF`
    pub fn to_line(&self) -> String {
        format!("{} {}\n", self.verb, encode_payload(&self.args))
    }

    /// Parse a request line (terminator already removed)
    ///
    /// This is the slicebot side of the exchange; the client only uses it in
    /// test doubles.
    pub fn parse(line: &str) -> Result<Self> {
        let (verb, encoded) = line.split_once(' ').unwrap_or((line, ""));
        Self::new(Verb::from(verb), decode_payload(encoded)?)
    }
}

/// A reply line split into verb and decoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    /// Reply verb
    pub verb: ReplyVerb,
    /// Decoded payload text; empty when the line carried none
    pub payload: String,
}

impl RawReply {
    /// Create a reply
    pub fn new(verb: ReplyVerb, payload: impl Into<String>) -> Self {
        Self {
            verb,
            payload: payload.into(),
        }
    }

    /// Split a reply line on its first space and decode the payload
    pub fn parse(line: &str) -> Result<Self> {
        let (verb, encoded) = line.split_once(' ').unwrap_or((line, ""));
        Ok(Self {
            verb: ReplyVerb::parse(verb),
            payload: decode_payload(encoded)?,
        })
    }

    /// Serialize as `VERB SP BASE64(payload) LF`
    pub fn to_line(&self) -> String {
        format!("{} {}\n", self.verb, encode_payload(&self.payload))
    }
}
