//! Concurrent client for slicebot
//!
//! slicebot answers queries over a program dependence graph. It runs as a
//! child process and speaks a line protocol on its standard streams; see
//! [`slicer_protocol`] for the wire format. This crate manages that process:
//!
//! - a background task keeps slicebot's output drained and queues reply lines
//! - commands are serialized so each reply pairs with its request by order
//! - either side may end the connection, and exactly one of them cleans up
//!
//! # Architecture
//!
//! 1. **Protocol Layer** (`slicer-protocol`): framing, verbs, payload decoding
//! 2. **Transport Layer** (`slicer-transport`): subprocess spawning and I/O
//! 3. **Client Layer** (this crate): correlation and connection lifecycle
//!
//! # Usage Example
//!
//! ```no_run
//! use slicer::{ClientConfig, EdgeFilter, SliceOptions, Slicer};
//!
//! #[tokio::main]
//! async fn main() -> slicer::Result<()> {
//!     let slicer = Slicer::spawn(ClientConfig::new().with_program("slicebot")).await?;
//!
//!     slicer.load("graphs/jdk.pdg").await?;
//!     let forest = slicer
//!         .slice(
//!             "java.util.HashMap.put",
//!             &SliceOptions::new()
//!                 .with_direction("backward")
//!                 .with_filter(EdgeFilter::all().edge("ddg")),
//!         )
//!         .await?;
//!     println!("{}", forest);
//!
//!     slicer.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! A `slicebot` `ERROR` reply or an undecodable reply fails only the command
//! that received it. Losing the process fails the waiting command and every
//! later one with [`SlicerError::Closed`]. Nothing is retried.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod args;
pub mod client;
pub mod config;
pub mod error;
mod lifecycle;
mod queue;
mod reader;
pub mod testing;

pub use args::{EdgeFilter, SliceOptions};
pub use client::Slicer;
pub use config::{ClientConfig, DEFAULT_READ_CHUNK_SIZE};
pub use error::{Result, SlicerError};
pub use queue::LifecycleState;

// Re-export protocol and transport types callers commonly need
pub use slicer_protocol::{Candidate, Payload, Record, ReplyVerb, Request, Verb};
pub use slicer_transport::{Channel, ProcessConfig, StderrMode};
