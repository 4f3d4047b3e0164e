//! Duplex byte channel to a slicebot subprocess
//!
//! Spawns the child with piped standard streams and hands the three halves
//! of the connection to whoever needs them:
//!
//! - **Reader**: [`ChannelReader`] - chunked reads from the child's stdout
//! - **Writer**: [`ChannelWriter`] - flushed writes to the child's stdin
//! - **Control**: [`ProcessControl`] - forceful termination and reaping
//!
//! The halves are independent so a background reader can block on stdout
//! while a caller writes and a third party kills the process.
//!
//! # Usage
//!
//! ```no_run
//! # async fn run() -> slicer_transport::Result<()> {
//! use slicer_transport::{ProcessConfig, ProcessHandle};
//!
//! let channel = ProcessHandle::spawn(&ProcessConfig::default()).await?;
//! let (mut reader, mut writer, mut control) = channel.into_parts();
//! writer.write(b"LOAD Zm9v\n").await?;
//! if let Some(chunk) = reader.read_chunk(64 * 1024).await? {
//!     println!("{}", String::from_utf8_lossy(chunk));
//! }
//! control.terminate().await?;
//! control.wait().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod error;
pub mod subprocess;
pub mod traits;

// Re-export commonly used types
pub use channel::{Channel, ChannelReader, ChannelWriter};
pub use error::{Result, TransportError};
pub use subprocess::{ProcessConfig, ProcessHandle, StderrMode};
pub use traits::ProcessControl;
