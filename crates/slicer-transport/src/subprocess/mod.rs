//! Subprocess transport
//!
//! Spawns slicebot with piped stdin/stdout and exposes the pipes as a
//! [`Channel`](crate::Channel).

pub mod process;

pub use process::{ProcessConfig, ProcessHandle, StderrMode};
