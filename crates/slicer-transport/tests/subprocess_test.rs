//! Integration tests for the subprocess transport
//!
//! Use ordinary Unix tools as stand-ins for slicebot.

#![cfg(unix)]

use slicer_transport::{ProcessConfig, ProcessHandle, StderrMode};

#[tokio::test]
async fn test_cat_echoes_written_bytes() {
    let channel = ProcessHandle::spawn(&ProcessConfig::new("cat"))
        .await
        .expect("Failed to spawn cat");
    assert!(channel.id().is_some());
    let (mut reader, mut writer, mut control) = channel.into_parts();

    writer.write(b"LOAD Zm9v\n").await.unwrap();

    let mut received = Vec::new();
    while received.len() < 10 {
        let chunk = reader.read_chunk(4096).await.unwrap().expect("cat closed early");
        received.extend_from_slice(chunk);
    }
    assert_eq!(received, b"LOAD Zm9v\n");

    control.terminate().await.unwrap();
    control.terminate().await.unwrap();
    // Killed by a signal: no exit code
    assert_eq!(control.wait().await.unwrap(), None);
    assert!(reader.read_chunk(4096).await.unwrap().is_none());
}

#[tokio::test]
async fn test_exited_process_reports_eof_and_code() {
    let config = ProcessConfig::new("sh")
        .with_arg("-c")
        .with_arg("exit 3")
        .with_stderr(StderrMode::Null);
    let channel = ProcessHandle::spawn(&config).await.unwrap();
    let (mut reader, _writer, mut control) = channel.into_parts();

    assert!(reader.read_chunk(4096).await.unwrap().is_none());
    assert_eq!(control.wait().await.unwrap(), Some(3));

    // Terminating an already reaped process is a no-op
    control.terminate().await.unwrap();
    assert_eq!(control.wait().await.unwrap(), Some(3));
}

#[tokio::test]
async fn test_env_is_passed_to_child() {
    let config = ProcessConfig::new("sh")
        .with_arg("-c")
        .with_arg("printf '%s\\n' \"$SLICER_TEST_VALUE\"")
        .with_env("SLICER_TEST_VALUE", "graph.pb");
    let channel = ProcessHandle::spawn(&config).await.unwrap();
    let (mut reader, _writer, mut control) = channel.into_parts();

    let mut received = Vec::new();
    while let Some(chunk) = reader.read_chunk(64).await.unwrap() {
        received.extend_from_slice(chunk);
    }
    assert_eq!(received, b"graph.pb\n");
    assert_eq!(control.wait().await.unwrap(), Some(0));
}
