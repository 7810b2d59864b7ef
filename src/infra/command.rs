//! Subprocess output capture utilities.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

/// Spawns reader tasks draining a child's piped stdout and stderr into
/// separate buffers.
///
/// The streams are read concurrently with the parent's wait on the child,
/// so a test producing more output than the pipe capacity cannot deadlock
/// the runner. Each task owns its buffer and yields it when the stream
/// closes, which happens on process exit or kill.
pub fn capture_streams(child: &mut Child) -> (JoinHandle<String>, JoinHandle<String>) {
    let stdout = match child.stdout.take() {
        Some(stdout) => drain(stdout),
        None => tokio::spawn(async { String::new() }),
    };
    let stderr = match child.stderr.take() {
        Some(stderr) => drain(stderr),
        None => tokio::spawn(async { String::new() }),
    };
    (stdout, stderr)
}

/// Reads the stream to EOF as raw bytes and decodes lossily. A test is an
/// opaque executable and may write arbitrary bytes; only the status line
/// has to be valid JSON, and stray invalid sequences elsewhere must not
/// cost us the rest of the capture.
fn drain<R>(mut reader: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut bytes = Vec::new();
        let _ = reader.read_to_end(&mut bytes).await;
        String::from_utf8_lossy(&bytes).into_owned()
    })
}
