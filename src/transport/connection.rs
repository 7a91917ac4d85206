//! Connected pipe channel with message framing.
//!
//! A [`PipeConnection`] delivers whole wire messages: each frame is a
//! 4-byte little-endian payload length followed by the payload. Clean
//! peer shutdown on a frame boundary surfaces as
//! [`Error::Disconnected`](crate::Error::Disconnected) so read loops can
//! terminate quietly; every other failure is a pipe error.

// ============================================================================
// Imports
// ============================================================================

use std::io::ErrorKind;
use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::trace;

use crate::error::{Error, Result};
use crate::wire::{InputBuffer, OutputBuffer};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on a single message payload.
///
/// Rejected before allocation; a frame this large is a protocol violation,
/// not a legitimate request.
pub const MAX_MESSAGE_SIZE: u32 = 64 * 1024 * 1024;

// ============================================================================
// PipeConnection
// ============================================================================

/// A live channel between exactly one client and the engine.
///
/// Within one connection, request/response pairs are strictly ordered:
/// callers must fully read one response before writing the next request.
/// The client facade enforces this with its connection lock.
#[derive(Debug)]
pub struct PipeConnection {
    /// Underlying byte stream.
    stream: UnixStream,
}

impl PipeConnection {
    /// Attaches to an existing listening endpoint (MODE_CONNECT).
    ///
    /// Fails fast when no engine is listening — no internal retry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) if the
    /// endpoint does not exist or refuses the connection.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).await.map_err(|e| {
            Error::connection(format!("no engine listening on {}: {e}", path.display()))
        })?;

        trace!(path = %path.display(), "Connected to engine endpoint");
        Ok(Self { stream })
    }

    /// Wraps an accepted stream (engine side).
    #[inline]
    #[must_use]
    pub(crate) fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Reads one complete length-prefixed message.
    ///
    /// Blocks until the full payload is available.
    ///
    /// # Errors
    ///
    /// - [`Error::Disconnected`](crate::Error::Disconnected) if the peer
    ///   closed the channel on a frame boundary
    /// - [`Error::Protocol`](crate::Error::Protocol) if the frame exceeds
    ///   [`MAX_MESSAGE_SIZE`]
    /// - [`Error::Pipe`](crate::Error::Pipe) on any other I/O failure,
    ///   including EOF mid-frame
    pub async fn read_message(&mut self) -> Result<InputBuffer> {
        let mut length_bytes = [0u8; 4];
        if let Err(e) = self.stream.read_exact(&mut length_bytes).await {
            // EOF before any length byte is a clean disconnect.
            if e.kind() == ErrorKind::UnexpectedEof {
                return Err(Error::Disconnected);
            }
            return Err(Error::pipe(format!("failed to read frame length: {e}")));
        }

        let length = u32::from_le_bytes(length_bytes);
        if length > MAX_MESSAGE_SIZE {
            return Err(Error::protocol(format!(
                "frame of {length} bytes exceeds limit of {MAX_MESSAGE_SIZE}"
            )));
        }

        let mut payload = vec![0u8; length as usize];
        self.stream
            .read_exact(&mut payload)
            .await
            .map_err(|e| Error::pipe(format!("failed to read frame payload: {e}")))?;

        trace!(length, "Message read");
        Ok(InputBuffer::new(payload))
    }

    /// Writes one message as a single length-prefixed frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`](crate::Error::Protocol) if the payload exceeds
    ///   [`MAX_MESSAGE_SIZE`]
    /// - [`Error::Pipe`](crate::Error::Pipe) on partial or failed writes
    pub async fn write_message(&mut self, message: &OutputBuffer) -> Result<()> {
        let payload = message.as_bytes();
        if payload.len() > MAX_MESSAGE_SIZE as usize {
            return Err(Error::protocol(format!(
                "frame of {} bytes exceeds limit of {MAX_MESSAGE_SIZE}",
                payload.len()
            )));
        }

        let length = (payload.len() as u32).to_le_bytes();
        self.stream
            .write_all(&length)
            .await
            .map_err(|e| Error::pipe(format!("failed to write frame length: {e}")))?;
        self.stream
            .write_all(payload)
            .await
            .map_err(|e| Error::pipe(format!("failed to write frame payload: {e}")))?;
        self.stream
            .flush()
            .await
            .map_err(|e| Error::pipe(format!("failed to flush frame: {e}")))?;

        trace!(length = payload.len(), "Message written");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::transport::PipeListener;

    async fn connected_pair(name: &str) -> (tempfile::TempDir, PipeConnection, PipeConnection) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(name);
        let listener = PipeListener::bind(&path).await.expect("bind");

        let client = tokio::spawn({
            let path = path.clone();
            async move { PipeConnection::connect(&path).await }
        });
        let server_side = listener.accept().await.expect("accept");
        let client_side = client.await.unwrap().expect("connect");
        (dir, client_side, server_side)
    }

    #[tokio::test]
    async fn test_connect_without_listener_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nobody.sock");

        let err = PipeConnection::connect(&path).await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[tokio::test]
    async fn test_message_round_trip() {
        let (_dir, mut client, mut server) = connected_pair("echo.sock").await;

        let mut message = OutputBuffer::new();
        message.write_str("ping").write_i32(7);
        client.write_message(&message).await.expect("write");

        let mut received = server.read_message().await.expect("read");
        assert_eq!(received.read_str().unwrap(), "ping");
        assert_eq!(received.read_i32().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_empty_message_round_trip() {
        let (_dir, mut client, mut server) = connected_pair("empty.sock").await;

        client
            .write_message(&OutputBuffer::new())
            .await
            .expect("write");
        let received = server.read_message().await.expect("read");
        assert!(received.is_exhausted());
    }

    #[tokio::test]
    async fn test_back_to_back_messages_framed() {
        let (_dir, mut client, mut server) = connected_pair("frames.sock").await;

        for text in ["first", "second", "third"] {
            let mut message = OutputBuffer::new();
            message.write_str(text);
            client.write_message(&message).await.expect("write");
        }

        for expected in ["first", "second", "third"] {
            let mut received = server.read_message().await.expect("read");
            assert_eq!(received.read_str().unwrap(), expected);
            assert!(received.is_exhausted());
        }
    }

    #[tokio::test]
    async fn test_peer_close_is_disconnected() {
        let (_dir, client, mut server) = connected_pair("close.sock").await;

        drop(client);

        let err = server.read_message().await.unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn test_oversized_write_rejected() {
        let (_dir, mut client, _server) = connected_pair("big.sock").await;

        let mut message = OutputBuffer::new();
        let huge = "x".repeat(MAX_MESSAGE_SIZE as usize + 16);
        message.write_str(&huge);

        let err = client.write_message(&message).await.unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
