//! Per-connection framing.
//!
//! One request per connection: the peer writes its frame and half-closes.
//! The reader stops at EOF or at `cap` bytes, whichever comes first, so an
//! oversized payload is observed as oversized instead of being silently
//! truncated to a fixed chunk.

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use clawsec_core::error::{ClawSecError, Result};
use clawsec_core::protocol::frame::AGENT_HEADER_LEN;
use clawsec_core::protocol::rpc::RpcResponse;

/// Read cap for a given payload bound: header plus one byte past the bound.
pub fn frame_cap(max_payload_bytes: usize) -> usize {
    AGENT_HEADER_LEN
        .saturating_add(max_payload_bytes)
        .saturating_add(1)
}

/// Read one frame within `deadline`.
pub async fn read_frame<R>(reader: &mut R, cap: usize, deadline: Duration) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let read = async {
        let mut buf = Vec::with_capacity(cap.min(8192));
        reader.take(cap as u64).read_to_end(&mut buf).await?;
        Ok::<_, ClawSecError>(Bytes::from(buf))
    };

    tokio::time::timeout(deadline, read)
        .await
        .map_err(|_| ClawSecError::Timeout)?
}

/// Write the single response of a connection.
pub async fn write_response<W>(writer: &mut W, response: &RpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&response.to_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_until_half_close() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::spawn(async move {
            client.write_all(b"{\"jsonrpc\":").await.ok();
            client.write_all(b"\"2.0\"}").await.ok();
            client.shutdown().await.ok();
        });
        let frame = read_frame(&mut server, 1024, Duration::from_secs(5))
            .await
            .expect("frame");
        assert_eq!(&frame[..], b"{\"jsonrpc\":\"2.0\"}");
    }

    #[tokio::test]
    async fn stops_at_cap() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(&[b'a'; 100]).await.expect("write");
        let frame = read_frame(&mut server, 40, Duration::from_secs(5))
            .await
            .expect("frame");
        assert_eq!(frame.len(), 40);
    }

    #[tokio::test]
    async fn silent_peer_hits_deadline() {
        let (_client, mut server) = tokio::io::duplex(64);
        let err = read_frame(&mut server, 1024, Duration::from_millis(20))
            .await
            .expect_err("must time out");
        assert!(matches!(err, ClawSecError::Timeout));
    }

    #[test]
    fn cap_leaves_room_to_detect_oversize() {
        assert_eq!(frame_cap(1024), AGENT_HEADER_LEN + 1025);
        assert_eq!(frame_cap(usize::MAX), usize::MAX);
    }
}
