//! Minimal client: one frame out, one response back.

use std::io;
use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use clawsec_core::error::{ClawSecError, Result};
use clawsec_core::protocol::rpc::RpcResponse;

/// Send `frame`, half-close, and read the daemon's response.
///
/// Sending and receiving run concurrently: the daemon stops reading at its
/// size cap and answers before the whole frame is written, so the write
/// side may fail with a broken pipe after the response has arrived.
///
/// Returns `None` when the daemon closed without answering (empty frame,
/// read deadline, or internal error).
pub async fn request(path: impl AsRef<Path>, frame: &[u8]) -> Result<Option<RpcResponse>> {
    let stream = UnixStream::connect(path.as_ref()).await?;
    let (mut rd, mut wr) = stream.into_split();

    let send = async {
        wr.write_all(frame).await?;
        wr.shutdown().await
    };
    let recv = async {
        let mut buf = Vec::new();
        let res = rd.read_to_end(&mut buf).await;
        (buf, res)
    };
    let (sent, (buf, received)) = tokio::join!(send, recv);

    match received {
        Ok(_) => {}
        // unread input on the daemon side turns its close into a reset
        Err(e) if is_peer_gone(&e) && !buf.is_empty() => {}
        Err(e) => return Err(e.into()),
    }
    if buf.is_empty() {
        sent?;
        return Ok(None);
    }
    if let Err(e) = sent {
        if !is_peer_gone(&e) {
            return Err(e.into());
        }
    }

    serde_json::from_slice(&buf)
        .map(Some)
        .map_err(|e| ClawSecError::BadRequest(format!("invalid response json: {e}")))
}

fn is_peer_gone(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
    )
}
