//! Connection handshake
//!
//! Both sides exchange a fixed 5-byte preamble before any frame:
//!
//! ```text
//! Client                                   Server
//!   |------- magic (4) + version (1) ------>|
//!   |<------ magic (4) + version (1) -------|
//!   |                                       |
//!   |          [frames may flow]            |
//! ```
//!
//! Each side writes its preamble eagerly and then verifies the peer's, so
//! neither direction waits on the other. A bad magic means the peer is
//! not speaking this protocol at all; a version mismatch means it is, but
//! incompatibly. Both are terminal.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{FlightError, Result};

/// Protocol magic, first bytes on every connection
pub const MAGIC: [u8; 4] = *b"FLRP";

/// Current protocol version
pub const PROTOCOL_VERSION: u8 = 1;

/// Run the client side of the handshake
pub async fn client_handshake<S>(io: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    exchange(io).await
}

/// Run the server side of the handshake
pub async fn server_handshake<S>(io: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    exchange(io).await
}

async fn exchange<S>(io: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ours = [0u8; 5];
    ours[..4].copy_from_slice(&MAGIC);
    ours[4] = PROTOCOL_VERSION;
    io.write_all(&ours).await?;
    io.flush().await?;

    let mut theirs = [0u8; 5];
    io.read_exact(&mut theirs).await?;

    if theirs[..4] != MAGIC {
        return Err(FlightError::Handshake(format!(
            "bad magic: {:02x?}",
            &theirs[..4]
        )));
    }
    if theirs[4] != PROTOCOL_VERSION {
        return Err(FlightError::Handshake(format!(
            "peer speaks version {}, expected {}",
            theirs[4], PROTOCOL_VERSION
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handshake_completes_both_sides() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let (c, s) = tokio::join!(client_handshake(&mut client), server_handshake(&mut server));
        c.unwrap();
        s.unwrap();
    }

    #[tokio::test]
    async fn test_bad_magic_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let garbage = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            server.write_all(b"HTTP/1.1\r\n").await.unwrap();
            server
        });

        let result = client_handshake(&mut client).await;
        assert!(matches!(result, Err(FlightError::Handshake(_))));
        garbage.await.unwrap();
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let peer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let mut preamble = [0u8; 5];
            preamble[..4].copy_from_slice(&MAGIC);
            preamble[4] = PROTOCOL_VERSION + 1;
            server.write_all(&preamble).await.unwrap();
            server
        });

        let result = client_handshake(&mut client).await;
        assert!(matches!(result, Err(FlightError::Handshake(_))));
        peer.await.unwrap();
    }
}
