//! Chrome native-messaging framing: a 32-bit length in native byte order
//! followed by that many bytes of UTF-8 JSON.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::RelayError;
use crate::Result;

/// Chrome rejects host messages larger than 1 MiB.
pub const MAX_OUTGOING_BYTES: usize = 1024 * 1024;
pub const MAX_INCOMING_BYTES: usize = 64 * 1024 * 1024;

/// Read one message. `Ok(None)` when the extension closed the pipe.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Value>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_ne_bytes(len_buf) as usize;
    if len > MAX_INCOMING_BYTES {
        return Err(RelayError::FrameTooLarge {
            size: len,
            limit: MAX_INCOMING_BYTES,
        });
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(serde_json::from_slice(&buf)?))
}

pub async fn write_frame<W>(writer: &mut W, value: &Value) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let data = serde_json::to_vec(value)?;
    if data.len() > MAX_OUTGOING_BYTES {
        return Err(RelayError::FrameTooLarge {
            size: data.len(),
            limit: MAX_OUTGOING_BYTES,
        });
    }
    writer.write_all(&(data.len() as u32).to_ne_bytes()).await?;
    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(bytes: &[u8]) -> Vec<u8> {
        let mut out = (bytes.len() as u32).to_ne_bytes().to_vec();
        out.extend_from_slice(bytes);
        out
    }

    #[tokio::test]
    async fn reads_consecutive_frames_then_eof() {
        let mut input = frame(br#"{"type":"GET_CONFIG"}"#);
        input.extend(frame(br#"{"type":"CHECK_AUTH"}"#));
        let mut reader = input.as_slice();

        let first = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first["type"], "GET_CONFIG");
        let second = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(second["type"], "CHECK_AUTH");
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_prefixes_native_endian_length() {
        let mut out = Vec::new();
        write_frame(&mut out, &json!({"success": true})).await.unwrap();
        let body = br#"{"success":true}"#;
        assert_eq!(out, frame(body));
    }

    #[tokio::test]
    async fn oversized_reply_is_refused() {
        let big = "x".repeat(MAX_OUTGOING_BYTES);
        let mut out = Vec::new();
        let err = write_frame(&mut out, &json!({ "details": big }))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::FrameTooLarge { .. }));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_refused() {
        let input = ((MAX_INCOMING_BYTES + 1) as u32).to_ne_bytes();
        let mut reader = &input[..];
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(RelayError::FrameTooLarge { .. })
        ));
    }
}
