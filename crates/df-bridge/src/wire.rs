//! ADB host-protocol framing
//!
//! Requests are a 4-digit hex length followed by the payload, e.g.
//! `000chost:devices`. The server answers with `OKAY` or `FAIL`; a `FAIL`
//! is followed by a length-prefixed message. Device lists use the same
//! length prefix, and `host:track-devices` keeps sending them.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Decoder;

use df_core::error::BridgeError;
use df_core::{Session, SessionStatus};

/// Largest payload a 4-digit hex length can describe
pub const MAX_PAYLOAD_LEN: usize = 0xffff;

const OKAY: &[u8; 4] = b"OKAY";
const FAIL: &[u8; 4] = b"FAIL";

/// Frame a request payload
pub fn encode_request(payload: &str) -> Result<Vec<u8>, BridgeError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(BridgeError::InvalidArgument(format!(
            "request too long ({} bytes)",
            payload.len()
        )));
    }
    let mut out = format!("{:04x}", payload.len()).into_bytes();
    out.extend_from_slice(payload.as_bytes());
    Ok(out)
}

fn parse_len(prefix: &[u8]) -> Result<usize, BridgeError> {
    std::str::from_utf8(prefix)
        .ok()
        .and_then(|s| usize::from_str_radix(s, 16).ok())
        .ok_or_else(|| {
            BridgeError::Protocol(format!(
                "invalid length prefix {:?}",
                String::from_utf8_lossy(prefix)
            ))
        })
}

/// Send one request
pub async fn send_request<S>(stream: &mut S, payload: &str) -> Result<(), BridgeError>
where
    S: AsyncWrite + Unpin,
{
    let frame = encode_request(payload)?;
    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

/// Read one length-prefixed string
pub async fn read_prefixed<S>(stream: &mut S) -> Result<String, BridgeError>
where
    S: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    stream.read_exact(&mut prefix).await?;
    let len = parse_len(&prefix)?;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(String::from_utf8_lossy(&payload).into_owned())
}

/// Read the `OKAY`/`FAIL` status of the last request
pub async fn read_status<S>(stream: &mut S) -> Result<(), BridgeError>
where
    S: AsyncRead + Unpin,
{
    let mut status = [0u8; 4];
    stream.read_exact(&mut status).await?;
    match &status {
        OKAY => Ok(()),
        FAIL => {
            let message = read_prefixed(stream).await?;
            if message.contains("not found") {
                Err(BridgeError::DeviceNotFound(message))
            } else {
                Err(BridgeError::Failed(message))
            }
        }
        other => Err(BridgeError::Protocol(format!(
            "unexpected status {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Read everything until the server closes the connection
pub async fn read_to_close<S>(stream: &mut S) -> Result<String, BridgeError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse a `serial<TAB>state` device list
pub fn parse_devices(payload: &str) -> Vec<Session> {
    payload
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next().unwrap_or("");
            Some(Session::from_state(serial, state))
        })
        .collect()
}

/// Codec for the stream of device lists sent by `host:track-devices`
#[derive(Debug, Default)]
pub struct DeviceListCodec;

impl Decoder for DeviceListCodec {
    type Item = Vec<Session>;
    type Error = BridgeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }
        let len = parse_len(&src[..4])?;
        if src.len() < 4 + len {
            src.reserve(4 + len - src.len());
            return Ok(None);
        }
        src.advance(4);
        let payload = src.split_to(len);
        Ok(Some(parse_devices(&String::from_utf8_lossy(&payload))))
    }
}

/// Sessions that were in `previous` but are missing from `current`
pub fn vanished(previous: &[Session], current: &[Session]) -> Vec<Session> {
    previous
        .iter()
        .filter(|old| !current.iter().any(|new| new.serial == old.serial))
        .filter(|old| old.status != SessionStatus::Absent)
        .map(|old| Session::absent(old.serial.clone()))
        .collect()
}
