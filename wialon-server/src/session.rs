//! Per-connection session: login validation, duplicate-IMEI rejection, then
//! dispatch of `SD`/`D`/`B`/`P` frames to their acknowledgements.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use wialon_core::{
    decode, encode_ack, Body, ExtendedData, ExtendedDataResponseCode, LoginResponseCode, Packet,
    PacketType, ProtocolError, ShortData, ShortDataResponseCode,
};

/// Identify the frame type well enough from its raw prefix to answer a CRC
/// failure with the correct ack code, since a CRC mismatch means `decode()`
/// never exposes a parsed `Body` to dispatch on.
fn crc_error_ack(line: &[u8]) -> Option<Vec<u8>> {
    if line.starts_with(b"#L#") {
        Some(encode_ack(&PacketType::LoginResponse, LoginResponseCode::CrcError.as_str()))
    } else if line.starts_with(b"#SD#") {
        Some(encode_ack(&PacketType::ShortDataResponse, ShortDataResponseCode::CrcError.as_str()))
    } else if line.starts_with(b"#D#") {
        Some(encode_ack(&PacketType::ExtendedDataResponse, ExtendedDataResponseCode::CrcError.as_str()))
    } else if line.starts_with(b"#B#") {
        Some(encode_ack(&PacketType::BlackboxResponse, ExtendedDataResponseCode::CrcError.as_str()))
    } else {
        None
    }
}

use crate::registry::DeviceRegistry;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<Mutex<DeviceRegistry>>,
    active: Arc<Mutex<HashSet<String>>>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();

    let imei = match authenticate(&mut reader, &mut write_half, &registry, &mut line).await {
        Some(imei) => imei,
        None => return,
    };

    if !active.lock().unwrap().insert(imei.clone()) {
        warn!(%imei, %peer, "rejecting duplicate login");
        let _ = write_half
            .write_all(&encode_ack(&PacketType::LoginResponse, LoginResponseCode::Rejected.as_str()))
            .await;
        return;
    }
    let _ = write_half
        .write_all(&encode_ack(&PacketType::LoginResponse, LoginResponseCode::Ok.as_str()))
        .await;
    info!(%imei, %peer, "device online");

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => match decode(&line) {
                Ok(packet) => {
                    if let Some(response) = dispatch(&packet) {
                        if write_half.write_all(&response).await.is_err() {
                            break;
                        }
                    }
                }
                Err(ProtocolError::CrcMismatch { .. }) => {
                    warn!(%imei, "crc mismatch on post-login frame");
                    if let Some(ack) = crc_error_ack(&line) {
                        if write_half.write_all(&ack).await.is_err() {
                            break;
                        }
                    }
                }
                Err(e) => warn!(%imei, error = %e, "malformed frame"),
            },
            Err(e) => {
                warn!(%imei, error = %e, "read error");
                break;
            }
        }
    }

    active.lock().unwrap().remove(&imei);
    info!(%imei, "device offline");
}

/// Read and validate the first frame of a connection. Returns the
/// authenticated IMEI, or `None` if the connection should be dropped
/// (malformed login, bad credentials, or timeout).
async fn authenticate(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    registry: &Arc<Mutex<DeviceRegistry>>,
    line: &mut Vec<u8>,
) -> Option<String> {
    line.clear();
    match timeout(LOGIN_TIMEOUT, reader.read_until(b'\n', line)).await {
        Ok(Ok(0)) | Err(_) => return None,
        Ok(Err(_)) => return None,
        Ok(Ok(_)) => {}
    }

    let packet = match decode(line) {
        Ok(p) => p,
        Err(ProtocolError::CrcMismatch { .. }) => {
            if let Some(ack) = crc_error_ack(line) {
                let _ = writer.write_all(&ack).await;
            }
            return None;
        }
        Err(_) => return None,
    };

    let Body::Login { imei, password, .. } = packet.body else {
        return None;
    };

    let authed = registry.lock().unwrap().authenticate(&imei, &password);
    match authed {
        Some(true) => Some(imei),
        _ => {
            let _ = writer
                .write_all(&encode_ack(&PacketType::LoginResponse, LoginResponseCode::AuthError.as_str()))
                .await;
            None
        }
    }
}

/// Build the acknowledgement frame for a decoded frame, if one applies.
fn dispatch(packet: &Packet) -> Option<Vec<u8>> {
    match &packet.body {
        Body::Ping => Some(encode_ack(&PacketType::PingResponse, "1")),
        Body::ShortData(d) => {
            let code = validate_short(d).as_str();
            Some(encode_ack(&PacketType::ShortDataResponse, code))
        }
        Body::ExtendedData(d) => {
            let code = validate_extended(d).as_str();
            Some(encode_ack(&PacketType::ExtendedDataResponse, code))
        }
        Body::Blackbox(items) => {
            let code = items
                .iter()
                .map(validate_extended)
                .find(|c| *c != ExtendedDataResponseCode::Ok)
                .unwrap_or(ExtendedDataResponseCode::Ok);
            debug!(count = items.len(), "blackbox batch received");
            Some(encode_ack(&PacketType::BlackboxResponse, code.as_str()))
        }
        Body::Login { .. } => Some(encode_ack(&PacketType::LoginResponse, LoginResponseCode::Ok.as_str())),
        Body::Ack | Body::Opaque(_) => None,
    }
}

fn validate_short(d: &ShortData) -> ShortDataResponseCode {
    if d.timestamp.is_none() {
        return ShortDataResponseCode::InvalidTimestamp;
    }
    if d.latitude.is_none() || d.longitude.is_none() {
        return ShortDataResponseCode::CoordinateError;
    }
    if d.speed.is_none() || d.course.is_none() {
        return ShortDataResponseCode::MovePropsError;
    }
    if d.sats.is_none() {
        return ShortDataResponseCode::SatsError;
    }
    ShortDataResponseCode::Ok
}

fn validate_extended(d: &ExtendedData) -> ExtendedDataResponseCode {
    match validate_short(&d.short) {
        ShortDataResponseCode::InvalidTimestamp => ExtendedDataResponseCode::InvalidTimestamp,
        ShortDataResponseCode::CoordinateError => ExtendedDataResponseCode::CoordinateError,
        ShortDataResponseCode::MovePropsError => ExtendedDataResponseCode::MovePropsError,
        ShortDataResponseCode::SatsError => ExtendedDataResponseCode::SatsError,
        _ => ExtendedDataResponseCode::Ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn crc_error_ack_matches_frame_type() {
        assert_eq!(
            crc_error_ack(b"#SD#garbage;ZZZZ\r\n"),
            Some(encode_ack(&PacketType::ShortDataResponse, ShortDataResponseCode::CrcError.as_str()))
        );
        assert_eq!(
            crc_error_ack(b"#D#garbage;ZZZZ\r\n"),
            Some(encode_ack(&PacketType::ExtendedDataResponse, ExtendedDataResponseCode::CrcError.as_str()))
        );
        assert_eq!(
            crc_error_ack(b"#B#garbage;ZZZZ\r\n"),
            Some(encode_ack(&PacketType::BlackboxResponse, ExtendedDataResponseCode::CrcError.as_str()))
        );
        assert_eq!(crc_error_ack(b"#P#;ZZZZ\r\n"), None);
    }

    #[test]
    fn validate_short_flags_missing_timestamp() {
        let d = ShortData::default();
        assert_eq!(validate_short(&d), ShortDataResponseCode::InvalidTimestamp);
    }

    #[test]
    fn validate_short_accepts_complete_fix() {
        let d = ShortData {
            timestamp: Some(Utc::now()),
            latitude: Some(53.9),
            longitude: Some(27.5),
            speed: Some(10),
            course: Some(90),
            alt: Some(100),
            sats: Some(7),
        };
        assert_eq!(validate_short(&d), ShortDataResponseCode::Ok);
    }

    #[test]
    fn blackbox_validation_surfaces_first_failure() {
        let good = ExtendedData {
            short: ShortData {
                timestamp: Some(Utc::now()),
                latitude: Some(1.0),
                longitude: Some(1.0),
                speed: Some(0),
                course: Some(0),
                alt: Some(0),
                sats: Some(5),
            },
            ..Default::default()
        };
        let bad = ExtendedData::default();
        let code = [good, bad]
            .iter()
            .map(validate_extended)
            .find(|c| *c != ExtendedDataResponseCode::Ok)
            .unwrap_or(ExtendedDataResponseCode::Ok);
        assert_eq!(code, ExtendedDataResponseCode::InvalidTimestamp);
    }
}
