//! TCP session: login handshake, then concurrent read/write loops until the
//! connection drops, with a fixed backoff before redialing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use wialon_core::{decode, encode_extended_data, encode_login, encode_ping, BlackBox, Packet, PacketType};

use crate::config::DeviceConfig;
use crate::device::DeviceState;
use crate::telemetry::record_to_extended_data;

const ACK_TIMEOUT: Duration = Duration::from_secs(5);
/// Sleep between drain passes once the queue runs dry (`BlackBox.timeout` in
/// the write-loop description).
const BLACKBOX_DRAIN_INTERVAL: Duration = Duration::from_secs(10);
const PING_INTERVAL: Duration = Duration::from_secs(30);
const RECONNECT_BACKOFF: Duration = Duration::from_secs(3);

/// Dial, authenticate, run the session to completion, then redial forever.
/// Never returns; every failure is logged and retried.
pub async fn run_forever(config: DeviceConfig, blackbox: Arc<Mutex<BlackBox>>, state: Arc<Mutex<DeviceState>>) {
    loop {
        match connect_and_login(&config, &state).await {
            Ok(stream) => {
                *state.lock().unwrap() = DeviceState::Online;
                info!(imei = %config.imei, host = %config.host, port = config.port, "device online");
                run_session(stream, blackbox.clone()).await;
                warn!("session ended");
            }
            Err(e) => {
                warn!(error = %e, "login failed");
            }
        }
        *state.lock().unwrap() = DeviceState::Disconnected;
        tokio::time::sleep(RECONNECT_BACKOFF).await;
    }
}

/// `Disconnected → Dialing → Authenticating → Online` (the `Online`
/// transition itself is applied by the caller once the session starts).
async fn connect_and_login(config: &DeviceConfig, state: &Arc<Mutex<DeviceState>>) -> anyhow::Result<TcpStream> {
    *state.lock().unwrap() = DeviceState::Dialing;
    let addr = format!("{}:{}", config.host, config.port);
    let mut stream = TcpStream::connect(&addr).await?;

    *state.lock().unwrap() = DeviceState::Authenticating;
    let login = encode_login(&config.ver, &config.imei, &config.password);
    stream.write_all(&login).await?;

    let mut line = Vec::new();
    {
        let mut reader = BufReader::new(&mut stream);
        timeout(ACK_TIMEOUT, reader.read_until(b'\n', &mut line)).await??;
    }
    if line.is_empty() {
        anyhow::bail!("connection closed during login");
    }
    let packet = decode(&line)?;
    if packet.kind != PacketType::LoginResponse {
        anyhow::bail!("unexpected response to login: {:?}", packet.kind);
    }
    if packet.code.as_deref() != Some("1") {
        anyhow::bail!("login rejected with code {:?}", packet.code);
    }
    Ok(stream)
}

async fn run_session(stream: TcpStream, blackbox: Arc<Mutex<BlackBox>>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<Packet>();

    let read_task = tokio::spawn(async move {
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => match decode(&line) {
                    Ok(packet) => {
                        if ack_tx.send(packet).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "malformed frame from server"),
                },
                Err(e) => {
                    warn!(error = %e, "read error");
                    break;
                }
            }
        }
    });

    let mut ping_ticker = interval(PING_INTERVAL);

    loop {
        let pending = { blackbox.lock().unwrap().pending() };
        let wait = if pending > 0 { Duration::ZERO } else { BLACKBOX_DRAIN_INTERVAL };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                if pending > 0 {
                    if let Err(e) = send_one(&mut write_half, &blackbox, &mut ack_rx).await {
                        warn!(error = %e, "send failed");
                        break;
                    }
                }
            }
            _ = ping_ticker.tick() => {
                if write_half.write_all(&encode_ping()).await.is_err() {
                    break;
                }
            }
        }
    }

    read_task.abort();
}

/// One drain step: `peek(1)`, encode as a `D` frame, send, await the
/// matching `AD#<code>` up to [`ACK_TIMEOUT`]. Only `AD#1` confirms the
/// record; any other code or a timeout leaves it queued for the next pass.
///
/// Packets are matched to this pending request by framing type: the ping
/// ticker shares `ack_rx` and can interleave an `AP` ack at any time, which
/// must be skipped rather than mistaken for the data ack.
async fn send_one(
    write_half: &mut (impl AsyncWrite + Unpin),
    blackbox: &Arc<Mutex<BlackBox>>,
    ack_rx: &mut mpsc::UnboundedReceiver<Packet>,
) -> anyhow::Result<()> {
    let Some(record) = blackbox.lock().unwrap().peek(1).into_iter().next() else {
        return Ok(());
    };
    let data = record_to_extended_data(&record);
    write_half.write_all(&encode_extended_data(&data)).await?;

    let deadline = Instant::now() + ACK_TIMEOUT;
    loop {
        match timeout_at(deadline, ack_rx.recv()).await {
            Ok(Some(packet)) if packet.kind == PacketType::ExtendedDataResponse => {
                if packet.code.as_deref() == Some("1") {
                    blackbox.lock().unwrap().confirm(1)?;
                    debug!("record confirmed");
                } else {
                    warn!(code = ?packet.code, "server rejected record, will retry");
                }
                return Ok(());
            }
            Ok(Some(_other)) => continue,
            Ok(None) => anyhow::bail!("connection closed while awaiting ack"),
            Err(_) => {
                warn!("ack timed out, will retry");
                return Ok(());
            }
        }
    }
}
