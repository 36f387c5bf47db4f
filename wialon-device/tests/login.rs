//! Login handshake against a fake server over loopback, verifying the
//! `Disconnected -> Dialing -> Authenticating -> Online` transition and its
//! reversal on a rejected login.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::sleep;

use wialon_core::{encode_ack, BlackBox, LoginResponseCode, PacketType};
use wialon_device::config::DeviceConfig;
use wialon_device::connection;
use wialon_device::device::DeviceState;

fn test_config(port: u16) -> DeviceConfig {
    DeviceConfig {
        host: "127.0.0.1".to_string(),
        port,
        imei: "wips".to_string(),
        password: "wips".to_string(),
        ver: "2.0".to_string(),
        log: "wialon_device=warn".to_string(),
        positional_interval_secs: 5,
        emit_interval_secs: 10,
        param_interval_secs: 15,
    }
}

#[tokio::test]
async fn successful_login_reaches_online_state() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut line = Vec::new();
        reader.read_until(b'\n', &mut line).await.unwrap();
        write_half
            .write_all(&encode_ack(&PacketType::LoginResponse, LoginResponseCode::Ok.as_str()))
            .await
            .unwrap();
        sleep(Duration::from_secs(5)).await;
    });

    let blackbox_path = std::env::temp_dir().join("wialon-device-it-blackbox-ok.json");
    let _ = std::fs::remove_file(&blackbox_path);
    let blackbox = Arc::new(Mutex::new(BlackBox::open(&blackbox_path)));
    let state = Arc::new(Mutex::new(DeviceState::Disconnected));

    tokio::spawn(connection::run_forever(test_config(port), blackbox, state.clone()));
    sleep(Duration::from_millis(200)).await;

    assert_eq!(*state.lock().unwrap(), DeviceState::Online);
    let _ = std::fs::remove_file(&blackbox_path);
}

#[tokio::test]
async fn rejected_login_returns_to_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            let mut line = Vec::new();
            if matches!(reader.read_until(b'\n', &mut line).await, Ok(0) | Err(_)) {
                continue;
            }
            let _ = write_half
                .write_all(&encode_ack(&PacketType::LoginResponse, LoginResponseCode::AuthError.as_str()))
                .await;
        }
    });

    let blackbox_path = std::env::temp_dir().join("wialon-device-it-blackbox-reject.json");
    let _ = std::fs::remove_file(&blackbox_path);
    let blackbox = Arc::new(Mutex::new(BlackBox::open(&blackbox_path)));
    let state = Arc::new(Mutex::new(DeviceState::Disconnected));

    tokio::spawn(connection::run_forever(test_config(port), blackbox, state.clone()));
    sleep(Duration::from_millis(200)).await;

    assert_eq!(*state.lock().unwrap(), DeviceState::Disconnected);
    let _ = std::fs::remove_file(&blackbox_path);
}
