//! End-to-end login handshake over a real loopback socket.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::sleep;

use wialon_core::{decode, encode_login, LoginResponseCode, Packet, PacketType};
use wialon_server::config::ServerConfig;
use wialon_server::server;

fn test_config(port: u16, devices_path: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        devices_path: devices_path.to_string(),
        log: "wialon_server=warn".to_string(),
    }
}

fn write_devices(path: &std::path::Path) {
    std::fs::write(path, br#"[{"imei":"wips","password":"wips"}]"#).unwrap();
}

async fn login(addr: &str, imei: &str, password: &str) -> Packet {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&encode_login("2.0", imei, password)).await.unwrap();

    let mut reader = BufReader::new(&mut stream);
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line).await.unwrap();
    decode(&line).unwrap()
}

#[tokio::test]
async fn login_success_reaches_online() {
    let devices_path = std::env::temp_dir().join("wialon-server-it-success.json");
    write_devices(&devices_path);

    let config = test_config(28732, devices_path.to_str().unwrap());
    let addr = format!("{}:{}", config.host, config.port);
    tokio::spawn(server::run(config));
    sleep(Duration::from_millis(150)).await;

    let ack = login(&addr, "wips", "wips").await;
    assert_eq!(ack.kind, PacketType::LoginResponse);
    assert_eq!(ack.code.as_deref(), Some(LoginResponseCode::Ok.as_str()));

    let _ = std::fs::remove_file(&devices_path);
}

#[tokio::test]
async fn unknown_imei_is_rejected() {
    let devices_path = std::env::temp_dir().join("wialon-server-it-unknown.json");
    write_devices(&devices_path);

    let config = test_config(28734, devices_path.to_str().unwrap());
    let addr = format!("{}:{}", config.host, config.port);
    tokio::spawn(server::run(config));
    sleep(Duration::from_millis(150)).await;

    let ack = login(&addr, "no-such-device", "wips").await;
    assert_eq!(ack.code.as_deref(), Some(LoginResponseCode::AuthError.as_str()));

    let _ = std::fs::remove_file(&devices_path);
}

#[tokio::test]
async fn duplicate_login_is_rejected_while_first_stays_connected() {
    let devices_path = std::env::temp_dir().join("wialon-server-it-dup.json");
    write_devices(&devices_path);

    let config = test_config(28736, devices_path.to_str().unwrap());
    let addr = format!("{}:{}", config.host, config.port);
    tokio::spawn(server::run(config));
    sleep(Duration::from_millis(150)).await;

    let mut first = TcpStream::connect(&addr).await.unwrap();
    first.write_all(&encode_login("2.0", "wips", "wips")).await.unwrap();
    let mut first_reader = BufReader::new(&mut first);
    let mut first_line = Vec::new();
    first_reader.read_until(b'\n', &mut first_line).await.unwrap();
    let first_ack = decode(&first_line).unwrap();
    assert_eq!(first_ack.code.as_deref(), Some(LoginResponseCode::Ok.as_str()));

    let second_ack = login(&addr, "wips", "wips").await;
    assert_eq!(second_ack.code.as_deref(), Some(LoginResponseCode::Rejected.as_str()));

    drop(first_reader);

    // The first connection is untouched by the rejected duplicate: it can
    // still ping and get an ack.
    first.write_all(&wialon_core::encode_ping()).await.unwrap();
    let mut reader = BufReader::new(&mut first);
    let mut line = Vec::new();
    timeout_read(&mut reader, &mut line).await;
    let ping_ack = decode(&line).unwrap();
    assert_eq!(ping_ack.kind, PacketType::PingResponse);

    let _ = std::fs::remove_file(&devices_path);
}

async fn timeout_read(reader: &mut BufReader<&mut TcpStream>, line: &mut Vec<u8>) {
    tokio::time::timeout(Duration::from_secs(2), reader.read_until(b'\n', line)).await.unwrap().unwrap();
}
