//! Device configuration: CLI flags, `config.toml`, and environment
//! variables, applied in that precedence order over built-in defaults.

use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "wialon-device", about = "WialonIPS telematics device client")]
pub struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub imei: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub log: Option<String>,
    /// Positional sample cadence, in seconds (default 5).
    #[arg(long)]
    pub positional_interval_secs: Option<u64>,
    /// Forced low-priority emit cadence, in seconds (default 10).
    #[arg(long)]
    pub emit_interval_secs: Option<u64>,
    /// Demo-parameter (battery) sample cadence, in seconds (default 15).
    #[arg(long)]
    pub param_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    imei: Option<String>,
    password: Option<String>,
    log: Option<String>,
    positional_interval_secs: Option<u64>,
    emit_interval_secs: Option<u64>,
    param_interval_secs: Option<u64>,
}

#[derive(Debug, Default)]
struct EnvConfig {
    host: Option<String>,
    port: Option<u16>,
    imei: Option<String>,
    password: Option<String>,
    log: Option<String>,
    positional_interval_secs: Option<u64>,
    emit_interval_secs: Option<u64>,
    param_interval_secs: Option<u64>,
}

impl EnvConfig {
    fn from_env() -> Self {
        Self {
            host: std::env::var("WIALON_HOST").ok(),
            port: std::env::var("WIALON_PORT").ok().and_then(|v| v.parse().ok()),
            imei: std::env::var("WIALON_IMEI").ok(),
            password: std::env::var("WIALON_PASSWORD").ok(),
            log: std::env::var("WIALON_LOG").ok(),
            positional_interval_secs: std::env::var("WIALON_POSITIONAL_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()),
            emit_interval_secs: std::env::var("WIALON_EMIT_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()),
            param_interval_secs: std::env::var("WIALON_PARAM_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
    pub imei: String,
    pub password: String,
    pub ver: String,
    pub log: String,
    pub positional_interval_secs: u64,
    pub emit_interval_secs: u64,
    pub param_interval_secs: u64,
}

impl DeviceConfig {
    /// Resolve configuration with precedence CLI > file > env > default.
    pub fn load() -> Self {
        let args = Args::parse();
        Self::resolve(args)
    }

    fn resolve(args: Args) -> Self {
        let file: FileConfig = std::fs::read_to_string(&args.config)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default();
        let env = EnvConfig::from_env();

        Self {
            host: args.host.or(file.host).or(env.host).unwrap_or_else(|| "127.0.0.1".to_string()),
            port: args.port.or(file.port).or(env.port).unwrap_or(20332),
            imei: args.imei.or(file.imei).or(env.imei).unwrap_or_else(|| "wips".to_string()),
            password: args
                .password
                .or(file.password)
                .or(env.password)
                .unwrap_or_else(|| "wips".to_string()),
            ver: "2.0".to_string(),
            log: args.log.or(file.log).or(env.log).unwrap_or_else(|| "wialon_device=info".to_string()),
            positional_interval_secs: args
                .positional_interval_secs
                .or(file.positional_interval_secs)
                .or(env.positional_interval_secs)
                .unwrap_or(5),
            emit_interval_secs: args
                .emit_interval_secs
                .or(file.emit_interval_secs)
                .or(env.emit_interval_secs)
                .unwrap_or(10),
            param_interval_secs: args
                .param_interval_secs
                .or(file.param_interval_secs)
                .or(env.param_interval_secs)
                .unwrap_or(15),
        }
    }
}
