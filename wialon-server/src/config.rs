//! Server configuration: CLI flags, `config.toml`, and environment
//! variables, applied in that precedence order over built-in defaults.

use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "wialon-server", about = "WialonIPS telematics server")]
pub struct Args {
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub devices: Option<String>,
    #[arg(long)]
    pub log: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    devices: Option<String>,
    log: Option<String>,
}

#[derive(Debug, Default)]
struct EnvConfig {
    host: Option<String>,
    port: Option<u16>,
    log: Option<String>,
}

impl EnvConfig {
    fn from_env() -> Self {
        Self {
            host: std::env::var("WIALON_HOST").ok(),
            port: std::env::var("WIALON_PORT").ok().and_then(|v| v.parse().ok()),
            log: std::env::var("WIALON_LOG").ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub devices_path: String,
    pub log: String,
}

impl ServerConfig {
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
            host: args.host.or(file.host).or(env.host).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: args.port.or(file.port).or(env.port).unwrap_or(20332),
            devices_path: args.devices.or(file.devices).unwrap_or_else(|| "devices.json".to_string()),
            log: args.log.or(file.log).or(env.log).unwrap_or_else(|| "wialon_server=info".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_set() {
        let cfg = ServerConfig::resolve(Args {
            config: "/nonexistent/path/config.toml".to_string(),
            host: None,
            port: None,
            devices: None,
            log: None,
        });
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 20332);
        assert_eq!(cfg.devices_path, "devices.json");
    }
}
