//! wialon-device — WialonIPS telematics device client.
//!
//! Dials the configured server, logs in, then runs two concurrent loops for
//! the lifetime of the connection: a sampler that aggregates positional and
//! parameter signals into the BlackBox, and a session that drains it to the
//! wire and reconnects on failure.

use std::sync::{Arc, Mutex};

use wialon_core::BlackBox;

use std::time::Duration;

use wialon_device::config::DeviceConfig;
use wialon_device::device::{self, DeviceState};
use wialon_device::sampler::SamplerConfig;
use wialon_device::sensors::{StubBatterySource, StubGeoSource};
use wialon_device::{connection, sampler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DeviceConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log.clone().into()),
        )
        .init();

    tracing::info!(imei = %config.imei, host = %config.host, port = config.port, "wialon-device starting");

    let blackbox = Arc::new(Mutex::new(BlackBox::open(wialon_core::blackbox::DEFAULT_FILE)));

    let mut observer = device::build_observer(&config);
    let blackbox_sink = blackbox.clone();
    observer.set_on_event(move |record| {
        if let Err(e) = blackbox_sink.lock().unwrap().push(record) {
            tracing::warn!(error = %e, "failed to persist record to blackbox");
        }
    });

    let geo_source = Box::new(StubGeoSource::new(53.9, 27.5));
    let battery_source = Box::new(StubBatterySource::new(100.0));

    let state = Arc::new(Mutex::new(DeviceState::Disconnected));

    let sampler_config = SamplerConfig {
        positional_interval: Duration::from_secs(config.positional_interval_secs),
        emit_interval: Duration::from_secs(config.emit_interval_secs),
        param_interval: Duration::from_secs(config.param_interval_secs),
    };

    let sampler_handle = tokio::spawn(sampler::run(observer, geo_source, battery_source, sampler_config));
    let session_handle = tokio::spawn(connection::run_forever(config, blackbox, state));

    tokio::select! {
        _ = sampler_handle => {}
        _ = session_handle => {}
    }

    Ok(())
}
