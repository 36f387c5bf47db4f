//! Periodic positional/parameter refresh.
//!
//! Three independent cadences, matching the write loop only in that all
//! three run concurrently with it: positional refresh (fast), a coarser
//! forced low-priority emit, and an even coarser demo-parameter (battery)
//! refresh. Each just updates the observer; `emit`'s own firing rules (plus
//! the dedicated emit tick) decide what actually reaches the BlackBox.

use std::time::Duration;

use tokio::time::interval;
use tracing::debug;
use wialon_core::{datetime, geo, IOObserver, Priority, Value};

use crate::sensors::{BatterySource, GeoSource};

#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    pub positional_interval: Duration,
    pub emit_interval: Duration,
    pub param_interval: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            positional_interval: Duration::from_secs(5),
            emit_interval: Duration::from_secs(10),
            param_interval: Duration::from_secs(15),
        }
    }
}

pub async fn run(
    mut observer: IOObserver,
    mut geo_source: Box<dyn GeoSource>,
    mut battery_source: Box<dyn BatterySource>,
    config: SamplerConfig,
) {
    let mut positional_ticker = interval(config.positional_interval);
    let mut emit_ticker = interval(config.emit_interval);
    let mut param_ticker = interval(config.param_interval);

    loop {
        tokio::select! {
            _ = positional_ticker.tick() => {
                let fix = geo_source.sample();
                let (date, time) = datetime::format(fix.timestamp);
                observer.update_positional("date", Value::Str(date));
                observer.update_positional("time", Value::Str(time));
                observer.update_positional("lat_deg", Value::Real(fix.latitude));
                observer.update_positional("lon_deg", Value::Real(fix.longitude));
                observer.update_positional("speed", Value::Int(fix.speed));
                observer.update_positional("course", Value::Int(fix.course));
                observer.update_positional("alt", Value::Int(fix.alt));
                observer.update_positional("sats", Value::Int(fix.sats));

                let (lat_field, lat_sign) = geo::lat_to_ddmm(fix.latitude);
                let (lon_field, lon_sign) = geo::lon_to_ddmm(fix.longitude);
                debug!(
                    lat = %format!("{lat_field}{}", lat_sign.as_char()),
                    lon = %format!("{lon_field}{}", lon_sign.as_char()),
                    "sampled position"
                );
            }
            _ = param_ticker.tick() => {
                let battery_pct = battery_source.sample();
                observer.update_param("battery", Value::Real(battery_pct));
                if battery_pct < 10.0 {
                    observer.update_param("SOS", Value::Int(1));
                }
            }
            _ = emit_ticker.tick() => {
                observer.emit(Priority::Low);
            }
        }
    }
}
