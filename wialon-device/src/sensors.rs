//! Geolocation and battery sources.
//!
//! Real GNSS/power-management hardware is an external collaborator out of
//! scope for this crate; these traits let the sampler stay agnostic to the
//! backing implementation while a deterministic stub drives development and
//! tests.

use chrono::{DateTime, Utc};

/// A single positional fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: i64,
    pub course: i64,
    pub alt: i64,
    pub sats: i64,
}

pub trait GeoSource: Send {
    fn sample(&mut self) -> GeoFix;
}

pub trait BatterySource: Send {
    /// Battery level as a percentage in `0.0..=100.0`.
    fn sample(&mut self) -> f64;
}

/// Walks a fixed course at constant speed around a start point, advancing
/// one sample step per call. Deterministic so tests can assert on exact
/// output sequences.
pub struct StubGeoSource {
    origin_lat: f64,
    origin_lon: f64,
    step: f64,
    tick: u64,
}

impl StubGeoSource {
    pub fn new(origin_lat: f64, origin_lon: f64) -> Self {
        Self { origin_lat, origin_lon, step: 0.0001, tick: 0 }
    }
}

impl GeoSource for StubGeoSource {
    fn sample(&mut self) -> GeoFix {
        let n = self.tick as f64;
        self.tick += 1;
        GeoFix {
            timestamp: Utc::now(),
            latitude: self.origin_lat + self.step * n,
            longitude: self.origin_lon + self.step * n,
            speed: 20 + (self.tick % 5) as i64,
            course: ((self.tick * 7) % 360) as i64,
            alt: 100,
            sats: 8,
        }
    }
}

/// Drains linearly from a starting charge, looping back to full once
/// depleted — enough to exercise low-battery alarms without external input.
pub struct StubBatterySource {
    level: f64,
    drain_per_sample: f64,
}

impl StubBatterySource {
    pub fn new(start_pct: f64) -> Self {
        Self { level: start_pct, drain_per_sample: 0.5 }
    }
}

impl BatterySource for StubBatterySource {
    fn sample(&mut self) -> f64 {
        self.level -= self.drain_per_sample;
        if self.level < 0.0 {
            self.level = 100.0;
        }
        self.level
    }
}
