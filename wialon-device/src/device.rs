//! Device connection state machine: `Disconnected → Dialing →
//! Authenticating → Online`.

use wialon_core::{IOObserver, ObserverConfig, Operand, Priority, Signal};

use crate::config::DeviceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Disconnected,
    Dialing,
    Authenticating,
    Online,
}

/// Build the observer this device samples into, wiring up the
/// non-positional signals a stock install cares about: a low-battery alarm
/// and two discrete input/output banks.
pub fn build_observer(config: &DeviceConfig) -> IOObserver {
    let mut observer = IOObserver::new(ObserverConfig {
        ver: config.ver.clone(),
        imei: config.imei.clone(),
        password: config.password.clone(),
        host: config.host.clone(),
        port: config.port,
    });

    observer.configure_param(
        "battery",
        Signal::new(Operand::OnExit, Priority::High).with_band(10.0, 100.0),
    );

    observer.inputs = vec![Signal::new(Operand::OnChange, Priority::Low); 4];
    observer.outputs = vec![Signal::new(Operand::OnChange, Priority::Low); 4];
    observer.adc = vec![Signal::new(Operand::Monitoring, Priority::Low); 2];

    observer
}
