//! The IOObserver aggregates positional fields, discrete I/O, analog
//! channels, and named parameters into [`Record`] snapshots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::signal::{Operand, Priority, Signal, Value};

/// Fixed, ordered positional schema.
pub const POSITIONAL_FIELDS: [&str; 12] = [
    "date", "time", "lat_deg", "lat_sign", "lon_deg", "lon_sign", "speed", "course", "alt",
    "sats", "hdop", "ibutton",
];

/// Authentication / transport parameters the observer always carries,
/// exposed through the same keyed-lookup interface as any other param so
/// the codec need not distinguish "config" from "telemetry".
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    pub ver: String,
    pub imei: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            ver: "2.0".to_string(),
            imei: "wips".to_string(),
            password: "wips".to_string(),
            host: "127.0.0.1".to_string(),
            port: 20332,
        }
    }
}

/// An immutable snapshot published by [`IOObserver::emit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub priority: Priority,
    pub positional: HashMap<String, Option<Value>>,
    pub io: (Option<u32>, Option<u32>),
    pub adc: Vec<Option<f64>>,
    pub params: HashMap<String, Option<Value>>,
}

/// Aggregates positional, discrete I/O, analog, and named-parameter
/// signals and emits [`Record`] snapshots on demand or on high-priority
/// firing.
pub struct IOObserver {
    positional: Vec<(String, Signal)>,
    pub inputs: Vec<Signal>,
    pub outputs: Vec<Signal>,
    pub adc: Vec<Signal>,
    params: HashMap<String, Signal>,
    fired_event_only: Vec<String>,
    on_event: Option<Box<dyn FnMut(Record) + Send>>,
}

impl IOObserver {
    pub fn new(config: ObserverConfig) -> Self {
        let positional = POSITIONAL_FIELDS
            .iter()
            .map(|k| (k.to_string(), Signal::new(Operand::Monitoring, Priority::Low)))
            .collect();

        let mut params = HashMap::new();
        params.insert(
            "ver".to_string(),
            value_signal(Value::Str(config.ver.clone())),
        );
        params.insert(
            "imei".to_string(),
            value_signal(Value::Str(config.imei.clone())),
        );
        params.insert(
            "password".to_string(),
            value_signal(Value::Str(config.password.clone())),
        );
        params.insert(
            "host".to_string(),
            value_signal(Value::Str(config.host.clone())),
        );
        params.insert(
            "port".to_string(),
            value_signal(Value::Int(config.port as i64)),
        );
        params.insert(
            "SOS".to_string(),
            Signal::new(Operand::OnChange, Priority::High).event_only(true),
        );
        params.insert(
            "text".to_string(),
            Signal::new(Operand::OnChange, Priority::High).event_only(true),
        );

        Self {
            positional,
            inputs: Vec::new(),
            outputs: Vec::new(),
            adc: Vec::new(),
            params,
            fired_event_only: Vec::new(),
            on_event: None,
        }
    }

    /// Register a sink invoked synchronously with every emitted record.
    pub fn set_on_event<F>(&mut self, f: F)
    where
        F: FnMut(Record) + Send + 'static,
    {
        self.on_event = Some(Box::new(f));
    }

    /// Define or replace a named parameter's signal (config-time only).
    pub fn configure_param(&mut self, key: &str, signal: Signal) {
        self.params.insert(key.to_string(), signal);
    }

    pub fn update_positional_index(&mut self, index: usize, value: Value) {
        if let Some((_, signal)) = self.positional.get_mut(index) {
            let fires = signal.update(value);
            if fires && signal.priority > Priority::Low {
                self.emit(signal.priority);
            }
        }
    }

    pub fn update_positional(&mut self, key: &str, value: Value) {
        if let Some(idx) = POSITIONAL_FIELDS.iter().position(|k| *k == key) {
            self.update_positional_index(idx, value);
        }
    }

    pub fn update_input(&mut self, bit: usize, value: Value) {
        if let Some(priority) = update_indexed(&mut self.inputs, bit, value) {
            self.emit(priority);
        }
    }

    pub fn update_output(&mut self, bit: usize, value: Value) {
        if let Some(priority) = update_indexed(&mut self.outputs, bit, value) {
            self.emit(priority);
        }
    }

    pub fn update_adc(&mut self, index: usize, value: Value) {
        if let Some(priority) = update_indexed(&mut self.adc, index, value) {
            self.emit(priority);
        }
    }

    /// Update a single named parameter, emitting immediately if its
    /// priority exceeds `LOW`.
    pub fn update_param(&mut self, key: &str, value: Value) {
        let Some(signal) = self.params.get_mut(key) else {
            return;
        };
        if signal.priority == Priority::None {
            return;
        }
        let fires = signal.update(value);
        if fires {
            if signal.event_only {
                self.fired_event_only.push(key.to_string());
            }
            if signal.priority > Priority::Low {
                self.emit(signal.priority);
            }
        }
    }

    /// Update a batch of named parameters. A single record is emitted if
    /// the maximum firing priority in the batch exceeds `LOW`.
    pub fn update_params(&mut self, batch: impl IntoIterator<Item = (String, Value)>) {
        let mut max_priority = Priority::None;
        for (key, value) in batch {
            let Some(signal) = self.params.get_mut(&key) else {
                continue;
            };
            if signal.priority == Priority::None {
                continue;
            }
            if signal.update(value) {
                if signal.event_only {
                    self.fired_event_only.push(key.clone());
                }
                if signal.priority > max_priority {
                    max_priority = signal.priority;
                }
            }
        }
        if max_priority > Priority::Low {
            self.emit(max_priority);
        }
    }

    fn io_mask(signals: &[Signal]) -> Option<u32> {
        if signals.is_empty() {
            return None;
        }
        let mut mask = 0u32;
        for (i, s) in signals.iter().enumerate() {
            if s.value.as_ref().and_then(Value::as_f64).unwrap_or(0.0) > 0.0 {
                mask |= 1 << i;
            }
        }
        Some(mask)
    }

    /// Drain the list of event-only signals that have fired since the last
    /// emission, clearing the buffer. Exposed for testability (DESIGN.md).
    pub fn drain_fired(&mut self) -> Vec<String> {
        std::mem::take(&mut self.fired_event_only)
    }

    /// Construct a [`Record`] from current state plus the accumulated
    /// event-only buffer, publish it, and clear the buffer.
    pub fn emit(&mut self, priority: Priority) {
        let positional = self
            .positional
            .iter()
            .map(|(k, s)| (k.clone(), s.value.clone()))
            .collect();

        let io = (Self::io_mask(&self.inputs), Self::io_mask(&self.outputs));
        let adc = self.adc.iter().map(|s| s.value.as_ref().and_then(Value::as_f64)).collect();

        let fired = self.drain_fired();
        let params = self
            .params
            .iter()
            .filter(|(k, s)| s.priority > Priority::None && (!s.event_only || fired.contains(*k)))
            .map(|(k, s)| (k.clone(), s.value.clone()))
            .collect();

        let record = Record { priority, positional, io, adc, params };
        trace!(?priority, "observer emitting record");

        if let Some(sink) = &mut self.on_event {
            sink(record);
        }
    }
}

fn value_signal(v: Value) -> Signal {
    let mut s = Signal::new(Operand::Monitoring, Priority::None);
    s.value = Some(v);
    s
}

/// Apply `value` to `bag[index]`, returning the firing priority if the
/// signal fired with a priority above `LOW` (the caller then emits).
fn update_indexed(bag: &mut [Signal], index: usize, value: Value) -> Option<Priority> {
    let signal = bag.get_mut(index)?;
    if signal.priority == Priority::None {
        return None;
    }
    let fires = signal.update(value);
    (fires && signal.priority > Priority::Low).then_some(signal.priority)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_contains_all_positional_fields() {
        let mut o = IOObserver::new(ObserverConfig::default());
        o.update_positional_index(6, Value::Int(10)); // speed
        let captured = std::sync::Arc::new(std::sync::Mutex::new(None));
        let captured2 = captured.clone();
        o.set_on_event(move |r| *captured2.lock().unwrap() = Some(r));
        o.emit(Priority::Low);
        let r = captured.lock().unwrap().take().unwrap();
        assert_eq!(r.positional.len(), POSITIONAL_FIELDS.len());
    }

    #[test]
    fn event_only_signal_appears_once_then_clears() {
        let mut o = IOObserver::new(ObserverConfig::default());
        let records = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let records2 = records.clone();
        o.set_on_event(move |r| records2.lock().unwrap().push(r));

        o.update_param("SOS", Value::Int(1));
        assert_eq!(records.lock().unwrap().len(), 1);
        assert_eq!(
            records.lock().unwrap()[0].params.get("SOS").cloned().flatten(),
            Some(Value::Int(1))
        );

        o.emit(Priority::Low);
        assert_eq!(records.lock().unwrap().len(), 2);
        assert!(!records.lock().unwrap()[1].params.contains_key("SOS"));
    }

    #[test]
    fn update_params_batch_uses_max_firing_priority() {
        let mut o = IOObserver::new(ObserverConfig::default());
        o.configure_param("low_param", Signal::new(Operand::OnChange, Priority::Low));
        o.configure_param("high_param", Signal::new(Operand::OnChange, Priority::High));

        let records = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let records2 = records.clone();
        o.set_on_event(move |r| records2.lock().unwrap().push(r));

        o.update_params(vec![
            ("low_param".to_string(), Value::Int(1)),
            ("high_param".to_string(), Value::Int(1)),
        ]);
        assert_eq!(records.lock().unwrap().len(), 1);
        assert_eq!(records.lock().unwrap()[0].priority, Priority::High);
    }

    #[test]
    fn update_params_batch_stays_quiet_below_high() {
        let mut o = IOObserver::new(ObserverConfig::default());
        o.configure_param("low_param", Signal::new(Operand::OnChange, Priority::Low));

        let records = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let records2 = records.clone();
        o.set_on_event(move |r| records2.lock().unwrap().push(r));

        o.update_params(vec![("low_param".to_string(), Value::Int(1))]);
        assert!(records.lock().unwrap().is_empty());
    }

    #[test]
    fn io_bitmask_absent_without_signals() {
        let mut o = IOObserver::new(ObserverConfig::default());
        let captured = std::sync::Arc::new(std::sync::Mutex::new(None));
        let captured2 = captured.clone();
        o.set_on_event(move |r| *captured2.lock().unwrap() = Some(r));
        o.emit(Priority::Low);
        let r = captured.lock().unwrap().take().unwrap();
        assert_eq!(r.io, (None, None));
    }

    #[test]
    fn io_bitmask_reflects_positive_values() {
        let mut o = IOObserver::new(ObserverConfig::default());
        o.inputs.push(Signal::new(Operand::OnChange, Priority::Low));
        o.inputs.push(Signal::new(Operand::OnChange, Priority::Low));
        o.update_input(1, Value::Int(1));
        let captured = std::sync::Arc::new(std::sync::Mutex::new(None));
        let captured2 = captured.clone();
        o.set_on_event(move |r| *captured2.lock().unwrap() = Some(r));
        o.emit(Priority::Low);
        assert_eq!(captured.lock().unwrap().take().unwrap().io.0, Some(0b10));
    }
}
