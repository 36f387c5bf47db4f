//! Bridges [`IOObserver`] state to wire [`ExtendedData`].
//!
//! The observer's positional bag stores wire-ready shapes directly: `date`
//! and `time` as the formatted strings `datetime::format` produces, and
//! `lat_deg`/`lon_deg` as signed decimal degrees (the codec, not the
//! observer, owns `DDMM.mmmmmm` rendering). `lat_sign`/`lon_sign` exist in
//! the fixed schema but carry no independent value — sign lives in the
//! decimal's sign bit, matching `ShortData::latitude`/`longitude`.

use std::collections::HashMap;

use wialon_core::{datetime, is_lbs_key, ExtendedData, ParamValue, Record, ShortData, Value};

fn as_str(v: &Value) -> Option<String> {
    match v {
        Value::Str(s) => Some(s.clone()),
        _ => None,
    }
}

fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::Real(r) => Some(*r as i64),
        Value::Str(_) => None,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
}

fn positional(r: &Record, key: &str) -> Option<&Value> {
    r.positional.get(key).and_then(|v| v.as_ref())
}

fn to_param_value(v: Option<&Value>) -> ParamValue {
    match v {
        Some(Value::Int(i)) => ParamValue::Int(Some(*i)),
        Some(Value::Real(r)) => ParamValue::Real(Some(*r)),
        Some(Value::Str(s)) => ParamValue::Str(Some(s.clone())),
        None => ParamValue::Str(None),
    }
}

/// Convert an emitted [`Record`] into the wire shape sent as a `D` frame (or
/// one element of a `B` batch).
pub fn record_to_extended_data(r: &Record) -> ExtendedData {
    let date = positional(r, "date").and_then(as_str);
    let time = positional(r, "time").and_then(as_str);
    let timestamp = match (date, time) {
        (Some(d), Some(t)) => datetime::parse(&d, &t),
        _ => None,
    };

    let short = ShortData {
        timestamp,
        latitude: positional(r, "lat_deg").and_then(as_f64),
        longitude: positional(r, "lon_deg").and_then(as_f64),
        speed: positional(r, "speed").and_then(as_i64),
        course: positional(r, "course").and_then(as_i64),
        alt: positional(r, "alt").and_then(as_i64),
        sats: positional(r, "sats").and_then(as_i64),
    };

    let mut alarm = false;
    let mut params = HashMap::new();
    let mut lbs = HashMap::new();
    for (key, value) in &r.params {
        if key == "SOS" {
            if matches!(value, Some(Value::Int(1))) {
                alarm = true;
            }
            continue;
        }
        let pv = to_param_value(value.as_ref());
        if is_lbs_key(key) {
            lbs.insert(key.clone(), pv);
        } else {
            params.insert(key.clone(), pv);
        }
    }

    ExtendedData {
        short,
        hdop: positional(r, "hdop").and_then(as_f64),
        inputs: r.io.0,
        outputs: r.io.1,
        adc: r.adc.clone(),
        ibutton: positional(r, "ibutton").and_then(as_str),
        alarm,
        params,
        lbs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wialon_core::Priority;

    fn sample_record() -> Record {
        let (date, time) = datetime::format(chrono::Utc::now());
        let mut positional = HashMap::new();
        positional.insert("date".to_string(), Some(Value::Str(date)));
        positional.insert("time".to_string(), Some(Value::Str(time)));
        positional.insert("lat_deg".to_string(), Some(Value::Real(53.9182)));
        positional.insert("lon_deg".to_string(), Some(Value::Real(27.5402)));
        positional.insert("speed".to_string(), Some(Value::Int(10)));
        positional.insert("course".to_string(), Some(Value::Int(90)));
        positional.insert("alt".to_string(), Some(Value::Int(300)));
        positional.insert("sats".to_string(), Some(Value::Int(7)));
        positional.insert("hdop".to_string(), Some(Value::Real(1.0)));

        let mut params = HashMap::new();
        params.insert("SOS".to_string(), Some(Value::Int(1)));
        params.insert("mcc1".to_string(), Some(Value::Int(250)));
        params.insert("fuel".to_string(), Some(Value::Real(42.5)));

        Record {
            priority: Priority::High,
            positional,
            io: (Some(2), Some(18432)),
            adc: vec![Some(5.0), Some(0.0)],
            params,
        }
    }

    #[test]
    fn converts_positional_and_lifts_alarm_and_lbs() {
        let d = record_to_extended_data(&sample_record());
        assert_eq!(d.short.speed, Some(10));
        assert_eq!(d.short.course, Some(90));
        assert!((d.short.latitude.unwrap() - 53.9182).abs() < 1e-6);
        assert_eq!(d.inputs, Some(2));
        assert_eq!(d.outputs, Some(18432));
        assert_eq!(d.adc, vec![Some(5.0), Some(0.0)]);
        assert!(d.alarm);
        assert!(!d.params.contains_key("SOS"));
        assert_eq!(d.lbs.get("mcc1"), Some(&ParamValue::Int(Some(250))));
        assert_eq!(d.params.get("fuel"), Some(&ParamValue::Real(Some(42.5))));
    }
}
