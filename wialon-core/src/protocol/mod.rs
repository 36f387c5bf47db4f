//! Wire frame encoding/decoding (§4.1, §4.2).
//!
//! Frame shape: `#TYPE#BODY;CRCHEX\r\n` where `BODY` is a `;`-joined field
//! list that itself always carries one trailing `;` before the CRC hex.

mod codes;

pub use codes::{ExtendedDataResponseCode, LoginResponseCode, PacketType, ShortDataResponseCode};

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::crc;
use crate::datetime;
use crate::error::ProtocolError;
use crate::geo;

/// Short-data positional fields, shared by `SD` and the head of `D`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShortData {
    pub timestamp: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<i64>,
    pub course: Option<i64>,
    pub alt: Option<i64>,
    pub sats: Option<i64>,
}

/// A typed, possibly-absent wire parameter value. The variant carries the
/// wire's `1|2|3` type discriminator even when the value itself is absent,
/// so round-tripping an `NA` parameter preserves its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(Option<i64>),
    Real(Option<f64>),
    Str(Option<String>),
}

impl ParamValue {
    fn type_tag(&self) -> u8 {
        match self {
            Self::Int(_) => 1,
            Self::Real(_) => 2,
            Self::Str(_) => 3,
        }
    }

    fn to_wire(&self) -> String {
        match self {
            Self::Int(Some(v)) => v.to_string(),
            Self::Real(Some(v)) => format_real(*v),
            Self::Str(Some(v)) => v.clone(),
            _ => "NA".to_string(),
        }
    }
}

/// Full extended-data record: short-data fields plus hdop/IO/ADC/params.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendedData {
    pub short: ShortData,
    pub hdop: Option<f64>,
    pub inputs: Option<u32>,
    pub outputs: Option<u32>,
    pub adc: Vec<Option<f64>>,
    pub ibutton: Option<String>,
    /// `SOS:1:1` lifted out of `params` per §4.2.
    pub alarm: bool,
    pub params: HashMap<String, ParamValue>,
    /// `mcc`/`mnc`/`lac`/`cell_id` (optionally indexed) lifted out of `params`.
    pub lbs: HashMap<String, ParamValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Login { protocol_version: String, imei: String, password: String },
    Ping,
    ShortData(ShortData),
    ExtendedData(ExtendedData),
    Blackbox(Vec<ExtendedData>),
    /// Server acknowledgement frames; the numeric code lives on [`Packet::code`].
    Ack,
    /// Frame kinds recognized at the framing layer but not given payload
    /// semantics (video/DDD/image/upload channels, §1).
    Opaque(Vec<String>),
}

/// A fully parsed wire frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub kind: PacketType,
    /// The ack numeric/subcode string for server-originated response frames.
    pub code: Option<String>,
    pub raw: Vec<u8>,
    pub body: Body,
}

fn format_real(v: f64) -> String {
    format!("{v}")
}

fn f_i64(v: Option<i64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "NA".to_string())
}

fn f_f64(v: Option<f64>) -> String {
    v.map(format_real).unwrap_or_else(|| "NA".to_string())
}

fn f_str(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| "NA".to_string())
}

fn parse_opt_i64(s: &str) -> Option<i64> {
    if s == "NA" {
        None
    } else {
        s.parse().ok()
    }
}

fn parse_opt_f64(s: &str) -> Option<f64> {
    if s == "NA" {
        None
    } else {
        s.parse().ok()
    }
}

fn parse_opt_u32(s: &str) -> Option<u32> {
    if s == "NA" {
        None
    } else {
        s.parse().ok()
    }
}

fn normalize_course(course: Option<i64>) -> Option<i64> {
    course.filter(|c| (0..360).contains(c))
}

fn normalize_nonneg(v: Option<i64>) -> Option<i64> {
    v.filter(|n| *n >= 0)
}

fn parse_coord(deg_field: &str, sign_field: &str, is_latitude: bool) -> Option<f64> {
    if deg_field == "NA" || sign_field == "NA" {
        return None;
    }
    let magnitude = geo::ddmm_to_decimal(deg_field, is_latitude)?;
    let sign_char = sign_field.chars().next()?;
    let negative = if is_latitude {
        geo::LatSign::from_char(sign_char)? == geo::LatSign::South
    } else {
        geo::LonSign::from_char(sign_char)? == geo::LonSign::West
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Whether `key` is one of the LBS identifiers (`mcc`/`mnc`/`lac`/`cell_id`,
/// optionally suffixed with a digit index) that get lifted out of a
/// decoded `params` map into [`ExtendedData::lbs`].
pub fn is_lbs_key(key: &str) -> bool {
    for prefix in ["mcc", "mnc", "lac", "cell_id"] {
        if let Some(rest) = key.strip_prefix(prefix) {
            if rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit()) {
                return true;
            }
        }
    }
    false
}

fn short_data_fields(d: &ShortData) -> Vec<String> {
    let (date, time) = match d.timestamp {
        Some(dt) => datetime::format(dt),
        None => ("NA".to_string(), "NA".to_string()),
    };
    let (lat_field, lat_sign) = match d.latitude {
        Some(lat) => {
            let (field, sign) = geo::lat_to_ddmm(lat);
            (field, sign.as_char().to_string())
        }
        None => ("NA".to_string(), "NA".to_string()),
    };
    let (lon_field, lon_sign) = match d.longitude {
        Some(lon) => {
            let (field, sign) = geo::lon_to_ddmm(lon);
            (field, sign.as_char().to_string())
        }
        None => ("NA".to_string(), "NA".to_string()),
    };
    vec![
        date,
        time,
        lat_field,
        lat_sign,
        lon_field,
        lon_sign,
        f_i64(normalize_nonneg(d.speed)),
        f_i64(normalize_course(d.course)),
        f_i64(d.alt),
        f_i64(normalize_nonneg(d.sats)),
    ]
}

fn build_params_field(d: &ExtendedData) -> String {
    let mut parts = Vec::new();
    if d.alarm {
        parts.push("SOS:1:1".to_string());
    }
    for (k, v) in &d.lbs {
        parts.push(format!("{k}:{}:{}", v.type_tag(), v.to_wire()));
    }
    for (k, v) in &d.params {
        parts.push(format!("{k}:{}:{}", v.type_tag(), v.to_wire()));
    }
    if parts.is_empty() {
        "NA".to_string()
    } else {
        parts.join(",")
    }
}

fn extended_data_fields(d: &ExtendedData) -> Vec<String> {
    let mut fields = short_data_fields(&d.short);
    fields.push(f_f64(d.hdop));
    fields.push(d.inputs.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string()));
    fields.push(d.outputs.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string()));
    let adc = if d.adc.is_empty() {
        "NA".to_string()
    } else {
        d.adc.iter().map(|v| v.map(format_real).unwrap_or_else(|| "NA".to_string())).collect::<Vec<_>>().join(",")
    };
    fields.push(adc);
    fields.push(f_str(&d.ibutton));
    fields.push(build_params_field(d));
    fields
}

fn encode_frame(type_code: &str, fields: &[String]) -> Vec<u8> {
    let body = fields.join(";") + ";";
    let crc_hex = crc::crc16_hex(body.as_bytes());
    format!("#{type_code}#{body}{crc_hex}\r\n").into_bytes()
}

pub fn encode_login(version: &str, imei: &str, password: &str) -> Vec<u8> {
    encode_frame("L", &[version.to_string(), imei.to_string(), password.to_string()])
}

pub fn encode_ping() -> Vec<u8> {
    encode_frame("P", &[])
}

pub fn encode_short_data(d: &ShortData) -> Vec<u8> {
    encode_frame("SD", &short_data_fields(d))
}

pub fn encode_extended_data(d: &ExtendedData) -> Vec<u8> {
    encode_frame("D", &extended_data_fields(d))
}

pub fn encode_blackbox(items: &[ExtendedData]) -> Vec<u8> {
    let joined = items
        .iter()
        .map(|d| extended_data_fields(d).join(";") + ";")
        .collect::<Vec<_>>()
        .join("|");
    encode_frame("B", &[joined])
}

/// Encode a server acknowledgement frame for `kind` (an `AL`/`ASD`/`AD`/`AB`/`AP`
/// variant) carrying `code` as its single body field.
pub fn encode_ack(kind: &PacketType, code: &str) -> Vec<u8> {
    encode_frame(kind.as_str(), &[code.to_string()])
}

fn parse_login(fields: &[String]) -> Result<Body, ProtocolError> {
    if fields.len() != 3 {
        return Err(ProtocolError::MalformedFrame(format!("login expects 3 fields, got {}", fields.len())));
    }
    Ok(Body::Login {
        protocol_version: fields[0].clone(),
        imei: fields[1].clone(),
        password: fields[2].clone(),
    })
}

fn parse_short_data(fields: &[String]) -> Result<ShortData, ProtocolError> {
    if fields.len() != 10 {
        return Err(ProtocolError::MalformedFrame(format!("short data expects 10 fields, got {}", fields.len())));
    }
    let timestamp = datetime::parse(&fields[0], &fields[1]);
    let latitude = parse_coord(&fields[2], &fields[3], true);
    let longitude = parse_coord(&fields[4], &fields[5], false);
    Ok(ShortData {
        timestamp,
        latitude,
        longitude,
        speed: parse_opt_i64(&fields[6]),
        course: parse_opt_i64(&fields[7]),
        alt: parse_opt_i64(&fields[8]),
        sats: parse_opt_i64(&fields[9]),
    })
}

fn parse_params_field(s: &str) -> (HashMap<String, ParamValue>, HashMap<String, ParamValue>, bool) {
    let mut params = HashMap::new();
    let mut lbs = HashMap::new();
    let mut alarm = false;
    if s == "NA" || s.is_empty() {
        return (params, lbs, alarm);
    }
    for part in s.split(',') {
        let mut pieces = part.splitn(3, ':');
        let (Some(key), Some(typ)) = (pieces.next(), pieces.next()) else {
            continue;
        };
        let value = pieces.next().unwrap_or("NA");
        let pv = match typ {
            "1" => ParamValue::Int(if value == "NA" { None } else { value.parse().ok() }),
            "2" => ParamValue::Real(if value == "NA" { None } else { value.parse().ok() }),
            _ => ParamValue::Str(if value == "NA" { None } else { Some(value.to_string()) }),
        };
        if key == "SOS" {
            if let ParamValue::Int(Some(1)) = pv {
                alarm = true;
            }
            continue;
        }
        if is_lbs_key(key) {
            lbs.insert(key.to_string(), pv);
        } else {
            params.insert(key.to_string(), pv);
        }
    }
    (params, lbs, alarm)
}

fn parse_extended_data(fields: &[String]) -> Result<ExtendedData, ProtocolError> {
    if fields.len() != 16 {
        return Err(ProtocolError::MalformedFrame(format!("extended data expects 16 fields, got {}", fields.len())));
    }
    let short = parse_short_data(&fields[0..10])?;
    let hdop = parse_opt_f64(&fields[10]);
    let inputs = parse_opt_u32(&fields[11]);
    let outputs = parse_opt_u32(&fields[12]);
    let adc = if fields[13] == "NA" {
        Vec::new()
    } else {
        fields[13].split(',').map(parse_opt_f64).collect()
    };
    let ibutton = if fields[14] == "NA" { None } else { Some(fields[14].clone()) };
    let (params, lbs, alarm) = parse_params_field(&fields[15]);
    Ok(ExtendedData { short, hdop, inputs, outputs, adc, ibutton, alarm, params, lbs })
}

fn parse_blackbox(left: &str) -> Result<Vec<ExtendedData>, ProtocolError> {
    if left.is_empty() {
        return Ok(Vec::new());
    }
    let mut items = Vec::new();
    for chunk in left.split('|') {
        let stripped = chunk.strip_suffix(';').unwrap_or(chunk);
        let subfields: Vec<String> =
            if stripped.is_empty() { Vec::new() } else { stripped.split(';').map(|s| s.to_string()).collect() };
        items.push(parse_extended_data(&subfields)?);
    }
    Ok(items)
}

/// Parse a full wire frame, verifying the CRC suffix when one is present.
///
/// Protocol v1 frames may omit the `;CRCHEX` suffix; absence is accepted,
/// never treated as an error (§4.1, §9).
pub fn decode(bytes: &[u8]) -> Result<Packet, ProtocolError> {
    if !bytes.is_ascii() {
        return Err(ProtocolError::NotAscii);
    }
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::NotAscii)?;
    let text = text.strip_suffix("\r\n").ok_or_else(|| ProtocolError::MalformedFrame("missing CRLF".to_string()))?;
    let rest = text.strip_prefix('#').ok_or_else(|| ProtocolError::MalformedFrame("missing '#'".to_string()))?;
    let (type_code, rest) =
        rest.split_once('#').ok_or_else(|| ProtocolError::MalformedFrame("missing type delimiter".to_string()))?;
    let kind = PacketType::from_code(type_code);

    let (left, crc_candidate) = match rest.rsplit_once(';') {
        Some((l, r)) => (l, r),
        None => (rest, ""),
    };

    let is_hex = !crc_candidate.is_empty() && crc_candidate.chars().all(|c| c.is_ascii_hexdigit());
    if is_hex {
        let body_for_crc = format!("{left};");
        let computed = crc::crc16_hex(body_for_crc.as_bytes());
        if !computed.eq_ignore_ascii_case(crc_candidate) {
            return Err(ProtocolError::CrcMismatch { expected: crc_candidate.to_uppercase(), computed });
        }
    }

    let is_blackbox = matches!(kind, PacketType::BlackboxBatch);
    let fields: Vec<String> = if is_blackbox || left.is_empty() {
        Vec::new()
    } else {
        left.split(';').map(|s| s.to_string()).collect()
    };

    let body = match &kind {
        PacketType::Login => parse_login(&fields)?,
        PacketType::Ping => Body::Ping,
        PacketType::ShortData => Body::ShortData(parse_short_data(&fields)?),
        PacketType::ExtendedData => Body::ExtendedData(parse_extended_data(&fields)?),
        PacketType::BlackboxBatch => Body::Blackbox(parse_blackbox(left)?),
        PacketType::LoginResponse
        | PacketType::ShortDataResponse
        | PacketType::ExtendedDataResponse
        | PacketType::BlackboxResponse
        | PacketType::PingResponse
        | PacketType::DriverMessageResponse => Body::Ack,
        _ => Body::Opaque(fields.clone()),
    };

    let code = match &kind {
        PacketType::LoginResponse
        | PacketType::ShortDataResponse
        | PacketType::ExtendedDataResponse
        | PacketType::BlackboxResponse
        | PacketType::PingResponse
        | PacketType::DriverMessageResponse => Some(fields.first().cloned().unwrap_or_default()),
        _ => None,
    };

    Ok(Packet { kind, code, raw: bytes.to_vec(), body })
}
