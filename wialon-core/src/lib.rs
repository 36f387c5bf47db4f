//! # wialon-core
//!
//! Shared protocol, signal, and storage types for the Wialon IPS telematics
//! endpoint suite.
//!
//! These types are used by:
//! - `wialon-device`: encoding records and driving the signal state machine
//! - `wialon-server`: decoding frames and dispatching acknowledgements
//!
//! ## Wire Conventions
//!
//! - Frames are ASCII, `;`-delimited, CRC-16/ARC protected, terminated `\r\n`.
//! - Coordinates are `DDMM.mmmmmm` (lat) / `DDDMM.mmmmmm` (lon) with literal
//!   hemisphere signs.
//! - `NA` means "unavailable" at any field position.

pub mod blackbox;
pub mod crc;
pub mod datetime;
pub mod error;
pub mod geo;
pub mod observer;
pub mod protocol;
pub mod signal;

pub use blackbox::BlackBox;
pub use error::{ProtocolError, StorageError};
pub use observer::{IOObserver, ObserverConfig, Record};
pub use protocol::{
    decode, encode_ack, encode_blackbox, encode_extended_data, encode_login, encode_ping,
    encode_short_data, is_lbs_key, Body, ExtendedData, ExtendedDataResponseCode,
    LoginResponseCode, Packet, PacketType, ParamValue, ShortData, ShortDataResponseCode,
};
pub use signal::{Operand, Priority, Signal, Value};
