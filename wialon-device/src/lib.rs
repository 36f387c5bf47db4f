//! Library surface for `wialon-device`. The binary entry point (`main.rs`)
//! wires these pieces together; integration tests drive [`connection::run_forever`]
//! against a real loopback listener.

pub mod config;
pub mod connection;
pub mod device;
pub mod sampler;
pub mod sensors;
pub mod telemetry;
