//! Library surface for `wialon-server`. The binary entry point (`main.rs`)
//! is a thin wrapper around [`server::run`]; this split also lets
//! integration tests drive a real accept loop over loopback.

pub mod config;
pub mod registry;
pub mod server;
pub mod session;
