//! Harness glue around the netcorr capture core: configuration resolution and
//! recorded-traffic replay.

pub mod config;
pub mod replay;
