//! superpico-tools library crate.
//!
//! Host-side helpers for the SuperPico Digital board: frame capture over
//! serial and a reconnecting serial console. Both binaries are thin wrappers
//! around [`cli`].

pub mod cli;
pub mod config;
pub mod frame;
pub mod logging;
pub mod monitor;
pub mod ports;
pub mod transport;
