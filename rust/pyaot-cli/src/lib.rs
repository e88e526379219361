//! Pyaot CLI library.
//!
//! Flag handling, configuration and the build driver behind the `pyaot` binary.

pub mod cli;
pub mod colors;
pub mod config;
pub mod driver;
