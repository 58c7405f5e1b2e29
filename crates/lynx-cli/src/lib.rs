//! Library side of the `lynx` binary.

pub mod commands;
pub mod logging;
pub mod types;
