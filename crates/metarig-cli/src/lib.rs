//! Metarig CLI library
//!
//! Command implementations behind the `metarig` binary, exposed as a library
//! so they can be tested without spawning a process.

pub mod commands;
pub mod input;
