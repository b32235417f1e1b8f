//! # sigspan
//!
//! Command line front end for the sigspan mining engine.
//!
//! The library half exists so the command implementations, the run
//! configuration and the pattern sinks can be tested without spawning the
//! binary.

pub mod cli;
pub mod config;
