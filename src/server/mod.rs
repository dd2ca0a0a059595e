//! Server core functionality
//!
//! This module contains the TCP listener and the accept loop that hands each
//! connection to its own session task.

pub mod core;

pub use core::Server;
