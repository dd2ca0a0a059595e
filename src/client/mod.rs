//! Client management system
//!
//! Handles client connections, session state and the registry of connected
//! clients.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::handle_client;
pub use registry::ClientRegistry;
pub use state::Client;
