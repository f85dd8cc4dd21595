//! TCP control transport

pub mod server;
pub mod types;

pub use server::Server;
