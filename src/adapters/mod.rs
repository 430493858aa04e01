// Adapters layer: concrete implementations for external systems (upstream HTTP API, HTTP surface).

pub mod http;
pub mod server;
