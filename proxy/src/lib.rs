// Library interface for the proxy modules
// This allows tests and the binary to import them

pub mod error;
pub mod gateway;
pub mod server;
pub mod upstream;
