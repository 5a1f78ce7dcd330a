pub mod client;
pub mod connection;
pub mod rate_limit;

// Re-export the pieces the rest of the engine wires together.
pub use client::GateIoClient;
pub use connection::ConnectionManager;
pub use rate_limit::RateLimiter;
