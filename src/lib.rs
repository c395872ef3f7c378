// Configuration
pub mod config;

// Connection registry and broadcast hub
pub mod hub;

// Per-connection WebSocket sessions
pub mod session;

// User record storage
pub mod users;

// HTTP and WebSocket APIs
pub mod api;
