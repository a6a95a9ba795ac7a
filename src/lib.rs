// Library root — the binary entry point is src/main.rs; integration tests
// under tests/ use the relay and provider directly.

pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod relay;
pub mod session;
pub mod subsystems;
