//! Command implementations for the CLI
//!
//! - start: Start the gateway server
//! - config: Configuration display and validation
//! - emit: Send sample traffic to a running gateway

pub mod config;
pub mod emit;
pub mod start;
