//! # DailyMed MCP Server
//!
//! Model Context Protocol server over the DailyMed v2 REST API. It searches
//! and retrieves FDA drug labels (SPLs), flattens their XML narrative into
//! sections and enriches them with RxNorm and pharmacologic class
//! cross-references loaded from local mapping files.

pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod pagination;
pub mod server;
pub mod spl;
pub mod tools;
pub mod transport;

// Re-export commonly used types
pub use client::{ClientConfig, DailyMedClient};
pub use config::{ServerConfig, TransportMode};
pub use error::{DailyMedError, Result};
pub use mapping::MappingIndex;
pub use server::McpServer;
pub use spl::{SplDocument, SplSection};

/// Current version of the MCP server
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
