//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::spl::ExtractOptions;

/// Which transports the binary starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Stdio,
    Http,
    Both,
}

impl TransportMode {
    pub fn uses_stdio(&self) -> bool {
        matches!(self, TransportMode::Stdio | TransportMode::Both)
    }

    pub fn uses_http(&self) -> bool {
        matches!(self, TransportMode::Http | TransportMode::Both)
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host (default: localhost)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Log level or `EnvFilter` directive (default: info)
    pub log_level: String,
    pub transport: TransportMode,
    /// DailyMed v2 REST base URL
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Directory holding the two mapping files (default: data)
    pub data_dir: PathBuf,
    /// Render nested label sections into their parent's content
    pub include_subsections: bool,
    /// Honor `HTTP_PROXY`-style environment variables for upstream calls
    pub use_system_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            transport: TransportMode::Stdio,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            data_dir: PathBuf::from("data"),
            include_subsections: false,
            use_system_proxy: true,
        }
    }
}

impl ServerConfig {
    /// Upstream client settings derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            extract_options: ExtractOptions {
                include_subsections: self.include_subsections,
            },
            use_system_proxy: self.use_system_proxy,
            ..Default::default()
        }
    }
}
