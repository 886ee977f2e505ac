use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to.
    pub bind: String,
    /// Base seed for reproducible renders. Without it every render is
    /// seeded from the operating system.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    #[tracing::instrument(level = "debug")]
    fn default() -> Self {
        debug!("Creating default server config");
        Self {
            bind: "127.0.0.1:8000".to_string(),
            seed: None,
        }
    }
}
