use anyhow::Result;
use std::env;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub records_path: Option<PathBuf>,
    pub analytics_config_path: Option<PathBuf>,
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let records_path = env::var("RECORDS_PATH").ok().map(PathBuf::from);
        let analytics_config_path = env::var("ANALYTICS_CONFIG").ok().map(PathBuf::from);

        Ok(AppConfig {
            host,
            port,
            log_level,
            records_path,
            analytics_config_path,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
