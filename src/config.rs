//! Server configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_LOADSHEDDING_URL: &str = "https://loadshedding.eskom.co.za/LoadShedding/GetStatus";
/// Nominatim's usage policy requires an identifying User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("utility-topup/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_MODEL_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub suppliers_path: PathBuf,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub loadshedding_url: String,
    pub model_ttl: Duration,
    /// Makes model training and prediction reproducible when set
    pub model_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
            templates_dir: PathBuf::from("templates"),
            suppliers_path: PathBuf::from("static/gasSuppliers.json"),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_user_agent: DEFAULT_USER_AGENT.to_string(),
            loadshedding_url: DEFAULT_LOADSHEDDING_URL.to_string(),
            model_ttl: DEFAULT_MODEL_TTL,
            model_seed: None,
        }
    }
}

impl ServerConfig {
    /// Read from the process environment; unset or unparseable values keep their defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            templates_dir: lookup("TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.templates_dir),
            suppliers_path: lookup("SUPPLIERS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.suppliers_path),
            geocoder_url: lookup("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            geocoder_user_agent: lookup("GEOCODER_USER_AGENT").unwrap_or(defaults.geocoder_user_agent),
            loadshedding_url: lookup("LOADSHEDDING_URL").unwrap_or(defaults.loadshedding_url),
            model_ttl: lookup("MODEL_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.model_ttl),
            model_seed: lookup("MODEL_SEED").and_then(|s| s.parse().ok()),
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  STATIC_DIR: {}", self.static_dir.display());
        tracing::info!("  TEMPLATES_DIR: {}", self.templates_dir.display());
        tracing::info!("  SUPPLIERS_PATH: {}", self.suppliers_path.display());
        tracing::info!("  GEOCODER_URL: {}", self.geocoder_url);
        tracing::info!("  LOADSHEDDING_URL: {}", self.loadshedding_url);
        tracing::info!("  MODEL_TTL_SECS: {}", self.model_ttl.as_secs());
    }
}
