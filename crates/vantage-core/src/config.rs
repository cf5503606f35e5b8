//! Dashboard configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use vantage_router::{RouteNames, ViewLayout};

use crate::error::CoreError;
use crate::Result;

/// Environment variable selecting the [`Environment`]
pub const ENV_VAR: &str = "VANTAGE_ENV";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(CoreError::Config(format!("Unknown environment: {}", s))),
        }
    }
}

/// API base addresses for one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    /// Prefix for requests through the dev proxy
    pub base_api: String,
    /// Prefix served by the mock layer, empty when mocking is unavailable
    pub mock_api: String,
    /// Address of the real backend
    pub backend_api: String,
}

impl ApiEndpoints {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self {
                base_api: "/api".to_string(),
                mock_api: "/api".to_string(),
                backend_api: "http://127.0.0.1:8000".to_string(),
            },
            Environment::Test => Self {
                base_api: "//test/api".to_string(),
                mock_api: "/api".to_string(),
                backend_api: "http://test-server:8000".to_string(),
            },
            Environment::Production => Self {
                base_api: "https://api.example.com".to_string(),
                mock_api: String::new(),
                backend_api: "https://api.example.com".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: Environment,
    /// Overrides the environment's built-in endpoints
    pub api: Option<ApiEndpoints>,
    /// Send requests to the real backend
    pub use_backend: bool,
    /// Serve requests from the mock layer
    pub mock: bool,
    /// Path to the durable storage database
    pub storage_path: PathBuf,
    pub views: ViewLayout,
    pub routes: RouteNames,
}

impl Config {
    pub fn new(environment: Environment, data_dir: PathBuf) -> Self {
        Self {
            environment,
            api: None,
            use_backend: true,
            mock: false,
            storage_path: data_dir.join("vantage.db"),
            views: ViewLayout::default(),
            routes: RouteNames::default(),
        }
    }

    /// Default configuration for the environment named by `VANTAGE_ENV`
    pub fn from_env() -> Result<Self> {
        let environment = match std::env::var(ENV_VAR) {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };
        Ok(Self::new(environment, Self::data_dir()))
    }

    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.as_ref().display(), environment = %config.environment, "Loaded configuration");
        Ok(config)
    }

    pub fn endpoints(&self) -> ApiEndpoints {
        self.api
            .clone()
            .unwrap_or_else(|| ApiEndpoints::for_environment(self.environment))
    }

    /// Base address requests should be sent to
    pub fn api_base(&self) -> String {
        let endpoints = self.endpoints();
        if self.use_backend {
            endpoints.backend_api
        } else if self.mock {
            endpoints.mock_api
        } else {
            endpoints.base_api
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Vantage"))
            .unwrap_or_else(|| PathBuf::from(".vantage"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Environment::default(), Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
