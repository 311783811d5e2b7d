//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Default Gemini model used when RVI_GEMINI_MODEL is not set
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Default Gemini API endpoint
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Placeholder value shipped in .env templates; never a real key
const PLACEHOLDER_API_KEY: &str = "your-key-here";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Get default configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/reviewintel/config.toml first, then /etc/reviewintel/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("reviewintel").join("config.toml"));
        let system_config = PathBuf::from("/etc/reviewintel/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("reviewintel").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("reviewintel"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/reviewintel"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("reviewintel"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/reviewintel"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("reviewintel"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\reviewintel"))
    } else {
        PathBuf::from("./reviewintel_data")
    }
}

/// Ensure the root folder exists, creating it if necessary
pub fn ensure_root_folder(root_folder: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(root_folder)?;
    Ok(())
}

/// Database file path inside the root folder
pub fn database_path(root_folder: &std::path::Path) -> PathBuf {
    root_folder.join("reviewintel.db")
}

/// Gemini API configuration, loaded from the environment
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    /// Request timeout; the analysis call may legitimately take minutes
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Load configuration from environment variables.
    ///
    /// GEMINI_API_KEY may be absent at startup; validation happens when an
    /// analysis is actually requested (see [`GeminiConfig::validate_key`]).
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("RVI_GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            endpoint: std::env::var("RVI_GEMINI_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_GEMINI_ENDPOINT.to_string()),
            timeout_secs: 300,
        }
    }

    /// Reject absent, too-short, or template placeholder API keys before any
    /// network call is attempted.
    pub fn validate_key(&self) -> Result<()> {
        if self.api_key.len() < 10 || self.api_key == PLACEHOLDER_API_KEY {
            return Err(Error::Config(
                "Missing Gemini API key. Please set GEMINI_API_KEY in the environment.".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_takes_priority() {
        let path = resolve_root_folder(Some("/tmp/rvi-test"), "RVI_TEST_UNSET_VAR").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/rvi-test"));
    }

    #[test]
    fn default_root_folder_is_not_empty() {
        let path = resolve_root_folder(None, "RVI_TEST_UNSET_VAR").unwrap();
        assert!(!path.as_os_str().is_empty());
    }

    #[test]
    fn placeholder_key_is_rejected() {
        let config = GeminiConfig {
            api_key: "your-key-here".to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            timeout_secs: 300,
        };
        assert!(config.validate_key().is_err());
    }

    #[test]
    fn short_key_is_rejected() {
        let config = GeminiConfig {
            api_key: "abc".to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            timeout_secs: 300,
        };
        assert!(config.validate_key().is_err());
    }

    #[test]
    fn plausible_key_is_accepted() {
        let config = GeminiConfig {
            api_key: "AIzaSyTestKey1234567890".to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            timeout_secs: 300,
        };
        assert!(config.validate_key().is_ok());
    }
}
