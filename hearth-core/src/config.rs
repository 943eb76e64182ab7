use std::collections::BTreeMap;
use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parsing(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parsing(e) => write!(f, "TOML parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Parsing(value)
    }
}

/// Process-wide configuration: read once at startup, then handed to the
/// server by value. Nothing mutates it afterwards.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub content: ContentConfig,
    /// URL path -> template name, rendered without any markdown.
    pub endpoints: BTreeMap<String, String>,
    /// URL path -> markdown source, rendered once at startup
    /// (or per request when `content.reload` is set).
    pub documents: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            content: ContentConfig::default(),
            endpoints: BTreeMap::from([
                ("/".to_string(), "index.html".to_string()),
                ("/contact".to_string(), "contact.html".to_string()),
            ]),
            documents: BTreeMap::from([(
                "/resume".to_string(),
                "content/resume.md".to_string(),
            )]),
        }
    }
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&data)?;

        Ok(config)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub addr: String,
    pub tls: bool,
    pub cert_file: String,
    pub key_file: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            tls: false,
            cert_file: String::new(),
            key_file: String::new(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ContentConfig {
    /// Glob handed to the template loader.
    pub templates: String,
    pub static_dir: String,
    pub blog_dir: String,
    /// Re-read document sources on every request instead of binding them
    /// once at startup. Useful while writing.
    pub reload: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            templates: "templates/**/*.html".to_string(),
            static_dir: "static".to_string(),
            blog_dir: "content/blog".to_string(),
            reload: false,
        }
    }
}
