use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub predictor: PredictorConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    6001
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How predictor scripts are launched: `<program> <script_dir>/<script> <json>`.
#[derive(Debug, Deserialize, Clone)]
pub struct PredictorConfig {
    #[serde(default = "default_program")]
    pub program: String,
    pub script_dir: PathBuf,
    /// Upper bound for a single invocation. Absent means wait forever.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,
    pub scripts: PredictorScripts,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictorScripts {
    pub crop_recommendation: String,
    pub disease_detection: String,
    pub market_price: String,
}

fn default_program() -> String {
    "python3".into()
}

fn default_timeout_ms() -> Option<u64> {
    Some(30_000)
}

impl PredictorConfig {
    pub fn get_script_path(&self, script: &str) -> PathBuf {
        self.script_dir.join(script)
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no current directory: {}", e)))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    load_configuration(
        &base_path.join("configuration"),
        environment,
        None,
        std::env::var("PORT").ok(),
    )
}

/// Layers `base.yaml`, the environment file, `AGRO_*` variables and `port`,
/// each overriding the previous one. `env_vars` replaces the process
/// environment when given.
fn load_configuration(
    configuration_directory: &Path,
    environment: Environment,
    env_vars: Option<config::Map<String, String>>,
    port: Option<String>,
) -> Result<Config, config::ConfigError> {
    // The bare PORT variable is what hosting platforms set.
    let port = port
        .map(|port| {
            port.trim().parse::<u16>().map_err(|e| {
                config::ConfigError::Message(format!("invalid PORT `{}`: {}", port, e))
            })
        })
        .transpose()?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("AGRO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env_vars),
        )
        .set_override_option("server.port", port.map(i64::from))?
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    Ok(config)
}
