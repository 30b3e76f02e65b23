use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub metering: MeteringSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MeteringSettings {
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    #[serde(default = "default_poll_period_ms")]
    pub period_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            period_ms: default_poll_period_ms(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_poll_period_ms() -> u64 {
    100_000
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl AppConfig {
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.polling.period_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.metering.request_timeout_ms)
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid server.bind {:?}: {}", self.server.bind, e))
    }

    fn validate(self) -> anyhow::Result<Self> {
        anyhow::ensure!(self.polling.period_ms > 0, "polling.period_ms must be positive");
        anyhow::ensure!(
            self.metering.request_timeout_ms > 0,
            "metering.request_timeout_ms must be positive"
        );
        anyhow::ensure!(!self.metering.host.trim().is_empty(), "metering.host is empty");
        self.bind_addr()?;
        Ok(self)
    }
}

/// `config/dashboard.toml` if present, then `DASHBOARD__SECTION__KEY`
/// environment overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<AppConfig>()?.validate()
}

#[cfg(test)]
fn parse_app_config(toml: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    settings.try_deserialize::<AppConfig>()?.validate()
}
