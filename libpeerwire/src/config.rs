use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_IDLE_TCP: Duration = Duration::from_secs(5);
pub const DEFAULT_UDP_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_FAIL: u32 = 3;

/// Node-wide settings for request/response exchanges.
///
/// Durations are stored in milliseconds in the YAML representation:
///
/// ```yaml
/// idle_tcp_millis: 5000
/// udp_timeout_millis: 3000
/// sign_responses: true
/// max_fail: 3
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// How long an established TCP connection may sit unused before it is considered dead.
    #[serde(rename = "idle_tcp_millis", serialize_with = "to_millis", deserialize_with = "from_millis")]
    pub idle_tcp: Duration,
    /// How long to wait for the reply to a UDP request.
    #[serde(rename = "udp_timeout_millis", serialize_with = "to_millis", deserialize_with = "from_millis")]
    pub udp_timeout: Duration,
    /// Sign every response this node sends with its keypair.
    pub sign_responses: bool,
    /// Number of non-forced offline reports after which a peer is dropped from the peer map.
    pub max_fail: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            idle_tcp: DEFAULT_IDLE_TCP,
            udp_timeout: DEFAULT_UDP_TIMEOUT,
            sign_responses: false,
            max_fail: DEFAULT_MAX_FAIL,
        }
    }
}

impl NodeConfig {
    pub fn with_idle_tcp(mut self, idle: Duration) -> Self {
        self.idle_tcp = idle;
        self
    }

    pub fn with_udp_timeout(mut self, timeout: Duration) -> Self {
        self.udp_timeout = timeout;
        self
    }

    pub fn with_signed_responses(mut self, sign: bool) -> Self {
        self.sign_responses = sign;
        self
    }

    pub fn with_max_fail(mut self, max_fail: u32) -> Self {
        self.max_fail = max_fail;
        self
    }

    pub fn from_yml(text: &str) -> Result<Self, ConfigError> {
        let config = serde_yml::from_str(text)?;
        Ok(config)
    }

    pub fn to_yml(&self) -> Result<String, ConfigError> {
        let s = serde_yml::to_string(self)?;
        Ok(s)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yml(&text)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let text = self.to_yml()?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

fn to_millis<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_u64(d.as_millis() as u64)
}

fn from_millis<'de, D>(d: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(d)?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempPath;

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config = NodeConfig::from_yml("idle_tcp_millis: 250\nsign_responses: true\n").expect("parse config");
        assert_eq!(config.idle_tcp, Duration::from_millis(250));
        assert!(config.sign_responses);
        assert_eq!(config.udp_timeout, DEFAULT_UDP_TIMEOUT);
        assert_eq!(config.max_fail, DEFAULT_MAX_FAIL);
    }

    #[test]
    fn save_and_load() {
        let config = NodeConfig::default().with_udp_timeout(Duration::from_millis(1500)).with_max_fail(5);
        let tmp = TempPath::from_path("test_node_config.yml");
        config.save(&tmp).expect("save config");
        let loaded = NodeConfig::load(&tmp).expect("load config");
        assert_eq!(config, loaded);
    }

    #[test]
    fn invalid_yaml() {
        let err = NodeConfig::from_yml("idle_tcp_millis: [not, a, number]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
