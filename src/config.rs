//! Client and reconciler configuration.
//!
//! Values come from prefixed environment variables (`KAFKA_BOOTSTRAP_SERVERS`
//! and so on). Lookup goes through a closure so callers and tests can supply
//! their own source.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;

/// Prefix for every environment variable read by [`ClientConfig::from_env`]
pub const DEFAULT_ENV_PREFIX: &str = "KAFKA";

const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:9092";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_REASSIGNMENT_TIMEOUT_SECS: u64 = 30 * 60;

/// SASL mechanisms accepted by the admin client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SaslMechanism {
    Plain,
    ScramSha256,
    ScramSha512,
    #[default]
    AwsMskIam,
}

impl SaslMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaslMechanism::Plain => "plain",
            SaslMechanism::ScramSha256 => "scram-sha256",
            SaslMechanism::ScramSha512 => "scram-sha512",
            SaslMechanism::AwsMskIam => "aws-msk-iam",
        }
    }

    /// IAM authenticates with ambient AWS credentials instead of a password
    pub fn needs_credentials(&self) -> bool {
        !matches!(self, SaslMechanism::AwsMskIam)
    }
}

impl FromStr for SaslMechanism {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "plain" => Ok(SaslMechanism::Plain),
            "scram-sha256" => Ok(SaslMechanism::ScramSha256),
            "scram-sha512" => Ok(SaslMechanism::ScramSha512),
            "aws-msk-iam" => Ok(SaslMechanism::AwsMskIam),
            _ => Err(ConfigError::UnknownSaslMechanism(raw.to_string())),
        }
    }
}

impl fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SaslConfig {
    pub mechanism: SaslMechanism,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SaslConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslConfig")
            .field("mechanism", &self.mechanism)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub enabled: bool,
    pub skip_verify: bool,
}

/// Connection settings for the admin client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Only one server is needed to reach the cluster
    pub bootstrap_server: String,
    pub sasl: Option<SaslConfig>,
    pub tls: TlsConfig,
    /// Applied once to the shared admin connection
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(DEFAULT_ENV_PREFIX, |key| std::env::var(key).ok())
    }

    /// Load configuration from `lookup`, which receives full variable names
    /// such as `KAFKA_SASL_ENABLED`.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource { prefix, lookup };

        let servers = env.string("BOOTSTRAP_SERVERS", DEFAULT_BOOTSTRAP_SERVERS);
        let bootstrap_server = servers
            .split(',')
            .map(str::trim)
            .find(|s| !s.is_empty())
            .ok_or(ConfigError::NoBootstrapServers)?
            .to_string();

        let sasl = if env.bool("SASL_ENABLED", true) {
            let mechanism: SaslMechanism = env
                .string("SASL_MECHANISM", SaslMechanism::default().as_str())
                .parse()?;
            let username = env.string("SASL_USERNAME", "");
            let password = env.string("SASL_PASSWORD", "");

            if mechanism.needs_credentials() {
                if username.is_empty() {
                    return Err(ConfigError::MissingCredential {
                        mechanism: mechanism.as_str(),
                        field: "username",
                    });
                }
                if password.is_empty() {
                    return Err(ConfigError::MissingCredential {
                        mechanism: mechanism.as_str(),
                        field: "password",
                    });
                }
            }

            Some(SaslConfig {
                mechanism,
                username,
                password,
            })
        } else {
            None
        };

        let tls = TlsConfig {
            enabled: env.bool("TLS_ENABLED", false),
            skip_verify: env.bool("TLS_SKIP_VERIFY", false),
        };
        let timeout = Duration::from_secs(env.u64("TIMEOUT", DEFAULT_TIMEOUT_SECS));

        debug!(
            bootstrap_server = %bootstrap_server,
            sasl = ?sasl.as_ref().map(|s| s.mechanism),
            tls = tls.enabled,
            timeout_secs = timeout.as_secs(),
            "Loaded client configuration"
        );

        Ok(Self {
            bootstrap_server,
            sasl,
            tls,
            timeout,
        })
    }
}

/// Settings that shape how the reconciler issues mutations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Wait budget handed to the cluster with each reassignment request
    #[serde(with = "secs")]
    pub reassignment_timeout: Duration,

    /// Ask the partition extender to spread new partitions across racks
    pub rack_aware_extension: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            reassignment_timeout: Duration::from_secs(DEFAULT_REASSIGNMENT_TIMEOUT_SECS),
            rack_aware_extension: true,
        }
    }
}

impl ReconcilerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(DEFAULT_ENV_PREFIX, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource { prefix, lookup };
        Self {
            reassignment_timeout: Duration::from_secs(
                env.u64("REASSIGNMENT_TIMEOUT", DEFAULT_REASSIGNMENT_TIMEOUT_SECS),
            ),
            rack_aware_extension: env.bool("RACK_AWARE_EXTENSION", true),
        }
    }
}

/// Prefixed variable lookup. Unparseable values fall back to the default.
struct EnvSource<'a, F> {
    prefix: &'a str,
    lookup: F,
}

impl<F> EnvSource<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(&format!("{}_{}", self.prefix, key))
    }

    fn string(&self, key: &str, fallback: &str) -> String {
        self.raw(key).unwrap_or_else(|| fallback.to_string())
    }

    fn bool(&self, key: &str, fallback: bool) -> bool {
        self.raw(key)
            .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                "1" | "t" | "true" => Some(true),
                "0" | "f" | "false" => Some(false),
                _ => None,
            })
            .unwrap_or(fallback)
    }

    fn u64(&self, key: &str, fallback: u64) -> u64 {
        self.raw(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(fallback)
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
