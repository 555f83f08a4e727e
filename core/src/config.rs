//! Client options and the validated, immutable client configuration.

use std::time::Duration;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::http::Encoding;
use crate::overrides::TransportOverride;

pub const DEFAULT_API_PREFIX: &str = "wp-json";
pub const DEFAULT_VERSION: &str = "wc/v3";
pub const DEFAULT_CONFIG_FILE: &str = "woocommerce.yaml";
pub const ENV_PREFIX: &str = "WOOCOMMERCE_";

/// Construction options as supplied by the caller.
///
/// Field names are snake_case; the camelCase spellings (`consumerKey`,
/// `wpAPIPrefix`, ...) are accepted as aliases. Options can be loaded with
/// [`ClientOptions::load`], in priority order (lowest to highest):
/// 1. Field defaults
/// 2. `woocommerce.yaml` (if it exists)
/// 3. Environment variables with the `WOOCOMMERCE_` prefix
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientOptions {
    /// Store root, e.g. `https://shop.example`.
    #[serde(default)]
    pub url: String,

    #[serde(default, alias = "consumerKey")]
    pub consumer_key: String,

    #[serde(default, alias = "consumerSecret")]
    pub consumer_secret: String,

    /// Path segment before the version.
    #[serde(default = "default_api_prefix", alias = "wpAPIPrefix")]
    pub wp_api_prefix: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Charset for decoding response bodies.
    #[serde(default)]
    pub encoding: Encoding,

    /// Send credentials as query parameters instead of Basic auth (TLS only).
    #[serde(default, alias = "queryStringAuth")]
    pub query_string_auth: bool,

    #[serde(default)]
    pub port: Option<u16>,

    /// Request timeout in milliseconds, forwarded to the transport.
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default, alias = "transportOverride")]
    pub transport_override: TransportOverride,
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            wp_api_prefix: default_api_prefix(),
            version: default_version(),
            encoding: Encoding::default(),
            query_string_auth: false,
            port: None,
            timeout: None,
            transport_override: TransportOverride::default(),
        }
    }
}

impl ClientOptions {
    pub fn new(
        url: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            ..Self::default()
        }
    }

    pub fn wp_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.wp_api_prefix = prefix.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn query_string_auth(mut self, enabled: bool) -> Self {
        self.query_string_auth = enabled;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn transport_override(mut self, overrides: TransportOverride) -> Self {
        self.transport_override = overrides;
        self
    }

    /// Load options from `woocommerce.yaml` and `WOOCOMMERCE_*` variables.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load options with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let options = Figment::new()
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(options)
    }
}

/// Validated client configuration. Read-only after construction.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    url: String,
    consumer_key: String,
    consumer_secret: String,
    api_prefix: String,
    version: String,
    encoding: Encoding,
    query_string_auth: bool,
    port: Option<u16>,
    timeout: Option<Duration>,
    transport_override: TransportOverride,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("consumer_key", &self.consumer_key)
            .field("api_prefix", &self.api_prefix)
            .field("version", &self.version)
            .field("encoding", &self.encoding)
            .field("query_string_auth", &self.query_string_auth)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Validate `options`.
    ///
    /// Required options are checked first, in the order `url`,
    /// `consumerKey`, `consumerSecret`; nothing else is looked at until all
    /// three are present. Empty prefix and version fall back to defaults.
    ///
    /// # Errors
    /// `ConfigError::MissingOption` for an absent required option,
    /// `ConfigError::InvalidUrl` if the URL has no host, and
    /// `ConfigError::InvalidOption` for a zero port.
    pub fn new(options: ClientOptions) -> Result<Self, ConfigError> {
        if options.url.is_empty() {
            return Err(ConfigError::MissingOption("url"));
        }
        if options.consumer_key.is_empty() {
            return Err(ConfigError::MissingOption("consumerKey"));
        }
        if options.consumer_secret.is_empty() {
            return Err(ConfigError::MissingOption("consumerSecret"));
        }

        match Url::parse(&options.url) {
            Ok(parsed) if parsed.host_str().is_some_and(|h| !h.is_empty()) => {}
            _ => return Err(ConfigError::InvalidUrl(options.url)),
        }

        if options.port == Some(0) {
            return Err(ConfigError::InvalidOption {
                option: "port",
                reason: "cannot be 0".to_string(),
            });
        }

        let api_prefix = if options.wp_api_prefix.is_empty() {
            default_api_prefix()
        } else {
            options.wp_api_prefix
        };
        let version = if options.version.is_empty() {
            default_version()
        } else {
            options.version
        };

        Ok(Self {
            url: options.url,
            consumer_key: options.consumer_key,
            consumer_secret: options.consumer_secret,
            api_prefix,
            version,
            encoding: options.encoding,
            query_string_auth: options.query_string_auth,
            port: options.port,
            timeout: options.timeout.filter(|ms| *ms > 0).map(Duration::from_millis),
            transport_override: options.transport_override,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn query_string_auth(&self) -> bool {
        self.query_string_auth
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn transport_override(&self) -> &TransportOverride {
        &self.transport_override
    }
}

impl TryFrom<ClientOptions> for ClientConfig {
    type Error = ConfigError;

    fn try_from(options: ClientOptions) -> Result<Self, Self::Error> {
        Self::new(options)
    }
}
