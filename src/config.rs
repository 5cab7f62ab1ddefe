use crate::deploy::{DeployEvent, LogSink};
use crate::error::{ConfigError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, HeaderMap, HeaderValue};
use std::{env, fmt, path::PathBuf, str::FromStr, sync::Arc, time::Duration};
use tracing::warn;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5001;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

// Rendered in place of a missing credential half, e.g. "user:undefined".
const MISSING_CREDENTIAL: &str = "undefined";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            _ => Err(ConfigError::InvalidProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// Where the IPFS node lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub user: Option<String>,
    pub pass: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            protocol: Protocol::default(),
            user: None,
            pass: None,
        }
    }
}

impl ConnectionConfig {
    /// Reads `IPFS_HOST`, `IPFS_PORT`, `IPFS_PROTOCOL`, `IPFS_USER` and `IPFS_PASS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        // An empty connection setting falls back to its default.
        let setting = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = setting("IPFS_HOST") {
            config.host = host;
        }
        if let Some(port) = setting("IPFS_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if let Some(protocol) = setting("IPFS_PROTOCOL") {
            config.protocol = protocol.parse()?;
        }
        config.user = lookup("IPFS_USER");
        config.pass = lookup("IPFS_PASS");

        Ok(config)
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}/api/v0", self.protocol, self.host, self.port)
    }

    /// True when either credential is set to something non-empty.
    pub fn has_credentials(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.user) || set(&self.pass)
    }

    /// `Basic base64(user:pass)`, or `None` when no credential is set.
    ///
    /// A half that is missing entirely is encoded as the text `undefined`,
    /// which is what existing deployments of this tool have always sent.
    pub fn basic_auth(&self) -> Option<String> {
        if !self.has_credentials() {
            return None;
        }
        if self.user.is_none() || self.pass.is_none() {
            warn!("only one of IPFS_USER/IPFS_PASS is set; the other is sent as '{MISSING_CREDENTIAL}'");
        }

        let user = self.user.as_deref().unwrap_or(MISSING_CREDENTIAL);
        let pass = self.pass.as_deref().unwrap_or(MISSING_CREDENTIAL);
        Some(format!("Basic {}", STANDARD.encode(format!("{user}:{pass}"))))
    }

    /// Headers attached to every request made to the node.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(auth) = self.basic_auth() {
            let mut value = HeaderValue::from_str(&auth)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("utf-8"));
        Ok(headers)
    }
}

/// Everything a single deploy run needs.
#[derive(Clone)]
pub struct DeployConfig {
    pub src_dir: PathBuf,
    pub connection: ConnectionConfig,
    pub log: LogSink,
}

impl DeployConfig {
    pub fn new(src_dir: impl Into<PathBuf>, connection: ConnectionConfig) -> Self {
        Self {
            src_dir: src_dir.into(),
            connection,
            log: Arc::new(|_: &DeployEvent<'_>| {}),
        }
    }

    pub fn with_log<F>(mut self, log: F) -> Self
    where
        F: Fn(&DeployEvent<'_>) + Send + Sync + 'static,
    {
        self.log = Arc::new(log);
        self
    }
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("src_dir", &self.src_dir)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}
