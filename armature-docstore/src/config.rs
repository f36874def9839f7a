//! Document store connection configuration.

use crate::error::{DocStoreError, Result};
use std::fmt;
use std::time::Duration;

/// Environment variable holding comma separated node URIs.
pub const ENV_URIS: &str = "DOCSTORE_URIS";
/// Environment variable holding the basic auth username.
pub const ENV_USERNAME: &str = "DOCSTORE_USERNAME";
/// Environment variable holding the basic auth password.
pub const ENV_PASSWORD: &str = "DOCSTORE_PASSWORD";
/// Environment variable holding the request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "DOCSTORE_REQUEST_TIMEOUT_SECS";

/// Connection configuration for [`OpenSearchTransport`](crate::OpenSearchTransport).
#[derive(Clone)]
pub struct DocStoreConfig {
    /// Node URIs, each `scheme://host:port`.
    pub urls: Vec<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Skip certificate verification (development clusters only).
    pub danger_accept_invalid_certs: bool,
}

impl DocStoreConfig {
    /// Create a new configuration with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
            danger_accept_invalid_certs: false,
        }
    }

    /// Create configuration with multiple URLs for a cluster.
    pub fn cluster(urls: Vec<String>) -> Self {
        Self {
            urls,
            ..Self::new("")
        }
    }

    /// Read configuration from `DOCSTORE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// `DOCSTORE_URIS` is required; the other keys are optional.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uris = lookup(ENV_URIS)
            .ok_or_else(|| DocStoreError::Configuration(format!("{} is not set", ENV_URIS)))?;

        let urls: Vec<String> = uris
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let mut config = Self::cluster(urls);

        if let (Some(user), Some(pass)) = (lookup(ENV_USERNAME), lookup(ENV_PASSWORD)) {
            config = config.with_basic_auth(user, pass);
        }

        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                DocStoreError::Configuration(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    ENV_REQUEST_TIMEOUT, secs
                ))
            })?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Skip certificate verification (DANGER: only for development).
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.danger_accept_invalid_certs = true;
        self
    }

    /// Parse every configured URI.
    pub fn nodes(&self) -> Result<Vec<NodeAddress>> {
        if self.urls.is_empty() {
            return Err(DocStoreError::Configuration("No URLs provided".to_string()));
        }
        self.urls.iter().map(|u| NodeAddress::parse(u)).collect()
    }

    /// Check that at least one URI is configured and all of them parse.
    pub fn validate(&self) -> Result<()> {
        self.nodes().map(|_| ())
    }
}

impl fmt::Debug for DocStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocStoreConfig")
            .field("urls", &self.urls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("request_timeout", &self.request_timeout)
            .field("danger_accept_invalid_certs", &self.danger_accept_invalid_certs)
            .finish()
    }
}

/// A node address of the form `scheme://host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddress {
    /// `http` or `https`.
    pub scheme: String,
    /// Host name or address.
    pub host: String,
    /// Port number.
    pub port: u16,
}

impl NodeAddress {
    /// Parse a `scheme://host:port` URI. The port is mandatory.
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |why: &str| {
            DocStoreError::Configuration(format!("Invalid node URI {:?}: {}", uri, why))
        };

        let (scheme, rest) = uri.trim().split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        let scheme = scheme.to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(invalid("scheme must be http or https"));
        }

        let rest = rest.trim_end_matches('/');
        let (host, port) = rest.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
        if host.is_empty() || host.contains('/') {
            return Err(invalid("missing host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }

    /// Render as a URL string.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}
