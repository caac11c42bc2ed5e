// Client configuration: remote endpoint layout and deadlines.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::Endpoint;

fn default_init_path() -> String {
    "/handshake/init".into()
}

fn default_finish_path() -> String {
    "/handshake/finish".into()
}

fn default_request_path() -> String {
    "/request".into()
}

fn default_session_header() -> String {
    "x-session-id".into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Where and how the secure client reaches its peer.
///
/// Only `base_url` is required when deserializing; every other field has a
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_init_path")]
    pub init_path: String,
    #[serde(default = "default_finish_path")]
    pub finish_path: String,
    #[serde(default = "default_request_path")]
    pub request_path: String,
    /// Header carrying the hex session id on finish and request posts.
    #[serde(default = "default_session_header")]
    pub session_header: String,
    /// Deadline for each transport exchange, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            init_path: default_init_path(),
            finish_path: default_finish_path(),
            request_path: default_request_path(),
            session_header: default_session_header(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("{e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_paths(
        mut self,
        init: impl Into<String>,
        finish: impl Into<String>,
        request: impl Into<String>,
    ) -> Self {
        self.init_path = init.into();
        self.finish_path = finish.into();
        self.request_path = request.into();
        self
    }

    pub fn with_session_header(mut self, header: impl Into<String>) -> Self {
        self.session_header = header.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".into()));
        }
        for (name, path) in [
            ("init_path", &self.init_path),
            ("finish_path", &self.finish_path),
            ("request_path", &self.request_path),
        ] {
            if path.is_empty() {
                return Err(Error::Config(format!("{name} must not be empty")));
            }
        }
        if self.session_header.is_empty() {
            return Err(Error::Config("session_header must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }

    /// Full URL for an endpoint.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::HandshakeInit => &self.init_path,
            Endpoint::HandshakeFinish => &self.finish_path,
            Endpoint::Request => &self.request_path,
        };
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in() {
        let cfg = ClientConfig::from_json_str(r#"{"base_url":"https://svc.example"}"#).unwrap();
        assert_eq!(cfg, ClientConfig::new("https://svc.example"));
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn endpoint_urls_join_cleanly() {
        let cfg = ClientConfig::new("https://svc.example/").with_paths("hs/init", "/hs/finish", "/rpc");
        assert_eq!(
            cfg.endpoint_url(Endpoint::HandshakeInit),
            "https://svc.example/hs/init"
        );
        assert_eq!(
            cfg.endpoint_url(Endpoint::HandshakeFinish),
            "https://svc.example/hs/finish"
        );
        assert_eq!(cfg.endpoint_url(Endpoint::Request), "https://svc.example/rpc");
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("http://x")
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(ClientConfig::new("http://x")
            .with_session_header("")
            .validate()
            .is_err());
        assert!(ClientConfig::from_json_str(r#"{"init_path":"/x"}"#).is_err());
    }
}
