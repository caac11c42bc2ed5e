// HTTP transport over reqwest.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::config::ClientConfig;
use crate::crypto::kdf::SessionId;
use crate::error::{Error, Result};
use crate::transport::{Endpoint, Transport, TransportResponse};

/// Posts raw bodies to the endpoints named in a [`ClientConfig`].
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("securelink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("http client init: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        endpoint: Endpoint,
        body: Vec<u8>,
        session_id: Option<&SessionId>,
    ) -> Result<TransportResponse> {
        let url = self.config.endpoint_url(endpoint);
        let mut req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);
        if let Some(id) = session_id {
            req = req.header(self.config.session_header.as_str(), id.to_hex());
        }

        let res = req
            .send()
            .await
            .map_err(|e| Error::Network(format!("{endpoint:?}: {e}")))?;
        let status = res.status().as_u16();
        let body = res
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("{endpoint:?} body: {e}")))?;
        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        assert!(matches!(
            HttpTransport::new(ClientConfig::new("")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn keeps_config() {
        let t = HttpTransport::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();
        assert_eq!(t.config().base_url, "http://127.0.0.1:9");
    }
}
