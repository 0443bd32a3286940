//! TLS settings and HTTP transports.

use pipeset_core::{Error, Result, Token};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::fmt;
use std::time::Duration;

/// Connect timeout for every transport.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS settings shared by every request to a target.
#[derive(Clone, Default)]
pub struct TlsConfig {
    /// Skip server certificate verification.
    pub insecure: bool,
    /// Extra CA certificate trusted on top of the system roots.
    pub ca_cert: Option<reqwest::Certificate>,
}

impl TlsConfig {
    pub fn new(insecure: bool, ca_cert: Option<reqwest::Certificate>) -> Self {
        Self { insecure, ca_cert }
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("insecure", &self.insecure)
            .field("ca_cert", &self.ca_cert.is_some())
            .finish()
    }
}

/// Parse a PEM encoded CA certificate. An empty string means none.
pub fn load_ca_cert(pem: &str) -> Result<Option<reqwest::Certificate>> {
    if pem.is_empty() {
        return Ok(None);
    }

    reqwest::Certificate::from_pem(pem.as_bytes())
        .map(Some)
        .map_err(|e| Error::InvalidCaCert(e.to_string()))
}

/// Build an HTTP transport. With a token, every request carries it in the
/// `Authorization` header.
pub fn transport(tls: &TlsConfig, token: Option<&Token>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .danger_accept_invalid_certs(tls.insecure);

    if let Some(cert) = &tls.ca_cert {
        builder = builder.add_root_certificate(cert.clone());
    }

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&token.header_value())
            .map_err(|e| Error::Authentication(format!("invalid token: {}", e)))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }

    Ok(builder.build()?)
}
