//! Authentication tokens and the authenticator trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::client::Client;

/// A bearer token issued by the server's token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token type, e.g. "bearer".
    #[serde(rename = "type")]
    pub token_type: String,
    /// The access token itself.
    pub value: String,
}

impl Token {
    pub fn new(token_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            token_type: token_type.into(),
            value: value.into(),
        }
    }

    /// True when both type and value are empty.
    pub fn is_empty(&self) -> bool {
        self.token_type.is_empty() && self.value.is_empty()
    }

    /// The `Authorization` header value for this token.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.value)
    }
}

/// Exchanges user credentials for a token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Obtain a token for `username`/`password`, using the transport and base
    /// URL of `client`.
    async fn get_token(&self, client: &dyn Client, username: &str, password: &str)
    -> Result<Token>;
}
