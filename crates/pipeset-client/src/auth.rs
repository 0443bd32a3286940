//! OAuth2 password-grant authentication.
//!
//! The client id, secret and scopes are the ones the server registers for its
//! own command-line client. They are trust assumptions of the deployment, not
//! secrets, and are not configurable.

use async_trait::async_trait;
use pipeset_core::{Authenticator, Client, Error, Result, Token};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

/// OAuth2 client id registered on the server.
pub const CLIENT_ID: &str = "fly";
/// OAuth2 client secret registered on the server.
pub const CLIENT_SECRET: &str = "Zmx5";
/// Scopes requested with every token.
pub const SCOPES: [&str; 5] = ["openid", "profile", "email", "federated:id", "groups"];
/// Token endpoint, relative to the server URL.
pub const TOKEN_PATH: &str = "/sky/token";
/// Token type assumed when the endpoint does not name one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
}

/// Authenticates with an OAuth2 password grant against `<url>/sky/token`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuth2Authenticator;

impl OAuth2Authenticator {
    pub fn new() -> Self {
        Self
    }

    fn token_url(client: &dyn Client) -> String {
        format!("{}{}", client.url().trim_end_matches('/'), TOKEN_PATH)
    }
}

#[async_trait]
impl Authenticator for OAuth2Authenticator {
    async fn get_token(
        &self,
        client: &dyn Client,
        username: &str,
        password: &str,
    ) -> Result<Token> {
        let url = Self::token_url(client);
        let scope = SCOPES.join(" ");
        let params = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", scope.as_str()),
        ];

        debug!(url = %url, username, "requesting token");

        let response = client
            .http_client()
            .post(&url)
            .basic_auth(CLIENT_ID, Some(CLIENT_SECRET))
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Authentication(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!(
                "token request failed ({}): {}",
                status, text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Authentication(format!("malformed token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(Error::Authentication(
                "server response missing access_token".to_string(),
            ));
        }

        let token_type = if token.token_type.is_empty() {
            DEFAULT_TOKEN_TYPE.to_string()
        } else {
            token.token_type
        };

        Ok(Token::new(token_type, token.access_token))
    }
}
