//! OAuth 2.0 refresh-token exchange against Google's token endpoint.

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::credential::Credential;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CredentialRefresher};

use super::config::{GoogleConfig, OAuthCredentials};

/// OAuth client that renews Google access tokens.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    token_url: Url,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client from the Google configuration.
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            credentials: config.credentials.clone(),
            token_url: config.token_url.clone(),
            http_client,
        })
    }

    /// Exchanges `refresh_token` for a new access token.
    ///
    /// The returned credential keeps `refresh_token` unless Google rotated it.
    pub async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<Credential> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        debug!("requesting new access token");

        let response = self
            .http_client
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("token refresh request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(refresh_error(status.as_u16(), &body));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("invalid token response: {}", e)))?;

        info!("successfully refreshed access token");
        Ok(token_response.into_credential(refresh_token))
    }
}

impl CredentialRefresher for OAuthClient {
    fn name(&self) -> &str {
        "google-oauth"
    }

    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, ProviderResult<Credential>> {
        Box::pin(async move {
            self.refresh_token(refresh_token)
                .await
                .map_err(|e| e.with_provider("google-oauth"))
        })
    }
}

/// Maps a failed token response.
///
/// Google answers a revoked or expired refresh token with 400 `invalid_grant`
/// and an unknown client with 401 `invalid_client`; both are denials.
fn refresh_error(status: u16, body: &str) -> ProviderError {
    match status {
        400 | 401 => {
            let reason = serde_json::from_str::<TokenErrorResponse>(body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or_else(|_| body.to_string());
            ProviderError::authentication(format!("token refresh denied ({}): {}", status, reason))
        }
        _ => ProviderError::from_status(status, "token refresh", body),
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_credential(self, previous_refresh_token: &str) -> Credential {
        let refresh_token = self
            .refresh_token
            .unwrap_or_else(|| previous_refresh_token.to_string());
        let credential = Credential::new(self.access_token).with_refresh_token(refresh_token);
        match self.expires_in {
            Some(expires_in) => credential.expiring_in(expires_in),
            None => credential,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}
