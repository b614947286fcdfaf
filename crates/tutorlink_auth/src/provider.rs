//! OAuth 2.0 authorization-code login against Google or a Cognito hosted UI.

use crate::error::AuthError;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::{debug, error, info};
use tutorlink_common::services::{AuthorizationRequest, BoxFuture, IdentityClaims, IdentityService};
use tutorlink_common::HTTP_CLIENT;
use tutorlink_config::OAuthProviderConfig;

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Fields of an OpenID userinfo response. Cognito reports `username` where
/// Google reports `name`.
#[derive(Deserialize, Debug)]
struct UserInfo {
    email: Option<String>,
    name: Option<String>,
    username: Option<String>,
}

pub struct OAuthIdentityService {
    name: String,
    client: ConfiguredClient,
    scopes: Vec<String>,
    userinfo_url: String,
}

impl OAuthIdentityService {
    pub fn new(name: &str, config: &OAuthProviderConfig) -> Result<Self, AuthError> {
        let invalid = |field: &str| {
            let field = field.to_string();
            move |e: oauth2::url::ParseError| {
                AuthError::ConfigError(format!("{}.{} is not a valid URL: {}", name, field, e))
            }
        };

        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_url.clone()).map_err(invalid("auth_url"))?)
            .set_token_uri(TokenUrl::new(config.token_url.clone()).map_err(invalid("token_url"))?)
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_url.clone()).map_err(invalid("redirect_url"))?,
            );

        Ok(Self {
            name: name.to_string(),
            client,
            scopes: config.scopes.clone(),
            userinfo_url: config.userinfo_url.clone(),
        })
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<IdentityClaims, AuthError> {
        let response = HTTP_CLIENT
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::UserInfoError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::UserInfoError(e.to_string()))?;
        if !status.is_success() {
            error!("[{}] userinfo returned {}: {}", self.name, status, body);
            return Err(AuthError::UserInfoError(format!("status {}", status)));
        }

        let info: UserInfo =
            serde_json::from_str(&body).map_err(|e| AuthError::UserInfoError(e.to_string()))?;
        let email = info
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthError::MissingEmail)?;

        Ok(IdentityClaims {
            email,
            name: info.name.or(info.username),
        })
    }
}

impl IdentityService for OAuthIdentityService {
    type Error = AuthError;

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn authorization_request(&self) -> AuthorizationRequest {
        let (url, csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .url();

        AuthorizationRequest {
            url: url.to_string(),
            csrf_state: csrf_token.secret().to_string(),
        }
    }

    fn exchange_code(&self, code: &str) -> BoxFuture<'_, IdentityClaims, Self::Error> {
        let code = AuthorizationCode::new(code.to_owned());
        Box::pin(async move {
            debug!("[{}] exchanging authorization code", self.name);
            let token = self
                .client
                .exchange_code(code)
                .request_async(&*HTTP_CLIENT)
                .await
                .map_err(|e| {
                    error!("[{}] code exchange failed: {:?}", self.name, e);
                    AuthError::ExchangeError(e.to_string())
                })?;

            let claims = self.fetch_userinfo(token.access_token().secret()).await?;
            info!("[{}] authenticated {}", self.name, claims.email);
            Ok(claims)
        })
    }
}
