//! Account API client methods

use super::{ApiClient, ClientError, RequestOptions, decode_json, server_message};
use crate::endpoints::user;
use crate::types::{LoginRequest, LoginTokens, RegisterRequest, ResetPasswordRequest};
use serde_json::Value;
use tracing::{debug, info, warn};

impl ApiClient {
    /// Create an account. No token is required or stored.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Value, ClientError> {
        let response = self
            .public_post(user::REGISTER, &RegisterRequest { email, password, name })
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response, "Registration failed").await);
        }
        decode_json(response).await
    }

    /// Authenticate and store the issued token pair.
    ///
    /// The full response body is returned. When it lacks either token the
    /// store is left untouched. A pair that cannot be persisted fails the
    /// login with [`ClientError::Storage`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let response = self
            .public_post(user::LOGIN, &LoginRequest { email, password })
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response, "Invalid credentials").await);
        }

        let body: Value = decode_json(response).await?;
        match LoginTokens::from_response(&body) {
            Some(tokens) => {
                self.tokens.set_tokens(&tokens.access, &tokens.refresh)?;
                info!("Logged in");
            }
            None => warn!("Login response carried no complete token pair, session not stored"),
        }
        Ok(body)
    }

    /// Forget the stored session. No request is made.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.tokens.clear_tokens()?;
        debug!("Logged out");
        Ok(())
    }

    /// Whether an access token is currently stored
    pub fn is_authenticated(&self) -> bool {
        self.tokens.access_token().is_some()
    }

    /// Fetch the signed-in user's profile
    pub async fn profile(&self) -> Result<Value, ClientError> {
        self.request(user::PROFILE, &RequestOptions::get()).await
    }

    /// Ask the backend to email a password reset link
    pub async fn send_reset_password_email(&self, email: &str) -> Result<Value, ClientError> {
        let options = RequestOptions::post().json(&ResetPasswordRequest { email })?;
        self.request(user::RESET_PASSWORD, &options).await
    }
}

/// Login/register failure: server message if any, else `fallback`
async fn rejection(response: reqwest::Response, fallback: &str) -> ClientError {
    let body = response.bytes().await.unwrap_or_default();
    ClientError::Authentication(server_message(&body).unwrap_or_else(|| fallback.to_owned()))
}
