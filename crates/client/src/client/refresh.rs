//! Access token refresh

use super::ApiClient;
use crate::endpoints;
use crate::types::{RefreshRequest, RefreshResponse};
use tracing::{debug, warn};

impl ApiClient {
    /// Exchange the stored refresh token for a new access token.
    ///
    /// Returns `true` once the new access token is in the store. The refresh
    /// token itself is kept as is. Any failure, including transport errors
    /// and a store that cannot persist the new pair, clears both tokens and
    /// returns `false`. Without a stored refresh token
    /// no request is made.
    pub async fn refresh_access_token(&self) -> bool {
        let Some(refresh) = self.tokens.refresh_token() else {
            debug!("No refresh token stored, skipping refresh");
            return false;
        };

        let outcome = self
            .exchange_refresh_token(&refresh)
            .await
            .and_then(|access| {
                self.tokens
                    .set_tokens(&access, &refresh)
                    .map_err(|e| e.to_string())
            });

        match outcome {
            Ok(()) => {
                debug!("Access token refreshed");
                true
            }
            Err(reason) => {
                warn!(%reason, "Token refresh failed, clearing session");
                if let Err(e) = self.tokens.clear_tokens() {
                    warn!(error = %e, "Could not clear session after failed refresh");
                }
                false
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh: &str) -> Result<String, String> {
        let response = self
            .public_post(endpoints::token::REFRESH, &RefreshRequest { refresh })
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("refresh endpoint returned {status}"));
        }

        let body = response.bytes().await.map_err(|e| e.to_string())?;
        let parsed: RefreshResponse =
            serde_json::from_slice(&body).map_err(|e| format!("invalid refresh response: {e}"))?;
        if parsed.access.is_empty() {
            return Err("refresh response carried an empty access token".into());
        }
        Ok(parsed.access)
    }
}
