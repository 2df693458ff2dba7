//! Direct calls to the `/auth` routes and user lookup.
//!
//! These bypass the refresh-and-replay path of [`Gateway::request`]: a failed
//! login or refresh here is an answer for the caller, not something to recover from.

use reqwest::Response;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    errors::Error,
    gateway::{Gateway, REFRESH_ENDPOINT},
    types::{AuthResponse, ErrorBody, LoginRequest, RegisterRequest, User, UserEnvelope},
};

#[derive(Clone)]
pub struct AuthApi {
    gateway: Gateway,
}

impl AuthApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Exchange the session cookie for a credential. `None` on any failure.
    pub async fn refresh(&self) -> Option<AuthResponse> {
        let resp = match self
            .gateway
            .http()
            .post(self.gateway.url(REFRESH_ENDPOINT))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                error!(error = %err, "token refresh failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            info!(status = %resp.status(), "no session to restore");
            return None;
        }
        match resp.json::<AuthResponse>().await {
            Ok(payload) => Some(payload),
            Err(err) => {
                error!(error = %err, "token refresh returned an unreadable body");
                None
            }
        }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, Error> {
        let resp = self.post_json("/auth/login", credentials).await?;
        let payload: AuthResponse = Self::read_auth(resp, "Login failed").await?;
        if payload.credential().is_none() {
            return Err(Error::Auth("Login response carried no access token".to_string()));
        }
        info!(login = %credentials.login, "logged in");
        Ok(payload)
    }

    pub async fn register(&self, form: &RegisterRequest) -> Result<serde_json::Value, Error> {
        let resp = self.post_json("/auth/register", &form.payload()).await?;
        let body: serde_json::Value = Self::read_auth(resp, "Registration failed").await?;
        info!(login = %form.login, "registered");
        Ok(body)
    }

    /// Best effort; the server-side session may outlive a failed call.
    pub async fn logout(&self) {
        let result = self
            .gateway
            .http()
            .post(self.gateway.url("/auth/logout"))
            .send()
            .await;
        if let Err(err) = result {
            warn!(error = %err, "logout request failed");
        }
    }

    /// Look up a user. `None` when the user is missing or the call fails.
    pub async fn fetch_user(&self, user_id: &str, credential: Option<&str>) -> Option<User> {
        let endpoint = format!("/users/{}", urlencoding::encode(user_id));
        let mut req = self.gateway.http().get(self.gateway.url(&endpoint));
        if let Some(token) = credential {
            req = req.bearer_auth(token);
        }
        let resp = match req.send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(user_id, status = %resp.status(), "user lookup failed");
                return None;
            }
            Err(err) => {
                error!(user_id, error = %err, "failed to fetch user data");
                return None;
            }
        };
        match resp.json::<UserEnvelope>().await {
            Ok(envelope) => Some(envelope.user),
            Err(err) => {
                error!(user_id, error = %err, "user payload unreadable");
                None
            }
        }
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, Error> {
        Ok(self
            .gateway
            .http()
            .post(self.gateway.url(endpoint))
            .json(body)
            .send()
            .await?)
    }

    async fn read_auth<T: serde::de::DeserializeOwned>(
        resp: Response,
        fallback: &str,
    ) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| fallback.to_string());
            error!(status = %status, message = %message, "auth request rejected");
            return Err(Error::Auth(message));
        }
        Ok(serde_json::from_str(&body)?)
    }
}
