use jiff::Timestamp;
use reqwest::{Method, Response};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    auth::AuthApi,
    errors::Error,
    gateway::{Gateway, RequestOptions},
    types::{AuthResponse, LoginRequest, RegisterRequest, User},
};

#[derive(Clone, Debug)]
pub struct SessionState {
    pub access_token: String,
    pub user: Option<User>,
    pub since: Timestamp,
}

/// The signed-in user and their current credential, plus the calls that change them.
///
/// Requests issued through the session use the current credential and adopt
/// any credential the gateway obtains by refreshing along the way.
pub struct Session {
    api: AuthApi,
    state: RwLock<Option<SessionState>>,
}

impl Session {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            api: AuthApi::new(gateway),
            state: RwLock::new(None),
        }
    }

    pub fn gateway(&self) -> &Gateway {
        self.api.gateway()
    }

    pub fn auth(&self) -> &AuthApi {
        &self.api
    }

    pub async fn snapshot(&self) -> Option<SessionState> {
        self.state.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.as_ref().and_then(|s| s.user.clone())
    }

    /// Try to resume a previous session from the refresh cookie. Returns whether one was found.
    pub async fn restore(&self) -> bool {
        let Some(payload) = self.api.refresh().await else {
            return false;
        };
        let restored = self.adopt(payload).await;
        if restored {
            info!("session restored");
        }
        restored
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, Error> {
        let payload = self.api.login(credentials).await?;
        self.adopt(payload.clone()).await;
        Ok(payload)
    }

    pub async fn register(&self, form: &RegisterRequest) -> Result<serde_json::Value, Error> {
        self.api.register(form).await
    }

    /// Clears local state even when the server call fails.
    pub async fn logout(&self) {
        self.api.logout().await;
        self.clear().await;
        info!("logged out");
    }

    /// Fetch a user by id; when it is the signed-in user their cached profile is updated.
    pub async fn fetch_user(&self, user_id: &str) -> Option<User> {
        let token = self.access_token().await;
        let user = self.api.fetch_user(user_id, token.as_deref()).await?;
        let mut state = self.state.write().await;
        if let Some(current) = state.as_mut()
            && current.user.as_ref().is_some_and(|u| u.id == user.id)
        {
            current.user = Some(user.clone());
        }
        Some(user)
    }

    /// [`Gateway::request`] with the session's credential.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Response, Error> {
        let token = self.access_token().await;
        let result = self
            .gateway()
            .request(endpoint, options, token.as_deref())
            .await;
        match &result {
            Err(Error::SessionExpired) | Err(Error::AuthenticationRequired) => self.clear().await,
            _ => self.adopt_refreshed().await,
        }
        result
    }

    pub async fn get(&self, endpoint: &str) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::GET)).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::POST).json(body)?)
            .await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::PUT).json(body)?)
            .await
    }

    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::PATCH).json(body)?)
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::DELETE)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        let token = self.access_token().await;
        let result = self.gateway().get_json(endpoint, token.as_deref()).await;
        match &result {
            Err(Error::SessionExpired) | Err(Error::AuthenticationRequired) => self.clear().await,
            _ => self.adopt_refreshed().await,
        }
        result
    }

    async fn adopt(&self, payload: AuthResponse) -> bool {
        let Some(token) = payload.credential().map(str::to_string) else {
            return false;
        };
        // A credential from login or restore supersedes anything refreshed earlier.
        self.gateway().refresh_coordinator().reset();
        *self.state.write().await = Some(SessionState {
            access_token: token,
            user: payload.user,
            since: Timestamp::now(),
        });
        true
    }

    async fn adopt_refreshed(&self) {
        let Some(latest) = self.gateway().latest_credential() else {
            return;
        };
        let mut state = self.state.write().await;
        if let Some(current) = state.as_mut()
            && current.access_token != latest
        {
            debug!(token_len = latest.len(), "adopting refreshed credential");
            current.access_token = latest;
            current.since = Timestamp::now();
        }
    }

    async fn clear(&self) {
        self.gateway().refresh_coordinator().reset();
        *self.state.write().await = None;
    }
}
