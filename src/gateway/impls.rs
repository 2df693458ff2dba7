use std::sync::Arc;

use jiff::Timestamp;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    errors::Error,
    gateway::{Gateway, GatewayInner, REFRESH_ENDPOINT, RequestOptions},
    navigation::{Navigator, TracingNavigator},
    refresh::{Acquired, RefreshCoordinator, RefreshLease, RefreshResolution},
    telemetry::refresh::{RefreshOutcome, RefreshTelemetry},
    types::AuthResponse,
};

impl Gateway {
    /// Create a gateway that reports redirects through `tracing`.
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::with_navigator(config, Arc::new(TracingNavigator))
    }

    pub fn with_navigator(config: &Config, navigator: Arc<dyn Navigator>) -> Result<Self, Error> {
        let api_base = config.api_base()?;
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            inner: Arc::new(GatewayInner {
                http,
                api_base,
                login_route: config.login_route.clone(),
                refresh: RefreshCoordinator::new(),
                navigator,
            }),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.inner.api_base
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    /// Credential issued by the most recent successful refresh, if any.
    pub fn latest_credential(&self) -> Option<String> {
        self.inner.refresh.latest_credential()
    }

    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.inner.api_base, endpoint)
    }

    pub(crate) fn redirect_to_login(&self) {
        warn!(route = %self.inner.login_route, "redirecting to login");
        self.inner.navigator.navigate(&self.inner.login_route);
    }

    /// Issue `options` against `endpoint`, recovering transparently from an expired credential.
    ///
    /// Non-401 responses, including other error statuses, are returned as-is. A 401
    /// without a credential redirects to login and fails with
    /// [`Error::AuthenticationRequired`]. A 401 with a credential joins (or opens)
    /// the refresh cycle and replays the request with the new credential; if
    /// the refresh fails every waiting caller gets [`Error::SessionExpired`].
    /// A credential older than the last refreshed one is first retried with that
    /// newer credential, and only goes through a refresh if that is rejected too.
    /// Transport errors propagate unchanged.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
        credential: Option<&str>,
    ) -> Result<Response, Error> {
        let response = self.send(endpoint, &options, credential).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            debug!(endpoint, status = %response.status(), "request complete");
            return Ok(response);
        }

        let Some(rejected) = credential else {
            warn!(endpoint, "401 without credential");
            self.redirect_to_login();
            return Err(Error::AuthenticationRequired);
        };

        warn!(endpoint, method = %options.method, "401 with credential; refreshing");
        let (fresh, superseded) = self.fresh_credential(rejected).await?;
        let mut replay = self.send(endpoint, &options, Some(&fresh)).await?;
        if superseded && replay.status() == StatusCode::UNAUTHORIZED {
            // The remembered credential has expired too; it has to go through a refresh cycle.
            warn!(endpoint, "latest credential rejected; refreshing");
            let (fresh, _) = self.fresh_credential(&fresh).await?;
            replay = self.send(endpoint, &options, Some(&fresh)).await?;
        }
        info!(endpoint, status = %replay.status(), "request replayed");
        Ok(replay)
    }

    pub async fn get(&self, endpoint: &str, credential: Option<&str>) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::GET), credential)
            .await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
        credential: Option<&str>,
    ) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::POST).json(body)?, credential)
            .await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
        credential: Option<&str>,
    ) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::PUT).json(body)?, credential)
            .await
    }

    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
        credential: Option<&str>,
    ) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::PATCH).json(body)?, credential)
            .await
    }

    pub async fn delete(&self, endpoint: &str, credential: Option<&str>) -> Result<Response, Error> {
        self.request(endpoint, RequestOptions::new(Method::DELETE), credential)
            .await
    }

    /// GET `endpoint` and decode a JSON body, treating any non-2xx status as [`Error::Status`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        credential: Option<&str>,
    ) -> Result<T, Error> {
        let resp = self.get(endpoint, credential).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(endpoint, status = %status, "unexpected response status");
            return Err(Error::Status(status, body));
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        credential: Option<&str>,
    ) -> Result<Response, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for name in options.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in options.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
        if let Some(token) = credential {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::Config(format!("credential is not a valid header value: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut req = self
            .inner
            .http
            .request(options.method.clone(), self.url(endpoint))
            .headers(headers);
        if let Some(body) = options.body.as_ref() {
            req = req.body(body.clone());
        }
        Ok(req.send().await?)
    }

    /// Resolves the credential to replay with; the flag is set when no refresh was awaited.
    async fn fresh_credential(&self, rejected: &str) -> Result<(String, bool), Error> {
        let ticket = match self.inner.refresh.acquire(rejected) {
            Acquired::Superseded(token) => {
                debug!("credential already refreshed; replaying with latest");
                return Ok((token, true));
            }
            Acquired::Follower(ticket) => {
                debug!("joining in-flight refresh");
                ticket
            }
            Acquired::Leader { lease, ticket } => {
                // Runs detached so a caller dropping its future never cancels the shared exchange.
                let gateway = self.clone();
                tokio::spawn(async move { gateway.run_refresh(lease).await });
                ticket
            }
        };
        match ticket.wait().await {
            RefreshResolution::Refreshed(token) => Ok((token, false)),
            RefreshResolution::Failed => Err(Error::SessionExpired),
        }
    }

    async fn run_refresh(&self, lease: RefreshLease) {
        let telemetry = RefreshTelemetry::new("gateway.refresh");
        telemetry.emit_start(Timestamp::now());
        match self.exchange().await {
            Ok(token) => {
                telemetry.emit_success(token.len(), Timestamp::now());
                lease.resolve(RefreshResolution::Refreshed(token));
            }
            Err((outcome, reason)) => {
                telemetry.emit_failure(outcome, &reason, Timestamp::now());
                self.redirect_to_login();
                lease.resolve(RefreshResolution::Failed);
            }
        }
    }

    async fn exchange(&self) -> Result<String, (RefreshOutcome, String)> {
        let resp = self
            .inner
            .http
            .post(self.url(REFRESH_ENDPOINT))
            .send()
            .await
            .map_err(|e| (RefreshOutcome::Transport, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err((RefreshOutcome::Rejected, format!("status {}", status)));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| (RefreshOutcome::Transport, e.to_string()))?;
        let payload: AuthResponse = serde_json::from_str(&body)
            .map_err(|e| (RefreshOutcome::Malformed, e.to_string()))?;
        payload
            .credential()
            .map(str::to_string)
            .ok_or_else(|| (RefreshOutcome::Malformed, "missing accessToken".to_string()))
    }
}
