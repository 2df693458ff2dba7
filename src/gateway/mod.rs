use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::Serialize;

use crate::{errors::Error, navigation::Navigator, refresh::RefreshCoordinator};

mod impls;

pub const REFRESH_ENDPOINT: &str = "/auth/refresh";

/// Authenticated access to the remote API.
///
/// Attaches bearer credentials, and on a 401 performs at most one refresh
/// exchange per cycle no matter how many callers hit the 401, replaying every
/// affected request with the new credential. Clones share the HTTP client,
/// cookie jar and refresh state.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    http: Client,
    api_base: String,
    login_route: String,
    refresh: RefreshCoordinator,
    navigator: Arc<dyn Navigator>,
}

/// Method, headers and body of one logical request. Kept intact so it can be replayed.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}
