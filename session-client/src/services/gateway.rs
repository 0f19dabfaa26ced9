//! Authenticated request gateway.
//!
//! Attaches the current bearer token to outbound API calls and transparently
//! recovers from a single token expiry. The gateway holds no mutable state
//! of its own; everything lives in the session store.

use std::sync::Arc;

use client_core::error::ClientError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};

use super::session::SessionStore;

/// Caller-supplied extras for one request. Extra headers are merged under
/// the gateway's own; the authorization header is never overridable.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }
}

pub struct ApiGateway {
    http: reqwest::Client,
    session: Arc<SessionStore>,
}

impl ApiGateway {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            http: session.http_client().clone(),
            session,
        }
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        self.request(Method::GET, path, RequestOptions::default())
            .await
    }

    pub async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, ClientError> {
        self.request(Method::POST, path, RequestOptions::json(body))
            .await
    }

    pub async fn put(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, ClientError> {
        self.request(Method::PUT, path, RequestOptions::json(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        self.request(Method::DELETE, path, RequestOptions::default())
            .await
    }

    /// Sends one authenticated request.
    ///
    /// Without an access token this short-circuits to a synthetic 401 and
    /// performs no network call. A 401 response triggers one refresh and one
    /// retry; every other status is returned to the caller untouched.
    /// Network-level failures on the request itself propagate; a refresh
    /// that yields no usable token surfaces the session-expired notice,
    /// logs out, and returns the synthetic 401.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Response, ClientError> {
        let Some(token) = self.session.access_token().await else {
            tracing::warn!(path, "Request without an access token");
            return Ok(unauthorized_response());
        };

        let response = self.send(method.clone(), path, &options, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!(path, "Access token rejected, attempting refresh");
        match self.session.refresh_access_token().await {
            Ok(Some(new_token)) => {
                // Exactly one retry, strictly after the refresh completed.
                self.send(method, path, &options, &new_token).await
            }
            Ok(None) => {
                self.fail_session().await;
                Ok(unauthorized_response())
            }
            Err(e) => {
                tracing::error!(error = %e, "Token refresh failed");
                self.fail_session().await;
                Ok(unauthorized_response())
            }
        }
    }

    async fn fail_session(&self) {
        self.session.observer().notify_session_expired();
        self.session.logout().await;
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        options: &RequestOptions,
        token: &str,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.session.base_url(), path);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers.clone());
        // A caller-supplied credential must never reach the wire, not even
        // alongside the real one; reqwest appends on duplicate names.
        headers.remove(AUTHORIZATION);

        let mut builder = self
            .http
            .request(method, &url)
            .headers(headers)
            .bearer_auth(token);
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }
}

fn unauthorized_response() -> reqwest::Response {
    http::Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .body("")
        .expect("statically valid response")
        .into()
}
