use std::future::Future;
use std::sync::Arc;

use reqwest::cookie::Jar;
use serde::Serialize;

use asistente_core::error::RequestError;
use asistente_core::payload::{CalendarEventPayload, EmailPayload, InvokeRequest, InvokeResponse};

use crate::config::Config;

/// The three backend calls the controller makes. One attempt each, no timeout.
pub trait Backend: Send + Sync + 'static {
    fn invoke(
        &self,
        request: &InvokeRequest,
    ) -> impl Future<Output = Result<InvokeResponse, RequestError>> + Send;

    fn send_email(
        &self,
        payload: &EmailPayload,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    fn create_event(
        &self,
        payload: &CalendarEventPayload,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;
}

/// reqwest-backed backend. Chat goes through a client without a cookie store;
/// email and calendar go through one whose jar carries the stored auth cookie.
pub struct HttpBackend {
    invoke_url: String,
    gmail_url: String,
    calendar_url: String,
    anonymous: reqwest::Client,
    credentialed: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &Config, auth_cookie: Option<&str>) -> Result<Self, reqwest::Error> {
        let jar = Arc::new(Jar::default());
        // The stored value may hold several `name=value` pairs from a Cookie header.
        for pair in auth_cookie
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|pair| pair.contains('='))
        {
            jar.add_cookie_str(pair, config.api_base());
        }
        let credentialed = reqwest::Client::builder().cookie_provider(jar).build()?;

        Ok(Self {
            invoke_url: config.invoke_url(),
            gmail_url: config.gmail_url(),
            calendar_url: config.calendar_url(),
            anonymous: reqwest::Client::new(),
            credentialed,
        })
    }
}

/// POST `body` as JSON and return the raw response text of a 2xx response.
async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
) -> Result<String, RequestError> {
    tracing::debug!(%url, "POST");
    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(%url, error = %e, "request failed before a response");
            RequestError::Transport(e.to_string())
        })?;

    let status = resp.status();
    let raw = resp
        .text()
        .await
        .map_err(|e| RequestError::Transport(e.to_string()))?;

    if !status.is_success() {
        tracing::warn!(%url, status = status.as_u16(), "backend returned an error status");
        return Err(RequestError::from_status(status.as_u16(), &raw));
    }
    tracing::debug!(%url, status = status.as_u16(), bytes = raw.len(), "response received");
    Ok(raw)
}

impl Backend for HttpBackend {
    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, RequestError> {
        let raw = post_json(&self.anonymous, &self.invoke_url, request).await?;
        if raw.trim().is_empty() {
            return Ok(InvokeResponse::default());
        }
        serde_json::from_str(&raw).map_err(|e| RequestError::Decode(e.to_string()))
    }

    async fn send_email(&self, payload: &EmailPayload) -> Result<(), RequestError> {
        post_json(&self.credentialed, &self.gmail_url, payload).await?;
        Ok(())
    }

    async fn create_event(&self, payload: &CalendarEventPayload) -> Result<(), RequestError> {
        post_json(&self.credentialed, &self.calendar_url, payload).await?;
        Ok(())
    }
}
